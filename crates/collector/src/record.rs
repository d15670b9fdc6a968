//! Re-exports the collection blob contract (§6) from `gazette-core`, where
//! it's shared with the topic processor that reads these blobs back.

pub use gazette_core::collection::{collection_blob_path, CollectionRecord};
