//! The collection blob contract shared by stage E (writer) and stage F
//! (reader): `collections/YYYY/MM/DD/{collection_id}.json` (§6), one JSON
//! document per cycle, grown in place as items survive review and dedup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::StandardItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub collection_id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<StandardItem>,
}

impl CollectionRecord {
    pub fn new(collection_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { collection_id: collection_id.into(), created_at, items: Vec::new() }
    }
}

pub fn collection_blob_path(now: DateTime<Utc>, collection_id: &str) -> String {
    format!("collections/{}/{collection_id}.json", now.format("%Y/%m/%d"))
}
