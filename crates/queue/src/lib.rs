pub mod batcher;
pub mod consumer;
pub mod error;
pub mod local;
pub mod sqs;

pub use batcher::MicroBatcher;
pub use consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
pub use error::QueueError;
pub use local::LocalQueue;
pub use sqs::{SqsClient, SqsConsumer, SqsProducer};

use std::sync::Arc;

use gazette_core::config::{ObjectStoreConfig, QueueConfig};

/// The four named queues of §4/§6, each with its own consumer and producer.
pub struct Queues {
    pub collection_requests: Arc<dyn QueueConsumer>,
    pub collection_requests_producer: Arc<dyn QueueProducer>,
    pub processing_requests: Arc<dyn QueueConsumer>,
    pub processing_requests_producer: Arc<dyn QueueProducer>,
    pub markdown_requests: Arc<dyn QueueConsumer>,
    pub markdown_requests_producer: Arc<dyn QueueProducer>,
    pub publishing_requests: Arc<dyn QueueConsumer>,
    pub publishing_requests_producer: Arc<dyn QueueProducer>,
}

impl Queues {
    /// Build all four queues from config, routing to SQS or the local
    /// file-backed queue depending on `queue.backend`.
    pub fn from_config(object_store: &ObjectStoreConfig, queue: &QueueConfig) -> Result<Self, QueueError> {
        if queue.backend == "sqs" {
            let sqs = SqsClient::new(object_store);
            Ok(Self {
                collection_requests: Arc::new(sqs.for_queue(&queue.collection_requests_url, queue.visibility_timeout_secs, queue.dlq_url.clone())),
                collection_requests_producer: Arc::new(sqs.producer_for(&queue.collection_requests_url)),
                processing_requests: Arc::new(sqs.for_queue(&queue.processing_requests_url, queue.visibility_timeout_secs, queue.dlq_url.clone())),
                processing_requests_producer: Arc::new(sqs.producer_for(&queue.processing_requests_url)),
                markdown_requests: Arc::new(sqs.for_queue(&queue.markdown_requests_url, queue.visibility_timeout_secs, queue.dlq_url.clone())),
                markdown_requests_producer: Arc::new(sqs.producer_for(&queue.markdown_requests_url)),
                publishing_requests: Arc::new(sqs.for_queue(&queue.publishing_requests_url, queue.visibility_timeout_secs, queue.dlq_url.clone())),
                publishing_requests_producer: Arc::new(sqs.producer_for(&queue.publishing_requests_url)),
            })
        } else {
            let root = object_store.local_root.join("queues");
            let collection = Arc::new(LocalQueue::new(root.join(&queue.collection_requests_url))?);
            let processing = Arc::new(LocalQueue::new(root.join(&queue.processing_requests_url))?);
            let markdown = Arc::new(LocalQueue::new(root.join(&queue.markdown_requests_url))?);
            let publishing = Arc::new(LocalQueue::new(root.join(&queue.publishing_requests_url))?);
            Ok(Self {
                collection_requests: collection.clone(),
                collection_requests_producer: collection,
                processing_requests: processing.clone(),
                processing_requests_producer: processing,
                markdown_requests: markdown.clone(),
                markdown_requests_producer: markdown,
                publishing_requests: publishing.clone(),
                publishing_requests_producer: publishing,
            })
        }
    }
}
