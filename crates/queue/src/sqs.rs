//! AWS SQS consumer/producer.

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_sqs::config::BehaviorVersion;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use chrono::{TimeZone, Utc};
use tracing::{debug, info};

use gazette_core::config::ObjectStoreConfig;

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
use crate::error::QueueError;

/// Shared SQS client, built once per process and cloned per queue URL.
#[derive(Clone)]
pub struct SqsClient {
    client: Client,
}

impl SqsClient {
    /// Build an SQS client reusing the same AWS credentials as the
    /// object-store config (one account backs both S3 and SQS).
    pub fn new(object_store: &ObjectStoreConfig) -> Self {
        let region = aws_sdk_sqs::config::Region::new(object_store.region.clone());

        let mut builder = aws_sdk_sqs::Config::builder()
            .region(region)
            .behavior_version(BehaviorVersion::latest());

        if let (Some(key_id), Some(secret)) =
            (&object_store.access_key_id, &object_store.secret_access_key)
        {
            let creds = Credentials::new(
                key_id,
                secret,
                object_store.session_token.clone(),
                None,
                "gazette-queue-static",
            );
            builder = builder.credentials_provider(creds);
        }

        if let Some(ref endpoint) = object_store.endpoint_url {
            if !endpoint.is_empty() {
                let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.clone()
                } else {
                    format!("https://{endpoint}")
                };
                builder = builder.endpoint_url(&url);
            }
        }

        Self { client: Client::from_conf(builder.build()) }
    }

    pub fn for_queue(&self, queue_url: impl Into<String>, visibility_timeout_secs: u32, dlq_url: Option<String>) -> SqsConsumer {
        SqsConsumer {
            client: self.client.clone(),
            queue_url: queue_url.into(),
            dlq_url,
            visibility_timeout_secs: visibility_timeout_secs as i32,
        }
    }

    pub fn producer_for(&self, queue_url: impl Into<String>) -> SqsProducer {
        SqsProducer { client: self.client.clone(), queue_url: queue_url.into() }
    }
}

/// SQS-backed queue consumer.
pub struct SqsConsumer {
    client: Client,
    queue_url: String,
    dlq_url: Option<String>,
    visibility_timeout_secs: i32,
}

#[async_trait]
impl QueueConsumer for SqsConsumer {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let capped = max_messages.min(10) as i32;

        debug!(max_messages = capped, "polling sqs");

        let resp = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(capped)
            .wait_time_seconds(20)
            .visibility_timeout(self.visibility_timeout_secs)
            .message_system_attribute_names(aws_sdk_sqs::types::MessageSystemAttributeName::All)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("sqs receive failed: {e:?}")))?;

        let sqs_messages = resp.messages.unwrap_or_default();
        debug!(count = sqs_messages.len(), "received sqs messages");

        let mut messages = Vec::with_capacity(sqs_messages.len());
        for msg in sqs_messages {
            let id = msg.message_id().unwrap_or("unknown").to_string();
            let body = msg.body().unwrap_or("").to_string();
            let receipt_handle = msg
                .receipt_handle()
                .ok_or_else(|| QueueError::Parse("missing receipt handle".into()))?
                .to_string();

            let timestamp = msg
                .attributes()
                .and_then(|attrs| attrs.get(&aws_sdk_sqs::types::MessageSystemAttributeName::SentTimestamp))
                .and_then(|ts| ts.parse::<i64>().ok())
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .unwrap_or_else(Utc::now);

            let attempt_count = msg
                .attributes()
                .and_then(|attrs| attrs.get(&aws_sdk_sqs::types::MessageSystemAttributeName::ApproximateReceiveCount))
                .and_then(|c| c.parse::<u32>().ok())
                .unwrap_or(1);

            messages.push(QueueMessage { id, body, receipt_handle, timestamp, attempt_count });
        }

        Ok(messages)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Ack(format!("sqs delete failed: {e:?}")))?;
        Ok(())
    }

    async fn nack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.client
            .change_message_visibility()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .visibility_timeout(0)
            .send()
            .await
            .map_err(|e| QueueError::Provider(format!("sqs visibility change failed: {e:?}")))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("sqs health check failed: {e:?}")))?;

        let count = resp
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|v| v.parse::<u64>().ok());

        Ok(QueueHealth { connected: true, approximate_message_count: count, provider: "sqs".to_string() })
    }

    async fn dlq_depth(&self) -> Result<Option<u64>, QueueError> {
        let dlq_url = match &self.dlq_url {
            Some(url) => url,
            None => return Ok(None),
        };

        let resp = self
            .client
            .get_queue_attributes()
            .queue_url(dlq_url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| QueueError::Connection(format!("sqs dlq check failed: {e:?}")))?;

        Ok(resp
            .attributes()
            .and_then(|attrs| attrs.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .and_then(|v| v.parse::<u64>().ok()))
    }
}

/// SQS-backed queue producer — enqueues the next stage's work item.
pub struct SqsProducer {
    client: Client,
    queue_url: String,
}

#[async_trait]
impl QueueProducer for SqsProducer {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Send(format!("sqs send failed: {e:?}")))?;
        info!(queue_url = %self.queue_url, "enqueued message");
        Ok(())
    }
}
