//! Retry policy for LLM calls (§4.F step 3): exponential backoff on
//! transient errors (429, 5xx, connection failures), no retry on other
//! 4xx responses.

use std::time::Duration;

use tracing::warn;

use crate::provider::{Completion, LlmError, LlmProvider, Message};

const INITIAL_BACKOFF_SECS: f64 = 1.0;
const BACKOFF_MULTIPLIER: f64 = 2.0;

pub async fn complete_with_retry(
    provider: &dyn LlmProvider,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
) -> Result<Completion, LlmError> {
    let mut attempt = 0;
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        match provider.complete(messages.clone(), temperature, max_tokens).await {
            Ok(completion) => return Ok(completion),
            Err(err) if attempt < max_retries && err.is_transient() => {
                let delay = match &err {
                    LlmError::RateLimited { retry_after_secs: Some(secs) } if *secs > 0.0 => *secs,
                    _ => backoff,
                };
                warn!(attempt, delay_secs = delay, error = %err, "llm call failed, retrying");
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                backoff *= BACKOFF_MULTIPLIER;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::provider::TokenUsage;

    struct FlakyProvider {
        calls: Arc<AtomicU32>,
        fail_times: u32,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        async fn complete(&self, _messages: Vec<Message>, _t: f32, _m: u32) -> Result<Completion, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(LlmError::ApiError { status: 503, body: "unavailable".into() })
            } else {
                Ok(Completion { text: "ok".into(), usage: TokenUsage { input_tokens: 1, output_tokens: 1 } })
            }
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    struct AlwaysBadRequestProvider;

    #[async_trait]
    impl LlmProvider for AlwaysBadRequestProvider {
        async fn complete(&self, _messages: Vec<Message>, _t: f32, _m: u32) -> Result<Completion, LlmError> {
            Err(LlmError::ApiError { status: 400, body: "bad request".into() })
        }

        fn model_name(&self) -> &str {
            "test-model"
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let provider = FlakyProvider { calls: Arc::new(AtomicU32::new(0)), fail_times: 2 };
        let result = complete_with_retry(&provider, vec![], 0.7, 100, 3).await;
        assert!(result.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_transient_4xx() {
        let provider = AlwaysBadRequestProvider;
        let result = complete_with_retry(&provider, vec![], 0.7, 100, 5).await;
        assert!(matches!(result, Err(LlmError::ApiError { status: 400, .. })));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let provider = FlakyProvider { calls: Arc::new(AtomicU32::new(0)), fail_times: 100 };
        let result = complete_with_retry(&provider, vec![], 0.7, 100, 2).await;
        assert!(result.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
