pub mod cost;
pub mod provider;
pub mod providers;
pub mod retry;

pub use cost::{calculate_model_cost, calculate_token_cost, model_pricing, ModelPricing};
pub use provider::{Completion, LlmError, LlmProvider, Message, Role, TokenUsage};
pub use providers::create_provider;
pub use retry::complete_with_retry;
