pub mod claude;
pub mod ollama;
pub mod openai;

use gazette_core::config::LlmConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the configured LLM provider (§4.F step 3).
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = config.openai_base_url.as_deref().unwrap_or("https://api.openai.com");
            Ok(Box::new(openai::OpenAiProvider::new(api_key.clone(), config.model.clone(), base_url.to_string())))
        }
        "anthropic" | "claude" => {
            let api_key = config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Box::new(claude::AnthropicProvider::new(api_key.clone(), config.model.clone())))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(config.ollama_url.clone(), config.model.clone()))),
        other => Err(LlmError::NotConfigured(format!("unknown LLM provider: '{other}'"))),
    }
}
