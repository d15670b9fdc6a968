//! Pure-function cost calculation for LLM token usage.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::provider::TokenUsage;

#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Pricing table, updated alongside model releases. Unknown models fall
/// back to the cheapest known row.
fn default_pricing() -> &'static HashMap<&'static str, ModelPricing> {
    static PRICING: OnceLock<HashMap<&'static str, ModelPricing>> = OnceLock::new();
    PRICING.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("gpt-3.5-turbo", ModelPricing { input_per_1k: 0.0005, output_per_1k: 0.0015 });
        m.insert("gpt-4", ModelPricing { input_per_1k: 0.01, output_per_1k: 0.03 });
        m.insert("gpt-4o", ModelPricing { input_per_1k: 0.0025, output_per_1k: 0.01 });
        m.insert("claude-3-haiku", ModelPricing { input_per_1k: 0.00025, output_per_1k: 0.00125 });
        m.insert("claude-3-5-sonnet", ModelPricing { input_per_1k: 0.003, output_per_1k: 0.015 });
        m
    })
}

/// Fallback row used when a model name has no table entry: the cheapest
/// row in the table by combined per-1k price, not a fixed constant, so it
/// stays correct as pricing rows are added or repriced.
fn fallback_pricing() -> ModelPricing {
    *default_pricing()
        .values()
        .min_by(|a, b| (a.input_per_1k + a.output_per_1k).partial_cmp(&(b.input_per_1k + b.output_per_1k)).unwrap())
        .expect("pricing table is never empty")
}

pub fn model_pricing(model_name: &str) -> ModelPricing {
    default_pricing().get(model_name).copied().unwrap_or_else(fallback_pricing)
}

/// cost = (input_tokens/1000 * input_price) + (output_tokens/1000 * output_price),
/// rounded to 6 decimal places.
pub fn calculate_token_cost(usage: TokenUsage, pricing: ModelPricing) -> f64 {
    let input_cost = (usage.input_tokens as f64 / 1000.0) * pricing.input_per_1k;
    let output_cost = (usage.output_tokens as f64 / 1000.0) * pricing.output_per_1k;
    round6(input_cost + output_cost)
}

pub fn calculate_model_cost(model_name: &str, usage: TokenUsage) -> f64 {
    calculate_token_cost(usage, model_pricing(model_name))
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_cost_matches_reference() {
        let usage = TokenUsage { input_tokens: 1000, output_tokens: 500 };
        let cost = calculate_model_cost("gpt-3.5-turbo", usage);
        assert_eq!(cost, 0.00125);
    }

    #[test]
    fn gpt4o_cost_matches_reference() {
        let usage = TokenUsage { input_tokens: 2000, output_tokens: 1000 };
        let cost = calculate_model_cost("gpt-4o", usage);
        assert_eq!(cost, 0.015);
    }

    #[test]
    fn unknown_model_falls_back_to_cheapest() {
        let usage = TokenUsage { input_tokens: 1000, output_tokens: 500 };
        let cost = calculate_model_cost("some-future-model", usage);
        // cheapest row is claude-3-haiku (0.00025 / 0.00125 per 1k).
        assert_eq!(cost, 0.000875);
    }

    #[test]
    fn zero_usage_is_zero_cost() {
        let usage = TokenUsage { input_tokens: 0, output_tokens: 0 };
        assert_eq!(calculate_model_cost("gpt-4", usage), 0.0);
    }
}
