//! Cost derivation (§9: "cost derivation happens at the execution-summary
//! boundary, not inside the provider").
//!
//! [`lacquer_provider::TokenUsage`] is deliberately rate-agnostic; turning
//! it into a dollar figure is a policy decision the host makes, not
//! something any provider or the scheduler should bake in.

use std::collections::HashMap;

use lacquer_core::TokenUsage;

/// Turns a model's token usage into an estimated cost, in USD.
pub trait CostModel: Send + Sync {
    /// Estimate the cost of one model call. `None` means "unknown" rather
    /// than "free" — callers should not assume a missing estimate is zero.
    fn estimate(&self, model: &str, usage: &TokenUsage) -> Option<f64>;
}

/// A [`CostModel`] that never estimates anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCostModel;

impl CostModel for NullCostModel {
    fn estimate(&self, _model: &str, _usage: &TokenUsage) -> Option<f64> {
        None
    }
}

/// A [`CostModel`] backed by a per-model table of USD-per-million-token
/// prices, one pair per model: `(prompt_rate, completion_rate)`.
#[derive(Debug, Default, Clone)]
pub struct PerTokenCostModel {
    rates: HashMap<String, (f64, f64)>,
}

impl PerTokenCostModel {
    /// An empty table; every model is unpriced until added.
    pub fn new() -> Self {
        Self { rates: HashMap::new() }
    }

    /// Set `model`'s per-million-token prompt/completion rates.
    pub fn with_rate(mut self, model: impl Into<String>, prompt_per_million: f64, completion_per_million: f64) -> Self {
        self.rates.insert(model.into(), (prompt_per_million, completion_per_million));
        self
    }
}

impl CostModel for PerTokenCostModel {
    fn estimate(&self, model: &str, usage: &TokenUsage) -> Option<f64> {
        let (prompt_rate, completion_rate) = self.rates.get(model)?;
        let prompt_cost = usage.prompt_tokens as f64 / 1_000_000.0 * prompt_rate;
        let completion_cost = usage.completion_tokens as f64 / 1_000_000.0 * completion_rate;
        Some(prompt_cost + completion_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_model_estimates_nothing() {
        let usage = TokenUsage { prompt_tokens: 100, completion_tokens: 50, total_tokens: 150 };
        assert_eq!(NullCostModel.estimate("anything", &usage), None);
    }

    #[test]
    fn unpriced_model_is_unknown_not_free() {
        let model = PerTokenCostModel::new().with_rate("claude-3", 3.0, 15.0);
        let usage = TokenUsage { prompt_tokens: 1_000_000, completion_tokens: 0, total_tokens: 1_000_000 };
        assert_eq!(model.estimate("gpt-unknown", &usage), None);
    }

    #[test]
    fn priced_model_computes_from_the_rate_table() {
        let model = PerTokenCostModel::new().with_rate("claude-3", 3.0, 15.0);
        let usage = TokenUsage { prompt_tokens: 1_000_000, completion_tokens: 1_000_000, total_tokens: 2_000_000 };
        assert_eq!(model.estimate("claude-3", &usage), Some(18.0));
    }
}
