//! Per-token pricing.

use serde::{Deserialize, Serialize};

/// Linear per-token prices, in US dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPricing {
    /// Price of a single input token
    pub price_per_input_token: f64,
    /// Price of a single output token
    pub price_per_output_token: f64,
    /// Model name for reference
    pub model_name: String,
}

impl Default for TokenPricing {
    fn default() -> Self {
        // $3 / $15 per million tokens
        Self {
            price_per_input_token: 0.000_003,
            price_per_output_token: 0.000_015,
            model_name: "default".to_string(),
        }
    }
}

impl TokenPricing {
    pub fn new(price_per_input_token: f64, price_per_output_token: f64) -> Self {
        Self {
            price_per_input_token,
            price_per_output_token,
            ..Self::default()
        }
    }

    /// Price a call. No rounding is applied here.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> CostBreakdown {
        let input_cost = input_tokens as f64 * self.price_per_input_token;
        let output_cost = output_tokens as f64 * self.price_per_output_token;
        CostBreakdown {
            input_cost,
            output_cost,
            total: input_cost + output_cost,
        }
    }
}

/// Cost of one call split by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total: f64,
}

/// Display-time formatting for a dollar amount.
pub fn format_usd(amount: f64) -> String {
    format!("${:.4}", amount)
}
