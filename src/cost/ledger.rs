//! Token entry ledger with running totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::estimator::{TokenCount, TokenCounter};
use super::pricing::{format_usd, CostBreakdown, TokenPricing};
use crate::error::{WorkspaceError, WorkspaceResult};

/// One recorded generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenEntry {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: CostBreakdown,
    pub recorded_at: DateTime<Utc>,
}

/// Running totals over every entry in the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostTotals {
    pub total_input: u64,
    pub total_output: u64,
    pub total_cost: f64,
}

/// Append-only ledger of token entries.
///
/// Totals are derived on read so they always agree with the entries.
#[derive(Debug, Clone, Default)]
pub struct CostLedger {
    pricing: TokenPricing,
    entries: Vec<TokenEntry>,
}

impl CostLedger {
    pub fn new(pricing: TokenPricing) -> Self {
        Self {
            pricing,
            entries: Vec::new(),
        }
    }

    pub fn pricing(&self) -> &TokenPricing {
        &self.pricing
    }

    /// Record a call with known token counts.
    ///
    /// Rejects counts that would push the running totals past `u64::MAX`;
    /// the ledger is left unchanged.
    pub fn record_call(&mut self, input_tokens: u64, output_tokens: u64) -> WorkspaceResult<&TokenEntry> {
        let totals = self.totals();
        let fits = totals
            .total_input
            .checked_add(input_tokens)
            .zip(totals.total_output.checked_add(output_tokens))
            .and_then(|(input, output)| input.checked_add(output))
            .is_some();
        if !fits {
            return Err(WorkspaceError::Validation(format!(
                "token counts {} in / {} out overflow the ledger totals",
                input_tokens, output_tokens
            )));
        }

        let cost = self.pricing.cost(input_tokens, output_tokens);
        tracing::debug!(input_tokens, output_tokens, total = cost.total, "Recorded token entry");
        self.entries.push(TokenEntry {
            input_tokens,
            output_tokens,
            cost,
            recorded_at: Utc::now(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Record a call, preferring reported usage and falling back to the counter.
    pub fn record_exchange(
        &mut self,
        usage: Option<TokenCount>,
        counter: &dyn TokenCounter,
        prompt: &str,
        output: &str,
    ) -> WorkspaceResult<&TokenEntry> {
        let count = usage.unwrap_or_else(|| counter.count_exchange(prompt, output));
        self.record_call(count.input_tokens, count.output_tokens)
    }

    pub fn entries(&self) -> &[TokenEntry] {
        &self.entries
    }

    pub fn totals(&self) -> CostTotals {
        self.entries
            .iter()
            .fold(CostTotals::default(), |mut totals, entry| {
                totals.total_input = totals.total_input.saturating_add(entry.input_tokens);
                totals.total_output = totals.total_output.saturating_add(entry.output_tokens);
                totals.total_cost += entry.cost.total;
                totals
            })
    }

    pub fn summary(&self) -> CostSummary {
        CostSummary {
            calls: self.entries.len(),
            totals: self.totals(),
            model_name: self.pricing.model_name.clone(),
        }
    }
}

/// Summary of ledger usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub calls: usize,
    pub totals: CostTotals,
    pub model_name: String,
}

impl CostSummary {
    /// Format as a human-readable string.
    pub fn format(&self) -> String {
        let mut output = String::from("## Token Cost Summary\n\n");
        output.push_str(&format!(
            "**Tokens Used**: {} ({} input, {} output)\n",
            self.totals.total_input.saturating_add(self.totals.total_output),
            self.totals.total_input,
            self.totals.total_output
        ));
        output.push_str(&format!(
            "**Estimated Cost**: {}\n",
            format_usd(self.totals.total_cost)
        ));
        output.push_str(&format!("**Calls**: {}\n", self.calls));
        output.push_str(&format!("**Pricing**: {}\n", self.model_name));
        output
    }
}
