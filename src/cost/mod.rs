//! Token cost estimation.
//!
//! - **TokenPricing**: linear per-token prices and the pure `cost` function
//! - **TokenCounter**: injectable token-count provider, with the heuristic
//!   [`TokenEstimator`] as the default
//! - **CostLedger**: append-only token entries with derived running totals
//!
//! # Example
//!
//! ```
//! use draftdesk::cost::{CostLedger, TokenPricing};
//!
//! let mut ledger = CostLedger::new(TokenPricing::default());
//! ledger.record_call(2_000, 500)?;
//! assert_eq!(ledger.totals().total_input, 2_000);
//! # Ok::<(), draftdesk::WorkspaceError>(())
//! ```

mod estimator;
mod ledger;
mod pricing;

pub use estimator::{EstimationMethod, TokenCount, TokenCounter, TokenEstimator};
pub use ledger::{CostLedger, CostSummary, CostTotals, TokenEntry};
pub use pricing::{format_usd, CostBreakdown, TokenPricing};
