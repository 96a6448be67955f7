use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Operator progress state consulted by the phase gate.
///
/// Lives for the session only. Nothing here is reset when the operator
/// navigates backwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSet {
    pub filters: BTreeSet<String>,
    pub toolkit: Option<String>,
    pub approved_variant: Option<String>,
    pub rollback_confirmed: bool,
}

impl DecisionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a filter id. Returns whether the filter is now selected.
    /// Blank ids are ignored and never selected.
    pub fn toggle_filter(&mut self, filter_id: impl Into<String>) -> bool {
        let Some(filter_id) = non_empty(filter_id.into().trim().to_string()) else {
            return false;
        };
        if self.filters.remove(&filter_id) {
            false
        } else {
            self.filters.insert(filter_id);
            true
        }
    }

    /// Select a toolkit. An empty id clears the selection.
    pub fn select_toolkit(&mut self, toolkit_id: impl Into<String>) {
        self.toolkit = non_empty(toolkit_id.into());
    }

    /// Approve a variant. An empty id clears the approval.
    pub fn approve_variant(&mut self, variant_id: impl Into<String>) {
        self.approved_variant = non_empty(variant_id.into());
    }

    pub fn confirm_rollback(&mut self, confirmed: bool) {
        self.rollback_confirmed = confirmed;
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
