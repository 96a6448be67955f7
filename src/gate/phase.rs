use std::fmt;

use serde::{Deserialize, Serialize};

use super::decisions::DecisionSet;

/// Identifier of a checkpoint phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    /// Pick at least one content filter
    Filters,
    /// Pick a toolkit
    Toolkit,
    /// Approve a variant
    Variant,
    /// Confirm the rollback point
    Rollback,
    /// Free review; carries no rule of its own
    Review,
}

impl PhaseId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseId::Filters => "filters",
            PhaseId::Toolkit => "toolkit",
            PhaseId::Variant => "variant",
            PhaseId::Rollback => "rollback",
            PhaseId::Review => "review",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the operator may leave `phase` going forward.
pub fn can_advance(phase: PhaseId, decisions: &DecisionSet) -> bool {
    match phase {
        PhaseId::Filters => !decisions.filters.is_empty(),
        PhaseId::Toolkit => decisions.toolkit.is_some(),
        PhaseId::Variant => decisions.approved_variant.is_some(),
        PhaseId::Rollback => decisions.rollback_confirmed,
        PhaseId::Review => true,
    }
}

/// One checkpoint in the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub label: String,
    pub hint: String,
}

impl Phase {
    pub fn new(id: PhaseId, label: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            hint: hint.into(),
        }
    }

    pub fn is_satisfied(&self, decisions: &DecisionSet) -> bool {
        can_advance(self.id, decisions)
    }
}

/// The fixed checkpoint sequence of the drafting workflow.
pub fn default_phases() -> Vec<Phase> {
    vec![
        Phase::new(
            PhaseId::Filters,
            "Filters",
            "Choose at least one filter to scope the draft.",
        ),
        Phase::new(
            PhaseId::Toolkit,
            "Toolkit",
            "Pick the toolkit the next drafts should lean on.",
        ),
        Phase::new(
            PhaseId::Variant,
            "Variant",
            "Approve one variant before moving on.",
        ),
        Phase::new(
            PhaseId::Rollback,
            "Rollback",
            "Confirm the rollback point to finish.",
        ),
    ]
}
