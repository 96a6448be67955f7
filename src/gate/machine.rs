use serde::{Deserialize, Serialize};

use super::decisions::DecisionSet;
use super::phase::{default_phases, Phase, PhaseId};
use crate::error::{WorkspaceError, WorkspaceResult};

/// Where a phase sits relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Done,
    Current,
    Upcoming,
}

/// Per-phase progress entry for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReport {
    pub id: PhaseId,
    pub label: String,
    pub hint: String,
    pub status: PhaseStatus,
    pub satisfied: bool,
}

/// Linear checkpoint navigation over a fixed phase list.
///
/// Forward moves are refused unless every phase being left is satisfied.
/// Backward moves are always allowed and never touch the decision set.
#[derive(Debug, Clone)]
pub struct PhaseGate {
    phases: Vec<Phase>,
    index: usize,
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self {
            phases: default_phases(),
            index: 0,
        }
    }
}

impl PhaseGate {
    /// Create a gate over a custom phase list. The list must not be empty.
    pub fn new(phases: Vec<Phase>) -> WorkspaceResult<Self> {
        if phases.is_empty() {
            return Err(WorkspaceError::Validation(
                "phase gate requires at least one phase".to_string(),
            ));
        }
        Ok(Self { phases, index: 0 })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &Phase {
        &self.phases[self.index]
    }

    fn last_index(&self) -> usize {
        self.phases.len() - 1
    }

    /// Whether the current phase's predicate holds.
    pub fn can_advance(&self, decisions: &DecisionSet) -> bool {
        self.current().is_satisfied(decisions)
    }

    pub fn is_complete(&self) -> bool {
        self.index == self.last_index()
    }

    /// Move by `delta` phases, clamped to the phase list.
    ///
    /// Returns the new index. A forward move fails with
    /// [`WorkspaceError::GateNotSatisfied`] naming the first unsatisfied
    /// phase, and the index is left unchanged.
    pub fn move_by(&mut self, delta: i64, decisions: &DecisionSet) -> WorkspaceResult<usize> {
        let last = self.last_index() as i64;
        let target = (self.index as i64).saturating_add(delta).clamp(0, last) as usize;

        if target > self.index {
            if let Some(blocked) = self.phases[self.index..target]
                .iter()
                .find(|phase| !phase.is_satisfied(decisions))
            {
                tracing::debug!(phase = %blocked.id, "Forward move refused");
                return Err(WorkspaceError::GateNotSatisfied { phase: blocked.id });
            }
        }

        if target != self.index {
            tracing::debug!(from = self.index, to = target, "Phase changed");
        }
        self.index = target;
        Ok(self.index)
    }

    pub fn progress(&self, decisions: &DecisionSet) -> Vec<PhaseReport> {
        self.phases
            .iter()
            .enumerate()
            .map(|(i, phase)| PhaseReport {
                id: phase.id,
                label: phase.label.clone(),
                hint: phase.hint.clone(),
                status: match i.cmp(&self.index) {
                    std::cmp::Ordering::Less => PhaseStatus::Done,
                    std::cmp::Ordering::Equal => PhaseStatus::Current,
                    std::cmp::Ordering::Greater => PhaseStatus::Upcoming,
                },
                satisfied: phase.is_satisfied(decisions),
            })
            .collect()
    }
}
