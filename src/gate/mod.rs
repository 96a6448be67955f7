//! Phase gate state machine.
//!
//! The workflow is a fixed, ordered list of checkpoints. The operator can
//! always step back, but can only step forward once the current phase's
//! predicate over the [`DecisionSet`] holds. The check lives inside
//! [`PhaseGate::move_by`], so an out-of-band forward move is refused with
//! `GateNotSatisfied` rather than silently accepted.

mod decisions;
mod machine;
mod phase;

pub use decisions::DecisionSet;
pub use machine::{PhaseGate, PhaseReport, PhaseStatus};
pub use phase::{can_advance, default_phases, Phase, PhaseId};
