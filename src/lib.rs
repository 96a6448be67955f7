//! draftdesk: an operator workspace for drafting a narrative beat by beat.
//!
//! - [`drafting`]: beats, append-only version history, prompt assembly and
//!   selection/rollback
//! - [`gate`]: the checkpoint phase state machine
//! - [`queue`]: simulated background tasks on a schedulable clock
//! - [`cost`]: token counting, pricing and the cost ledger
//! - [`toolkit`]: the comedic tool catalog, tool selection and angles
//! - [`runtime`]: segment archetypes, runtime budgeting and continuity notes
//! - [`store`]: whole-document state persistence
//! - [`workspace`]: the controller tying the cores together, and its view model
//! - [`server`]: the JSON HTTP binding

pub mod config;
pub mod cost;
pub mod drafting;
pub mod error;
pub mod gate;
pub mod queue;
pub mod runtime;
pub mod server;
pub mod store;
pub mod toolkit;
pub mod workspace;

pub use crate::config::WorkspaceConfig;
pub use crate::error::{WorkspaceError, WorkspaceResult};
pub use crate::workspace::WorkspaceController;
