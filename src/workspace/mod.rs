//! Workspace controller and its display model.

mod controller;
mod sync;
mod view;

pub use controller::{QueueSnapshot, WorkspaceController};
pub use sync::{StateWriter, SyncFailureLog, SyncFailureRecord, MAX_SYNC_FAILURES};
pub use view::{
    render, BeatView, CostView, DonorView, PhaseView, QueueView, RenderInput, ToolkitView,
    VersionView, WorkspaceView,
};
