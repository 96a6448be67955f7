//! Workspace state persistence.

mod backend;
mod document;

pub use backend::{FileStateStore, MemoryStateStore, StateStore};
pub use document::WorkspaceState;
