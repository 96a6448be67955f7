use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::document::WorkspaceState;
use crate::error::{WorkspaceError, WorkspaceResult};

/// Whole-document persistence for the workspace.
///
/// There is no concurrency token: `replace` overwrites whatever is stored.
pub trait StateStore: Send + Sync {
    /// Load the stored state, or an empty state if nothing is stored yet.
    fn load(&self) -> WorkspaceResult<WorkspaceState>;

    /// Replace the stored state.
    fn replace(&self, state: &WorkspaceState) -> WorkspaceResult<()>;
}

/// State store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> WorkspaceResult<WorkspaceState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(WorkspaceState::default());
            }
            Err(err) => return Err(WorkspaceError::Io(err)),
        };
        let document: serde_json::Value = serde_json::from_str(&content)?;
        WorkspaceState::from_document(&document)
    }

    fn replace(&self, state: &WorkspaceState) -> WorkspaceResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(state)?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), beats = state.beats.len(), "State written");
        Ok(())
    }
}

/// In-memory state store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<Mutex<Option<WorkspaceState>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: WorkspaceState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(state))),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> WorkspaceResult<WorkspaceState> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| WorkspaceError::SyncFailure("memory store poisoned".to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn replace(&self, state: &WorkspaceState) -> WorkspaceResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| WorkspaceError::SyncFailure("memory store poisoned".to_string()))?;
        *guard = Some(state.clone());
        Ok(())
    }
}
