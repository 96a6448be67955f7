//! Background persistence and the sync failure log.
//!
//! The controller never touches the store on the request path. Each save is
//! handed to a [`StateWriter`] task over an unbounded channel; the task
//! coalesces queued snapshots, writes the newest one on the blocking pool,
//! and records failures in the shared [`SyncFailureLog`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::store::{StateStore, WorkspaceState};

/// Oldest records are dropped past this many.
pub const MAX_SYNC_FAILURES: usize = 50;

/// A persistence or generation call that failed after the local mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailureRecord {
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Bounded, shareable list of recent sync failures.
#[derive(Debug, Clone)]
pub struct SyncFailureLog {
    records: Arc<Mutex<VecDeque<SyncFailureRecord>>>,
    capacity: usize,
}

impl Default for SyncFailureLog {
    fn default() -> Self {
        Self::with_capacity(MAX_SYNC_FAILURES)
    }
}

impl SyncFailureLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Sync failure");
        let Ok(mut records) = self.records.lock() else {
            return;
        };
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(SyncFailureRecord {
            message,
            occurred_at: Utc::now(),
        });
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<SyncFailureRecord> {
        self.records
            .lock()
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.records
            .lock()
            .map(|records| records.is_empty())
            .unwrap_or(true)
    }
}

enum WriteCommand {
    Save(Box<WorkspaceState>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background task that writes state documents.
///
/// Must be created inside a tokio runtime. Dropping the handle closes the
/// channel; the task writes whatever is still queued and exits.
pub struct StateWriter {
    sender: mpsc::UnboundedSender<WriteCommand>,
    handle: JoinHandle<()>,
}

impl StateWriter {
    pub fn spawn(store: Arc<dyn StateStore>, failures: SyncFailureLog) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(store, failures, receiver));
        Self { sender, handle }
    }

    /// Queue a snapshot for writing. Returns immediately.
    pub fn save(&self, state: WorkspaceState) -> bool {
        self.sender
            .send(WriteCommand::Save(Box::new(state)))
            .is_ok()
    }

    /// Wait until every snapshot queued so far has been written or has failed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

async fn run_writer(
    store: Arc<dyn StateStore>,
    failures: SyncFailureLog,
    mut receiver: mpsc::UnboundedReceiver<WriteCommand>,
) {
    while let Some(command) = receiver.recv().await {
        let mut latest = None;
        let mut waiters = Vec::new();
        let mut next = Some(command);

        // Everything already queued is written once, newest snapshot wins.
        while let Some(command) = next {
            match command {
                WriteCommand::Save(state) => latest = Some(state),
                WriteCommand::Flush(done) => waiters.push(done),
            }
            next = receiver.try_recv().ok();
        }

        if let Some(state) = latest {
            write_snapshot(&store, &failures, *state).await;
        }
        for done in waiters {
            let _ = done.send(());
        }
    }
    tracing::debug!("State writer stopped");
}

async fn write_snapshot(store: &Arc<dyn StateStore>, failures: &SyncFailureLog, state: WorkspaceState) {
    let store = Arc::clone(store);
    let beats = state.beats.len();
    let result = tokio::task::spawn_blocking(move || store.replace(&state)).await;
    match result {
        Ok(Ok(())) => tracing::debug!(beats, "State persisted"),
        Ok(Err(err)) => failures.record(format!("persist failed: {}", err)),
        Err(err) => failures.record(format!("persist task failed: {}", err)),
    }
}
