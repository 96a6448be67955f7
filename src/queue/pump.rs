//! Background driver for a shared task queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::simulator::SharedTaskQueue;

/// Polls a [`SharedTaskQueue`] on a fixed tick until stopped.
///
/// The queue is locked only for the duration of a poll, never across an
/// await point.
pub struct QueuePump {
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl QueuePump {
    /// Spawn the pump on the current tokio runtime.
    pub fn spawn(queue: SharedTaskQueue, tick: Duration) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let task_stop = Arc::clone(&stop_flag);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick).await;
                if task_stop.load(Ordering::SeqCst) {
                    break;
                }

                let changes = match queue.lock() {
                    Ok(mut queue) => queue.poll(),
                    Err(_) => {
                        tracing::warn!("Task queue lock poisoned; stopping pump");
                        break;
                    }
                };
                for change in changes {
                    tracing::info!(
                        task_id = %change.task_id,
                        from = ?change.from,
                        to = ?change.to,
                        "Task advanced"
                    );
                }
            }
        });

        Self { stop_flag, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the pump to stop and wait for it to exit.
    pub async fn shutdown(self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "Queue pump exited abnormally");
        }
    }
}
