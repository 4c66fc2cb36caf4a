//! Debounced automatic pushes.
//!
//! Every state change is tagged with its [`Origin`]. Only local changes are
//! pushed, after a quiet period with no further local change. A remote
//! change cancels any pending push, so applying a subscribed bundle can
//! never echo it back to the store.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::coordinator::SyncCoordinator;
use crate::models::SyncData;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Made by the user on this device
    Local,
    /// Applied from the household document
    Remote,
}

#[derive(Debug, Clone)]
pub struct StateChange {
    pub origin: Origin,
    pub bundle: SyncData,
}

impl StateChange {
    pub fn local(bundle: SyncData) -> Self {
        Self {
            origin: Origin::Local,
            bundle,
        }
    }

    pub fn remote(bundle: SyncData) -> Self {
        Self {
            origin: Origin::Remote,
            bundle,
        }
    }
}

/// Handle to the background push task. Dropping it cancels the task and
/// any pending push.
pub struct PushScheduler {
    tx: Option<mpsc::UnboundedSender<StateChange>>,
    task: Option<JoinHandle<()>>,
}

impl PushScheduler {
    /// Spawns the push task. Must be called inside a Tokio runtime.
    pub fn spawn(coordinator: SyncCoordinator, quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(coordinator, quiet, rx));
        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    pub fn notify(&self, change: StateChange) {
        if let Some(tx) = &self.tx {
            if tx.send(change).is_err() {
                tracing::warn!("Push scheduler stopped; change not queued");
            }
        }
    }

    /// Stops accepting changes and waits for a pending push to go out.
    pub async fn flush(mut self) {
        self.tx.take();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Push scheduler ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PushScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn push(coordinator: &SyncCoordinator, bundle: &SyncData) {
    if let Err(e) = coordinator.push(bundle).await {
        tracing::warn!("Automatic push failed: {}", e);
    }
}

async fn run(
    coordinator: SyncCoordinator,
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<StateChange>,
) {
    let mut pending: Option<SyncData> = None;
    let timer = sleep(quiet);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            change = rx.recv() => match change {
                Some(StateChange { origin: Origin::Local, bundle }) => {
                    pending = Some(bundle);
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                Some(StateChange { origin: Origin::Remote, .. }) => {
                    if pending.take().is_some() {
                        tracing::debug!("Remote change cancelled pending push");
                    }
                }
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(bundle) = pending.take() {
                    push(&coordinator, &bundle).await;
                }
            }
        }
    }

    if let Some(bundle) = pending.take() {
        push(&coordinator, &bundle).await;
    }
}
