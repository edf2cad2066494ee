//! Background persistence of committed documents.
//!
//! Commits land in a single latest-wins slot. One worker drains it, so the
//! remote store only ever sees documents in commit order, and a newer commit
//! supersedes a snapshot that keeps failing.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::client::RemoteDocumentStore;
use crate::core::document::Document;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Snapshot {
    version: u64,
    document: Arc<Document>,
}

/// Versions handled by the persistence worker so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStatus {
    /// Highest version confirmed by the remote store.
    pub persisted: u64,
    /// Highest version the worker is done with, saved or abandoned.
    pub settled: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub key: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

pub(crate) struct Outbox {
    pending: watch::Sender<Option<Snapshot>>,
    status: watch::Receiver<PersistStatus>,
}

impl Outbox {
    /// Must be called from within a tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteDocumentStore>, policy: RetryPolicy) -> Self {
        let (pending_tx, pending_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(PersistStatus::default());

        tokio::spawn(persist_worker(remote, policy, pending_rx, status_tx));

        Outbox {
            pending: pending_tx,
            status: status_rx,
        }
    }

    pub fn enqueue(&self, version: u64, document: Arc<Document>) {
        self.pending
            .send_replace(Some(Snapshot { version, document }));
    }

    pub fn status(&self) -> PersistStatus {
        *self.status.borrow()
    }

    /// Resolves once `version` (or a later one) has been settled.
    pub async fn settled(&self, version: u64) -> PersistStatus {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|s| s.settled >= version)
            .await
            .map(|current| *current);
        // Worker is gone, report what it last published.
        settled.unwrap_or_else(|_| *status.borrow())
    }
}

async fn persist_worker(
    remote: Arc<dyn RemoteDocumentStore>,
    policy: RetryPolicy,
    mut pending: watch::Receiver<Option<Snapshot>>,
    status: watch::Sender<PersistStatus>,
) {
    while pending.changed().await.is_ok() {
        let snapshot = pending.borrow_and_update().clone();
        let Some(mut snapshot) = snapshot else {
            continue;
        };

        let mut attempt = 1;
        loop {
            match persist_once(remote.as_ref(), &policy, &snapshot).await {
                Ok(()) => {
                    status.send_modify(|s| {
                        s.persisted = s.persisted.max(snapshot.version);
                        s.settled = s.settled.max(snapshot.version);
                    });
                    break;
                }
                Err(reason) => {
                    warn!(
                        version = snapshot.version,
                        attempt, "Could not save document to remote store: {reason}"
                    );
                }
            }

            if attempt >= policy.max_attempts {
                error!(
                    version = snapshot.version,
                    "Giving up on saving document after {attempt} attempts"
                );
                status.send_modify(|s| s.settled = s.settled.max(snapshot.version));
                break;
            }

            time::sleep(policy.delay(attempt)).await;
            attempt += 1;

            if pending.has_changed().unwrap_or(false) {
                let newer = pending.borrow_and_update().clone();
                if let Some(newer) = newer {
                    debug!(
                        superseded = snapshot.version,
                        version = newer.version,
                        "Newer document committed, retrying with it"
                    );
                    // The superseded version will never be saved on its own.
                    status.send_modify(|s| s.settled = s.settled.max(snapshot.version));
                    snapshot = newer;
                    attempt = 1;
                }
            }
        }
    }
    debug!("Persistence worker stopped");
}

async fn persist_once(
    remote: &dyn RemoteDocumentStore,
    policy: &RetryPolicy,
    snapshot: &Snapshot,
) -> Result<(), String> {
    match time::timeout(policy.timeout, remote.set(&policy.key, &snapshot.document)).await {
        Ok(Ok(())) => {
            let document = &snapshot.document;
            info!(
                version = snapshot.version,
                free = document.leaderboard.free.len(),
                paid = document.leaderboard.paid.len(),
                players = document.player_stats.len(),
                "Saved document to remote store"
            );
            Ok(())
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("no answer after {:?}", policy.timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_is_capped() {
        let policy = RetryPolicy {
            key: "game-data".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 10,
            backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay(3), Duration::from_millis(2_000));
        assert_eq!(policy.delay(20), MAX_BACKOFF);
    }
}
