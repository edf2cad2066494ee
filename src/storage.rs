mod outbox;

pub use outbox::PersistStatus;

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

use crate::client::RemoteDocumentStore;
use crate::core::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::storage::outbox::{Outbox, RetryPolicy};
use crate::utils::Clock;

#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Key of the whole document in the remote store.
    pub document_key: String,
    pub ttl: Duration,
    /// Upper bound on any single remote read or write.
    pub remote_timeout: Duration,
    pub persist_max_attempts: u32,
    pub persist_backoff: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions {
            document_key: "game-data".to_string(),
            ttl: Duration::from_secs(30),
            remote_timeout: Duration::from_secs(5),
            persist_max_attempts: 5,
            persist_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

struct CacheState {
    document: Arc<Document>,
    // Last successful fetch or local commit.
    refreshed_at: Option<DateTime<Utc>>,
    // Bumped on every local commit.
    version: u64,
}

impl CacheState {
    fn freshness(&self, now: DateTime<Utc>, ttl: Duration) -> Freshness {
        match self.refreshed_at {
            Some(at) if (now - at).to_std().map_or(true, |age| age < ttl) => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }
}

type SharedState = Arc<Mutex<CacheState>>;

/// Process-local copy of the document, refreshed from and written through to
/// the remote store. Clones share the same cache.
#[derive(Clone)]
pub struct CacheStore {
    state: SharedState,
    remote: Arc<dyn RemoteDocumentStore>,
    clock: Arc<dyn Clock>,
    options: Arc<CacheOptions>,
    outbox: Arc<Outbox>,
}

impl CacheStore {
    /// Starts the persistence worker, so this must run inside a tokio runtime.
    pub fn new(
        remote: Arc<dyn RemoteDocumentStore>,
        clock: Arc<dyn Clock>,
        options: CacheOptions,
    ) -> CacheStore {
        let outbox = Outbox::spawn(
            remote.clone(),
            RetryPolicy {
                key: options.document_key.clone(),
                timeout: options.remote_timeout,
                max_attempts: options.persist_max_attempts.max(1),
                backoff: options.persist_backoff,
            },
        );
        let state = CacheState {
            document: Arc::new(Document::empty(clock.now_millis())),
            refreshed_at: None,
            version: 0,
        };

        CacheStore {
            state: Arc::new(Mutex::new(state)),
            remote,
            clock,
            options: Arc::new(options),
            outbox: Arc::new(outbox),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn freshness(&self) -> Freshness {
        self.lock().freshness(self.clock.now(), self.options.ttl)
    }

    /// Serve the cache while fresh, otherwise try to refresh it from the remote
    /// store. Remote failures only mean the cached document is served as is.
    pub async fn load_data(&self) -> Arc<Document> {
        let now = self.clock.now();
        let base_version = {
            let state = self.lock();
            if state.freshness(now, self.options.ttl) == Freshness::Fresh {
                debug!("Using cached document (fresh)");
                return state.document.clone();
            }
            state.version
        };

        if self.outbox.status().settled < base_version {
            debug!(
                version = base_version,
                "Local changes not yet saved, serving cached document"
            );
            return self.get_data();
        }

        let key = &self.options.document_key;
        let fetched = time::timeout(self.options.remote_timeout, self.remote.get(key))
            .await
            .unwrap_or_else(|_| Err(StoreError::Timeout(self.options.remote_timeout)));

        match fetched {
            Ok(Some(document)) => {
                let mut state = self.lock();
                if state.version != base_version {
                    debug!("Document committed locally during fetch, keeping local version");
                    return state.document.clone();
                }
                info!(
                    free = document.leaderboard.free.len(),
                    paid = document.leaderboard.paid.len(),
                    players = document.player_stats.len(),
                    prize_pool = document.prize_pool.total_amount,
                    "Loaded document from remote store"
                );
                state.document = Arc::new(document);
                state.refreshed_at = Some(now);
                state.document.clone()
            }
            Ok(None) => {
                let mut state = self.lock();
                if state.version != base_version {
                    debug!("Document committed locally during fetch, already queued for saving");
                    return state.document.clone();
                }
                warn!("No document under '{key}' in remote store yet, initializing");
                let document = Document::clone(&state.document);
                self.commit(&mut state, document);
                state.document.clone()
            }
            Err(e) => {
                warn!("Remote store unavailable, using cached document. {e}");
                self.get_data()
            }
        }
    }

    /// Current cached document, without any remote access.
    pub fn get_data(&self) -> Arc<Document> {
        self.lock().document.clone()
    }

    /// Replace the cached document and queue it for persistence. The commit
    /// itself cannot fail; returns the version assigned to it.
    pub fn save_data(&self, document: Document) -> u64 {
        let mut state = self.lock();
        self.commit(&mut state, document)
    }

    /// Read-modify-write of the cached document in one critical section, so
    /// concurrent mutations are applied one after another.
    pub fn mutate<F>(&self, change: F) -> Arc<Document>
    where
        F: FnOnce(&mut Document, &dyn Clock),
    {
        let mut state = self.lock();
        let mut document = Document::clone(&state.document);
        change(&mut document, self.clock.as_ref());
        self.commit(&mut state, document);
        state.document.clone()
    }

    fn commit(&self, state: &mut CacheState, document: Document) -> u64 {
        state.document = Arc::new(document);
        state.version += 1;
        state.refreshed_at = Some(self.clock.now());
        self.outbox.enqueue(state.version, state.document.clone());
        state.version
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.outbox.status()
    }

    /// Wait for the persistence worker to be done with every commit so far.
    pub async fn flush(&self) -> StoreResult<()> {
        let version = self.version();
        let status = self.outbox.settled(version).await;
        if status.persisted >= version {
            Ok(())
        } else {
            Err(StoreError::Persist(version))
        }
    }
}
