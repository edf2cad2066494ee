#![allow(dead_code)]

use async_trait::async_trait;
use pull_board::client::RemoteDocumentStore;
use pull_board::core::document::{AddressPolicy, Document, LeaderboardEntry, Mode};
use pull_board::core::leaderboard::rank_board;
use pull_board::error::{StoreError, StoreResult};
use pull_board::game::GameStorage;
use pull_board::storage::{CacheOptions, CacheStore};
use pull_board::utils::ManualClock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory remote store counting every call.
#[derive(Default)]
pub struct MemoryRemote {
    document: Mutex<Option<Document>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    hang_gets: AtomicBool,
    get_delay: Mutex<Option<Duration>>,
}

impl MemoryRemote {
    pub fn empty() -> Arc<Self> {
        Arc::new(MemoryRemote::default())
    }

    pub fn with_document(document: Document) -> Arc<Self> {
        let remote = MemoryRemote::default();
        *remote.document.lock().unwrap() = Some(document);
        Arc::new(remote)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Document> {
        self.document.lock().unwrap().clone()
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn hang_gets(&self, hang: bool) {
        self.hang_gets.store(hang, Ordering::SeqCst);
    }

    pub fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl RemoteDocumentStore for MemoryRemote {
    async fn get(&self, _key: &str) -> StoreResult<Option<Document>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        // Answer reflects the store at request time.
        let document = self.document.lock().unwrap().clone();

        if self.hang_gets.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Remote("503 Service Unavailable".to_string()));
        }
        Ok(document)
    }

    async fn set(&self, _key: &str, value: &Document) -> StoreResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StoreError::Remote("500 Internal Server Error".to_string()));
        }
        *self.document.lock().unwrap() = Some(value.clone());
        Ok(())
    }
}

pub fn test_options() -> CacheOptions {
    CacheOptions {
        persist_max_attempts: 2,
        persist_backoff: Duration::from_millis(10),
        ..CacheOptions::default()
    }
}

pub fn cache_store(remote: &Arc<MemoryRemote>, clock: &Arc<ManualClock>) -> CacheStore {
    CacheStore::new(remote.clone(), clock.clone(), test_options())
}

pub fn game_storage(remote: &Arc<MemoryRemote>, clock: &Arc<ManualClock>) -> GameStorage {
    game_storage_with_policy(remote, clock, AddressPolicy::default())
}

pub fn game_storage_with_policy(
    remote: &Arc<MemoryRemote>,
    clock: &Arc<ManualClock>,
    policy: AddressPolicy,
) -> GameStorage {
    GameStorage::new(remote.clone(), clock.clone(), test_options(), policy)
}

pub fn sample_document() -> Document {
    let mut document = Document::empty(1_700_000_000_000);
    document.leaderboard.free = vec![
        LeaderboardEntry::new("0xAA", 5, 3, 1).with_username("bob"),
        LeaderboardEntry::new("0xBB", 2, 8, 0),
    ];
    rank_board(document.leaderboard.board_mut(Mode::Free));
    document.prize_pool.total_amount = 25.0;
    document.prize_pool.participants = 2;
    document
}
