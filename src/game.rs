use std::sync::Arc;
use tracing::{debug, info};

use crate::client::RemoteDocumentStore;
use crate::core::document::{
    AddressPolicy, Document, LeaderboardEntry, Mode, PlayerStats, PrizePool, PrizePoolUpdate,
};
use crate::core::leaderboard::upsert_entry;
use crate::core::stats::{apply_prize_pool_update, find_player_stats, upsert_player_stats};
use crate::error::StoreResult;
use crate::storage::{CacheOptions, CacheStore, PersistStatus};
use crate::utils::Clock;

/// Operations used by request handlers. Reads never fail, writes always
/// succeed locally and are persisted in the background.
#[derive(Clone)]
pub struct GameStorage {
    cache: CacheStore,
    policy: AddressPolicy,
}

impl GameStorage {
    pub fn new(
        remote: Arc<dyn RemoteDocumentStore>,
        clock: Arc<dyn Clock>,
        options: CacheOptions,
        policy: AddressPolicy,
    ) -> Self {
        GameStorage {
            cache: CacheStore::new(remote, clock, options),
            policy,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Warm the cache at process start.
    pub async fn init_storage(&self) {
        let document = self.cache.load_data().await;
        info!(
            free = document.leaderboard.free.len(),
            paid = document.leaderboard.paid.len(),
            players = document.player_stats.len(),
            "Storage initialized"
        );
    }

    pub async fn load_data(&self) -> Arc<Document> {
        self.cache.load_data().await
    }

    pub fn get_data(&self) -> Arc<Document> {
        self.cache.get_data()
    }

    /// Overwrites the whole document.
    pub fn save_data(&self, document: Document) -> u64 {
        self.cache.save_data(document)
    }

    pub fn update_leaderboard_entry(&self, mode: Mode, entry: LeaderboardEntry) -> Arc<Document> {
        debug!(%mode, address = %entry.address, "Updating leaderboard entry");
        let matching = self.policy.leaderboard;
        self.cache.mutate(|document, _| {
            upsert_entry(document.leaderboard.board_mut(mode), entry, matching);
        })
    }

    pub fn update_player_stats(&self, address: &str, partial: PlayerStats) -> Arc<Document> {
        debug!(address, "Updating player stats");
        let matching = self.policy.player_stats;
        self.cache.mutate(|document, clock| {
            upsert_player_stats(
                &mut document.player_stats,
                address,
                partial,
                matching,
                clock.now_millis(),
            );
        })
    }

    /// `None` when no stats are stored for the address.
    pub fn get_player_stats(&self, address: &str) -> Option<PlayerStats> {
        let document = self.cache.get_data();
        find_player_stats(&document.player_stats, address, self.policy.player_stats).cloned()
    }

    pub fn update_prize_pool(&self, update: PrizePoolUpdate) -> Arc<Document> {
        debug!(?update, "Updating prize pool");
        self.cache.mutate(|document, clock| {
            document.prize_pool =
                apply_prize_pool_update(&document.prize_pool, update, clock.now_millis());
        })
    }

    pub fn leaderboard(&self, mode: Mode) -> Vec<LeaderboardEntry> {
        self.cache.get_data().leaderboard.board(mode).clone()
    }

    pub fn prize_pool(&self) -> PrizePool {
        self.cache.get_data().prize_pool.clone()
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.cache.persist_status()
    }

    pub async fn flush(&self) -> StoreResult<()> {
        self.cache.flush().await
    }
}
