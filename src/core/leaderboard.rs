use crate::core::document::{AddressMatching, LeaderboardEntry};
use std::cmp::Ordering;

/// Board order: longest streak first, then most trigger pulls, then fewest deaths.
/// Entries equal on all three keys have no defined relative order.
pub fn ranking_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.max_streak
        .cmp(&a.max_streak)
        .then_with(|| b.trigger_pulls.cmp(&a.trigger_pulls))
        .then_with(|| a.deaths.cmp(&b.deaths))
}

/// Sort the board and overwrite every rank with its 1-based position.
pub fn rank_board(board: &mut [LeaderboardEntry]) {
    board.sort_by(ranking_order);
    for (rank, entry) in (1u64..).zip(board.iter_mut()) {
        entry.rank = Some(rank);
    }
}

/// Replace any entry sharing the incoming address, then re-rank the whole board.
///
/// The previous entry is dropped entirely: fields missing from `entry` are not
/// carried over from it.
pub fn upsert_entry(
    board: &mut Vec<LeaderboardEntry>,
    entry: LeaderboardEntry,
    matching: AddressMatching,
) {
    board.retain(|existing| !matching.matches(&existing.address, &entry.address));
    board.push(entry);
    rank_board(board);
}
