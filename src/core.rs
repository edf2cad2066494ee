pub mod document;
pub mod leaderboard;
pub mod stats;
