use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Open-ended per-player statistics record, always carrying `lastUpdated`.
pub type PlayerStats = Map<String, Value>;

pub const LAST_UPDATED_FIELD: &str = "lastUpdated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Free,
    Paid,
}

/// How two player addresses are compared when looking for an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddressMatching {
    CaseInsensitive,
    Exact,
}

impl AddressMatching {
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            AddressMatching::Exact => a == b,
            AddressMatching::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// Leaderboard entries are matched ignoring case while player stats are keyed
/// by the exact address string. Both are kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPolicy {
    pub leaderboard: AddressMatching,
    pub player_stats: AddressMatching,
}

impl Default for AddressPolicy {
    fn default() -> Self {
        AddressPolicy {
            leaderboard: AddressMatching::CaseInsensitive,
            player_stats: AddressMatching::Exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub trigger_pulls: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub max_streak: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<i64>,
    // Fields written by other clients, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LeaderboardEntry {
    pub fn new(address: &str, max_streak: u64, trigger_pulls: u64, deaths: u64) -> Self {
        LeaderboardEntry {
            address: address.to_string(),
            username: None,
            trigger_pulls,
            deaths,
            max_streak,
            rank: None,
            is_paid: None,
            last_played: None,
            extra: Map::new(),
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboards {
    #[serde(default)]
    pub free: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub paid: Vec<LeaderboardEntry>,
}

impl Leaderboards {
    pub fn board(&self, mode: Mode) -> &Vec<LeaderboardEntry> {
        match mode {
            Mode::Free => &self.free,
            Mode::Paid => &self.paid,
        }
    }

    pub fn board_mut(&mut self, mode: Mode) -> &mut Vec<LeaderboardEntry> {
        match mode {
            Mode::Free => &mut self.free,
            Mode::Paid => &mut self.paid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizePool {
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub participants: u64,
    #[serde(default)]
    pub last_updated: i64,
}

/// Partial prize pool change, omitted fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizePoolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<u64>,
}

/// The single unit cached in memory and persisted to the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub leaderboard: Leaderboards,
    #[serde(default)]
    pub prize_pool: PrizePool,
    /// Address => stats record. Records are normally objects, but any JSON
    /// value stored by another writer is accepted.
    #[serde(default)]
    pub player_stats: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Empty document as created at process start.
    pub fn empty(now_millis: i64) -> Self {
        Document {
            prize_pool: PrizePool {
                last_updated: now_millis,
                ..PrizePool::default()
            },
            ..Document::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_persisted_document() {
        let raw = json!({
            "leaderboard": {
                "free": [
                    { "address": "0xAA", "username": "bob", "triggerPulls": 3, "deaths": 1, "maxStreak": 5, "rank": 1 }
                ],
                "paid": []
            },
            "prizePool": { "totalAmount": 12.5, "participants": 4, "lastUpdated": 1700000000000i64 },
            "playerStats": { "0xAA": { "gamesPlayed": 9, "lastUpdated": 1700000000000i64 } }
        });

        let document: Document = serde_json::from_value(raw).unwrap();
        let entry = &document.leaderboard.board(Mode::Free)[0];
        assert_eq!(entry.username.as_deref(), Some("bob"));
        assert_eq!(entry.max_streak, 5);
        assert_eq!(entry.rank, Some(1));
        assert_eq!(document.prize_pool.total_amount, 12.5);
        assert_eq!(document.player_stats["0xAA"]["gamesPlayed"], json!(9));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let document: Document = serde_json::from_value(json!({ "prizePool": {} })).unwrap();
        assert!(document.leaderboard.free.is_empty());
        assert!(document.leaderboard.paid.is_empty());
        assert!(document.player_stats.is_empty());
    }

    #[test]
    fn absent_optional_fields_are_not_serialized() {
        let value = serde_json::to_value(LeaderboardEntry::new("0xAA", 7, 3, 1)).unwrap();
        let fields = value.as_object().unwrap();
        assert!(!fields.contains_key("username"));
        assert!(!fields.contains_key("rank"));
        assert_eq!(value["maxStreak"], json!(7));
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "leaderboard": {
                "free": [{ "address": "0xAA", "maxStreak": 2, "avatar": "skull.png" }],
                "paid": []
            },
            "prizePool": { "totalAmount": 0.0, "participants": 0, "lastUpdated": 0 },
            "playerStats": { "0xAA": null, "0xBB": 3 },
            "season": 4
        });

        let document: Document = serde_json::from_value(raw).unwrap();
        assert_eq!(document.extra["season"], json!(4));
        assert_eq!(document.leaderboard.free[0].extra["avatar"], json!("skull.png"));
        assert_eq!(document.player_stats["0xBB"], json!(3));

        let written = serde_json::to_value(&document).unwrap();
        assert_eq!(written["season"], json!(4));
        assert_eq!(written["leaderboard"]["free"][0]["avatar"], json!("skull.png"));
        assert_eq!(written["playerStats"]["0xAA"], Value::Null);
    }

    #[test]
    fn mode_parses_from_lowercase() {
        assert_eq!("paid".parse::<Mode>().unwrap(), Mode::Paid);
        assert_eq!(Mode::Free.to_string(), "free");
        assert!("ranked".parse::<Mode>().is_err());
    }

    #[test]
    fn address_matching() {
        assert!(AddressMatching::CaseInsensitive.matches("0xAbC", "0xabc"));
        assert!(!AddressMatching::Exact.matches("0xAbC", "0xabc"));
        assert!(AddressMatching::Exact.matches("0xabc", "0xabc"));
    }
}
