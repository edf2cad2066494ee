use crate::core::document::{
    AddressMatching, PlayerStats, PrizePool, PrizePoolUpdate, LAST_UPDATED_FIELD,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which stats for `address` are (or will be) stored.
pub fn stats_key<'a>(
    stats: &'a BTreeMap<String, Value>,
    address: &'a str,
    matching: AddressMatching,
) -> &'a str {
    match matching {
        AddressMatching::Exact => address,
        AddressMatching::CaseInsensitive => stats
            .keys()
            .find(|key| matching.matches(key, address))
            .map(String::as_str)
            .unwrap_or(address),
    }
}

/// A record that is not a JSON object counts as absent.
pub fn find_player_stats<'a>(
    stats: &'a BTreeMap<String, Value>,
    address: &str,
    matching: AddressMatching,
) -> Option<&'a PlayerStats> {
    stats
        .get(stats_key(stats, address, matching))
        .and_then(Value::as_object)
}

/// Shallow merge: fields of `partial` overwrite, other existing fields survive.
pub fn merge_player_stats(
    existing: Option<&PlayerStats>,
    partial: PlayerStats,
    now_millis: i64,
) -> PlayerStats {
    let mut merged = existing.cloned().unwrap_or_default();
    merged.extend(partial);
    merged.insert(LAST_UPDATED_FIELD.to_string(), Value::from(now_millis));
    merged
}

pub fn upsert_player_stats(
    stats: &mut BTreeMap<String, Value>,
    address: &str,
    partial: PlayerStats,
    matching: AddressMatching,
    now_millis: i64,
) {
    let key = stats_key(stats, address, matching).to_string();
    let existing = stats.get(&key).and_then(Value::as_object);
    let merged = merge_player_stats(existing, partial, now_millis);
    stats.insert(key, Value::Object(merged));
}

pub fn apply_prize_pool_update(
    pool: &PrizePool,
    update: PrizePoolUpdate,
    now_millis: i64,
) -> PrizePool {
    PrizePool {
        total_amount: update.total_amount.unwrap_or(pool.total_amount),
        participants: update.participants.unwrap_or(pool.participants),
        last_updated: now_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> PlayerStats {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn merge_preserves_unrelated_fields() {
        let existing = record(json!({ "x": 1 }));
        let merged = merge_player_stats(Some(&existing), record(json!({ "y": 2 })), 1_000);
        assert_eq!(
            Value::Object(merged),
            json!({ "x": 1, "y": 2, "lastUpdated": 1_000 })
        );
    }

    #[test]
    fn merge_overwrites_same_named_fields() {
        let existing = record(json!({ "x": 1, "lastUpdated": 5 }));
        let merged = merge_player_stats(Some(&existing), record(json!({ "x": 3 })), 9);
        assert_eq!(merged["x"], json!(3));
        assert_eq!(merged["lastUpdated"], json!(9));
    }

    #[test]
    fn upsert_respects_address_matching() {
        let mut stats = BTreeMap::new();
        stats.insert("0xAA".to_string(), json!({ "x": 1 }));

        upsert_player_stats(
            &mut stats,
            "0xaa",
            record(json!({ "y": 2 })),
            AddressMatching::CaseInsensitive,
            7,
        );
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["0xAA"]["y"], json!(2));

        upsert_player_stats(
            &mut stats,
            "0xaa",
            record(json!({ "z": 3 })),
            AddressMatching::Exact,
            8,
        );
        assert_eq!(stats.len(), 2);
        assert!(stats["0xaa"].get("x").is_none());
    }

    #[test]
    fn non_object_record_is_absent_and_replaced_on_update() {
        let mut stats = BTreeMap::new();
        stats.insert("0xAA".to_string(), json!("corrupted"));
        assert_eq!(
            find_player_stats(&stats, "0xAA", AddressMatching::Exact),
            None
        );

        upsert_player_stats(
            &mut stats,
            "0xAA",
            record(json!({ "y": 2 })),
            AddressMatching::Exact,
            3,
        );
        assert_eq!(stats["0xAA"], json!({ "y": 2, "lastUpdated": 3 }));
    }

    #[test]
    fn prize_pool_keeps_omitted_fields() {
        let pool = PrizePool {
            total_amount: 10.0,
            participants: 4,
            last_updated: 1,
        };
        let updated = apply_prize_pool_update(
            &pool,
            PrizePoolUpdate {
                participants: Some(5),
                ..PrizePoolUpdate::default()
            },
            2,
        );
        assert_eq!(updated.total_amount, 10.0);
        assert_eq!(updated.participants, 5);
        assert_eq!(updated.last_updated, 2);
    }
}
