use crate::aggregate;
use crate::errors::StoreError;
use crate::kv::KeyValueStore;
use crate::models::{Item, ItemCount, LogEntry};
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{error, info, warn};

pub const ITEMS_KEY: &str = "habit-items";
pub const LOGS_KEY: &str = "habit-logs";

/// Owns the item list and the append-only log, writing both through to `K`
/// after every mutation.
#[derive(Debug)]
pub struct Store<K> {
    kv: K,
    items: Vec<Item>,
    logs: Vec<LogEntry>,
}

impl<K: KeyValueStore> Store<K> {
    /// Builds a store over `kv` and loads whatever it already holds.
    pub fn open(kv: K) -> Self {
        let mut store = Self {
            kv,
            items: Vec::new(),
            logs: Vec::new(),
        };
        store.load();
        store
    }

    /// Replaces both collections with the persisted ones. Never fails:
    /// unreadable or malformed data comes back as empty collections.
    pub fn load(&mut self) {
        let mut seen = HashSet::new();
        self.items = decode_records::<Item>(self.read_blob(ITEMS_KEY), ITEMS_KEY)
            .into_iter()
            .filter(|item| {
                if item.name.trim().is_empty() {
                    warn!("dropping stored item {} with blank name", item.id);
                    return false;
                }
                if !seen.insert(item.id.clone()) {
                    warn!("dropping stored item with duplicate id {}", item.id);
                    return false;
                }
                true
            })
            .collect();
        self.logs = decode_records(self.read_blob(LOGS_KEY), LOGS_KEY);

        info!(
            "loaded {} items and {} log entries",
            self.items.len(),
            self.logs.len()
        );
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        let items = serde_json::to_string(&self.items).map_err(|source| StoreError::Serialize {
            key: ITEMS_KEY,
            source,
        })?;
        let logs = serde_json::to_string(&self.logs).map_err(|source| StoreError::Serialize {
            key: LOGS_KEY,
            source,
        })?;

        self.kv.set(ITEMS_KEY, &items)?;
        self.kv.set(LOGS_KEY, &logs)?;
        Ok(())
    }

    pub fn add_item(&mut self, name: &str, color: &str) -> Result<Option<Item>, StoreError> {
        self.add_item_at(name, color, Utc::now().timestamp_millis())
    }

    /// Creates an item stamped `now_ms`. A blank name is a no-op.
    pub fn add_item_at(
        &mut self,
        name: &str,
        color: &str,
        now_ms: i64,
    ) -> Result<Option<Item>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let item = Item {
            id: self.next_item_id(now_ms),
            name: name.to_string(),
            color: color.to_string(),
            created_at: now_ms,
        };
        self.items.push(item.clone());
        self.save()?;

        info!("created item {} ({})", item.id, item.name);
        Ok(Some(item))
    }

    pub fn add_log(&mut self, item_id: &str) -> Result<LogEntry, StoreError> {
        self.add_log_at(item_id, Utc::now().timestamp_millis())
    }

    /// Appends a log entry. `item_id` is not checked against the item list.
    pub fn add_log_at(&mut self, item_id: &str, now_ms: i64) -> Result<LogEntry, StoreError> {
        let entry = LogEntry {
            item_id: item_id.to_string(),
            timestamp: now_ms,
        };
        self.logs.push(entry.clone());
        self.save()?;
        Ok(entry)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    #[cfg(test)]
    pub(crate) fn kv(&self) -> &K {
        &self.kv
    }

    pub fn count_today<Tz: TimeZone>(&self, item_id: &str, now: &DateTime<Tz>) -> u64 {
        aggregate::count_today(&self.logs, item_id, now)
    }

    pub fn today_counts<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<ItemCount> {
        aggregate::today_counts(&self.items, &self.logs, now)
    }

    fn read_blob(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(err) => {
                error!("failed to read {key}: {err}");
                None
            }
        }
    }

    // Ids are the creation millisecond; bump past any collision.
    fn next_item_id(&self, now_ms: i64) -> String {
        let mut candidate = now_ms;
        loop {
            let id = candidate.to_string();
            if self.item(&id).is_none() {
                return id;
            }
            candidate += 1;
        }
    }
}

fn decode_records<T: DeserializeOwned>(raw: Option<String>, key: &str) -> Vec<T> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let values = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(values)) => values,
        Ok(_) => {
            error!("stored {key} is not a JSON array, starting empty");
            return Vec::new();
        }
        Err(err) => {
            error!("failed to parse stored {key}: {err}");
            return Vec::new();
        }
    };

    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("dropping malformed record in {key}: {err}");
                None
            }
        })
        .collect();

    if records.len() != total {
        warn!("kept {} of {total} records from {key}", records.len());
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use chrono::FixedOffset;

    const RED: &str = "linear-gradient(135deg, #FF6B6B, #EE5253)";

    fn tokyo_ms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        tokyo(y, m, d, h, min, s).timestamp_millis()
    }

    fn tokyo(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
    }

    fn seeded(items: &str, logs: &str) -> MemoryKvStore {
        let mut kv = MemoryKvStore::new();
        kv.set(ITEMS_KEY, items).unwrap();
        kv.set(LOGS_KEY, logs).unwrap();
        kv
    }

    #[derive(Debug, Default)]
    struct ReadOnlyKv;

    impl KeyValueStore for ReadOnlyKv {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.to_string(),
                source: std::io::Error::other("quota exceeded"),
            })
        }
    }

    #[test]
    fn blank_name_is_a_no_op() {
        let mut store = Store::open(MemoryKvStore::new());
        let water = store.add_item_at("Water", RED, 1_000).unwrap();
        let blank = store.add_item_at("", "#fff", 2_000).unwrap();
        let spaces = store.add_item_at("   ", "#fff", 3_000).unwrap();

        assert!(water.is_some());
        assert!(blank.is_none());
        assert!(spaces.is_none());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].name, "Water");
    }

    #[test]
    fn item_id_and_created_at_come_from_the_clock() {
        let mut store = Store::open(MemoryKvStore::new());
        let item = store
            .add_item_at("  Read  ", RED, 1_714_600_000_123)
            .unwrap()
            .unwrap();

        assert_eq!(item.id, "1714600000123");
        assert_eq!(item.created_at, 1_714_600_000_123);
        assert_eq!(item.name, "Read");
        assert_eq!(item.color, RED);
    }

    #[test]
    fn items_created_in_the_same_millisecond_get_distinct_ids() {
        let mut store = Store::open(MemoryKvStore::new());
        let first = store.add_item_at("Water", RED, 500).unwrap().unwrap();
        let second = store.add_item_at("Walk", RED, 500).unwrap().unwrap();
        let third = store.add_item_at("Read", RED, 501).unwrap().unwrap();

        assert_eq!(first.id, "500");
        assert_eq!(second.id, "501");
        assert_eq!(third.id, "502");
        assert_eq!(second.created_at, 500);
    }

    #[test]
    fn mutations_write_through() {
        let mut store = Store::open(MemoryKvStore::new());
        let item = store.add_item_at("Water", RED, 10).unwrap().unwrap();
        store.add_log_at(&item.id, 20).unwrap();

        let items = store.kv().get(ITEMS_KEY).unwrap().unwrap();
        let logs = store.kv().get(LOGS_KEY).unwrap().unwrap();
        assert_eq!(
            items,
            format!(r#"[{{"id":"10","name":"Water","color":"{RED}","createdAt":10}}]"#)
        );
        assert_eq!(logs, r#"[{"itemId":"10","timestamp":20}]"#);
    }

    #[test]
    fn reopening_restores_both_collections_in_order() {
        let mut store = Store::open(MemoryKvStore::new());
        store.add_item_at("Water", RED, 10).unwrap();
        store.add_item_at("Walk", "#0f0", 11).unwrap();
        store.add_log_at("11", 30).unwrap();
        store.add_log_at("10", 20).unwrap();

        let reopened = Store::open(store.kv().clone());
        assert_eq!(reopened.items(), store.items());
        assert_eq!(reopened.logs(), store.logs());
    }

    #[test]
    fn load_twice_is_stable() {
        let mut store = Store::open(seeded(
            r#"[{"id":"1","name":"Water","color":"c","createdAt":1}]"#,
            r#"[{"itemId":"1","timestamp":5}]"#,
        ));
        let items = store.items().to_vec();
        let logs = store.logs().to_vec();

        store.load();
        assert_eq!(store.items(), items.as_slice());
        assert_eq!(store.logs(), logs.as_slice());
    }

    #[test]
    fn malformed_blobs_load_empty() {
        let store = Store::open(seeded("{not json", r#"{"itemId":"1"}"#));
        assert!(store.items().is_empty());
        assert!(store.logs().is_empty());
    }

    #[test]
    fn invalid_records_are_dropped_individually() {
        let store = Store::open(seeded(
            r#"[
                {"id":"1","name":"Water","color":"c","createdAt":1},
                {"id":"2","name":"Walk","color":"c"},
                {"id":"3","name":"  ","color":"c","createdAt":3},
                {"id":"1","name":"Copy","color":"c","createdAt":4},
                {"id":4,"name":"Numeric","color":"c","createdAt":4},
                {"id":"5","name":"Read","color":"c","createdAt":5,"extra":true}
            ]"#,
            r#"[
                {"itemId":"1","timestamp":10},
                {"itemId":"1"},
                "garbage",
                {"itemId":"5","timestamp":"soon"},
                {"itemId":"5","timestamp":11}
            ]"#,
        ));

        let ids: Vec<&str> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(store.items()[0].name, "Water");
        assert_eq!(
            store.logs(),
            &[
                LogEntry {
                    item_id: "1".into(),
                    timestamp: 10
                },
                LogEntry {
                    item_id: "5".into(),
                    timestamp: 11
                },
            ]
        );
    }

    #[test]
    fn write_failure_propagates() {
        let mut store = Store::open(ReadOnlyKv);
        let err = store.add_item_at("Water", RED, 1).unwrap_err();
        assert!(matches!(err, StoreError::Write { ref key, .. } if key == ITEMS_KEY));
        assert!(store.add_log_at("1", 2).is_err());
    }

    #[test]
    fn log_just_before_midnight_is_not_counted_next_day() {
        let mut store = Store::open(MemoryKvStore::new());
        store
            .add_log_at("id1", tokyo_ms(2024, 5, 1, 23, 59, 59) + 999)
            .unwrap();

        assert_eq!(store.count_today("id1", &tokyo(2024, 5, 2, 0, 0, 0)), 0);
    }

    #[test]
    fn three_logs_same_day_count_three() {
        let mut store = Store::open(MemoryKvStore::new());
        store.add_log_at("id1", tokyo_ms(2024, 5, 2, 8, 0, 0)).unwrap();
        store.add_log_at("id1", tokyo_ms(2024, 5, 2, 12, 0, 0)).unwrap();
        store.add_log_at("id1", tokyo_ms(2024, 5, 2, 18, 0, 0)).unwrap();

        assert_eq!(store.count_today("id1", &tokyo(2024, 5, 2, 20, 0, 0)), 3);
    }

    #[test]
    fn logs_for_unknown_items_are_still_counted() {
        let mut store = Store::open(MemoryKvStore::new());
        let now = tokyo(2024, 5, 2, 9, 0, 0);
        store.add_log_at("ghost-id", now.timestamp_millis()).unwrap();

        assert!(store.item("ghost-id").is_none());
        assert_eq!(store.count_today("ghost-id", &now), 1);
        assert!(store.today_counts(&now).is_empty());
    }
}
