/// Detection events are keyed by the backend's integer primary key.
pub type EventId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Product name to detected-count map, ordered for stable display.
pub type ProductCounts = std::collections::BTreeMap<String, u64>;
