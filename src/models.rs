use serde::{Deserialize, Serialize};

/// A user-defined habit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: i64,
}

/// One tracked occurrence of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub item_id: String,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCount {
    pub id: String,
    pub name: String,
    pub color: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: String,
    pub items: Vec<ItemCount>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub item_id: String,
    pub date: String,
    pub count: u64,
}
