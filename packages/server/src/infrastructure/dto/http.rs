//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/chats/{friend_id}/messages` and `POST /api/groups/{group_id}/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub body: String,
}

/// Query of `GET /api/chats/{friend_id}/messages`; accepts `user_id` or `userId`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSizeDto {
    pub room: String,
    pub members: usize,
}

/// Body of `GET /debug/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSnapshotDto {
    pub connections: usize,
    pub rooms: Vec<RoomSizeDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query_accepts_camel_case_user_id() {
        // テスト項目: userId と user_id のどちらのクエリ名でも読み取れる
        // given (前提条件):
        let camel = serde_json::json!({"userId": "alice"});
        let snake = serde_json::json!({"user_id": "bob"});

        // when (操作):
        let camel: HistoryQuery = serde_json::from_value(camel).unwrap();
        let snake: HistoryQuery = serde_json::from_value(snake).unwrap();

        // then (期待する結果):
        assert_eq!(camel.user_id.as_deref(), Some("alice"));
        assert_eq!(snake.user_id.as_deref(), Some("bob"));
    }
}
