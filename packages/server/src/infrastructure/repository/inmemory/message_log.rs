//! InMemory MessageLog 実装
//!
//! ドメイン層が定義する MessageLog trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。プロセスが終了するとログは失われます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ChatMessage, MessageLog, RepositoryError, RoomKey};

/// インメモリ MessageLog 実装
#[derive(Debug, Default)]
pub struct InMemoryMessageLog {
    /// Room ごとのメッセージ（追記順）
    messages: RwLock<HashMap<RoomKey, Vec<ChatMessage>>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, room: &RoomKey, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        messages
            .entry(room.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn history(&self, room: &RoomKey) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(room).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageBody, Timestamp, UserId};

    fn message(room: &RoomKey, body: &str, at: i64) -> ChatMessage {
        ChatMessage::new(
            room.clone(),
            UserId::new("alice".to_string()).unwrap(),
            MessageBody::new(body.to_string()).unwrap(),
            Timestamp::new(at),
        )
    }

    #[tokio::test]
    async fn test_append_then_history_preserves_order() {
        // テスト項目: 追記したメッセージが追記順で履歴に返される
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        let room = RoomKey::new("alice:bob".to_string()).unwrap();
        let first = message(&room, "first", 1000);
        let second = message(&room, "second", 2000);

        // when (操作):
        log.append(&room, &first).await.unwrap();
        log.append(&room, &second).await.unwrap();
        let history = log.history(&room).await.unwrap();

        // then (期待する結果):
        assert_eq!(history, vec![first, second]);
    }

    #[tokio::test]
    async fn test_history_is_isolated_per_room() {
        // テスト項目: 別の Room のメッセージは履歴に含まれない
        // given (前提条件):
        let log = InMemoryMessageLog::new();
        let direct = RoomKey::new("alice:bob".to_string()).unwrap();
        let group = RoomKey::new("group:g1".to_string()).unwrap();
        log.append(&direct, &message(&direct, "dm", 1000))
            .await
            .unwrap();

        // when (操作):
        let history = log.history(&group).await.unwrap();

        // then (期待する結果):
        assert!(history.is_empty());
    }
}
