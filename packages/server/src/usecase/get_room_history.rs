//! UseCase: Room のメッセージ履歴の取得

use std::sync::Arc;

use crate::domain::{ChatMessage, MessageLog, RoomKey};

use super::error::GetRoomHistoryError;

/// Room 履歴取得のユースケース
pub struct GetRoomHistoryUseCase {
    /// MessageLog（永続化されたログの抽象化）
    message_log: Arc<dyn MessageLog>,
}

impl GetRoomHistoryUseCase {
    pub fn new(message_log: Arc<dyn MessageLog>) -> Self {
        Self { message_log }
    }

    /// Room のメッセージを追記順で返す
    pub async fn execute(&self, room: &RoomKey) -> Result<Vec<ChatMessage>, GetRoomHistoryError> {
        Ok(self.message_log.history(room).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RepositoryError, repository::MockMessageLog};

    #[tokio::test]
    async fn test_repository_failure_is_surfaced() {
        // テスト項目: ログの読み出しに失敗した場合はエラーが返される
        // given (前提条件):
        let mut message_log = MockMessageLog::new();
        message_log
            .expect_history()
            .returning(|_| Err(RepositoryError::Unavailable("disk gone".to_string())));
        let usecase = GetRoomHistoryUseCase::new(Arc::new(message_log));
        let room = RoomKey::new("alice:bob".to_string()).unwrap();

        // when (操作):
        let result = usecase.execute(&room).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(GetRoomHistoryError::Repository(RepositoryError::Unavailable(
                "disk gone".to_string()
            )))
        );
    }
}
