//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - メッセージの生成、ログへの追記、Room へのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - WebSocket と REST の両方の入口がこのユースケースを通る
//! - ログへの追記とブロードキャストは独立したベストエフォート処理であることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：追記とブロードキャストが 1 回ずつ行われる
//! - 異常系：ログへの追記が失敗してもブロードキャストは行われる

use std::sync::Arc;

use tsudoi_shared::time::{Clock, SystemClock};

use crate::domain::{
    ChatMessage, MessageBody, MessageLog, MessagePusher, RoomEvent, RoomKey, Timestamp, UserId,
};

/// メッセージ送信のユースケース (`sendMessageToRoom`)
pub struct SendMessageUseCase {
    /// MessageLog（永続化されたログの抽象化）
    message_log: Arc<dyn MessageLog>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(message_log: Arc<dyn MessageLog>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self::with_clock(message_log, message_pusher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        message_log: Arc<dyn MessageLog>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            message_log,
            message_pusher,
            clock,
        }
    }

    /// メッセージを生成し、ログに追記してから Room にブロードキャストする
    ///
    /// # Arguments
    ///
    /// * `room` - 送信先の Room
    /// * `sender` - 送信者（WebSocket の場合は認証済みユーザー）
    /// * `body` - メッセージ本文
    ///
    /// # Returns
    ///
    /// 生成された `ChatMessage`。ログへの追記の失敗は記録されるだけで、
    /// 呼び出し元にもブロードキャストにも影響しない。
    pub async fn execute(&self, room: RoomKey, sender: UserId, body: MessageBody) -> ChatMessage {
        let created_at = Timestamp::new(self.clock.now_millis());
        let message = ChatMessage::new(room.clone(), sender, body, created_at);

        // 1. ログに追記（失敗しても配信は続ける）
        if let Err(e) = self.message_log.append(&room, &message).await {
            tracing::warn!(
                "Failed to persist message '{}' in room '{}': {}",
                message.id.as_str(),
                room,
                e
            );
        }

        // 2. Room のメンバーへブロードキャスト
        tracing::debug!(
            "Broadcasting message '{}' from '{}' to room '{}'",
            message.id.as_str(),
            message.sender,
            room
        );
        self.message_pusher
            .publish(RoomEvent::MessageNew {
                room,
                message: message.clone(),
            })
            .await;

        message
    }
}
