//! Repository trait 定義
//!
//! 永続化されたメッセージログへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ログは配信の調整には使われません。永続化と履歴の再生のためだけに参照されます。

use async_trait::async_trait;

use super::{ChatMessage, RepositoryError, RoomKey};

/// Append-only message log keyed by room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// メッセージを Room のログに追記
    async fn append(&self, room: &RoomKey, message: &ChatMessage) -> Result<(), RepositoryError>;

    /// Room のメッセージ履歴を追記順で取得
    async fn history(&self, room: &RoomKey) -> Result<Vec<ChatMessage>, RepositoryError>;
}
