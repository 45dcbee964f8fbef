//! MessagePusher trait 定義
//!
//! Room のメンバーへイベントを届けるためのインターフェース。
//! UseCase 層はこの trait に依存し、Hub の具体的な実装には依存しない。

use async_trait::async_trait;

use super::RoomEvent;

/// Best-effort fan-out of room events.
///
/// Delivery never fails from the caller's point of view: unknown rooms,
/// empty rooms and full recipient queues are all silently tolerated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Fan the event out to every current member of its room.
    async fn publish(&self, event: RoomEvent);
}
