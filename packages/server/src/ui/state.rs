//! Server state shared by all connection tasks and HTTP handlers.

use std::sync::Arc;

use crate::{
    domain::Authenticator,
    infrastructure::hub::Hub,
    usecase::{GetRoomHistoryUseCase, SendMessageUseCase},
};

/// Shared application state
pub struct AppState {
    /// Hub（接続・Room・ブロードキャストの管理）
    pub hub: Hub,
    /// Authenticator（接続時の認証）
    pub authenticator: Arc<dyn Authenticator>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetRoomHistoryUseCase（履歴取得のユースケース）
    pub get_room_history_usecase: Arc<GetRoomHistoryUseCase>,
}
