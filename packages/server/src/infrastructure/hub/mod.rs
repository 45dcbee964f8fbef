//! Hub: the connection registry, room membership and broadcast behind one lock.
//!
//! ## 責務
//!
//! - 接続 (ClientRecord) の登録・登録解除と配信ループの起動
//! - Room への join / leave
//! - Room メンバーへのブロードキャスト（満杯のキューには破棄で対応）
//!
//! ## ロックの方針
//!
//! The registry and membership maps share a single reader/writer lock.
//! Structural changes take it exclusively; broadcast only reads a snapshot of
//! the member set and releases the lock before enqueueing. Enqueueing never
//! blocks, and no transport write ever happens under the lock.

pub mod membership;
pub mod outbound;
pub mod registry;

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{ConnectionId, MessagePusher, RoomEvent, RoomKey, UserId},
    infrastructure::dto::websocket::OutboundEnvelope,
};

use membership::RoomMembership;
use outbound::{ConnectionWriter, EnqueueOutcome, Payload, spawn_delivery_loop};
use registry::{ConnectionRegistry, Registration};

pub use outbound::{DEFAULT_QUEUE_CAPACITY, TransportError};
pub use registry::ClientRecord;

/// Per-call result of a broadcast, for diagnostics only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Recipients whose queue accepted the payload.
    pub queued: usize,
    /// Recipients whose queue was full.
    pub dropped: usize,
    /// Recipients torn down between the snapshot and the enqueue.
    pub closed: usize,
}

impl BroadcastOutcome {
    pub fn recipients(&self) -> usize {
        self.queued + self.dropped + self.closed
    }
}

/// Point-in-time view of the Hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSnapshot {
    pub connections: usize,
    pub rooms: Vec<(RoomKey, usize)>,
}

#[derive(Debug, Default)]
struct HubState {
    registry: ConnectionRegistry,
    membership: RoomMembership,
}

impl HubState {
    /// Remove the record from every room, then from the registry, then close its queue.
    fn unregister(&mut self, connection_id: ConnectionId) -> Option<Arc<ClientRecord>> {
        let record = self.registry.lookup(connection_id)?;
        let rooms = self.membership.leave_all(connection_id);
        self.registry.remove(connection_id);
        record.close();
        tracing::debug!(
            "Client '{}' ({}) left {} room(s)",
            connection_id,
            record.user_id(),
            rooms.len()
        );
        Some(record)
    }
}

/// Shared, cloneable handle to the connection/room registry.
#[derive(Debug, Clone)]
pub struct Hub {
    state: Arc<RwLock<HubState>>,
    queue_capacity: usize,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl Hub {
    /// Create an empty Hub whose clients each get a queue of `queue_capacity`.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
            queue_capacity,
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Register a live connection and start its delivery loop.
    ///
    /// Idempotent: a handle that is already registered returns its existing
    /// record, `writer` is dropped and no second loop is started.
    /// `user_id` must come from a successful authentication.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        writer: Box<dyn ConnectionWriter>,
    ) -> Arc<ClientRecord> {
        let mut state = self.state.write().await;
        let registration = state
            .registry
            .register(connection_id, user_id, self.queue_capacity);
        match registration {
            Registration::Existing(record) => {
                tracing::debug!("Client '{}' is already registered", connection_id);
                record
            }
            Registration::Created(record, receiver) => {
                let hub = Arc::downgrade(&self.state);
                spawn_delivery_loop(connection_id, receiver, writer, move || {
                    teardown(hub, connection_id)
                });
                tracing::info!(
                    "Client '{}' registered as '{}' ({} connected)",
                    connection_id,
                    record.user_id(),
                    state.registry.len()
                );
                record
            }
        }
    }

    /// Tear down a connection. Unknown handles are ignored.
    ///
    /// When this returns the client is in no room, its queue is closed and
    /// nothing more is delivered to it.
    pub async fn unregister(&self, connection_id: ConnectionId) {
        let removed = self.state.write().await.unregister(connection_id);
        if let Some(record) = removed {
            tracing::info!(
                "Client '{}' ({}) unregistered",
                connection_id,
                record.user_id()
            );
        }
    }

    pub async fn lookup(&self, connection_id: ConnectionId) -> Option<Arc<ClientRecord>> {
        self.state.read().await.registry.lookup(connection_id)
    }

    /// Subscribe a registered connection to `room`.
    ///
    /// Returns `false` when the handle is not registered.
    pub async fn join(&self, connection_id: ConnectionId, room: RoomKey) -> bool {
        let mut state = self.state.write().await;
        let Some(record) = state.registry.lookup(connection_id) else {
            tracing::warn!("Join from unregistered client '{}' ignored", connection_id);
            return false;
        };
        if state.membership.join(&record, room.clone()) {
            tracing::debug!("Client '{}' joined room '{}'", connection_id, room);
        }
        true
    }

    /// Unsubscribe a connection from `room`. Idempotent.
    pub async fn leave(&self, connection_id: ConnectionId, room: &RoomKey) {
        if self
            .state
            .write()
            .await
            .membership
            .leave(connection_id, room)
        {
            tracing::debug!("Client '{}' left room '{}'", connection_id, room);
        }
    }

    /// Snapshot of the room's members at the time of the call.
    pub async fn members_of(&self, room: &RoomKey) -> Vec<Arc<ClientRecord>> {
        self.state.read().await.membership.members_of(room)
    }

    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomKey> {
        self.state.read().await.membership.rooms_of(connection_id)
    }

    /// Best-effort fan-out of `payload` to every current member of `room`.
    ///
    /// Unknown or empty rooms are a no-op. Each member gets one non-blocking
    /// enqueue attempt; a full queue drops the payload for that member only.
    pub async fn broadcast(&self, room: &RoomKey, payload: Payload) -> BroadcastOutcome {
        let members = self.members_of(room).await;

        let mut outcome = BroadcastOutcome::default();
        for member in &members {
            match member.try_enqueue(payload.clone()) {
                EnqueueOutcome::Queued => outcome.queued += 1,
                EnqueueOutcome::Dropped => {
                    tracing::debug!(
                        "Outbound queue of '{}' is full, dropping payload for room '{}'",
                        member.connection_id(),
                        room
                    );
                    outcome.dropped += 1;
                }
                EnqueueOutcome::Closed => outcome.closed += 1,
            }
        }
        outcome
    }

    /// Enqueue `payload` for a single connection, with the same drop-on-full policy.
    pub async fn push_to(&self, connection_id: ConnectionId, payload: Payload) -> EnqueueOutcome {
        match self.lookup(connection_id).await {
            Some(record) => record.try_enqueue(payload),
            None => EnqueueOutcome::Closed,
        }
    }

    pub async fn snapshot(&self) -> HubSnapshot {
        let state = self.state.read().await;
        HubSnapshot {
            connections: state.registry.len(),
            rooms: state.membership.room_sizes(),
        }
    }
}

async fn teardown(hub: Weak<RwLock<HubState>>, connection_id: ConnectionId) {
    if let Some(state) = hub.upgrade() {
        state.write().await.unregister(connection_id);
    }
}

#[async_trait]
impl MessagePusher for Hub {
    async fn publish(&self, event: RoomEvent) {
        let envelope = OutboundEnvelope::from(&event);
        let payload: Payload = match serde_json::to_string(&envelope) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!("Failed to serialize event for '{}': {}", event.room(), e);
                return;
            }
        };

        let outcome = self.broadcast(event.room(), payload).await;
        tracing::debug!(
            "Broadcast to '{}': {} queued, {} dropped, {} closed",
            event.room(),
            outcome.queued,
            outcome.dropped,
            outcome.closed
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use tokio::sync::{Notify, mpsc};

    use super::{
        outbound::testing::{ChannelWriter, FailingWriter, StalledWriter},
        *,
    };
    use crate::domain::{ChatMessage, MessageBody, Timestamp};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - Hub の登録・登録解除・join/leave・broadcast
    // - 満杯のキューを持つクライアントがいてもブロードキャストがブロックしないこと
    //
    // 【なぜこのテストが必要か】
    // - Hub は全接続タスクが共有する唯一の可変状態
    // - 1 つの遅いクライアントが送信者や他の受信者を止めてはならない
    //
    // 【どのようなシナリオをテストするか】
    // 1. 冪等な登録（配信ループが 2 つ起動しない）
    // 2. 登録解除後に Room から消えていること
    // 3. 満杯のクライアントを含む Room へのブロードキャスト
    // 4. 空の Room へのブロードキャスト
    // 5. 書き込み失敗時の自動登録解除
    // 6. 同一 Room への並行ブロードキャスト
    // ========================================

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn room(key: &str) -> RoomKey {
        RoomKey::new(key.to_string()).unwrap()
    }

    fn payload(s: &str) -> Payload {
        Arc::from(s)
    }

    async fn connect(hub: &Hub, id: &str) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionId::next();
        let (writer, rx) = ChannelWriter::new();
        hub.register(connection_id, user(id), Box::new(writer)).await;
        (connection_id, rx)
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_register_twice_does_not_start_second_loop() {
        // テスト項目: 同じハンドルの二重登録は同じレコードを返し、2 つ目の配信ループを起動しない
        // given (前提条件):
        let hub = Hub::new(8);
        let connection_id = ConnectionId::next();
        let (first_writer, mut first_rx) = ChannelWriter::new();
        let (second_writer, mut second_rx) = ChannelWriter::new();

        // when (操作):
        let first = hub
            .register(connection_id, user("alice"), Box::new(first_writer))
            .await;
        let second = hub
            .register(connection_id, user("alice"), Box::new(second_writer))
            .await;
        hub.join(connection_id, room("alice:bob")).await;
        hub.broadcast(&room("alice:bob"), payload("hello")).await;

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(recv(&mut first_rx).await, Some("hello".to_string()));
        // the second writer was dropped without ever being driven
        assert_eq!(second_rx.recv().await, None);
        assert_eq!(hub.snapshot().await.connections, 1);
    }

    #[tokio::test]
    async fn test_unregister_removes_client_from_all_rooms() {
        // テスト項目: 登録解除後は lookup できず、どの Room にも属さない
        // given (前提条件):
        let hub = Hub::new(8);
        let (alice, _alice_rx) = connect(&hub, "alice").await;
        let (bob, _bob_rx) = connect(&hub, "bob").await;
        hub.join(alice, room("alice:bob")).await;
        hub.join(bob, room("alice:bob")).await;
        hub.join(alice, room("group:g1")).await;
        let record = hub.lookup(alice).await.unwrap();

        // when (操作):
        hub.unregister(alice).await;

        // then (期待する結果):
        assert!(hub.lookup(alice).await.is_none());
        assert!(hub.rooms_of(alice).await.is_empty());
        assert!(record.is_closed());
        assert_eq!(record.try_enqueue(payload("late")), EnqueueOutcome::Closed);
        assert_eq!(
            hub.snapshot().await,
            HubSnapshot {
                connections: 1,
                rooms: vec![(room("alice:bob"), 1)],
            }
        );
    }

    #[tokio::test]
    async fn test_unregister_unknown_handle_is_noop() {
        // テスト項目: 未登録ハンドルの登録解除、二重の登録解除はどちらも何もしない
        // given (前提条件):
        let hub = Hub::new(8);
        let (alice, _rx) = connect(&hub, "alice").await;

        // when (操作):
        hub.unregister(ConnectionId::next()).await;
        hub.unregister(alice).await;
        hub.unregister(alice).await;

        // then (期待する結果):
        assert_eq!(hub.snapshot().await.connections, 0);
    }

    #[tokio::test]
    async fn test_join_unregistered_connection_is_rejected() {
        // テスト項目: 未登録の接続は Room に参加できない
        // given (前提条件):
        let hub = Hub::new(8);

        // when (操作):
        let joined = hub.join(ConnectionId::next(), room("group:g1")).await;

        // then (期待する結果):
        assert!(!joined);
        assert!(hub.snapshot().await.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_skips_full_queue_without_blocking() {
        // テスト項目: 3 人中 1 人のキューが満杯でも、残り 2 人には届き、呼び出しはブロックしない
        // given (前提条件):
        let hub = Hub::new(1);
        let key = room("group:g1");
        let (alice, mut alice_rx) = connect(&hub, "alice").await;
        let (bob, mut bob_rx) = connect(&hub, "bob").await;

        let carol = ConnectionId::next();
        let entered = Arc::new(Notify::new());
        let stalled = StalledWriter {
            entered: entered.clone(),
        };
        hub.register(carol, user("carol"), Box::new(stalled)).await;

        // carol の配信ループを書き込み中で止め、キュー (容量 1) を埋める
        hub.join(carol, room("group:carol-only")).await;
        hub.broadcast(&room("group:carol-only"), payload("stuck"))
            .await;
        entered.notified().await;
        let filler = hub
            .broadcast(&room("group:carol-only"), payload("filler"))
            .await;
        assert_eq!(filler.queued, 1);

        for id in [alice, bob, carol] {
            hub.join(id, key.clone()).await;
        }

        // when (操作):
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            hub.broadcast(&key, payload("hi")),
        )
        .await
        .expect("broadcast must not block on a stalled client");

        // then (期待する結果):
        assert_eq!(
            outcome,
            BroadcastOutcome {
                queued: 2,
                dropped: 1,
                closed: 0
            }
        );
        assert_eq!(recv(&mut alice_rx).await, Some("hi".to_string()));
        assert_eq!(recv(&mut bob_rx).await, Some("hi".to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room_is_noop() {
        // テスト項目: メンバーのいない Room へのブロードキャストはエラーなく何もしない
        // given (前提条件):
        let hub = Hub::new(8);
        let (_alice, mut alice_rx) = connect(&hub, "alice").await;

        // when (操作):
        let outcome = hub.broadcast(&room("alice:bob"), payload("hi")).await;

        // then (期待する結果):
        assert_eq!(outcome, BroadcastOutcome::default());
        assert!(
            tokio::time::timeout(Duration::from_millis(50), alice_rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_write_failure_unregisters_client() {
        // テスト項目: 書き込みに失敗したクライアントは自動的に登録解除され、接続が閉じられる
        // given (前提条件):
        let hub = Hub::new(8);
        let connection_id = ConnectionId::next();
        let closed = Arc::new(AtomicBool::new(false));
        let record = hub
            .register(
                connection_id,
                user("alice"),
                Box::new(FailingWriter {
                    closed: closed.clone(),
                }),
            )
            .await;
        hub.join(connection_id, room("group:g1")).await;

        // when (操作):
        hub.broadcast(&room("group:g1"), payload("boom")).await;

        // then (期待する結果):
        tokio::time::timeout(Duration::from_secs(1), record.closed())
            .await
            .expect("client should be torn down after a write failure");
        assert!(hub.lookup(connection_id).await.is_none());
        assert!(hub.snapshot().await.rooms.is_empty());
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_push_to_single_connection() {
        // テスト項目: push_to は指定した接続にだけ届く
        // given (前提条件):
        let hub = Hub::new(8);
        let (alice, mut alice_rx) = connect(&hub, "alice").await;
        let (_bob, mut bob_rx) = connect(&hub, "bob").await;

        // when (操作):
        let outcome = hub.push_to(alice, payload("echo")).await;
        let unknown = hub.push_to(ConnectionId::next(), payload("echo")).await;

        // then (期待する結果):
        assert_eq!(outcome, EnqueueOutcome::Queued);
        assert_eq!(unknown, EnqueueOutcome::Closed);
        assert_eq!(recv(&mut alice_rx).await, Some("echo".to_string()));
        assert!(
            tokio::time::timeout(Duration::from_millis(50), bob_rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_broadcasts_keep_invariants() {
        // テスト項目: 50 人の Room への 100 並行ブロードキャストで構造が壊れず、
        //             各呼び出しは各メンバーへちょうど 1 回だけ enqueue を試みる
        // given (前提条件):
        let hub = Hub::new(DEFAULT_QUEUE_CAPACITY);
        let key = room("group:busy");
        let mut receivers = Vec::new();
        for i in 0..50 {
            let (id, rx) = connect(&hub, &format!("user{i}")).await;
            hub.join(id, key.clone()).await;
            receivers.push(rx);
        }

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..100 {
            let hub = hub.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                hub.broadcast(&key, Arc::from(format!("m{i}"))).await
            }));
        }
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        // then (期待する結果):
        for outcome in &outcomes {
            assert_eq!(outcome.recipients(), 50);
            assert_eq!(outcome.closed, 0);
        }
        let total_queued: usize = outcomes.iter().map(|o| o.queued).sum();
        assert!(total_queued > 0);

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.connections, 50);
        assert_eq!(snapshot.rooms, vec![(key.clone(), 50)]);

        for rx in &mut receivers {
            let mut seen = std::collections::HashSet::new();
            while let Ok(Some(msg)) =
                tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
            {
                assert!(seen.insert(msg), "a payload was delivered twice");
            }
            assert!(seen.len() <= 100);
        }
    }

    #[tokio::test]
    async fn test_publish_serializes_message_new_envelope() {
        // テスト項目: publish は message:new エンベロープを JSON で配信する
        // given (前提条件):
        let hub = Hub::new(8);
        let (alice, mut alice_rx) = connect(&hub, "alice").await;
        let key = RoomKey::direct(&user("alice"), &user("bob"));
        hub.join(alice, key.clone()).await;
        let message = ChatMessage::new(
            key.clone(),
            user("alice"),
            MessageBody::new("hi".to_string()).unwrap(),
            Timestamp::new(1672531200000),
        );

        // when (操作):
        hub.publish(RoomEvent::MessageNew {
            room: key,
            message: message.clone(),
        })
        .await;

        // then (期待する結果):
        let json: serde_json::Value =
            serde_json::from_str(&recv(&mut alice_rx).await.unwrap()).unwrap();
        assert_eq!(json["type"], "message:new");
        assert_eq!(json["room"], "alice:bob");
        assert_eq!(json["message"]["id"], message.id.as_str());
        assert_eq!(json["message"]["sender"], "alice");
        assert_eq!(json["message"]["body"], "hi");
        assert_eq!(json["message"]["createdAt"], "2023-01-01T00:00:00.000Z");
    }
}
