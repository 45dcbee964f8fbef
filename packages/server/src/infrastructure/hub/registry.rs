//! Connection registry: one [`ClientRecord`] per live connection.

use std::{collections::HashMap, future::Future, sync::Arc};

use crate::domain::{ConnectionId, UserId};

use super::outbound::{EnqueueOutcome, OutboundQueue, OutboundReceiver, Payload};

/// The Hub's view of one live connection.
///
/// The user ID is fixed at registration. The connection handle is borrowed:
/// the Hub never creates or destroys the transport behind it.
#[derive(Debug)]
pub struct ClientRecord {
    connection_id: ConnectionId,
    user_id: UserId,
    outbound: OutboundQueue,
}

impl ClientRecord {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Non-blocking, drop-on-full enqueue onto this client's outbound queue.
    pub fn try_enqueue(&self, payload: Payload) -> EnqueueOutcome {
        self.outbound.try_enqueue(payload)
    }

    /// Resolves once the client has been unregistered or its delivery failed.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        self.outbound.closed()
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    pub(super) fn close(&self) {
        self.outbound.close();
    }
}

/// Result of [`ConnectionRegistry::register`].
pub enum Registration {
    /// The handle was already registered; nothing was allocated.
    Existing(Arc<ClientRecord>),
    /// A new record whose delivery loop still has to be started.
    Created(Arc<ClientRecord>, OutboundReceiver),
}

impl Registration {
    pub fn record(&self) -> &Arc<ClientRecord> {
        match self {
            Registration::Existing(record) | Registration::Created(record, _) => record,
        }
    }
}

/// Map from connection handle to its client record.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: HashMap<ConnectionId, Arc<ClientRecord>>,
}

impl ConnectionRegistry {
    /// Idempotent: a known handle returns its existing record unchanged.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        user_id: UserId,
        queue_capacity: usize,
    ) -> Registration {
        if let Some(existing) = self.clients.get(&connection_id) {
            return Registration::Existing(existing.clone());
        }

        let (outbound, receiver) = OutboundQueue::bounded(queue_capacity);
        let record = Arc::new(ClientRecord {
            connection_id,
            user_id,
            outbound,
        });
        self.clients.insert(connection_id, record.clone());
        Registration::Created(record, receiver)
    }

    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<Arc<ClientRecord>> {
        self.clients.remove(&connection_id)
    }

    pub fn lookup(&self, connection_id: ConnectionId) -> Option<Arc<ClientRecord>> {
        self.clients.get(&connection_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn test_register_twice_returns_existing_record() {
        // テスト項目: 同じハンドルを 2 回登録しても同じレコードが返される（冪等性）
        // given (前提条件):
        let mut registry = ConnectionRegistry::default();
        let connection_id = ConnectionId::next();

        // when (操作):
        let first = registry.register(connection_id, user("alice"), 4);
        let second = registry.register(connection_id, user("mallory"), 4);

        // then (期待する結果):
        assert!(matches!(first, Registration::Created(_, _)));
        assert!(matches!(second, Registration::Existing(_)));
        assert!(Arc::ptr_eq(first.record(), second.record()));
        assert_eq!(second.record().user_id().as_str(), "alice");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_then_lookup_returns_none() {
        // テスト項目: 削除後の lookup は None を返す
        // given (前提条件):
        let mut registry = ConnectionRegistry::default();
        let connection_id = ConnectionId::next();
        registry.register(connection_id, user("alice"), 4);

        // when (操作):
        let removed = registry.remove(connection_id);

        // then (期待する結果):
        assert!(removed.is_some());
        assert!(registry.lookup(connection_id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_handle_is_noop() {
        // テスト項目: 未登録のハンドルの削除は何もしない
        // given (前提条件):
        let mut registry = ConnectionRegistry::default();
        registry.register(ConnectionId::next(), user("alice"), 4);

        // when (操作):
        let removed = registry.remove(ConnectionId::next());

        // then (期待する結果):
        assert!(removed.is_none());
        assert_eq!(registry.len(), 1);
    }
}
