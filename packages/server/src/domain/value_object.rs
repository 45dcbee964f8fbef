//! Value objects.
//!
//! 不変条件はコンストラクタで検証し、生成された値は常に有効であることを保証します。

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::Serialize;
use uuid::Uuid;

use super::error::ValueObjectError;

/// Separator between the two participants of a direct room key.
pub const DIRECT_KEY_SEPARATOR: char = ':';

/// Prefix of every group room key.
pub const GROUP_KEY_PREFIX: &str = "group:";

/// User ID that may never be assigned, so that no direct key starts with the group prefix.
pub const RESERVED_USER_ID: &str = "group";

// ========================================
// UserId
// ========================================

/// Authenticated user identifier.
///
/// Must be non-empty, must not contain [`DIRECT_KEY_SEPARATOR`] and must not be
/// [`RESERVED_USER_ID`]. Together these keep the direct and group key spaces apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        if value.contains(DIRECT_KEY_SEPARATOR) {
            return Err(ValueObjectError::UserIdContainsSeparator(
                value,
                DIRECT_KEY_SEPARATOR,
            ));
        }
        if value == RESERVED_USER_ID {
            return Err(ValueObjectError::UserIdReserved(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// GroupId
// ========================================

/// Identifier of a named group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::GroupIdEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ========================================
// RoomKey
// ========================================

/// Canonical room identifier.
///
/// - Direct room: `min(a, b) + ":" + max(a, b)`, so `direct(a, b) == direct(b, a)`.
/// - Group room: `"group:" + group_id`.
///
/// Keys received from clients are accepted as opaque strings via [`RoomKey::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoomKey(String);

impl RoomKey {
    /// Opaque key, e.g. one named by a client frame.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::RoomKeyEmpty);
        }
        Ok(Self(value))
    }

    /// Order-independent key of the conversation between `a` and `b`.
    pub fn direct(a: &UserId, b: &UserId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!(
            "{}{}{}",
            low.as_str(),
            DIRECT_KEY_SEPARATOR,
            high.as_str()
        ))
    }

    /// Key of a group conversation.
    pub fn group(group_id: &GroupId) -> Self {
        Self(format!("{}{}", GROUP_KEY_PREFIX, group_id.as_str()))
    }

    pub fn is_group(&self) -> bool {
        self.0.starts_with(GROUP_KEY_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// MessageBody
// ========================================

/// Text body of a chat message. Only the empty string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::MessageBodyEmpty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ========================================
// MessageId
// ========================================

/// Globally unique message identifier (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ========================================
// ConnectionId
// ========================================

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle of one live connection.
///
/// The Hub only borrows this handle; it never owns the transport behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a process-unique handle.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ========================================
// Timestamp
// ========================================

/// Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
