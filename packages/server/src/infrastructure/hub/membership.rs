//! Room membership: which client records are subscribed to which room.
//!
//! Rooms exist only while they have members. A room entry is created on the
//! first join and removed the instant its member set becomes empty.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::domain::{ConnectionId, RoomKey};

use super::registry::ClientRecord;

#[derive(Debug, Default)]
pub struct RoomMembership {
    rooms: HashMap<RoomKey, HashMap<ConnectionId, Arc<ClientRecord>>>,
    // reverse index, kept in step with `rooms`
    joined: HashMap<ConnectionId, HashSet<RoomKey>>,
}

impl RoomMembership {
    /// Add the client to the room. Returns `false` if it was already a member.
    pub fn join(&mut self, record: &Arc<ClientRecord>, room: RoomKey) -> bool {
        let connection_id = record.connection_id();
        let members = self.rooms.entry(room.clone()).or_default();
        if members.contains_key(&connection_id) {
            return false;
        }
        members.insert(connection_id, record.clone());
        self.joined.entry(connection_id).or_default().insert(room);
        true
    }

    /// Remove the client from the room. Returns `false` if it was not a member.
    pub fn leave(&mut self, connection_id: ConnectionId, room: &RoomKey) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        if members.remove(&connection_id).is_none() {
            return false;
        }
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if let Some(rooms) = self.joined.get_mut(&connection_id) {
            rooms.remove(room);
            if rooms.is_empty() {
                self.joined.remove(&connection_id);
            }
        }
        true
    }

    /// Remove the client from every room it belongs to.
    pub fn leave_all(&mut self, connection_id: ConnectionId) -> Vec<RoomKey> {
        let Some(rooms) = self.joined.remove(&connection_id) else {
            return Vec::new();
        };
        for room in &rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
        rooms.into_iter().collect()
    }

    /// Snapshot of the room's current members. Unknown rooms yield nothing.
    pub fn members_of(&self, room: &RoomKey) -> Vec<Arc<ClientRecord>> {
        self.rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room: &RoomKey) -> usize {
        self.rooms.get(room).map_or(0, HashMap::len)
    }

    pub fn rooms_of(&self, connection_id: ConnectionId) -> Vec<RoomKey> {
        self.joined
            .get(&connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every live room with its member count, sorted by key.
    pub fn room_sizes(&self) -> Vec<(RoomKey, usize)> {
        let mut sizes: Vec<(RoomKey, usize)> = self
            .rooms
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect();
        sizes.sort_by(|a, b| a.0.cmp(&b.0));
        sizes
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
