//! Process-wide table of live rooms.
//!
//! Rooms are created lazily by the first join and dropped as soon as their
//! roster empties, so nothing survives a period with no members. There is no
//! persistence: restarting the server loses every room.

use crate::room::Room;
use log::info;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room with the given id, creating an empty one if needed.
    pub fn get_or_create(&mut self, room_id: &str) -> &mut Room {
        self.rooms.entry(room_id.to_string()).or_insert_with(|| {
            info!("Created room {}", room_id);
            Room::new(room_id)
        })
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let room = self.rooms.remove(room_id);
        if room.is_some() {
            info!("Destroyed room {}", room_id);
        }
        room
    }

    /// Drops the room if its roster is empty. Returns true if it was removed.
    pub fn remove_if_empty(&mut self, room_id: &str) -> bool {
        match self.rooms.get(room_id) {
            Some(room) if room.is_empty() => self.remove(room_id).is_some(),
            _ => false,
        }
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_ids(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::Member;
    use shared::Stroke;
    use tokio::sync::mpsc;

    #[test]
    fn test_get_or_create_is_lazy_and_stable() {
        let mut registry = RoomRegistry::new();
        assert!(registry.is_empty());

        registry.get_or_create("r1");
        registry.get_or_create("r1");
        registry.get_or_create("r2");

        assert_eq!(registry.len(), 2);
        let mut ids = registry.room_ids();
        ids.sort();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_get_unknown_room() {
        let mut registry = RoomRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.get_mut("missing").is_none());
        assert!(registry.remove("missing").is_none());
    }

    #[test]
    fn test_remove_if_empty_keeps_occupied_rooms() {
        let mut registry = RoomRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry
            .get_or_create("r1")
            .add_member(Member::new("alice", "Alice", "#fff", 1, tx));
        registry.get_or_create("r2");

        assert!(!registry.remove_if_empty("r1"));
        assert!(registry.remove_if_empty("r2"));
        assert!(!registry.remove_if_empty("r2"));
        assert!(registry.contains("r1"));
        assert!(!registry.contains("r2"));
    }

    #[test]
    fn test_recreated_room_starts_blank() {
        let mut registry = RoomRegistry::new();
        let stroke = Stroke::begin("s1", "alice", "#fff", 0.0, 0.0, "#000", 2.0, 0);
        registry.get_or_create("r1").history_mut().add_stroke(&stroke);

        assert!(registry.remove_if_empty("r1"));

        assert!(registry.get_or_create("r1").history().is_empty());
    }
}
