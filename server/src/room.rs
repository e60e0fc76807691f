//! Room membership and event fan-out
//!
//! A room owns its drawing history and the roster of members currently
//! connected to it. Every member carries the outbound queue of the connection
//! it joined through. Fan-out serializes an event once and enqueues the same
//! frame for each recipient.
//!
//! Delivery is at-most-once: a member whose connection has already closed is
//! skipped and nothing is retried. Cleaning up such members is left to the
//! disconnect path.

use crate::history::DrawingHistory;
use indexmap::IndexMap;
use log::debug;
use shared::{encode, ProtocolError, ServerMessage, UserInfo};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Server-assigned identifier of one transport connection.
pub type ConnectionId = u64;

/// Queue feeding a connection's socket writer.
pub type Outbound = mpsc::UnboundedSender<Message>;

/// A participant bound to a room through one connection.
#[derive(Debug, Clone)]
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub color: String,
    /// Connection this member joined through
    pub connection_id: ConnectionId,
    sender: Outbound,
}

impl Member {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        connection_id: ConnectionId,
        sender: Outbound,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            color: color.into(),
            connection_id,
            sender,
        }
    }

    /// Returns true while the connection's writer is still accepting frames.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    fn deliver(&self, frame: &Message) -> bool {
        if !self.is_open() {
            return false;
        }
        self.sender.send(frame.clone()).is_ok()
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            user_id: self.user_id.clone(),
            user_name: self.name.clone(),
            user_color: self.color.clone(),
        }
    }
}

/// An isolated drawing session.
#[derive(Debug)]
pub struct Room {
    id: String,
    /// Members keyed by user id, in join order
    members: IndexMap<String, Member>,
    history: DrawingHistory,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: IndexMap::new(),
            history: DrawingHistory::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &DrawingHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut DrawingHistory {
        &mut self.history
    }

    /// Adds a member to the roster.
    ///
    /// If the user id is already present (a participant rejoining before its
    /// previous connection was reaped) the entry is replaced in place and the
    /// previous member is returned.
    pub fn add_member(&mut self, member: Member) -> Option<Member> {
        self.members.insert(member.user_id.clone(), member)
    }

    /// Removes a member, but only if it is still bound to `connection_id`.
    ///
    /// A stale connection whose member entry has since been taken over by a
    /// newer connection cannot evict the replacement.
    pub fn remove_member(&mut self, user_id: &str, connection_id: ConnectionId) -> bool {
        match self.members.get(user_id) {
            Some(member) if member.connection_id == connection_id => {
                self.members.shift_remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub fn member(&self, user_id: &str) -> Option<&Member> {
        self.members.get(user_id)
    }

    /// Current roster in join order.
    pub fn users(&self) -> Vec<UserInfo> {
        self.members.values().map(Member::info).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sends an event to every member. Returns how many frames were enqueued.
    pub fn broadcast(&self, event: &ServerMessage) -> Result<usize, ProtocolError> {
        self.fan_out(event, None)
    }

    /// Sends an event to every member except `sender_id`.
    pub fn broadcast_except(
        &self,
        sender_id: &str,
        event: &ServerMessage,
    ) -> Result<usize, ProtocolError> {
        self.fan_out(event, Some(sender_id))
    }

    /// Sends an event to a single member.
    pub fn send_to(&self, user_id: &str, event: &ServerMessage) -> Result<bool, ProtocolError> {
        let Some(member) = self.members.get(user_id) else {
            return Ok(false);
        };
        let frame = Message::text(encode(event)?);
        Ok(member.deliver(&frame))
    }

    fn fan_out(&self, event: &ServerMessage, exclude: Option<&str>) -> Result<usize, ProtocolError> {
        let frame = Message::text(encode(event)?);
        let mut delivered = 0;

        for member in self.members.values() {
            if Some(member.user_id.as_str()) == exclude {
                continue;
            }

            if member.deliver(&frame) {
                delivered += 1;
            } else {
                debug!(
                    "Skipping closed connection {} for {} in room {}",
                    member.connection_id, member.user_id, self.id
                );
            }
        }

        Ok(delivered)
    }
}
