//! Connection binding and message dispatch
//!
//! The gateway is the single owner of every room. The event loop hands it one
//! transport event at a time; each call mutates the affected room and enqueues
//! the resulting fan-out before returning, so the order in which members
//! receive events is exactly the order in which mutations were applied.
//!
//! A connection starts unbound and binds to a room with its first
//! `JOIN_ROOM`. Anything else sent before that is dropped. Disconnects,
//! whether graceful, from a transport error or from a failed write, all take
//! the same path.

use crate::registry::RoomRegistry;
use crate::room::{ConnectionId, Member, Outbound};
use log::{debug, info, warn};
use shared::{
    decode, default_user_name, now_millis, ClientMessage, ProtocolError, ServerMessage, Stroke,
};
use std::collections::HashMap;

/// Identity a connection acquired by joining a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub room_id: String,
    pub user_id: String,
    pub user_color: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Binding {
    Unbound,
    Bound(Session),
}

#[derive(Debug)]
struct Connection {
    sender: Outbound,
    binding: Binding,
}

#[derive(Debug, Default)]
pub struct Gateway {
    registry: RoomRegistry,
    connections: HashMap<ConnectionId, Connection>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Session of a bound connection.
    pub fn session(&self, connection_id: ConnectionId) -> Option<&Session> {
        match &self.connections.get(&connection_id)?.binding {
            Binding::Bound(session) => Some(session),
            Binding::Unbound => None,
        }
    }

    /// Registers a freshly accepted connection in the unbound state.
    pub fn connect(&mut self, connection_id: ConnectionId, sender: Outbound) {
        debug!("Connection {} opened", connection_id);
        self.connections.insert(
            connection_id,
            Connection {
                sender,
                binding: Binding::Unbound,
            },
        );
    }

    /// Decodes one inbound text frame and dispatches it.
    ///
    /// Payloads that fail to parse are logged and dropped; the connection
    /// stays open.
    pub fn handle_text(
        &mut self,
        connection_id: ConnectionId,
        text: &str,
    ) -> Result<(), ProtocolError> {
        match decode::<ClientMessage>(text) {
            Ok(message) => self.dispatch(connection_id, message),
            Err(e) => {
                warn!("Dropping payload from connection {}: {}", connection_id, e);
                Ok(())
            }
        }
    }

    /// Applies one client message and fans out its result.
    pub fn dispatch(
        &mut self,
        connection_id: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), ProtocolError> {
        if let ClientMessage::JoinRoom {
            room_id,
            user_id,
            user_color,
            user_name,
        } = message
        {
            return self.join(connection_id, room_id, user_id, user_color, user_name);
        }

        if let ClientMessage::Unknown = message {
            debug!("Ignoring unknown message type from {}", connection_id);
            return Ok(());
        }

        let Some(session) = self.session(connection_id).cloned() else {
            debug!(
                "Dropping {} from unbound connection {}",
                message.kind(),
                connection_id
            );
            return Ok(());
        };

        let Some(room) = self.registry.get_mut(&session.room_id) else {
            return Ok(());
        };

        let user_id = session.user_id;

        match message {
            ClientMessage::DrawStart {
                stroke_id,
                x,
                y,
                color,
                width,
            } => {
                let stroke = Stroke::begin(
                    stroke_id,
                    user_id.as_str(),
                    session.user_color,
                    x,
                    y,
                    color,
                    width,
                    now_millis(),
                );
                if room.history_mut().add_stroke(&stroke) {
                    room.broadcast_except(&user_id, &ServerMessage::DrawStart { stroke })?;
                } else {
                    debug!("Stroke {} is already live in {}", stroke.id, room.id());
                }
            }

            ClientMessage::DrawMove { stroke_id, x, y } => {
                if room.history_mut().add_point(&stroke_id, x, y) {
                    room.broadcast_except(&user_id, &ServerMessage::DrawMove { stroke_id, x, y })?;
                }
            }

            ClientMessage::DrawEnd { stroke_id } => {
                if room.history_mut().finish_stroke(&stroke_id) {
                    room.broadcast_except(&user_id, &ServerMessage::DrawEnd { stroke_id })?;
                }
            }

            ClientMessage::Undo { .. } => {
                let undone = room.history_mut().undo(&user_id);
                room.broadcast(&ServerMessage::Undo {
                    stroke_id: undone.map(|stroke| stroke.id),
                    user_id,
                })?;
            }

            ClientMessage::Redo { .. } => {
                let stroke = room.history_mut().redo(&user_id);
                room.broadcast(&ServerMessage::Redo { stroke, user_id })?;
            }

            ClientMessage::CursorMove { x, y } => {
                let event = ServerMessage::CursorMove {
                    user_id: user_id.clone(),
                    user_name: session.user_name,
                    x,
                    y,
                    user_color: session.user_color,
                };
                room.broadcast_except(&user_id, &event)?;
            }

            ClientMessage::ClearCanvas => {
                room.history_mut().clear();
                info!("Canvas in room {} cleared by {}", room.id(), user_id);
                room.broadcast(&ServerMessage::ClearCanvas { user_id })?;
            }

            ClientMessage::JoinRoom { .. } | ClientMessage::Unknown => {}
        }

        Ok(())
    }

    /// Tears down a connection: leaves its room and drops the room if it is
    /// now empty. Unknown or unbound connections are ignored.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<(), ProtocolError> {
        let Some(connection) = self.connections.remove(&connection_id) else {
            return Ok(());
        };
        debug!("Connection {} closed", connection_id);

        let Binding::Bound(session) = connection.binding else {
            return Ok(());
        };

        let Some(room) = self.registry.get_mut(&session.room_id) else {
            return Ok(());
        };

        if !room.remove_member(&session.user_id, connection_id) {
            return Ok(());
        }

        info!("{} left room {}", session.user_id, session.room_id);
        let result = room
            .broadcast(&ServerMessage::UserLeft {
                user_id: session.user_id,
                users: room.users(),
            })
            .map(|_| ());

        self.registry.remove_if_empty(&session.room_id);
        result
    }

    fn join(
        &mut self,
        connection_id: ConnectionId,
        room_id: String,
        user_id: String,
        user_color: String,
        user_name: Option<String>,
    ) -> Result<(), ProtocolError> {
        let Some(connection) = self.connections.get_mut(&connection_id) else {
            return Ok(());
        };

        if let Binding::Bound(session) = &connection.binding {
            warn!(
                "Connection {} is already in room {}; ignoring join to {}",
                connection_id, session.room_id, room_id
            );
            return Ok(());
        }

        if room_id.is_empty() || user_id.is_empty() {
            warn!("Connection {} sent a join without room or user id", connection_id);
            return Ok(());
        }

        let user_name = user_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_user_name(&user_id));

        connection.binding = Binding::Bound(Session {
            room_id: room_id.clone(),
            user_id: user_id.clone(),
            user_color: user_color.clone(),
            user_name: user_name.clone(),
        });
        let sender = connection.sender.clone();

        let room = self.registry.get_or_create(&room_id);
        let replaced = room.add_member(Member::new(
            user_id.as_str(),
            user_name.as_str(),
            user_color.as_str(),
            connection_id,
            sender,
        ));
        info!("{} ({}) joined room {}", user_name, user_id, room_id);

        room.send_to(
            &user_id,
            &ServerMessage::CanvasState {
                strokes: room.history().strokes(),
                users: room.users(),
            },
        )?;
        room.broadcast(&ServerMessage::UserJoined {
            user_id,
            user_name,
            user_color,
            users: room.users(),
        })?;

        // The superseded connection no longer speaks for this user.
        if let Some(previous) = replaced.filter(|m| m.connection_id != connection_id) {
            if let Some(stale) = self.connections.get_mut(&previous.connection_id) {
                info!(
                    "Connection {} superseded by {} for {}",
                    previous.connection_id, connection_id, previous.user_id
                );
                stale.binding = Binding::Unbound;
            }
        }

        Ok(())
    }
}
