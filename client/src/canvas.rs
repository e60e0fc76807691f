//! Local mirror of a room's canvas, roster and remote cursors

use indexmap::IndexMap;
use log::debug;
use shared::{now_millis, ClientMessage, ServerMessage, Stroke, UserInfo};
use std::collections::HashMap;

/// Last known pointer position of another participant.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub user_name: String,
    pub user_color: String,
    pub x: f64,
    pub y: f64,
}

/// Client-side view of the room.
///
/// The server never echoes a participant's own stroke events back to it, so
/// strokes drawn locally are applied optimistically through
/// [`apply_local`](Self::apply_local). Undo, redo and clear are only applied
/// once the server broadcasts their outcome.
#[derive(Debug, Clone)]
pub struct CanvasMirror {
    user_id: String,
    user_color: String,
    strokes: IndexMap<String, Stroke>,
    users: Vec<UserInfo>,
    cursors: HashMap<String, RemoteCursor>,
    synced: bool,
}

impl CanvasMirror {
    pub fn new(user_id: impl Into<String>, user_color: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_color: user_color.into(),
            strokes: IndexMap::new(),
            users: Vec::new(),
            cursors: HashMap::new(),
            synced: false,
        }
    }

    /// Applies an event received from the server.
    pub fn apply(&mut self, event: &ServerMessage) {
        match event {
            ServerMessage::CanvasState { strokes, users } => {
                self.strokes = strokes
                    .iter()
                    .map(|stroke| (stroke.id.clone(), stroke.clone()))
                    .collect();
                self.users = users.clone();
                self.cursors.clear();
                self.synced = true;
            }
            ServerMessage::DrawStart { stroke } => {
                self.strokes.insert(stroke.id.clone(), stroke.clone());
            }
            ServerMessage::DrawMove { stroke_id, x, y } => {
                if let Some(stroke) = self.strokes.get_mut(stroke_id) {
                    stroke.push_point(*x, *y);
                }
            }
            ServerMessage::DrawEnd { .. } => {}
            ServerMessage::Undo { stroke_id, .. } => {
                if let Some(stroke_id) = stroke_id {
                    self.strokes.shift_remove(stroke_id);
                }
            }
            ServerMessage::Redo { stroke, .. } => {
                if let Some(stroke) = stroke {
                    self.strokes.shift_remove(&stroke.id);
                    self.strokes.insert(stroke.id.clone(), stroke.clone());
                }
            }
            ServerMessage::ClearCanvas { .. } => self.strokes.clear(),
            ServerMessage::UserJoined { users, .. } => self.users = users.clone(),
            ServerMessage::UserLeft { user_id, users } => {
                self.users = users.clone();
                self.cursors.remove(user_id);
            }
            ServerMessage::CursorMove {
                user_id,
                user_name,
                x,
                y,
                user_color,
            } => {
                self.cursors.insert(
                    user_id.clone(),
                    RemoteCursor {
                        user_name: user_name.clone(),
                        user_color: user_color.clone(),
                        x: *x,
                        y: *y,
                    },
                );
            }
        }
    }

    /// Applies our own outgoing stroke messages before the server sees them.
    pub fn apply_local(&mut self, message: &ClientMessage) {
        match message {
            ClientMessage::DrawStart {
                stroke_id,
                x,
                y,
                color,
                width,
            } => {
                let stroke = Stroke::begin(
                    stroke_id.as_str(),
                    self.user_id.as_str(),
                    self.user_color.as_str(),
                    *x,
                    *y,
                    color.as_str(),
                    *width,
                    now_millis(),
                );
                self.strokes.insert(stroke.id.clone(), stroke);
            }
            ClientMessage::DrawMove { stroke_id, x, y } => {
                if let Some(stroke) = self.strokes.get_mut(stroke_id) {
                    stroke.push_point(*x, *y);
                }
            }
            other => debug!("No local echo for {}", other.kind()),
        }
    }

    /// Forgets everything; the next snapshot rebuilds the view.
    pub fn reset(&mut self) {
        self.strokes.clear();
        self.users.clear();
        self.cursors.clear();
        self.synced = false;
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.values()
    }

    pub fn stroke(&self, stroke_id: &str) -> Option<&Stroke> {
        self.strokes.get(stroke_id)
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn users(&self) -> &[UserInfo] {
        &self.users
    }

    pub fn cursor(&self, user_id: &str) -> Option<&RemoteCursor> {
        self.cursors.get(user_id)
    }
}
