use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOM_ID: &str = "12";
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_DELAY_MS: u64 = 3000;
pub const DEFAULT_NAME_LEN: usize = 8;

/// Colors handed out to participants that do not pick their own.
pub const USER_PALETTE: [&str; 6] = [
    "#3b82f6", "#8b5cf6", "#ec4899", "#f59e0b", "#10b981", "#06b6d4",
];

/// A single sampled position along a stroke, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point(pub f64, pub f64);

/// One continuous drawing gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: String,
    pub user_id: String,
    pub user_color: String,
    pub start_x: f64,
    pub start_y: f64,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f64,
    pub timestamp: u64,
}

impl Stroke {
    /// Starts a stroke at `(x, y)` with that position as its only point.
    #[allow(clippy::too_many_arguments)]
    pub fn begin(
        id: impl Into<String>,
        user_id: impl Into<String>,
        user_color: impl Into<String>,
        x: f64,
        y: f64,
        color: impl Into<String>,
        width: f64,
        timestamp: u64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            user_color: user_color.into(),
            start_x: x,
            start_y: y,
            points: vec![Point(x, y)],
            color: color.into(),
            width,
            timestamp,
        }
    }

    pub fn push_point(&mut self, x: f64, y: f64) {
        self.points.push(Point(x, y));
    }
}

/// Roster entry as seen by other participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub user_name: String,
    pub user_color: String,
}

/// Messages a participant sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
        user_id: String,
        #[serde(default)]
        user_color: String,
        #[serde(default)]
        user_name: Option<String>,
    },
    DrawStart {
        stroke_id: String,
        x: f64,
        y: f64,
        color: String,
        width: f64,
    },
    DrawMove {
        stroke_id: String,
        x: f64,
        y: f64,
    },
    DrawEnd {
        stroke_id: String,
    },
    // The server always acts on its own cursor; a client-side id is ignored.
    Undo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_id: Option<String>,
    },
    Redo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_id: Option<String>,
    },
    CursorMove {
        x: f64,
        y: f64,
    },
    ClearCanvas,
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom { .. } => "JOIN_ROOM",
            ClientMessage::DrawStart { .. } => "DRAW_START",
            ClientMessage::DrawMove { .. } => "DRAW_MOVE",
            ClientMessage::DrawEnd { .. } => "DRAW_END",
            ClientMessage::Undo { .. } => "UNDO",
            ClientMessage::Redo { .. } => "REDO",
            ClientMessage::CursorMove { .. } => "CURSOR_MOVE",
            ClientMessage::ClearCanvas => "CLEAR_CANVAS",
            ClientMessage::Unknown => "UNKNOWN",
        }
    }
}

/// Events the server fans out to room members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    CanvasState {
        strokes: Vec<Stroke>,
        users: Vec<UserInfo>,
    },
    DrawStart {
        stroke: Stroke,
    },
    DrawMove {
        stroke_id: String,
        x: f64,
        y: f64,
    },
    DrawEnd {
        stroke_id: String,
    },
    Undo {
        stroke_id: Option<String>,
        user_id: String,
    },
    Redo {
        stroke: Option<Stroke>,
        user_id: String,
    },
    ClearCanvas {
        user_id: String,
    },
    UserJoined {
        user_id: String,
        user_name: String,
        user_color: String,
        users: Vec<UserInfo>,
    },
    UserLeft {
        user_id: String,
        users: Vec<UserInfo>,
    },
    CursorMove {
        user_id: String,
        user_name: String,
        x: f64,
        y: f64,
        user_color: String,
    },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Display name used when a participant joins without one.
pub fn default_user_name(user_id: &str) -> String {
    user_id.chars().take(DEFAULT_NAME_LEN).collect()
}

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    (millis.min(u64::MAX as u128)) as u64
}
