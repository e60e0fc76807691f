use crate::canvas::CanvasMirror;
use crate::identity::{generate_stroke_id, Identity};
use crate::input::{line_messages, Brush, Command};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{
    decode, encode, ClientMessage, ServerMessage, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MS,
};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;

/// Bounded retry schedule with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay: Duration,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            attempts: 0,
        }
    }

    /// Returns the delay before the next attempt, or `None` once exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }

    /// Called after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            MAX_RECONNECT_ATTEMPTS,
            Duration::from_millis(RECONNECT_DELAY_MS),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub room_id: String,
    pub identity: Identity,
    pub brush: Brush,
    pub reconnect: ReconnectPolicy,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("room id must not be empty")]
    EmptyRoomId,

    #[error("user id must not be empty")]
    EmptyUserId,
}

impl ClientConfig {
    /// The server silently ignores joins without a room or user id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_id.trim().is_empty() {
            return Err(ConfigError::EmptyRoomId);
        }
        if self.identity.user_id.trim().is_empty() {
            return Err(ConfigError::EmptyUserId);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Quit,
    Lost,
}

/// Headless room participant.
///
/// Commands arrive over a channel, usually fed from stdin. While no session is
/// open they are dropped rather than queued for the next connection.
pub struct Client {
    server_url: String,
    room_id: String,
    identity: Identity,
    brush: Brush,
    reconnect: ReconnectPolicy,
    mirror: CanvasMirror,
    connected: bool,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let mirror = CanvasMirror::new(
            config.identity.user_id.as_str(),
            config.identity.user_color.as_str(),
        );

        Client {
            server_url: config.server_url,
            room_id: config.room_id,
            identity: config.identity,
            brush: config.brush,
            reconnect: config.reconnect,
            mirror,
            connected: false,
        }
    }

    pub fn mirror(&self) -> &CanvasMirror {
        &self.mirror
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinRoom {
            room_id: self.room_id.clone(),
            user_id: self.identity.user_id.clone(),
            user_color: self.identity.user_color.clone(),
            user_name: self.identity.user_name.clone(),
        }
    }

    /// Turns a command into the messages to send, echoing our own strokes
    /// into the mirror.
    fn prepare(&mut self, command: Command) -> Vec<ClientMessage> {
        let messages = match command {
            Command::Line { from, to, steps } => {
                let stroke_id = generate_stroke_id(&mut rand::thread_rng());
                line_messages(&stroke_id, from, to, steps, &self.brush)
            }
            Command::Undo => vec![ClientMessage::Undo { stroke_id: None }],
            Command::Redo => vec![ClientMessage::Redo { stroke_id: None }],
            Command::Clear => vec![ClientMessage::ClearCanvas],
            Command::Cursor { x, y } => vec![ClientMessage::CursorMove { x, y }],
            Command::Status | Command::Quit => Vec::new(),
        };

        for message in &messages {
            self.mirror.apply_local(message);
        }
        messages
    }

    fn handle_text(&mut self, text: &str) {
        match decode::<ServerMessage>(text) {
            Ok(event) => {
                self.log_event(&event);
                self.mirror.apply(&event);
            }
            Err(e) => warn!("Error parsing server message: {}", e),
        }
    }

    fn log_event(&self, event: &ServerMessage) {
        match event {
            ServerMessage::CanvasState { strokes, users } => info!(
                "Joined room {} ({} strokes, {} users)",
                self.room_id,
                strokes.len(),
                users.len()
            ),
            ServerMessage::UserJoined { user_name, .. } => info!("{} joined", user_name),
            ServerMessage::UserLeft { user_id, .. } => info!("{} left", user_id),
            ServerMessage::Undo {
                stroke_id: Some(stroke_id),
                user_id,
            } => info!("{} undid {}", user_id, stroke_id),
            ServerMessage::Redo {
                stroke: Some(stroke),
                user_id,
            } => info!("{} redid {}", user_id, stroke.id),
            ServerMessage::ClearCanvas { user_id } => info!("{} cleared the canvas", user_id),
            other => debug!("Received {:?}", other),
        }
    }

    fn print_status(&self) {
        info!(
            "{} as {} in room {}: {} strokes, {} users",
            if self.connected { "Connected" } else { "Offline" },
            self.identity.user_id,
            self.room_id,
            self.mirror.stroke_count(),
            self.mirror.users().len()
        );
        for user in self.mirror.users() {
            info!("  {} ({}) {}", user.user_name, user.user_id, user.user_color);
        }
    }

    /// One connection lifetime: join, then pump frames and commands.
    async fn session(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
    ) -> Result<SessionEnd, Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.server_url);
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.server_url.as_str()).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        self.connected = true;
        self.reconnect.reset();
        self.mirror.reset();
        info!("Connected to {}", self.server_url);

        ws_sender
            .send(Message::text(encode(&self.join_message())?))
            .await?;

        // Drawing commands wait for the snapshot so it cannot wipe local echo.
        let mut pending: Vec<Command> = Vec::new();

        loop {
            tokio::select! {
                frame = ws_receiver.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_text(text.as_str());
                        if self.mirror.is_synced() && !pending.is_empty() {
                            let queued: Vec<ClientMessage> = pending
                                .drain(..)
                                .flat_map(|command| self.prepare(command))
                                .collect();
                            for message in queued {
                                ws_sender.send(Message::text(encode(&message)?)).await?;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Lost),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Connection error: {}", e);
                        return Ok(SessionEnd::Lost);
                    }
                },

                command = commands.recv() => match command {
                    None | Some(Command::Quit) => {
                        let _ = ws_sender.send(Message::Close(None)).await;
                        return Ok(SessionEnd::Quit);
                    }
                    Some(Command::Status) => self.print_status(),
                    Some(command) if !self.mirror.is_synced() => {
                        debug!("Holding {:?} until the room snapshot arrives", command);
                        pending.push(command);
                    }
                    Some(command) => {
                        for message in self.prepare(command) {
                            ws_sender.send(Message::text(encode(&message)?)).await?;
                        }
                    }
                },
            }
        }
    }

    /// Sleeps out a reconnect delay, discarding commands typed meanwhile.
    /// Returns true if the user asked to quit.
    async fn wait_offline(
        &self,
        delay: Duration,
        commands: &mut mpsc::Receiver<Command>,
    ) -> bool {
        let timer = sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = &mut timer => return false,
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => return true,
                    Some(Command::Status) => self.print_status(),
                    Some(command) => warn!("Not connected, dropping {:?}", command),
                },
            }
        }
    }

    /// Runs sessions until the user quits or reconnect attempts run out.
    pub async fn run(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let outcome = self.session(commands).await;
            self.connected = false;

            match outcome {
                Ok(SessionEnd::Quit) => {
                    info!("Disconnected");
                    return Ok(());
                }
                Ok(SessionEnd::Lost) => warn!("Connection lost"),
                Err(e) => warn!("Connection failed: {}", e),
            }

            let delay = match self.reconnect.next_delay() {
                Some(delay) => delay,
                None => {
                    return Err(format!(
                        "giving up after {} reconnect attempts",
                        self.reconnect.max_attempts()
                    )
                    .into())
                }
            };

            info!(
                "Attempting to reconnect ({}/{}) in {:?}",
                self.reconnect.attempts(),
                self.reconnect.max_attempts(),
                delay
            );
            if self.wait_offline(delay, commands).await {
                return Ok(());
            }
        }
    }
}
