//! Server network layer handling WebSocket connections and the event loop

use crate::config::ServerConfig;
use crate::gateway::Gateway;
use crate::room::ConnectionId;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Events sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        connection_id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    },
    Text {
        connection_id: ConnectionId,
        text: String,
    },
    Disconnected {
        connection_id: ConnectionId,
    },
}

/// Main server coordinating connections and room state.
///
/// Connection tasks only move bytes. All room state lives in the [`Gateway`]
/// owned by [`Server::run`], which applies events strictly one at a time.
pub struct Server {
    listener: TcpListener,
    gateway: Gateway,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(config: &ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            gateway: Gateway::new(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawns task that accepts TCP connections and upgrades them
    fn spawn_acceptor(listener: TcpListener, event_tx: mpsc::UnboundedSender<ServerEvent>) {
        tokio::spawn(async move {
            let mut next_connection_id: ConnectionId = 1;

            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let connection_id = next_connection_id;
                        next_connection_id += 1;

                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            Self::handle_connection(stream, addr, connection_id, event_tx).await;
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    }
                }

                if event_tx.is_closed() {
                    break;
                }
            }
        });
    }

    /// Pumps frames between one socket and the event loop until either side ends.
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        connection_id: ConnectionId,
        event_tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws_stream) => ws_stream,
            Err(e) => {
                warn!("WebSocket handshake with {} failed: {}", addr, e);
                return;
            }
        };
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

        info!("Connection {} established from {}", connection_id, addr);
        if event_tx
            .send(ServerEvent::Connected {
                connection_id,
                addr,
                sender: out_tx,
            })
            .is_err()
        {
            return;
        }

        let writer = async {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = ws_sender.send(frame).await {
                    debug!("Send to connection {} failed: {}", connection_id, e);
                    break;
                }
            }
            let _ = ws_sender.close().await;
        };

        let reader = async {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let event = ServerEvent::Text {
                            connection_id,
                            text: text.as_str().to_owned(),
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Read from connection {} failed: {}", connection_id, e);
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = writer => {},
            _ = reader => {},
        }

        info!("Connection {} from {} closed", connection_id, addr);
        let _ = event_tx.send(ServerEvent::Disconnected { connection_id });
    }

    /// Applies one transport event to the room state.
    fn handle_event(gateway: &mut Gateway, event: ServerEvent) {
        let result = match event {
            ServerEvent::Connected {
                connection_id,
                addr,
                sender,
            } => {
                debug!("Registering connection {} from {}", connection_id, addr);
                gateway.connect(connection_id, sender);
                Ok(())
            }
            ServerEvent::Text {
                connection_id,
                text,
            } => gateway.handle_text(connection_id, &text),
            ServerEvent::Disconnected { connection_id } => gateway.disconnect(connection_id),
        };

        if let Err(e) = result {
            error!("Failed to handle event: {}", e);
        }
    }

    /// Main server loop; runs until the event channel closes.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let Server {
            listener,
            mut gateway,
            event_tx,
            mut event_rx,
        } = self;

        Self::spawn_acceptor(listener, event_tx);
        info!("Server started successfully");

        while let Some(event) = event_rx.recv().await {
            Self::handle_event(&mut gateway, event);
        }

        info!("Server shutting down");
        Ok(())
    }
}
