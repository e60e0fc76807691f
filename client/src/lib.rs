//! # Drawing Client Library
//!
//! A headless participant for shared drawing rooms. It joins a room over
//! WebSocket, keeps a local mirror of the canvas and roster, and turns simple
//! text commands into the same message stream a pointer-driven client would
//! produce. Useful for scripting, load checks and poking at a running server.
//!
//! ## Architecture Overview
//!
//! ### Optimistic Local Echo
//! The server never sends a participant's own stroke events back to it. Strokes
//! drawn here are applied to the mirror immediately; undo, redo and clear are
//! applied only when the server broadcasts their outcome, since the history
//! cursor is shared by the whole room.
//!
//! ### Reconnection
//! A lost connection is retried a bounded number of times with a fixed delay.
//! The counter resets after every successful connection, and each reconnect
//! re-joins the room and receives a fresh snapshot. Commands issued while
//! offline are discarded.
//!
//! ## Module Organization
//!
//! ### Canvas Module (`canvas`)
//! Ordered stroke map, roster and remote cursors rebuilt from server events.
//!
//! ### Identity Module (`identity`)
//! Generated user ids, stroke ids and palette colors.
//!
//! ### Input Module (`input`)
//! Command parsing and line-to-stroke expansion.
//!
//! ### Network Module (`network`)
//! Connection lifetime, reconnect policy and frame handling.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::identity::Identity;
//! use client::input::{Brush, Command};
//! use client::network::{Client, ClientConfig, ReconnectPolicy};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identity = Identity::resolve(&mut rand::thread_rng(), None, None, None);
//!     let mut client = Client::new(ClientConfig {
//!         server_url: "ws://127.0.0.1:3000".to_string(),
//!         room_id: "12".to_string(),
//!         identity,
//!         brush: Brush::default(),
//!         reconnect: ReconnectPolicy::default(),
//!     });
//!
//!     let (tx, mut rx) = mpsc::channel(16);
//!     tx.send("line 0 0 100 100".parse::<Command>()?).await?;
//!     tx.send(Command::Quit).await?;
//!
//!     client.run(&mut rx).await
//! }
//! ```

pub mod canvas;
pub mod identity;
pub mod input;
pub mod network;
