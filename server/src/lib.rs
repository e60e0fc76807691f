//! # Drawing Server Library
//!
//! This library provides the authoritative server for shared drawing rooms.
//! Every room holds one canvas with a linear, shared undo/redo history, and
//! the server keeps all participants of a room on the same timeline.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative History
//! The server owns the definitive history of every room. Clients draw
//! optimistically, but undo, redo and clear are resolved only here, against a
//! single cursor per room that every member shares.
//!
//! ### Room Lifecycle
//! Rooms are created by the first participant to join and destroyed when the
//! last one leaves. Nothing is persisted: an empty room, or a restart, loses
//! its canvas.
//!
//! ### Event Fan-out
//! Each applied change is relayed to the room, either to everyone or to
//! everyone but the participant who caused it (who already shows it locally).
//! Delivery is best-effort and at-most-once.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Connection tasks only read and write sockets. Every decoded frame is
//! forwarded to one event loop that owns all rooms and applies messages
//! sequentially. Handling a message, including enqueueing its broadcast,
//! finishes before the next one starts, so broadcast order always matches
//! mutation order.
//!
//! ### WebSocket Transport
//! Participants connect over WebSocket and exchange JSON text frames tagged
//! by a `type` field. See the `shared` crate for the message catalogue.
//!
//! ## Module Organization
//!
//! ### History Module (`history`)
//! Append-only action log, cursor and the derived set of visible strokes.
//!
//! ### Room Module (`room`)
//! Membership roster and broadcast helpers for one room.
//!
//! ### Registry Module (`registry`)
//! Room id to room table with lazy creation and teardown.
//!
//! ### Gateway Module (`gateway`)
//! Per-connection binding state and message dispatch.
//!
//! ### Network Module (`network`)
//! Listener, per-connection socket tasks and the event loop.
//!
//! ### Config Module (`config`)
//! Listener address settings.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(&ServerConfig::new("127.0.0.1", 3000)).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod gateway;
pub mod history;
pub mod network;
pub mod registry;
pub mod room;
