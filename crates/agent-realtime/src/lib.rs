//! Client for a conversational voice agent reached over a bidirectional
//! WebSocket.
//!
//! - `options`: API key, endpoints and headers.
//! - `protocol`: the JSON settings, control and server messages.
//! - `connection`: the session itself, with a single writer task.
//! - `keepalive`: the owned, cancellable keep-alive emitter.
//! - `events`: the events a session produces and the handler trait for them.

pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod options;
pub mod protocol;

pub use client::{AgentClient, GrantToken};
pub use connection::AgentConnection;
pub use error::{AgentError, Result};
pub use events::{AgentEvent, AgentEventHandler, CloseReason, run_handler};
pub use keepalive::{KEEP_ALIVE_INTERVAL, KeepAlive};
pub use options::ClientOptions;
pub use protocol::{ClientMessage, ServerMessage, Settings};
