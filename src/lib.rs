//! tcpchat - a multi-user chat server over raw TCP.
//!
//! Clients connect, pick a display name, and exchange newline-delimited
//! messages broadcast to everyone else in the room.

pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;

pub use chat::{
    parse_input, prompt_for, ChatCommand, ChatEvent, ChatInput, Registry, RegistryError,
    SessionHandle,
};
pub use config::{Config, ServerConfig};
pub use error::{ChatError, Result};
pub use server::{ChatServer, ChatSession, SessionState};
