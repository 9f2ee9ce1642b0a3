//! TCP server: the listener/accept loop and per-connection sessions.

pub mod listener;
pub mod session;

pub use listener::ChatServer;
pub use session::{
    ChatSession, SessionState, CHAT_FULL, NAME_PROMPT, NAME_TAKEN, RENAME_CONFLICT, WELCOME_BANNER,
};
