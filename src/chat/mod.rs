//! Chat core: the shared user registry, event formatting, and input parsing.

pub mod command;
pub mod event;
pub mod registry;

pub use command::{parse_input, ChatCommand, ChatInput, RENAME_COMMAND, RENAME_USAGE};
pub use event::{prompt_for, timestamp_now, ChatEvent, TIMESTAMP_FORMAT};
pub use registry::{Registry, RegistryError, SessionHandle};
