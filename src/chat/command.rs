//! Chat input parsing.
//!
//! The only command is `\change_name <name>`. Any line whose first token is
//! the command word is treated as a command attempt: a wrong argument count
//! is reported as a usage error rather than relayed as chat.

/// The rename command word.
pub const RENAME_COMMAND: &str = "\\change_name";

/// Usage line sent back for a malformed rename command.
pub const RENAME_USAGE: &str = "[USAGE]: \\change_name <new_name>";

/// Result of parsing a chat input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Empty line; the sender just gets a fresh prompt.
    Empty,
    /// Regular chat message, relayed as typed.
    Message(String),
    /// Parsed command.
    Command(ChatCommand),
}

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Change display name to the given name.
    Rename(String),
    /// Command word recognized but the argument count is wrong.
    Malformed,
}

/// Parse a chat input line into a message or command.
pub fn parse_input(raw: &str) -> ChatInput {
    let mut tokens = raw.split_whitespace();
    match tokens.next() {
        Some(RENAME_COMMAND) => match (tokens.next(), tokens.next()) {
            (Some(new_name), None) => ChatInput::Command(ChatCommand::Rename(new_name.to_string())),
            _ => ChatInput::Command(ChatCommand::Malformed),
        },
        Some(_) => ChatInput::Message(raw.to_string()),
        None if raw.is_empty() => ChatInput::Empty,
        // Whitespace-only lines are still relayed as typed.
        None => ChatInput::Message(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse_input(""), ChatInput::Empty);
    }

    #[test]
    fn test_parse_whitespace_only_is_message() {
        assert_eq!(parse_input("   "), ChatInput::Message("   ".to_string()));
    }

    #[test]
    fn test_parse_plain_message() {
        assert_eq!(
            parse_input("hello there"),
            ChatInput::Message("hello there".to_string())
        );
    }

    #[test]
    fn test_parse_message_keeps_raw_text() {
        assert_eq!(
            parse_input("  padded  "),
            ChatInput::Message("  padded  ".to_string())
        );
    }

    #[test]
    fn test_parse_rename() {
        assert_eq!(
            parse_input("\\change_name Bob"),
            ChatInput::Command(ChatCommand::Rename("Bob".to_string()))
        );
    }

    #[test]
    fn test_parse_rename_extra_spacing() {
        assert_eq!(
            parse_input("  \\change_name   Bob "),
            ChatInput::Command(ChatCommand::Rename("Bob".to_string()))
        );
    }

    #[test]
    fn test_parse_rename_missing_argument() {
        assert_eq!(
            parse_input("\\change_name"),
            ChatInput::Command(ChatCommand::Malformed)
        );
    }

    #[test]
    fn test_parse_rename_extra_arguments() {
        assert_eq!(
            parse_input("\\change_name Bob Smith"),
            ChatInput::Command(ChatCommand::Malformed)
        );
    }

    #[test]
    fn test_parse_command_word_must_lead() {
        // The command word mid-line is just chat.
        assert_eq!(
            parse_input("try \\change_name Bob"),
            ChatInput::Message("try \\change_name Bob".to_string())
        );
    }
}
