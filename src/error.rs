//! Error types for tcpchat.

use thiserror::Error;

/// Common error type for tcpchat.
#[derive(Error, Debug)]
pub enum ChatError {
    /// I/O error (bind, accept, or transport failure).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for tcpchat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ChatError::Config("bad port".to_string());
        assert_eq!(err.to_string(), "configuration error: bad port");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err: ChatError = io_err.into();
        assert!(matches!(err, ChatError::Io(_)));
        assert!(err.to_string().contains("address in use"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<u16> {
            Ok(8989)
        }

        fn sample_err() -> Result<u16> {
            Err(ChatError::Config("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 8989);
        assert!(sample_err().is_err());
    }
}
