//! Protocol errors

use thiserror::Error;

use super::Status;

/// Errors that can occur during protocol communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Failed to open port {port}: {reason}")]
    PortOpen { port: String, reason: String },

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Reply timeout: received {received} of 9 bytes")]
    Timeout { received: usize },

    #[error("Not connected to board")]
    NotConnected,

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Board returned error code {status} ({})", describe_status(.status))]
    BoardStatus { status: u8 },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe_status(status: &u8) -> &'static str {
    Status::describe(*status)
}

impl ProtocolError {
    /// Board status code carried by a [`ProtocolError::BoardStatus`]
    pub fn status(&self) -> Option<u8> {
        match self {
            ProtocolError::BoardStatus { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was reported by the board rather than the link
    pub fn is_board_error(&self) -> bool {
        matches!(self, ProtocolError::BoardStatus { .. })
    }

    /// Named board status, if the code is one the protocol defines
    pub fn board_status(&self) -> Option<Status> {
        self.status().and_then(|code| Status::try_from(code).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_status_display() {
        let err = ProtocolError::BoardStatus { status: 5 };
        assert_eq!(
            err.to_string(),
            "Board returned error code 5 (configuration memory locked)"
        );
        assert_eq!(err.status(), Some(5));
        assert_eq!(err.board_status(), Some(Status::ConfigurationLocked));
        assert!(err.is_board_error());
    }

    #[test]
    fn test_unknown_board_status_display() {
        let err = ProtocolError::BoardStatus { status: 42 };
        assert_eq!(err.to_string(), "Board returned error code 42 (unknown status)");
        assert_eq!(err.board_status(), None);
    }

    #[test]
    fn test_io_error_converts() {
        fn flush() -> Result<(), ProtocolError> {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "line dropped"))?;
            Ok(())
        }
        let err = flush().expect_err("io failure");
        assert!(matches!(
            err,
            ProtocolError::IoError(ref e) if e.kind() == std::io::ErrorKind::BrokenPipe
        ));
        assert_eq!(err.to_string(), "I/O error: line dropped");
    }

    #[test]
    fn test_timeout_display() {
        let err = ProtocolError::Timeout { received: 4 };
        assert_eq!(err.to_string(), "Reply timeout: received 4 of 9 bytes");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_checksum_display() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0x2d,
            actual: 0x2e,
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0x2d, got 0x2e");
    }
}
