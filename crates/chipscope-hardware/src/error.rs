//! Error types for transport operations.
//!
//! Every variant except [`TransportError::Rejected`] ends the scan session:
//! the tag is gone, the user cancelled, or the platform cannot talk to it.
//! A rejected command only means the tag did not understand one probe.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while exchanging frames with a tag.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The tag left the field.
    #[error("Tag lost")]
    TagLost,

    /// The session was cancelled.
    #[error("Session cancelled")]
    Cancelled,

    /// No reply within the transport deadline.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The platform refused access to the reader.
    #[error("Permission denied")]
    PermissionDenied,

    /// The platform lacks a technology needed for the exchange.
    #[error("Capability unavailable: {capability}")]
    Unavailable { capability: String },

    /// The tag rejected or did not understand the command.
    #[error("Command rejected: {message}")]
    Rejected { message: String },

    /// Reader communication error.
    #[error("Communication error: {message}")]
    Communication { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a new unavailable-capability error.
    pub fn unavailable(capability: impl Into<String>) -> Self {
        Self::Unavailable {
            capability: capability.into(),
        }
    }

    /// Create a new rejected-command error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::Communication {
            message: message.into(),
        }
    }

    /// Whether the error ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error() {
        let error = TransportError::timeout(500);
        assert!(error.is_timeout());
        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "Operation timeout after 500ms");
    }

    #[test]
    fn test_rejected_is_recoverable() {
        let error = TransportError::rejected("NAK");
        assert!(!error.is_fatal());
        assert_eq!(error.to_string(), "Command rejected: NAK");
    }

    #[test]
    fn test_session_enders_are_fatal() {
        let errors = vec![
            TransportError::TagLost,
            TransportError::Cancelled,
            TransportError::PermissionDenied,
            TransportError::unavailable("IsoDep"),
            TransportError::communication("reader unplugged"),
            TransportError::Io(std::io::Error::other("pipe closed")),
        ];

        for error in errors {
            assert!(error.is_fatal(), "{error}");
        }
    }
}
