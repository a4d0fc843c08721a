use thiserror::Error;

/// Protocol-level failures.
///
/// These are the "probe failed" class of errors: a command the tag did not
/// understand, a response too short to decode, a status word that signals
/// rejection. They are always recoverable from the point of view of a scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Response too short: expected at least {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Command rejected with status {sw1:02X}{sw2:02X}")]
    StatusWord { sw1: u8, sw2: u8 },

    #[error("Tag answered NAK 0x{0:X}")]
    Nak(u8),

    #[error("ISO15693 error code 0x{0:02X}")]
    Iso15693(u8),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Register verify failed at 0x{register:02X}: expected {expected:02X?}, read {actual:02X?}")]
    VerifyFailed {
        register: u8,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },
}

impl Error {
    /// Shorthand for a short-response error.
    pub fn short(expected: usize, actual: usize) -> Self {
        Self::ShortResponse { expected, actual }
    }

    /// Shorthand for a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Shorthand for an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
