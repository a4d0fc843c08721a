//! Probe error type.
//!
//! A probe fails either because the transport failed or because the tag's
//! reply did not parse. Only fatal transport failures leave the waterfall;
//! everything else makes it advance to the next step.

use chipscope_hardware::TransportError;

/// Result type alias for probes.
pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] chipscope_core::Error),
}

impl ProbeError {
    /// Whether the error ends the session.
    pub fn is_fatal(&self) -> bool {
        match self {
            ProbeError::Transport(e) => e.is_fatal(),
            ProbeError::Protocol(_) => false,
        }
    }

    /// Split into the fatal transport error, if any.
    pub fn into_fatal(self) -> std::result::Result<TransportError, Self> {
        match self {
            ProbeError::Transport(e) if e.is_fatal() => Ok(e),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_are_recoverable() {
        let error = ProbeError::from(chipscope_core::Error::short(8, 1));
        assert!(!error.is_fatal());
        assert!(error.into_fatal().is_err());
    }

    #[test]
    fn test_transport_classification_delegates() {
        assert!(ProbeError::from(TransportError::TagLost).is_fatal());
        assert!(!ProbeError::from(TransportError::rejected("NAK")).is_fatal());
        assert!(matches!(
            ProbeError::from(TransportError::Cancelled).into_fatal(),
            Ok(TransportError::Cancelled)
        ));
    }
}
