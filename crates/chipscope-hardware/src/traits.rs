//! Transport trait definition.
//!
//! The detectors never talk to a reader directly. A platform adapter
//! (Android NFC, iOS Core NFC, PC/SC, or a replayed recording) implements
//! [`Transport`] and hands over the [`RawTagReading`] it learned while
//! activating the tag.
//!
//! The trait uses native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), so it is not object-safe; dispatch over concrete transports goes
//! through [`AnyTransport`](crate::devices::AnyTransport).

#![allow(async_fn_in_trait)]

use chipscope_core::{DetectionPlatform, RawTagReading};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Technology a frame is sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Raw ISO 14443-3A frames (Type 2 commands).
    NfcA,
    /// ISO 14443-4 APDUs.
    IsoDep,
    /// ISO 15693 frames.
    NfcV,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::NfcA => "NfcA",
            Channel::IsoDep => "IsoDep",
            Channel::NfcV => "NfcV",
        };
        f.write_str(name)
    }
}

/// Exchange of raw frames with one presented tag.
///
/// # Examples
///
/// ```no_run
/// use chipscope_hardware::traits::{Channel, Transport};
/// use chipscope_hardware::Result;
///
/// async fn get_version<T: Transport>(transport: &mut T) -> Result<Vec<u8>> {
///     transport.transceive(Channel::NfcA, &[0x60]).await
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Attributes captured while activating the tag.
    fn reading(&self) -> &RawTagReading;

    /// Platform performing the exchange.
    fn platform(&self) -> DetectionPlatform;

    /// Send one frame and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Rejected`](crate::TransportError::Rejected)
    /// when the tag does not answer the command, and a fatal error when the
    /// tag or reader is gone.
    async fn transceive(&mut self, channel: Channel, request: &[u8]) -> Result<Vec<u8>>;

    /// Whether the tag is still in the field.
    async fn is_present(&self) -> Result<bool>;

    /// Release the tag.
    async fn close(&mut self) -> Result<()>;
}
