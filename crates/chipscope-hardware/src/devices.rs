//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so code that must choose
//! a transport at runtime (the CLI) holds an [`AnyTransport`] instead of a
//! `Box<dyn Transport>`.
//!
//! # Examples
//!
//! ```
//! use chipscope_core::RawTagReading;
//! use chipscope_hardware::devices::AnyTransport;
//! use chipscope_hardware::mock::MockTransport;
//! use chipscope_hardware::traits::Transport;
//!
//! let reading = RawTagReading::new(vec![0x04, 0x01, 0x02, 0x03]).unwrap();
//! let (transport, _handle) = MockTransport::new(reading);
//! let any = AnyTransport::Mock(transport);
//! assert_eq!(any.reading().uid_hex(), "04010203");
//! ```

use chipscope_core::{DetectionPlatform, RawTagReading};

use crate::error::Result;
use crate::mock::MockTransport;
use crate::traits::{Channel, Transport};

/// Transport chosen at runtime.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Scripted or replayed transport.
    Mock(MockTransport),
    // TODO: PC/SC transport behind the `transport-pcsc` feature.
}

impl From<MockTransport> for AnyTransport {
    fn from(transport: MockTransport) -> Self {
        Self::Mock(transport)
    }
}

impl Transport for AnyTransport {
    fn reading(&self) -> &RawTagReading {
        match self {
            Self::Mock(transport) => transport.reading(),
        }
    }

    fn platform(&self) -> DetectionPlatform {
        match self {
            Self::Mock(transport) => transport.platform(),
        }
    }

    async fn transceive(&mut self, channel: Channel, request: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Mock(transport) => transport.transceive(channel, request).await,
        }
    }

    async fn is_present(&self) -> Result<bool> {
        match self {
            Self::Mock(transport) => transport.is_present().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(transport) => transport.close().await,
        }
    }
}
