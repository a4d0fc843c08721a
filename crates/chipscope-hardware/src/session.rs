//! One scan session over a transport.
//!
//! A [`Session`] owns the transport while a tag is being identified. Every
//! exchange and every polling delay races the session's
//! [`CancellationToken`], so cancelling the token (user abort, tag removal
//! observed elsewhere) stops the scan at the next await point.

use chipscope_core::{DetectionPlatform, RawTagReading};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Result, TransportError};
use crate::traits::{Channel, Transport};

/// Identifier of one scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cancellable exclusive access to one presented tag.
///
/// # Examples
///
/// ```
/// use chipscope_core::RawTagReading;
/// use chipscope_hardware::{Channel, MockTransport, Session, TransportError};
///
/// #[tokio::main]
/// async fn main() {
///     let reading = RawTagReading::new(vec![0x04, 0x01, 0x02, 0x03]).unwrap();
///     let (transport, _handle) = MockTransport::new(reading);
///     let mut session = Session::new(transport);
///
///     session.cancellation_token().cancel();
///     let result = session.transceive(Channel::NfcA, &[0x60]).await;
///     assert!(matches!(result, Err(TransportError::Cancelled)));
/// }
/// ```
#[derive(Debug)]
pub struct Session<T: Transport> {
    id: SessionId,
    transport: T,
    cancel: CancellationToken,
    exchanges: u32,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self::with_cancellation(transport, CancellationToken::new())
    }

    /// Create a session cancelled through an externally owned token.
    pub fn with_cancellation(transport: T, cancel: CancellationToken) -> Self {
        let id = SessionId::new();
        debug!("Opening session {} on {}", id, transport.platform());
        Self {
            id,
            transport,
            cancel,
            exchanges: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn reading(&self) -> &RawTagReading {
        self.transport.reading()
    }

    pub fn platform(&self) -> DetectionPlatform {
        self.transport.platform()
    }

    /// Token that cancels this session when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of frames sent so far.
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    /// Send one frame, or fail with [`TransportError::Cancelled`] if the
    /// session is cancelled first.
    pub async fn transceive(&mut self, channel: Channel, request: &[u8]) -> Result<Vec<u8>> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.exchanges += 1;
        trace!("{} >> {}", channel, hex::encode_upper(request));

        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
            reply = self.transport.transceive(channel, request) => reply,
        };

        match &reply {
            Ok(bytes) => trace!("{} << {}", channel, hex::encode_upper(bytes)),
            Err(e) => trace!("{} << error: {}", channel, e),
        }
        reply
    }

    /// Wait, or fail with [`TransportError::Cancelled`] if the session is
    /// cancelled first.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Close the transport and return it.
    pub async fn finish(mut self) -> Result<T> {
        debug!("Closing session {} after {} exchanges", self.id, self.exchanges);
        self.transport.close().await?;
        Ok(self.transport)
    }
}
