//! Scripted transport for testing and replaying recorded scans.
//!
//! [`MockTransport`] answers each request with the first unconsumed scripted
//! [`Exchange`] whose channel and request bytes match. Requests with no
//! scripted answer are rejected, the way a real tag ignores a command it does
//! not implement.

use chipscope_core::{DetectionPlatform, RawTagReading};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::fixture::{Exchange, ExchangeFault, ScanFixture};
use crate::traits::{Channel, Transport};

/// Scripted transport.
///
/// # Examples
///
/// ```
/// use chipscope_core::RawTagReading;
/// use chipscope_hardware::fixture::Exchange;
/// use chipscope_hardware::mock::MockTransport;
/// use chipscope_hardware::traits::{Channel, Transport};
///
/// #[tokio::main]
/// async fn main() -> chipscope_hardware::Result<()> {
///     let reading = RawTagReading::new(vec![0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]).unwrap();
///     let (mut transport, handle) = MockTransport::new(reading);
///
///     handle.script(Exchange::reply(Channel::NfcA, vec![0x60], vec![0x00, 0x04])).await?;
///
///     let reply = transport.transceive(Channel::NfcA, &[0x60]).await?;
///     assert_eq!(reply, vec![0x00, 0x04]);
///
///     // Unscripted commands are rejected.
///     assert!(transport.transceive(Channel::NfcA, &[0x60]).await.is_err());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    reading: RawTagReading,
    platform: DetectionPlatform,

    /// Unconsumed exchanges, in script order.
    script: Vec<Exchange>,

    events: mpsc::Receiver<MockEvent>,

    present: bool,
    closed: bool,

    /// Every frame sent, in order.
    sent: Vec<(Channel, Vec<u8>)>,
}

impl MockTransport {
    /// Create a transport for a reading with an empty script.
    ///
    /// Returns the transport and a handle for scripting it while in use.
    pub fn new(reading: RawTagReading) -> (Self, MockTransportHandle) {
        Self::with_script(reading, DetectionPlatform::Unknown, Vec::new())
    }

    /// Create a transport that replays a recorded scan.
    pub fn from_fixture(fixture: ScanFixture) -> (Self, MockTransportHandle) {
        Self::with_script(fixture.reading, fixture.platform, fixture.exchanges)
    }

    fn with_script(
        reading: RawTagReading,
        platform: DetectionPlatform,
        script: Vec<Exchange>,
    ) -> (Self, MockTransportHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let transport = Self {
            reading,
            platform,
            script,
            events: event_rx,
            present: true,
            closed: false,
            sent: Vec::new(),
        };

        (transport, MockTransportHandle { event_tx })
    }

    pub fn with_platform(mut self, platform: DetectionPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Append an exchange to the script.
    pub fn push(&mut self, exchange: Exchange) {
        self.script.push(exchange);
    }

    /// Frames sent so far.
    pub fn sent(&self) -> &[(Channel, Vec<u8>)] {
        &self.sent
    }

    /// Scripted exchanges not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                MockEvent::Script(exchange) => self.script.push(exchange),
                MockEvent::RemoveTag => self.present = false,
            }
        }
    }
}

impl Transport for MockTransport {
    fn reading(&self) -> &RawTagReading {
        &self.reading
    }

    fn platform(&self) -> DetectionPlatform {
        self.platform
    }

    async fn transceive(&mut self, channel: Channel, request: &[u8]) -> Result<Vec<u8>> {
        self.drain_events();
        if self.closed {
            return Err(TransportError::communication("transport closed"));
        }
        if !self.present {
            return Err(TransportError::TagLost);
        }
        self.sent.push((channel, request.to_vec()));

        let position = self
            .script
            .iter()
            .position(|exchange| exchange.channel == channel && exchange.request == request);
        let Some(position) = position else {
            trace!("No scripted reply for {} {}", channel, hex::encode_upper(request));
            return Err(TransportError::rejected(format!(
                "no scripted reply for {}",
                hex::encode_upper(request)
            )));
        };
        let exchange = self.script.remove(position);

        if let Some(delay_ms) = exchange.delay_ms {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if exchange.fault == Some(ExchangeFault::TagLost) {
            self.present = false;
        }
        exchange.outcome()
    }

    async fn is_present(&self) -> Result<bool> {
        // Events not yet drained are only observed by the next transceive.
        Ok(self.present && !self.closed)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug)]
enum MockEvent {
    Script(Exchange),
    RemoveTag,
}

/// Handle for controlling a [`MockTransport`] that is owned elsewhere.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    event_tx: mpsc::Sender<MockEvent>,
}

impl MockTransportHandle {
    /// Append an exchange to the transport's script.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has been dropped.
    pub async fn script(&self, exchange: Exchange) -> Result<()> {
        self.send(MockEvent::Script(exchange)).await
    }

    /// Simulate the tag leaving the field.
    pub async fn remove_tag(&self) -> Result<()> {
        self.send(MockEvent::RemoveTag).await
    }

    async fn send(&self, event: MockEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| TransportError::communication("mock transport dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x04, 0x10, 0x20, 0x30, 0x40, 0x50, 0x60]).unwrap()
    }

    #[tokio::test]
    async fn test_replies_in_script_order_per_request() {
        let fixture = ScanFixture::new(reading())
            .exchange(Exchange::reply(Channel::IsoDep, vec![0x90, 0x60], vec![0x01, 0x91, 0xAF]))
            .exchange(Exchange::reply(Channel::IsoDep, vec![0x90, 0xAF], vec![0x02, 0x91, 0xAF]))
            .exchange(Exchange::reply(Channel::IsoDep, vec![0x90, 0xAF], vec![0x03, 0x91, 0x00]));
        let (mut transport, _handle) = MockTransport::from_fixture(fixture);

        assert_eq!(transport.transceive(Channel::IsoDep, &[0x90, 0x60]).await.unwrap()[0], 0x01);
        assert_eq!(transport.transceive(Channel::IsoDep, &[0x90, 0xAF]).await.unwrap()[0], 0x02);
        assert_eq!(transport.transceive(Channel::IsoDep, &[0x90, 0xAF]).await.unwrap()[0], 0x03);
        assert_eq!(transport.remaining(), 0);
        assert_eq!(transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_channel_must_match() {
        let (mut transport, handle) = MockTransport::new(reading());
        handle.script(Exchange::reply(Channel::NfcV, vec![0x02, 0x2B], vec![0x00])).await.unwrap();

        let err = transport.transceive(Channel::NfcA, &[0x02, 0x2B]).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(transport.transceive(Channel::NfcV, &[0x02, 0x2B]).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_tag() {
        let (mut transport, handle) = MockTransport::new(reading());
        handle.remove_tag().await.unwrap();

        let err = transport.transceive(Channel::NfcA, &[0x60]).await.unwrap_err();
        assert!(matches!(err, TransportError::TagLost));
        assert!(!transport.is_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_recorded_tag_lost_sticks() {
        let fixture = ScanFixture::new(reading())
            .exchange(Exchange::fail(Channel::NfcA, vec![0x60], ExchangeFault::TagLost));
        let (mut transport, _handle) = MockTransport::from_fixture(fixture);

        assert!(transport.transceive(Channel::NfcA, &[0x60]).await.is_err());
        assert!(matches!(
            transport.transceive(Channel::NfcA, &[0x30, 0x00]).await,
            Err(TransportError::TagLost)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_uses_virtual_time() {
        let fixture = ScanFixture::new(reading())
            .exchange(Exchange::reply(Channel::NfcA, vec![0x60], vec![0x00]).with_delay(5_000));
        let (mut transport, _handle) = MockTransport::from_fixture(fixture);

        let start = tokio::time::Instant::now();
        transport.transceive(Channel::NfcA, &[0x60]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_close() {
        let (mut transport, _handle) = MockTransport::new(reading());
        transport.close().await.unwrap();
        assert!(transport.is_closed());
        assert!(transport.transceive(Channel::NfcA, &[0x60]).await.is_err());
    }
}
