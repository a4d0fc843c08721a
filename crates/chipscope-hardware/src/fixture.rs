//! Recorded scans.
//!
//! A [`ScanFixture`] is a reading plus the frames exchanged during one scan.
//! [`MockTransport`](crate::mock::MockTransport) replays it, which is how the
//! CLI re-runs captured tags and how detector tests script a tag.
//!
//! ```json
//! {
//!   "reading": { "uid": "04A1B2C3D4E5F6", "sak": 0, "atqa": 68, "capabilities": ["nfc_a"] },
//!   "exchanges": [
//!     { "channel": "nfc_a", "request": "60", "response": "0004040201001103" }
//!   ]
//! }
//! ```

use chipscope_core::{DetectionPlatform, RawTagReading};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::traits::Channel;

/// Failure a recorded exchange ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeFault {
    TagLost,
    Timeout,
    Rejected,
    Communication,
}

impl ExchangeFault {
    pub fn to_error(self) -> TransportError {
        match self {
            ExchangeFault::TagLost => TransportError::TagLost,
            ExchangeFault::Timeout => TransportError::timeout(0),
            ExchangeFault::Rejected => TransportError::rejected("recorded rejection"),
            ExchangeFault::Communication => TransportError::communication("recorded failure"),
        }
    }
}

/// One request and how the tag answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub channel: Channel,

    #[serde(with = "chipscope_core::serde_hex")]
    pub request: Vec<u8>,

    #[serde(default, with = "chipscope_core::serde_hex::option", skip_serializing_if = "Option::is_none")]
    pub response: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<ExchangeFault>,

    /// Simulated reply latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl Exchange {
    pub fn reply(channel: Channel, request: impl Into<Vec<u8>>, response: impl Into<Vec<u8>>) -> Self {
        Self {
            channel,
            request: request.into(),
            response: Some(response.into()),
            fault: None,
            delay_ms: None,
        }
    }

    pub fn fail(channel: Channel, request: impl Into<Vec<u8>>, fault: ExchangeFault) -> Self {
        Self {
            channel,
            request: request.into(),
            response: None,
            fault: Some(fault),
            delay_ms: None,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    /// The recorded outcome. An exchange with neither response nor fault
    /// counts as a rejection.
    pub fn outcome(&self) -> Result<Vec<u8>, TransportError> {
        match (&self.response, self.fault) {
            (_, Some(fault)) => Err(fault.to_error()),
            (Some(response), None) => Ok(response.clone()),
            (None, None) => Err(TransportError::rejected("no recorded response")),
        }
    }
}

/// A reading plus its recorded exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFixture {
    pub reading: RawTagReading,

    #[serde(default = "default_platform")]
    pub platform: DetectionPlatform,

    #[serde(default)]
    pub exchanges: Vec<Exchange>,
}

fn default_platform() -> DetectionPlatform {
    DetectionPlatform::Replay
}

impl ScanFixture {
    pub fn new(reading: RawTagReading) -> Self {
        Self {
            reading,
            platform: default_platform(),
            exchanges: Vec::new(),
        }
    }

    pub fn exchange(mut self, exchange: Exchange) -> Self {
        self.exchanges.push(exchange);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_json() {
        let json = r#"{
            "reading": { "uid": "04A1B2C3D4E5F6", "sak": 0, "capabilities": ["nfc_a"] },
            "exchanges": [
                { "channel": "nfc_a", "request": "60", "response": "00 04 04 02 01 00 11 03" },
                { "channel": "nfc_a", "request": "30FC", "fault": "rejected" }
            ]
        }"#;
        let fixture: ScanFixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.platform, DetectionPlatform::Replay);
        assert_eq!(fixture.reading.uid.len(), 7);
        assert_eq!(fixture.exchanges.len(), 2);
        assert_eq!(fixture.exchanges[0].request, vec![0x60]);
        assert_eq!(fixture.exchanges[0].outcome().unwrap().len(), 8);
        assert!(matches!(
            fixture.exchanges[1].outcome(),
            Err(TransportError::Rejected { .. })
        ));
    }

    #[test]
    fn test_fault_precedes_response() {
        let mut exchange = Exchange::fail(Channel::NfcV, vec![0x02], ExchangeFault::Timeout);
        exchange.response = Some(vec![0x00]);
        assert!(matches!(exchange.outcome(), Err(TransportError::Timeout { .. })));
    }

    #[test]
    fn test_empty_exchange_is_rejection() {
        let mut exchange = Exchange::reply(Channel::IsoDep, vec![0x00], vec![0x90, 0x00]);
        exchange.response = None;
        assert!(!exchange.outcome().unwrap_err().is_fatal());
    }
}
