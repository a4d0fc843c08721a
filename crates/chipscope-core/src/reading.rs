//! The per-scan reading handed over by the transport.
//!
//! A [`RawTagReading`] holds the field-level attributes a reader learns while
//! activating a tag (UID, SAK, ATQA, ATS) and the technology capabilities the
//! platform reports. It is immutable for the lifetime of one scan session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::constants::{MAX_UID_LENGTH, MIN_UID_LENGTH, SAK_ISO14443_4};
use crate::error::{Error, Result};

/// Technology capability reported by the platform for a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechCapability {
    /// ISO 14443-3A.
    NfcA,
    /// ISO 14443-3B.
    NfcB,
    /// JIS X 6319-4 (FeliCa).
    NfcF,
    /// ISO 15693.
    NfcV,
    /// ISO 14443-4.
    IsoDep,
    /// Platform recognises MIFARE Classic.
    MifareClassic,
    /// Platform recognises MIFARE Ultralight/NTAG.
    MifareUltralight,
    Ndef,
    NdefFormatable,
}

/// Platform that performed the detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPlatform {
    Android,
    Ios,
    Pcsc,
    /// Replayed from a recorded scan.
    Replay,
    #[default]
    Unknown,
}

impl fmt::Display for DetectionPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionPlatform::Android => "Android",
            DetectionPlatform::Ios => "iOS",
            DetectionPlatform::Pcsc => "PC/SC",
            DetectionPlatform::Replay => "Replay",
            DetectionPlatform::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// An NDEF record cached by the platform during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdefRecord {
    /// Type name format (3 bits).
    pub tnf: u8,
    #[serde(with = "crate::serde_hex")]
    pub record_type: Vec<u8>,
    #[serde(with = "crate::serde_hex")]
    pub payload: Vec<u8>,
}

/// Field-level attributes of one presented tag.
///
/// # Examples
///
/// ```
/// use chipscope_core::{RawTagReading, TechCapability};
///
/// let reading = RawTagReading::new(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66])
///     .unwrap()
///     .with_sak(0x00)
///     .with_atqa(0x0044)
///     .with_capability(TechCapability::NfcA)
///     .with_capability(TechCapability::MifareUltralight);
///
/// assert!(reading.is_type2_candidate());
/// assert_eq!(reading.uid_hex(), "04112233445566");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTagReading {
    #[serde(with = "crate::serde_hex")]
    pub uid: Vec<u8>,

    #[serde(default)]
    pub sak: Option<u8>,

    /// ATQA as a big-endian value, e.g. `0x0044`.
    #[serde(default)]
    pub atqa: Option<u16>,

    /// Full ATS starting with the TL length byte.
    #[serde(default, with = "crate::serde_hex::option")]
    pub ats: Option<Vec<u8>>,

    /// Historical bytes, when the platform exposes them directly.
    #[serde(default, with = "crate::serde_hex::option")]
    pub historical_bytes: Option<Vec<u8>>,

    #[serde(default)]
    pub capabilities: BTreeSet<TechCapability>,

    #[serde(default)]
    pub ndef_records: Vec<NdefRecord>,

    /// MIFARE Classic capacity in bytes as reported by the platform.
    #[serde(default)]
    pub classic_capacity_hint: Option<u32>,
}

impl RawTagReading {
    /// Create a reading from a UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID is not 4-10 bytes long (ISO 14443) or
    /// 8 bytes long (ISO 15693).
    pub fn new(uid: Vec<u8>) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&uid.len()) {
            return Err(Error::invalid_argument(format!(
                "UID length must be between {} and {} bytes, got {}",
                MIN_UID_LENGTH,
                MAX_UID_LENGTH,
                uid.len()
            )));
        }
        Ok(Self {
            uid,
            sak: None,
            atqa: None,
            ats: None,
            historical_bytes: None,
            capabilities: BTreeSet::new(),
            ndef_records: Vec::new(),
            classic_capacity_hint: None,
        })
    }

    pub fn with_sak(mut self, sak: u8) -> Self {
        self.sak = Some(sak);
        self
    }

    pub fn with_atqa(mut self, atqa: u16) -> Self {
        self.atqa = Some(atqa);
        self
    }

    pub fn with_ats(mut self, ats: Vec<u8>) -> Self {
        self.ats = Some(ats);
        self
    }

    pub fn with_historical_bytes(mut self, historical: Vec<u8>) -> Self {
        self.historical_bytes = Some(historical);
        self
    }

    pub fn with_capability(mut self, capability: TechCapability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_classic_capacity_hint(mut self, bytes: u32) -> Self {
        self.classic_capacity_hint = Some(bytes);
        self
    }

    pub fn with_ndef_record(mut self, record: NdefRecord) -> Self {
        self.ndef_records.push(record);
        self
    }

    pub fn has(&self, capability: TechCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// ISO-DEP is usable, either by capability or by the SAK compliance bit.
    pub fn has_iso_dep(&self) -> bool {
        self.has(TechCapability::IsoDep)
            || self.sak.is_some_and(|sak| sak & SAK_ISO14443_4 != 0)
    }

    /// Profile of a Type-2 tag: ISO 14443-A, no ISO-DEP, SAK absent or 0x00.
    pub fn is_type2_candidate(&self) -> bool {
        let sak_ok = matches!(self.sak, None | Some(0x00));
        let type2_tech = self.has(TechCapability::MifareUltralight) || self.has(TechCapability::NfcA);
        sak_ok && type2_tech && !self.has_iso_dep() && !self.has(TechCapability::NfcV)
    }

    /// Historical bytes, taken from the platform or parsed out of the ATS.
    ///
    /// The ATS is `TL T0 [TA] [TB] [TC] historical...`. When the first byte
    /// does not match the ATS length the platform has already stripped TL and
    /// parsing starts at T0.
    pub fn historical(&self) -> Option<Vec<u8>> {
        if let Some(historical) = &self.historical_bytes {
            return Some(historical.clone());
        }
        let ats = self.ats.as_deref()?;
        let body = match ats.first() {
            Some(&tl) if tl as usize == ats.len() => &ats[1..],
            Some(_) => ats,
            None => return None,
        };
        let (&t0, rest) = body.split_first()?;
        let interface_bytes = [0x10u8, 0x20, 0x40]
            .iter()
            .filter(|bit| t0 & **bit != 0)
            .count();
        rest.get(interface_bytes..).map(<[u8]>::to_vec)
    }

    /// UID as an uppercase hex string.
    pub fn uid_hex(&self) -> String {
        hex::encode_upper(&self.uid)
    }
}
