//! The classification result of one scan.
//!
//! A [`Transponder`] ties a [`ChipIdentity`] to everything the detectors
//! learned along the way. Family, label and cloneability are derived from
//! the identity when the record is built and cannot be set independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::{ChipFamily, ChipIdentity, Cloneability};
use crate::reading::{DetectionPlatform, RawTagReading};

/// How directly the identity was read from the chip.
///
/// Ordered: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// SAK-only or technology-only inference.
    Low,
    /// ATS signature, range inference or applet presence.
    Medium,
    /// Exact version or IC-reference match.
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(name)
    }
}

/// One 7-byte version block, as returned by NTAG GET_VERSION and each
/// frame of the DESFire GetVersion exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionBlock {
    pub vendor: u8,
    pub product_type: u8,
    pub subtype: u8,
    pub major: u8,
    pub minor: u8,
    pub storage_size: u8,
    pub protocol: u8,
}

impl VersionBlock {
    /// Build from exactly the seven version bytes.
    pub fn from_bytes(bytes: [u8; 7]) -> Self {
        Self {
            vendor: bytes[0],
            product_type: bytes[1],
            subtype: bytes[2],
            major: bytes[3],
            minor: bytes[4],
            storage_size: bytes[5],
            protocol: bytes[6],
        }
    }
}

/// Production data from the third DESFire version frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionInfo {
    #[serde(with = "crate::serde_hex")]
    pub uid: Vec<u8>,
    #[serde(with = "crate::serde_hex")]
    pub batch: Vec<u8>,
    /// Calendar week, BCD-decoded.
    pub week: u8,
    /// Two-digit year, BCD-decoded.
    pub year: u8,
}

/// DESFire hardware/software version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesfireVersion {
    pub hardware: VersionBlock,
    pub software: Option<VersionBlock>,
    pub production: Option<ProductionInfo>,
}

/// Protocol-specific version information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionInfo {
    Ntag(VersionBlock),
    Desfire(DesfireVersion),
}

/// What kind of inconsistency the SAK-swap analyzer found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Classic SAK while the tag also answers as ISO-DEP.
    SakSwap,
    /// Classic SAK with historical bytes of an upgradable security chip.
    UpgradableSecurityChip,
    /// SAK/ATQA pair that no factory part produces.
    NonFactoryCombination,
}

/// Diagnostic attached next to the identity, never replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SakSwapAnomaly {
    pub kind: AnomalyKind,
    pub confidence: Confidence,
    pub description: String,
}

/// Category of an on-card application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppletCategory {
    CardManager,
    Identity,
    Payment,
    MemoryManagement,
    PlatformDiscovery,
    Ndef,
    AccessControl,
    Transit,
    Campus,
    Other,
}

/// An application found on the chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppletInfo {
    #[serde(with = "crate::serde_hex")]
    pub aid: Vec<u8>,
    pub label: String,
    pub category: AppletCategory,
}

impl AppletInfo {
    pub fn new(aid: impl Into<Vec<u8>>, label: impl Into<String>, category: AppletCategory) -> Self {
        Self {
            aid: aid.into(),
            label: label.into(),
            category,
        }
    }
}

/// Which of the bridged sensors produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorChannel {
    Primary,
    Secondary,
}

/// One converted temperature sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub channel: SensorChannel,
    pub i2c_address: u8,
    pub raw: u16,
    pub celsius: f32,
}

/// The classification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transponder {
    identity: ChipIdentity,
    family: ChipFamily,
    cloneability: Cloneability,

    /// Human label, normally the identity name.
    pub label: String,

    /// User memory in bytes.
    pub memory_bytes: Option<u32>,

    /// Set when `memory_bytes` was decoded by rule rather than table.
    pub memory_approximate: bool,

    pub reading: RawTagReading,
    pub version: Option<VersionInfo>,
    pub anomaly: Option<SakSwapAnomaly>,
    pub applets: Vec<AppletInfo>,
    pub temperatures: Vec<TemperatureReading>,
    pub implant_name: Option<String>,

    /// Payment network name when the chip is a payment instrument.
    pub payment_network: Option<String>,

    pub confidence: Confidence,
    pub platform: DetectionPlatform,
    pub detected_at: DateTime<Utc>,
}

impl Transponder {
    /// Start building a transponder.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_core::{ChipIdentity, Confidence, RawTagReading, Transponder};
    ///
    /// let reading = RawTagReading::new(vec![0x01, 0x02, 0x03, 0x04]).unwrap().with_sak(0x08);
    /// let t = Transponder::builder(ChipIdentity::MifareClassic1k, Confidence::High, reading).build();
    ///
    /// assert_eq!(t.memory_bytes, Some(1024));
    /// assert!(t.cloneability().cloneable);
    /// ```
    pub fn builder(
        identity: ChipIdentity,
        confidence: Confidence,
        reading: RawTagReading,
    ) -> TransponderBuilder {
        TransponderBuilder::new(identity, confidence, reading)
    }

    pub fn identity(&self) -> ChipIdentity {
        self.identity
    }

    pub fn family(&self) -> ChipFamily {
        self.family
    }

    pub fn cloneability(&self) -> Cloneability {
        self.cloneability
    }

    pub fn is_payment_instrument(&self) -> bool {
        self.payment_network.is_some()
    }
}

/// Builder for [`Transponder`].
#[derive(Debug, Clone)]
pub struct TransponderBuilder {
    identity: ChipIdentity,
    confidence: Confidence,
    reading: RawTagReading,
    label: Option<String>,
    memory_bytes: Option<u32>,
    memory_approximate: bool,
    version: Option<VersionInfo>,
    applets: Vec<AppletInfo>,
    temperatures: Vec<TemperatureReading>,
    implant_name: Option<String>,
    payment_network: Option<String>,
    platform: DetectionPlatform,
    detected_at: Option<DateTime<Utc>>,
}

impl TransponderBuilder {
    pub fn new(identity: ChipIdentity, confidence: Confidence, reading: RawTagReading) -> Self {
        Self {
            identity,
            confidence,
            reading,
            label: None,
            memory_bytes: identity.nominal_memory(),
            memory_approximate: false,
            version: None,
            applets: Vec::new(),
            temperatures: Vec::new(),
            implant_name: None,
            payment_network: None,
            platform: DetectionPlatform::Unknown,
            detected_at: None,
        }
    }

    pub fn identity(&self) -> ChipIdentity {
        self.identity
    }

    /// Override the label (defaults to the identity name).
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Memory decoded from the chip itself; replaces the nominal size.
    pub fn memory(mut self, bytes: u32) -> Self {
        self.memory_bytes = Some(bytes);
        self.memory_approximate = false;
        self
    }

    pub fn approximate_memory(mut self, bytes: u32) -> Self {
        self.memory_bytes = Some(bytes);
        self.memory_approximate = true;
        self
    }

    pub fn version(mut self, version: VersionInfo) -> Self {
        self.version = Some(version);
        self
    }

    pub fn applets(mut self, applets: Vec<AppletInfo>) -> Self {
        self.applets = applets;
        self
    }

    pub fn temperatures(mut self, temperatures: Vec<TemperatureReading>) -> Self {
        self.temperatures = temperatures;
        self
    }

    pub fn implant_name(mut self, name: impl Into<String>) -> Self {
        self.implant_name = Some(name.into());
        self
    }

    pub fn payment_network(mut self, name: impl Into<String>) -> Self {
        self.payment_network = Some(name.into());
        self
    }

    pub fn platform(mut self, platform: DetectionPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Set a custom timestamp (defaults to now).
    pub fn detected_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.detected_at = Some(timestamp);
        self
    }

    pub fn build(self) -> Transponder {
        Transponder {
            identity: self.identity,
            family: self.identity.family(),
            cloneability: self.identity.cloneability(),
            label: self.label.unwrap_or_else(|| self.identity.name().to_string()),
            memory_bytes: self.memory_bytes,
            memory_approximate: self.memory_approximate,
            reading: self.reading,
            version: self.version,
            anomaly: None,
            applets: self.applets,
            temperatures: self.temperatures,
            implant_name: self.implant_name,
            payment_network: self.payment_network,
            confidence: self.confidence,
            platform: self.platform,
            detected_at: self.detected_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x04, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]).unwrap()
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_builder_derives_family_and_cloneability() {
        let t = Transponder::builder(ChipIdentity::DesfireEv2, Confidence::High, reading()).build();
        assert_eq!(t.family(), ChipFamily::MifareDesfire);
        assert_eq!(t.cloneability(), ChipIdentity::DesfireEv2.cloneability());
        assert_eq!(t.label, "MIFARE DESFire EV2");
        assert_eq!(t.memory_bytes, None);
        assert!(t.anomaly.is_none());
    }

    #[test]
    fn test_builder_memory_override() {
        let t = Transponder::builder(ChipIdentity::DesfireEv1, Confidence::High, reading())
            .approximate_memory(8192)
            .build();
        assert_eq!(t.memory_bytes, Some(8192));
        assert!(t.memory_approximate);
    }

    #[test]
    fn test_builder_custom_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap();
        let t = Transponder::builder(ChipIdentity::Ntag213, Confidence::High, reading())
            .detected_at(ts)
            .build();
        assert_eq!(t.detected_at, ts);
    }

    #[test]
    fn test_version_info_tagged_serialization() {
        let block = VersionBlock::from_bytes([0x04, 0x04, 0x02, 0x01, 0x00, 0x0F, 0x03]);
        let json = serde_json::to_string(&VersionInfo::Ntag(block)).unwrap();
        assert!(json.contains("\"kind\":\"ntag\""));
        assert!(json.contains("\"storage_size\":15"));
    }

    #[test]
    fn test_payment_instrument_flag() {
        let t = Transponder::builder(ChipIdentity::JavaCardUnknown, Confidence::Medium, reading())
            .payment_network("Visa")
            .build();
        assert!(t.is_payment_instrument());
    }
}
