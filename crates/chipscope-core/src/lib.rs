//! Core data model for contactless chip identification.
//!
//! Everything the detectors, the matcher and the transport layer agree on
//! lives here: the closed [`ChipIdentity`] set and its family/cloneability
//! tables, the per-scan [`RawTagReading`], and the [`Transponder`] record a
//! scan produces.

pub mod constants;
pub mod error;
pub mod identity;
pub mod reading;
pub mod serde_hex;
pub mod transponder;

pub use error::{Error, Result};
pub use identity::{ChipFamily, ChipIdentity, Cloneability};
pub use reading::{DetectionPlatform, NdefRecord, RawTagReading, TechCapability};
pub use transponder::{
    AnomalyKind, AppletCategory, AppletInfo, Confidence, DesfireVersion, ProductionInfo,
    SakSwapAnomaly, SensorChannel, TemperatureReading, Transponder, TransponderBuilder,
    VersionBlock, VersionInfo,
};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
