//! ISO 15693 identity tables (ICODE SLIX family, ICODE DNA, NTAG 5).
//!
//! IC reference ranges overlap between product lines in practice, so when a
//! tag reports both its IC reference and its memory geometry the memory band
//! wins. Tags that omit the IC reference are resolved by memory alone.

use chipscope_core::constants::VENDOR_NXP;
use chipscope_core::{ChipIdentity, Confidence};
use std::ops::RangeInclusive;

/// UID byte (display order) holding the manufacturer code.
pub const UID_MANUFACTURER_INDEX: usize = 1;

/// Block-count bands, in ascending order.
pub const MEMORY_BANDS: &[(RangeInclusive<u16>, ChipIdentity)] = &[
    (1..=8, ChipIdentity::IcodeSlixL),
    (9..=28, ChipIdentity::IcodeSlix),
    (29..=40, ChipIdentity::IcodeSlixS),
    (41..=63, ChipIdentity::IcodeDna),
    (64..=80, ChipIdentity::IcodeSlix2),
    (81..=128, ChipIdentity::Ntag5Switch),
    (129..=256, ChipIdentity::Ntag5Link),
    (257..=512, ChipIdentity::Ntag5Boost),
];

/// IC reference ranges.
pub const IC_REFERENCES: &[(RangeInclusive<u8>, ChipIdentity)] = &[
    (0x01..=0x01, ChipIdentity::IcodeSlix),
    (0x02..=0x02, ChipIdentity::IcodeSlixS),
    (0x03..=0x03, ChipIdentity::IcodeSlixL),
    (0x08..=0x0B, ChipIdentity::IcodeSlix2),
    (0x18..=0x18, ChipIdentity::IcodeDna),
    (0x50..=0x5F, ChipIdentity::Ntag5Link),
];

pub fn by_block_count(blocks: u16) -> Option<ChipIdentity> {
    MEMORY_BANDS
        .iter()
        .find(|(band, _)| band.contains(&blocks))
        .map(|(_, identity)| *identity)
}

pub fn by_ic_reference(ic_reference: u8) -> Option<ChipIdentity> {
    IC_REFERENCES
        .iter()
        .find(|(range, _)| range.contains(&ic_reference))
        .map(|(_, identity)| *identity)
}

/// Resolve an NXP ISO 15693 tag from its system information.
///
/// | IC reference | Memory  | Result                   |
/// |--------------|---------|--------------------------|
/// | known        | in band | memory band, High        |
/// | known        | none    | IC reference, High       |
/// | unknown/none | in band | memory band, Medium      |
/// | anything     | no band | `Iso15693Unknown`, Low   |
pub fn resolve(ic_reference: Option<u8>, block_count: Option<u16>) -> (ChipIdentity, Confidence) {
    let by_ic = ic_reference.and_then(by_ic_reference);
    let by_memory = block_count.and_then(by_block_count);
    match (by_ic, by_memory) {
        (Some(_), Some(identity)) => (identity, Confidence::High),
        (Some(identity), None) if block_count.is_none() => (identity, Confidence::High),
        (None, Some(identity)) => (identity, Confidence::Medium),
        _ => (ChipIdentity::Iso15693Unknown, Confidence::Low),
    }
}

/// Resolve a tag whose block count only gives a lower bound.
///
/// The memory bands cannot be used, so a known IC reference resolves at
/// Medium and anything else stays unknown.
pub fn resolve_at_least(ic_reference: Option<u8>) -> (ChipIdentity, Confidence) {
    match ic_reference.and_then(by_ic_reference) {
        Some(identity) => (identity, Confidence::Medium),
        None => (ChipIdentity::Iso15693Unknown, Confidence::Low),
    }
}

/// Whether a display-order UID carries the NXP manufacturer code.
pub fn is_nxp_uid(uid: &[u8]) -> bool {
    uid.get(UID_MANUFACTURER_INDEX) == Some(&VENDOR_NXP)
}

// ============================================================================
// Temperature-sensing implants
// ============================================================================

/// DSFID/AFI pair that marks an NTAG 5 implant with an I2C temperature
/// sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSignature {
    pub dsfid: u8,
    pub afi: u8,
    pub label: &'static str,
}

pub const SENSOR_SIGNATURES: &[SensorSignature] = &[SensorSignature {
    dsfid: 0xC2,
    afi: 0x54,
    label: "Temperature-sensing implant",
}];

pub fn sensor_signature(dsfid: Option<u8>, afi: Option<u8>) -> Option<&'static SensorSignature> {
    let (dsfid, afi) = (dsfid?, afi?);
    SENSOR_SIGNATURES
        .iter()
        .find(|signature| signature.dsfid == dsfid && signature.afi == afi)
}

/// Supported I2C temperature sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// 16-bit two's complement, 7.8125 m°C per LSB.
    Tmp117,
    /// 13-bit sign-magnitude in the low bits, 1/16 °C per LSB.
    Mcp9808,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSlot {
    pub kind: SensorKind,
    /// 7-bit I2C address.
    pub address: u8,
    /// Temperature register pointer.
    pub register: u8,
}

/// Addresses probed on a sensing implant, primary first.
pub const SENSOR_SLOTS: &[SensorSlot] = &[
    SensorSlot {
        kind: SensorKind::Tmp117,
        address: 0x48,
        register: 0x00,
    },
    SensorSlot {
        kind: SensorKind::Tmp117,
        address: 0x49,
        register: 0x00,
    },
    SensorSlot {
        kind: SensorKind::Mcp9808,
        address: 0x18,
        register: 0x05,
    },
];

/// Raw value a TMP117 returns before its first conversion completes.
pub const TMP117_RESET_SENTINEL: u16 = 0x8000;

/// Plausible implant temperature range in °C.
pub const PLAUSIBLE_CELSIUS: RangeInclusive<f32> = -40.0..=125.0;

impl SensorKind {
    /// Convert a raw register value, or `None` for a sentinel.
    pub fn celsius(self, raw: u16) -> Option<f32> {
        match self {
            SensorKind::Tmp117 => {
                if raw == TMP117_RESET_SENTINEL {
                    return None;
                }
                Some(raw as i16 as f32 * 0.0078125)
            }
            SensorKind::Mcp9808 => {
                let magnitude = (raw & 0x0FFF) as f32 / 16.0;
                if raw & 0x1000 != 0 {
                    Some(magnitude - 256.0)
                } else {
                    Some(magnitude)
                }
            }
        }
    }
}
