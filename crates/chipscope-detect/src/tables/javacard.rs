//! JavaCard platform tables: CPLC decoding and historical-byte patterns.

use chipscope_core::constants::{CPLC_FABRICATOR_INFINEON, CPLC_FABRICATOR_NXP};
use chipscope_core::{ChipIdentity, Confidence, Error, Result};

/// GET DATA tag of the CPLC block.
pub const CPLC_TAG: u16 = 0x9F7F;

/// CPLC body length.
pub const CPLC_LEN: usize = 42;

/// Mask applied to the OS identifier before matching.
pub const OS_ID_MASK: u16 = 0xFF00;

/// Card Production Life Cycle data (the fields used for identification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cplc {
    pub ic_fabricator: u16,
    pub ic_type: u16,
    pub os_id: u16,
    pub os_release_date: u16,
    pub os_release_level: u16,
    pub ic_serial: u32,
}

impl Cplc {
    /// Decode a GET DATA payload, with or without the `9F 7F len` header.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than the 42 CPLC bytes are present.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let [tag_hi, tag_lo] = CPLC_TAG.to_be_bytes();
        let body = match payload {
            [hi, lo, _len, rest @ ..] if *hi == tag_hi && *lo == tag_lo => rest,
            other => other,
        };
        if body.len() < CPLC_LEN {
            return Err(Error::short(CPLC_LEN, body.len()));
        }
        let word = |at: usize| u16::from_be_bytes([body[at], body[at + 1]]);
        Ok(Self {
            ic_fabricator: word(0),
            ic_type: word(2),
            os_id: word(4),
            os_release_date: word(6),
            os_release_level: word(8),
            ic_serial: u32::from_be_bytes([body[12], body[13], body[14], body[15]]),
        })
    }

    pub fn fabricator_name(&self) -> &'static str {
        match self.ic_fabricator {
            CPLC_FABRICATOR_NXP => "NXP",
            CPLC_FABRICATOR_INFINEON => "Infineon",
            _ => "unknown fabricator",
        }
    }

    /// Platform selected by fabricator and masked OS identifier.
    pub fn platform(&self) -> (ChipIdentity, Confidence) {
        if self.ic_fabricator != CPLC_FABRICATOR_NXP {
            return (ChipIdentity::JavaCardUnknown, Confidence::Medium);
        }
        match self.os_id & OS_ID_MASK {
            0xD300 => (ChipIdentity::Jcop4, Confidence::High),
            0x8200 => (ChipIdentity::Jcop3, Confidence::High),
            _ => (ChipIdentity::JavaCardUnknown, Confidence::Medium),
        }
    }
}

/// ASCII patterns in historical bytes, most specific first.
pub const HISTORICAL_PATTERNS: &[(&str, ChipIdentity, &str)] = &[
    ("JCOP4", ChipIdentity::Jcop4, "JCOP4"),
    ("JCOP3", ChipIdentity::Jcop3, "JCOP3"),
    ("JCOP", ChipIdentity::JavaCardUnknown, "JCOP"),
];

/// Match historical bytes against the JCOP patterns.
pub fn match_historical(historical: &[u8]) -> Option<(ChipIdentity, &'static str)> {
    HISTORICAL_PATTERNS
        .iter()
        .find(|(pattern, _, _)| {
            historical
                .windows(pattern.len())
                .any(|window| window == pattern.as_bytes())
        })
        .map(|(_, identity, label)| (*identity, *label))
}
