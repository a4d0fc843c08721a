//! DESFire command-set version tables.
//!
//! Four product lines answer the DESFire GetVersion command: DESFire proper,
//! DESFire Light, the NTAG DNA line and MIFARE Plus. Product type picks the
//! line. Within DESFire the hardware major byte picks the EV generation,
//! with a range inference when the exact byte is new; within NTAG DNA the
//! subtype byte is authoritative.

use chipscope_core::{ChipIdentity, Confidence};

pub const PRODUCT_DESFIRE: u8 = 0x01;
pub const PRODUCT_MIFARE_PLUS: u8 = 0x02;
pub const PRODUCT_NTAG_DNA: u8 = 0x04;
pub const PRODUCT_DESFIRE_LIGHT: u8 = 0x08;

/// DESFire hosted in an I2C-bridged secure element.
pub const PRODUCT_DESFIRE_HOSTED: u8 = 0x81;

/// Product line selected by the product-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductLine {
    Desfire,
    DesfireLight,
    NtagDna,
    MifarePlus,
}

pub fn product_line(product_type: u8) -> Option<ProductLine> {
    match product_type {
        PRODUCT_DESFIRE | PRODUCT_DESFIRE_HOSTED => Some(ProductLine::Desfire),
        PRODUCT_DESFIRE_LIGHT => Some(ProductLine::DesfireLight),
        PRODUCT_NTAG_DNA => Some(ProductLine::NtagDna),
        PRODUCT_MIFARE_PLUS => Some(ProductLine::MifarePlus),
        _ => None,
    }
}

/// DESFire EV generation from the hardware major version.
///
/// Known bytes resolve at High confidence. Unlisted bytes fall back to the
/// generation ranges at Medium; anything beyond them is
/// [`ChipIdentity::DesfireUnknown`] at Low.
pub fn desfire_generation(major: u8) -> (ChipIdentity, Confidence) {
    match major {
        0x00 => (ChipIdentity::DesfireEv0, Confidence::High),
        0x01 => (ChipIdentity::DesfireEv1, Confidence::High),
        0x12 | 0x22 => (ChipIdentity::DesfireEv2, Confidence::High),
        0x30 | 0x33 => (ChipIdentity::DesfireEv3, Confidence::High),
        0x02..=0x0F => (ChipIdentity::DesfireEv1, Confidence::Medium),
        0x10..=0x2F => (ChipIdentity::DesfireEv2, Confidence::Medium),
        0x31..=0x3F => (ChipIdentity::DesfireEv3, Confidence::Medium),
        _ => (ChipIdentity::DesfireUnknown, Confidence::Low),
    }
}

/// NTAG DNA variant from the subtype byte.
pub fn dna_variant(subtype: u8) -> Option<ChipIdentity> {
    match subtype {
        0x02 => Some(ChipIdentity::Ntag413Dna),
        0x05 => Some(ChipIdentity::Ntag424Dna),
        0x08 => Some(ChipIdentity::Ntag424DnaTagTamper),
        _ => None,
    }
}

/// MIFARE Plus generation from the hardware major version.
pub fn plus_generation(major: u8) -> ChipIdentity {
    match major {
        0x01 => ChipIdentity::MifarePlusX,
        0x11 => ChipIdentity::MifarePlusEv1,
        0x22 => ChipIdentity::MifarePlusEv2,
        _ => ChipIdentity::MifarePlusUnknown,
    }
}

/// Decoded storage-size byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSize {
    pub bytes: u32,
    /// Decoded by rule; the real size lies between `bytes` and twice that.
    pub approximate: bool,
}

/// Decode a storage-size byte.
///
/// Listed codes are exact. Other codes follow the NXP rule: the upper seven
/// bits are a power of two, and a set low bit means "more than that".
pub fn storage_size(code: u8) -> Option<StorageSize> {
    let exact = match code {
        0x0F => Some(256),
        0x11 => Some(512),
        0x13 => Some(1024),
        0x16 => Some(2 * 1024),
        0x18 => Some(4 * 1024),
        0x1A => Some(8 * 1024),
        0x1C => Some(16 * 1024),
        0x1E => Some(32 * 1024),
        _ => None,
    };
    if let Some(bytes) = exact {
        return Some(StorageSize {
            bytes,
            approximate: false,
        });
    }
    let exponent = u32::from(code >> 1);
    1u32.checked_shl(exponent).map(|bytes| StorageSize {
        bytes,
        approximate: true,
    })
}

// ============================================================================
// ATS signatures (fallback when GetVersion is unavailable)
// ============================================================================

/// What an ATS signature points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtsSignature {
    /// ATS without the TL byte: T0, interface bytes, historical bytes.
    pub body: &'static [u8],
    pub identity: ChipIdentity,
    pub label: &'static str,
}

pub const ATS_SIGNATURES: &[AtsSignature] = &[
    AtsSignature {
        body: &[0x75, 0x77, 0x81, 0x02, 0x80],
        identity: ChipIdentity::DesfireUnknown,
        label: "MIFARE DESFire",
    },
    AtsSignature {
        body: &[0x77, 0x77, 0x71, 0x02, 0x80],
        identity: ChipIdentity::NtagDnaUnknown,
        label: "NTAG DNA",
    },
    AtsSignature {
        body: &[0x78, 0x77, 0x71, 0x02, 0x80],
        identity: ChipIdentity::DesfireLight,
        label: "MIFARE DESFire Light",
    },
];

/// SAK and ATQA DESFire cards report when the ATS is unavailable.
pub const DESFIRE_SAK: u8 = 0x20;
pub const DESFIRE_ATQA: u16 = 0x0344;

/// Match an ATS body against the signature list.
pub fn match_ats(body: &[u8]) -> Option<&'static AtsSignature> {
    ATS_SIGNATURES
        .iter()
        .find(|signature| body.starts_with(signature.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00, ChipIdentity::DesfireEv0, Confidence::High)]
    #[case(0x01, ChipIdentity::DesfireEv1, Confidence::High)]
    #[case(0x12, ChipIdentity::DesfireEv2, Confidence::High)]
    #[case(0x22, ChipIdentity::DesfireEv2, Confidence::High)]
    #[case(0x33, ChipIdentity::DesfireEv3, Confidence::High)]
    #[case(0x30, ChipIdentity::DesfireEv3, Confidence::High)]
    #[case(0x05, ChipIdentity::DesfireEv1, Confidence::Medium)]
    #[case(0x1A, ChipIdentity::DesfireEv2, Confidence::Medium)]
    #[case(0x3C, ChipIdentity::DesfireEv3, Confidence::Medium)]
    #[case(0x42, ChipIdentity::DesfireUnknown, Confidence::Low)]
    fn test_desfire_generation(
        #[case] major: u8,
        #[case] identity: ChipIdentity,
        #[case] confidence: Confidence,
    ) {
        assert_eq!(desfire_generation(major), (identity, confidence));
    }

    #[test]
    fn test_range_inference_never_outranks_exact() {
        for major in 0..=u8::MAX {
            let (identity, confidence) = desfire_generation(major);
            let exact = matches!(major, 0x00 | 0x01 | 0x12 | 0x22 | 0x30 | 0x33);
            if !exact {
                assert!(confidence < Confidence::High, "{major:#04x} -> {identity:?}");
            }
        }
    }

    #[rstest]
    #[case(0x02, Some(ChipIdentity::Ntag413Dna))]
    #[case(0x05, Some(ChipIdentity::Ntag424Dna))]
    #[case(0x08, Some(ChipIdentity::Ntag424DnaTagTamper))]
    #[case(0x03, None)]
    fn test_dna_variant(#[case] subtype: u8, #[case] expected: Option<ChipIdentity>) {
        assert_eq!(dna_variant(subtype), expected);
    }

    #[rstest]
    #[case(0x01, ChipIdentity::MifarePlusX)]
    #[case(0x11, ChipIdentity::MifarePlusEv1)]
    #[case(0x22, ChipIdentity::MifarePlusEv2)]
    #[case(0x07, ChipIdentity::MifarePlusUnknown)]
    fn test_plus_generation(#[case] major: u8, #[case] expected: ChipIdentity) {
        assert_eq!(plus_generation(major), expected);
    }

    #[rstest]
    #[case(0x18, 4096, false)]
    #[case(0x1A, 8192, false)]
    #[case(0x13, 1024, false)]
    #[case(0x14, 1024, true)]
    #[case(0x17, 2048, true)]
    fn test_storage_size(#[case] code: u8, #[case] bytes: u32, #[case] approximate: bool) {
        assert_eq!(storage_size(code), Some(StorageSize { bytes, approximate }));
    }

    #[test]
    fn test_storage_size_out_of_range() {
        assert_eq!(storage_size(0x40), None);
        assert_eq!(storage_size(0xFF), None);
    }

    #[test]
    fn test_ats_signatures() {
        assert_eq!(
            match_ats(&[0x78, 0x77, 0x71, 0x02, 0x80]).map(|s| s.identity),
            Some(ChipIdentity::DesfireLight)
        );
        assert_eq!(match_ats(&[0x75, 0x77, 0x81, 0x02, 0x80, 0x00]).map(|s| s.label), Some("MIFARE DESFire"));
        assert_eq!(
            match_ats(&[0x77, 0x77, 0x71, 0x02, 0x80]).map(|s| s.identity),
            Some(ChipIdentity::NtagDnaUnknown)
        );
        assert!(match_ats(&[0x78, 0x80, 0x70, 0x02]).is_none());
    }

    #[test]
    fn test_product_lines() {
        assert_eq!(product_line(0x81), Some(ProductLine::Desfire));
        assert_eq!(product_line(0x04), Some(ProductLine::NtagDna));
        assert_eq!(product_line(0x10), None);
    }
}
