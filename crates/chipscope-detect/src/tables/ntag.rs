//! Type 2 version table (NTAG, NTAG I2C, Ultralight EV1).
//!
//! A GET_VERSION reply is resolved by product type, subtype and storage-size
//! byte. Codes not listed here resolve to `None`; the detector reports that
//! as [`ChipIdentity::Type2Unknown`] rather than guessing the nearest size.

use chipscope_core::{ChipIdentity, VersionBlock};

pub const PRODUCT_ULTRALIGHT: u8 = 0x03;
pub const PRODUCT_NTAG: u8 = 0x04;

/// Subtype of NTAG I2C parts (the others are 0x01 / 0x02).
pub const SUBTYPE_I2C: u8 = 0x05;

/// Hardware major of the NTAG I2C plus generation.
pub const MAJOR_I2C_PLUS: u8 = 0x02;

/// Resolve a version block to a concrete Type 2 identity.
pub fn lookup(block: &VersionBlock) -> Option<ChipIdentity> {
    use ChipIdentity::*;
    let identity = match (block.product_type, block.subtype, block.storage_size) {
        (PRODUCT_NTAG, SUBTYPE_I2C, 0x13) if block.major == MAJOR_I2C_PLUS => NtagI2cPlus1k,
        (PRODUCT_NTAG, SUBTYPE_I2C, 0x15) if block.major == MAJOR_I2C_PLUS => NtagI2cPlus2k,
        (PRODUCT_NTAG, SUBTYPE_I2C, 0x13) => NtagI2c1k,
        (PRODUCT_NTAG, SUBTYPE_I2C, 0x15) => NtagI2c2k,
        (PRODUCT_NTAG, _, 0x0B) => Ntag210,
        (PRODUCT_NTAG, _, 0x0E) => Ntag212,
        (PRODUCT_NTAG, _, 0x0F) => Ntag213,
        (PRODUCT_NTAG, _, 0x11) => Ntag215,
        (PRODUCT_NTAG, _, 0x13) => Ntag216,
        (PRODUCT_ULTRALIGHT, _, 0x0B) => UltralightEv1Mf0ul11,
        (PRODUCT_ULTRALIGHT, _, 0x0E) => UltralightEv1Mf0ul21,
        _ => return None,
    };
    Some(identity)
}

/// First and last user-memory page of a Type 2 identity.
pub fn user_pages(identity: ChipIdentity) -> Option<(u8, u8)> {
    use ChipIdentity::*;
    let last = match identity {
        Ntag210 | UltralightEv1Mf0ul11 | UltralightOriginal => 0x0F,
        Ntag212 | UltralightEv1Mf0ul21 => 0x23,
        Ntag213 => 0x27,
        Ntag215 => 0x81,
        Ntag216 | NtagI2c1k | NtagI2cPlus1k => 0xE1,
        _ => return None,
    };
    Some((0x04, last))
}

/// ASCII markers implant vendors leave in the last user pages, most
/// specific first ("flexNT" contains "xNT").
pub const IMPLANT_MARKERS: &[(&str, &str)] = &[
    ("flexNT", "flexNT"),
    ("flexDF", "flexDF"),
    ("xSIID", "xSIID"),
    ("NExT", "NExT"),
    ("xDF2", "xDF2"),
    ("xNT", "xNT"),
];

/// Find an implant marker in raw page data.
pub fn implant_marker(data: &[u8]) -> Option<&'static str> {
    IMPLANT_MARKERS
        .iter()
        .find(|(marker, _)| {
            data.windows(marker.len())
                .any(|window| window == marker.as_bytes())
        })
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn block(product_type: u8, subtype: u8, major: u8, storage_size: u8) -> VersionBlock {
        VersionBlock::from_bytes([0x04, product_type, subtype, major, 0x00, storage_size, 0x03])
    }

    #[rstest]
    #[case(block(0x04, 0x02, 0x01, 0x0F), Some(ChipIdentity::Ntag213))]
    #[case(block(0x04, 0x02, 0x01, 0x11), Some(ChipIdentity::Ntag215))]
    #[case(block(0x04, 0x02, 0x01, 0x13), Some(ChipIdentity::Ntag216))]
    #[case(block(0x04, 0x01, 0x01, 0x0B), Some(ChipIdentity::Ntag210))]
    #[case(block(0x04, 0x01, 0x01, 0x0E), Some(ChipIdentity::Ntag212))]
    #[case(block(0x04, 0x05, 0x01, 0x13), Some(ChipIdentity::NtagI2c1k))]
    #[case(block(0x04, 0x05, 0x01, 0x15), Some(ChipIdentity::NtagI2c2k))]
    #[case(block(0x04, 0x05, 0x02, 0x13), Some(ChipIdentity::NtagI2cPlus1k))]
    #[case(block(0x04, 0x05, 0x02, 0x15), Some(ChipIdentity::NtagI2cPlus2k))]
    #[case(block(0x03, 0x01, 0x01, 0x0B), Some(ChipIdentity::UltralightEv1Mf0ul11))]
    #[case(block(0x03, 0x01, 0x01, 0x0E), Some(ChipIdentity::UltralightEv1Mf0ul21))]
    #[case(block(0x04, 0x02, 0x01, 0x09), None)]
    #[case(block(0x07, 0x02, 0x01, 0x0F), None)]
    fn test_lookup(#[case] block: VersionBlock, #[case] expected: Option<ChipIdentity>) {
        assert_eq!(lookup(&block), expected);
    }

    #[test]
    fn test_user_pages() {
        assert_eq!(user_pages(ChipIdentity::Ntag216), Some((0x04, 0xE1)));
        assert_eq!(user_pages(ChipIdentity::DesfireEv1), None);
    }

    #[rstest]
    #[case(b"....flexNT......", Some("flexNT"))]
    #[case(b"xNT 2017........", Some("xNT"))]
    #[case(b"..NExT..........", Some("NExT"))]
    #[case(b"\x00\x00\x00\x00", None)]
    fn test_implant_marker(#[case] data: &[u8], #[case] expected: Option<&str>) {
        assert_eq!(implant_marker(data), expected);
    }
}
