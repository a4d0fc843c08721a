//! Compiled-in product catalog.

use std::collections::HashMap;

use chipscope_core::{ChipFamily, ChipIdentity};
use once_cell::sync::Lazy;
use serde::Serialize;

use ChipIdentity::*;

/// A product the matcher can recommend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Stable identifier.
    pub id: &'static str,
    pub name: &'static str,

    /// Family the product belongs to for family matching.
    pub family: ChipFamily,

    /// Chips the product ships with.
    pub chips: &'static [ChipIdentity],

    /// Source chips whose data can be written onto this product.
    pub clone_sources: &'static [ChipIdentity],

    /// UID length the product can take on when cloning, if fixed.
    pub clone_uid_length: Option<usize>,

    /// DESFire EV generation of the product's chip.
    pub desfire_ev: Option<u8>,

    /// Can carry a payment applet.
    pub payment: bool,

    pub notes: &'static str,
}

impl Product {
    pub fn is_native(&self, identity: ChipIdentity) -> bool {
        self.chips.contains(&identity)
    }

    /// Whether a chip with this identity and UID length can be cloned here.
    pub fn accepts_clone_of(&self, identity: ChipIdentity, uid_length: usize) -> bool {
        self.clone_sources.contains(&identity)
            && self.clone_uid_length.is_none_or(|length| length == uid_length)
    }
}

const TYPE2_CLONE_SOURCES: &[ChipIdentity] = &[
    Ntag213,
    Ntag215,
    Ntag216,
    UltralightOriginal,
    UltralightEv1Mf0ul11,
    UltralightEv1Mf0ul21,
];

const CLASSIC_CLONE_SOURCES: &[ChipIdentity] = &[MifareClassicMini, MifareClassic1k, MifareClassic4k];

const ISO15693_CLONE_SOURCES: &[ChipIdentity] = &[IcodeSlix, IcodeSlixS, IcodeSlixL];

/// Every product, in display order.
pub static PRODUCTS: &[Product] = &[
    Product {
        id: "xnt",
        name: "xNT",
        family: ChipFamily::Ntag,
        chips: &[Ntag216],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "2x12mm glass implant",
    },
    Product {
        id: "next",
        name: "NExT",
        family: ChipFamily::Ntag,
        chips: &[Ntag216],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "Dual-frequency glass implant; the 125kHz side is not assessed",
    },
    Product {
        id: "flexnt",
        name: "flexNT",
        family: ChipFamily::Ntag,
        chips: &[Ntag216],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "Flexible implant with a larger antenna",
    },
    Product {
        id: "flexmn",
        name: "flexMN",
        family: ChipFamily::Ntag,
        chips: &[],
        clone_sources: TYPE2_CLONE_SOURCES,
        clone_uid_length: Some(7),
        desfire_ev: None,
        payment: false,
        notes: "Magic NTAG with a writable UID",
    },
    Product {
        id: "xsiid",
        name: "xSIID",
        family: ChipFamily::Ntag,
        chips: &[NtagI2cPlus1k],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "Glass implant with an LED driven from the I2C interface",
    },
    Product {
        id: "xm1",
        name: "xM1",
        family: ChipFamily::MifareClassic,
        chips: &[MifareClassic1k],
        clone_sources: CLASSIC_CLONE_SOURCES,
        clone_uid_length: Some(4),
        desfire_ev: None,
        payment: false,
        notes: "Gen1a magic MIFARE Classic 1K, 4-byte UID",
    },
    Product {
        id: "flexm1",
        name: "flexM1",
        family: ChipFamily::MifareClassic,
        chips: &[MifareClassic1k],
        clone_sources: CLASSIC_CLONE_SOURCES,
        clone_uid_length: Some(4),
        desfire_ev: None,
        payment: false,
        notes: "Gen1a magic MIFARE Classic 1K, 4-byte UID, flexible",
    },
    Product {
        id: "flexm1-7b",
        name: "flexM1 7-byte",
        family: ChipFamily::MifareClassic,
        chips: &[MifareClassic1k],
        clone_sources: CLASSIC_CLONE_SOURCES,
        clone_uid_length: Some(7),
        desfire_ev: None,
        payment: false,
        notes: "Gen2 magic MIFARE Classic 1K, 7-byte UID",
    },
    Product {
        id: "xdf2",
        name: "xDF2",
        family: ChipFamily::MifareDesfire,
        chips: &[DesfireEv2],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: Some(2),
        payment: false,
        notes: "DESFire EV2 8K glass implant",
    },
    Product {
        id: "flexdf2",
        name: "flexDF2",
        family: ChipFamily::MifareDesfire,
        chips: &[DesfireEv2],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: Some(2),
        payment: false,
        notes: "DESFire EV2 8K flexible implant",
    },
    Product {
        id: "xslx",
        name: "xSLX",
        family: ChipFamily::Iso15693,
        chips: &[IcodeSlix2],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "ICODE SLIX2 glass implant",
    },
    Product {
        id: "flexslx",
        name: "flexSLX",
        family: ChipFamily::Iso15693,
        chips: &[IcodeSlix2],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "ICODE SLIX2 flexible implant",
    },
    Product {
        id: "magic-slix",
        name: "Magic SLIX",
        family: ChipFamily::Iso15693,
        chips: &[],
        clone_sources: ISO15693_CLONE_SOURCES,
        clone_uid_length: Some(8),
        desfire_ev: None,
        payment: false,
        notes: "UID-changeable ISO15693 tag",
    },
    Product {
        id: "spark2",
        name: "Spark 2",
        family: ChipFamily::Iso15693,
        chips: &[IcodeDna],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "ICODE DNA cryptobionic implant",
    },
    Product {
        id: "flexsense",
        name: "flexSense",
        family: ChipFamily::Iso15693,
        chips: &[Ntag5Link],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "NTAG 5 implant with a bridged temperature sensor",
    },
    Product {
        id: "apex-flex",
        name: "Apex Flex",
        family: ChipFamily::JavaCard,
        chips: &[Jcop4],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "JCOP4 JavaCard implant for FIDO, OpenPGP and OTP applets",
    },
    Product {
        id: "flexsecure",
        name: "flexSecure",
        family: ChipFamily::JavaCard,
        chips: &[Jcop4],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: false,
        notes: "JCOP4 JavaCard flexible implant",
    },
    Product {
        id: "walletmor",
        name: "Walletmor",
        family: ChipFamily::JavaCard,
        chips: &[],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: true,
        notes: "Payment implant issued with its own card account",
    },
    Product {
        id: "payment-conversion",
        name: "Payment conversion",
        family: ChipFamily::JavaCard,
        chips: &[],
        clone_sources: &[],
        clone_uid_length: None,
        desfire_ev: None,
        payment: true,
        notes: "Card chip and antenna re-housed into a flexible implant",
    },
];

static BY_ID: Lazy<HashMap<&'static str, &'static Product>> =
    Lazy::new(|| PRODUCTS.iter().map(|product| (product.id, product)).collect());

/// Look a product up by identifier.
pub fn product(id: &str) -> Option<&'static Product> {
    BY_ID.get(id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = PRODUCTS.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), PRODUCTS.len());
    }

    #[test]
    fn test_native_chips_belong_to_product_family() {
        for product in PRODUCTS {
            for chip in product.chips {
                assert_eq!(chip.family(), product.family, "{}", product.id);
            }
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(product("xm1").map(|p| p.name), Some("xM1"));
        assert!(product("nope").is_none());
    }

    #[test]
    fn test_clone_uid_length() {
        let xm1 = product("xm1").unwrap();
        assert!(xm1.accepts_clone_of(MifareClassic1k, 4));
        assert!(!xm1.accepts_clone_of(MifareClassic1k, 7));
        assert!(!xm1.accepts_clone_of(Ntag216, 4));
    }
}
