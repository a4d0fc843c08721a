//! Chip identities, families and the static cloneability table.
//!
//! [`ChipIdentity`] is a closed set. Every per-identity property (family,
//! label, nominal memory, cloneability) is an exhaustive `match`, so adding a
//! variant without filling in every table is a compile error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse chip family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipFamily {
    /// NTAG and MIFARE Ultralight (NFC Forum Type 2), plus the NTAG DNA line.
    Ntag,
    MifareClassic,
    MifareDesfire,
    MifarePlus,
    Iso15693,
    JavaCard,
    Unknown,
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChipFamily::Ntag => "NTAG",
            ChipFamily::MifareClassic => "MIFARE Classic",
            ChipFamily::MifareDesfire => "MIFARE DESFire",
            ChipFamily::MifarePlus => "MIFARE Plus",
            ChipFamily::Iso15693 => "ISO15693",
            ChipFamily::JavaCard => "JavaCard",
            ChipFamily::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Concrete chip identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipIdentity {
    // NFC Forum Type 2
    Ntag210,
    Ntag212,
    Ntag213,
    Ntag215,
    Ntag216,
    NtagI2c1k,
    NtagI2c2k,
    NtagI2cPlus1k,
    NtagI2cPlus2k,
    UltralightOriginal,
    UltralightEv1Mf0ul11,
    UltralightEv1Mf0ul21,
    Type2Unknown,

    // MIFARE Classic
    MifareClassicMini,
    MifareClassic1k,
    MifareClassic4k,

    // DESFire command set
    DesfireEv0,
    DesfireEv1,
    DesfireEv2,
    DesfireEv3,
    DesfireLight,
    DesfireUnknown,
    Ntag413Dna,
    Ntag424Dna,
    Ntag424DnaTagTamper,
    NtagDnaUnknown,

    // MIFARE Plus
    MifarePlusX,
    MifarePlusEv1,
    MifarePlusEv2,
    MifarePlusUnknown,

    // ISO 15693
    IcodeSlix,
    IcodeSlix2,
    IcodeSlixS,
    IcodeSlixL,
    IcodeDna,
    Ntag5Switch,
    Ntag5Link,
    Ntag5Boost,
    Iso15693Unknown,

    // JavaCard
    Jcop3,
    Jcop4,
    JavaCardUnknown,

    // Terminal fallbacks
    Iso14443aUnknown,
    Iso14443bUnknown,
    Unknown,
}

/// Static cloneability verdict for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cloneability {
    pub cloneable: bool,
    pub note: &'static str,
}

impl Cloneability {
    const fn yes(note: &'static str) -> Self {
        Self {
            cloneable: true,
            note,
        }
    }

    const fn no(note: &'static str) -> Self {
        Self {
            cloneable: false,
            note,
        }
    }
}

impl ChipIdentity {
    /// Every identity, in declaration order.
    pub const ALL: [ChipIdentity; 45] = [
        ChipIdentity::Ntag210,
        ChipIdentity::Ntag212,
        ChipIdentity::Ntag213,
        ChipIdentity::Ntag215,
        ChipIdentity::Ntag216,
        ChipIdentity::NtagI2c1k,
        ChipIdentity::NtagI2c2k,
        ChipIdentity::NtagI2cPlus1k,
        ChipIdentity::NtagI2cPlus2k,
        ChipIdentity::UltralightOriginal,
        ChipIdentity::UltralightEv1Mf0ul11,
        ChipIdentity::UltralightEv1Mf0ul21,
        ChipIdentity::Type2Unknown,
        ChipIdentity::MifareClassicMini,
        ChipIdentity::MifareClassic1k,
        ChipIdentity::MifareClassic4k,
        ChipIdentity::DesfireEv0,
        ChipIdentity::DesfireEv1,
        ChipIdentity::DesfireEv2,
        ChipIdentity::DesfireEv3,
        ChipIdentity::DesfireLight,
        ChipIdentity::DesfireUnknown,
        ChipIdentity::Ntag413Dna,
        ChipIdentity::Ntag424Dna,
        ChipIdentity::Ntag424DnaTagTamper,
        ChipIdentity::NtagDnaUnknown,
        ChipIdentity::MifarePlusX,
        ChipIdentity::MifarePlusEv1,
        ChipIdentity::MifarePlusEv2,
        ChipIdentity::MifarePlusUnknown,
        ChipIdentity::IcodeSlix,
        ChipIdentity::IcodeSlix2,
        ChipIdentity::IcodeSlixS,
        ChipIdentity::IcodeSlixL,
        ChipIdentity::IcodeDna,
        ChipIdentity::Ntag5Switch,
        ChipIdentity::Ntag5Link,
        ChipIdentity::Ntag5Boost,
        ChipIdentity::Iso15693Unknown,
        ChipIdentity::Jcop3,
        ChipIdentity::Jcop4,
        ChipIdentity::JavaCardUnknown,
        ChipIdentity::Iso14443aUnknown,
        ChipIdentity::Iso14443bUnknown,
        ChipIdentity::Unknown,
    ];

    /// Family this identity belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_core::{ChipFamily, ChipIdentity};
    ///
    /// assert_eq!(ChipIdentity::Ntag215.family(), ChipFamily::Ntag);
    /// assert_eq!(ChipIdentity::DesfireEv3.family(), ChipFamily::MifareDesfire);
    /// ```
    pub fn family(self) -> ChipFamily {
        use ChipIdentity::*;
        match self {
            Ntag210 | Ntag212 | Ntag213 | Ntag215 | Ntag216 | NtagI2c1k | NtagI2c2k
            | NtagI2cPlus1k | NtagI2cPlus2k | UltralightOriginal | UltralightEv1Mf0ul11
            | UltralightEv1Mf0ul21 | Type2Unknown | Ntag413Dna | Ntag424Dna
            | Ntag424DnaTagTamper | NtagDnaUnknown => ChipFamily::Ntag,
            MifareClassicMini | MifareClassic1k | MifareClassic4k => ChipFamily::MifareClassic,
            DesfireEv0 | DesfireEv1 | DesfireEv2 | DesfireEv3 | DesfireLight | DesfireUnknown => {
                ChipFamily::MifareDesfire
            }
            MifarePlusX | MifarePlusEv1 | MifarePlusEv2 | MifarePlusUnknown => {
                ChipFamily::MifarePlus
            }
            IcodeSlix | IcodeSlix2 | IcodeSlixS | IcodeSlixL | IcodeDna | Ntag5Switch
            | Ntag5Link | Ntag5Boost | Iso15693Unknown => ChipFamily::Iso15693,
            Jcop3 | Jcop4 | JavaCardUnknown => ChipFamily::JavaCard,
            Iso14443aUnknown | Iso14443bUnknown | Unknown => ChipFamily::Unknown,
        }
    }

    /// Human-readable product name.
    pub fn name(self) -> &'static str {
        use ChipIdentity::*;
        match self {
            Ntag210 => "NTAG210",
            Ntag212 => "NTAG212",
            Ntag213 => "NTAG213",
            Ntag215 => "NTAG215",
            Ntag216 => "NTAG216",
            NtagI2c1k => "NTAG I2C 1K",
            NtagI2c2k => "NTAG I2C 2K",
            NtagI2cPlus1k => "NTAG I2C plus 1K",
            NtagI2cPlus2k => "NTAG I2C plus 2K",
            UltralightOriginal => "MIFARE Ultralight",
            UltralightEv1Mf0ul11 => "MIFARE Ultralight EV1 (MF0UL11)",
            UltralightEv1Mf0ul21 => "MIFARE Ultralight EV1 (MF0UL21)",
            Type2Unknown => "Unknown NFC Type 2 tag",
            MifareClassicMini => "MIFARE Classic Mini",
            MifareClassic1k => "MIFARE Classic 1K",
            MifareClassic4k => "MIFARE Classic 4K",
            DesfireEv0 => "MIFARE DESFire (EV0)",
            DesfireEv1 => "MIFARE DESFire EV1",
            DesfireEv2 => "MIFARE DESFire EV2",
            DesfireEv3 => "MIFARE DESFire EV3",
            DesfireLight => "MIFARE DESFire Light",
            DesfireUnknown => "MIFARE DESFire (unknown version)",
            Ntag413Dna => "NTAG 413 DNA",
            Ntag424Dna => "NTAG 424 DNA",
            Ntag424DnaTagTamper => "NTAG 424 DNA TagTamper",
            NtagDnaUnknown => "NTAG DNA (unknown variant)",
            MifarePlusX => "MIFARE Plus X",
            MifarePlusEv1 => "MIFARE Plus EV1",
            MifarePlusEv2 => "MIFARE Plus EV2",
            MifarePlusUnknown => "MIFARE Plus (unknown version)",
            IcodeSlix => "ICODE SLIX",
            IcodeSlix2 => "ICODE SLIX2",
            IcodeSlixS => "ICODE SLIX-S",
            IcodeSlixL => "ICODE SLIX-L",
            IcodeDna => "ICODE DNA",
            Ntag5Switch => "NTAG 5 Switch",
            Ntag5Link => "NTAG 5 Link",
            Ntag5Boost => "NTAG 5 Boost",
            Iso15693Unknown => "Unknown ISO15693 tag",
            Jcop3 => "JCOP3",
            Jcop4 => "JCOP4",
            JavaCardUnknown => "JavaCard (unknown platform)",
            Iso14443aUnknown => "Unknown ISO14443-A tag",
            Iso14443bUnknown => "Unknown ISO14443-B tag",
            Unknown => "Unknown tag",
        }
    }

    /// Nominal user memory in bytes, where the identity fixes it.
    ///
    /// Identities whose memory varies by order code (DESFire, Plus, JavaCard)
    /// return `None`; detectors fill those in from the tag's own storage byte.
    pub fn nominal_memory(self) -> Option<u32> {
        use ChipIdentity::*;
        let bytes = match self {
            Ntag210 => 48,
            Ntag212 => 128,
            Ntag213 => 144,
            Ntag215 => 504,
            Ntag216 => 888,
            NtagI2c1k => 888,
            NtagI2c2k => 1904,
            NtagI2cPlus1k => 888,
            NtagI2cPlus2k => 1912,
            UltralightOriginal => 48,
            UltralightEv1Mf0ul11 => 48,
            UltralightEv1Mf0ul21 => 128,
            MifareClassicMini => 320,
            MifareClassic1k => 1024,
            MifareClassic4k => 4096,
            DesfireLight => 640,
            Ntag413Dna => 160,
            Ntag424Dna | Ntag424DnaTagTamper => 416,
            IcodeSlix => 112,
            IcodeSlix2 => 320,
            IcodeSlixS => 160,
            IcodeSlixL => 32,
            IcodeDna => 252,
            Ntag5Switch => 512,
            Ntag5Link => 1024,
            Ntag5Boost => 2048,
            Type2Unknown | DesfireEv0 | DesfireEv1 | DesfireEv2 | DesfireEv3
            | DesfireUnknown | NtagDnaUnknown | MifarePlusX | MifarePlusEv1 | MifarePlusEv2
            | MifarePlusUnknown | Iso15693Unknown | Jcop3 | Jcop4 | JavaCardUnknown
            | Iso14443aUnknown | Iso14443bUnknown | Unknown => return None,
        };
        Some(bytes)
    }

    /// DESFire EV generation (0 for the original DESFire), if applicable.
    pub fn desfire_ev_level(self) -> Option<u8> {
        match self {
            ChipIdentity::DesfireEv0 => Some(0),
            ChipIdentity::DesfireEv1 => Some(1),
            ChipIdentity::DesfireEv2 => Some(2),
            ChipIdentity::DesfireEv3 => Some(3),
            _ => None,
        }
    }

    /// True for the "unknown within family" fallbacks.
    pub fn is_generic(self) -> bool {
        use ChipIdentity::*;
        matches!(
            self,
            Type2Unknown
                | DesfireUnknown
                | NtagDnaUnknown
                | MifarePlusUnknown
                | Iso15693Unknown
                | JavaCardUnknown
                | Iso14443aUnknown
                | Iso14443bUnknown
                | Unknown
        )
    }

    /// Static cloneability verdict.
    ///
    /// # Examples
    ///
    /// ```
    /// use chipscope_core::ChipIdentity;
    ///
    /// assert!(ChipIdentity::MifareClassic1k.cloneability().cloneable);
    /// assert!(!ChipIdentity::Ntag424Dna.cloneability().cloneable);
    /// ```
    pub fn cloneability(self) -> Cloneability {
        use ChipIdentity::*;
        match self {
            Ntag210 | Ntag212 | Ntag213 | Ntag215 | Ntag216 => Cloneability::yes(
                "NDEF data copies to any NTAG21x; the UID needs a UID-changeable target",
            ),
            NtagI2c1k | NtagI2c2k | NtagI2cPlus1k | NtagI2cPlus2k => Cloneability::yes(
                "Memory contents copy; the I2C host interface and UID are not reproduced",
            ),
            UltralightOriginal | UltralightEv1Mf0ul11 | UltralightEv1Mf0ul21 => {
                Cloneability::yes("No authentication on user pages; copies to a UID-changeable Ultralight")
            }
            Type2Unknown => Cloneability::no("Unidentified Type 2 tag; memory layout unknown"),
            MifareClassicMini | MifareClassic1k | MifareClassic4k => Cloneability::yes(
                "Sector data copies once keys are known; UID needs a magic Classic target",
            ),
            DesfireEv0 | DesfireEv1 | DesfireEv2 | DesfireEv3 | DesfireLight | DesfireUnknown => {
                Cloneability::no("Application data is protected by AES/3DES keys held by the issuer")
            }
            Ntag413Dna | Ntag424Dna | Ntag424DnaTagTamper | NtagDnaUnknown => Cloneability::no(
                "Secure unique NFC messages are signed with on-chip AES keys",
            ),
            MifarePlusX | MifarePlusEv1 | MifarePlusEv2 | MifarePlusUnknown => Cloneability::no(
                "AES-protected sectors; only security level 1 exposes Classic-compatible data",
            ),
            IcodeSlix | IcodeSlixS | IcodeSlixL => {
                Cloneability::yes("Open block memory; UID requires a UID-changeable ISO15693 target")
            }
            IcodeSlix2 => Cloneability::yes(
                "Open block memory unless password-protected; originality signature does not copy",
            ),
            IcodeDna => Cloneability::no("AES mutual authentication protects memory"),
            Ntag5Switch => Cloneability::yes("Open block memory; the switch output is not reproduced"),
            Ntag5Link | Ntag5Boost => Cloneability::no(
                "Host interface and optional AES protection cannot be reproduced on a copy",
            ),
            Iso15693Unknown => Cloneability::no("Unidentified ISO15693 tag; memory layout unknown"),
            Jcop3 | Jcop4 | JavaCardUnknown => Cloneability::no(
                "Applet keys never leave the secure element",
            ),
            Iso14443aUnknown | Iso14443bUnknown | Unknown => {
                Cloneability::no("Chip not identified; cloneability cannot be assessed")
            }
        }
    }
}

impl fmt::Display for ChipIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
