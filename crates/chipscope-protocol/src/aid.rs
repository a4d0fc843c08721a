//! Well-known application identifiers used for applet-presence probing.

use bytes::Bytes;
use chipscope_core::AppletCategory;

use crate::apdu::{Apdu, CLA_ISO, INS_SELECT};

/// Applications the detectors know how to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownAid {
    // Card managers
    GlobalPlatformIsd,
    OpenPlatformCardManager,

    // Cryptographic / identity applets
    Piv,
    OpenPgp,
    FidoU2f,
    YubicoOtp,

    // Payment networks
    Visa,
    Mastercard,
    Maestro,
    AmericanExpress,
    Discover,
    Jcb,
    UnionPay,
    Interac,

    // Vendor / platform
    MemoryManager,
    FidesmoPlatform,

    Ndef,
}

impl WellKnownAid {
    /// Card managers, tried in order before reading CPLC.
    pub const CARD_MANAGERS: [WellKnownAid; 2] = [
        WellKnownAid::GlobalPlatformIsd,
        WellKnownAid::OpenPlatformCardManager,
    ];

    /// Applets probed for presence, in probe order.
    pub const PROBE_SET: [WellKnownAid; 15] = [
        WellKnownAid::MemoryManager,
        WellKnownAid::FidesmoPlatform,
        WellKnownAid::Piv,
        WellKnownAid::OpenPgp,
        WellKnownAid::FidoU2f,
        WellKnownAid::YubicoOtp,
        WellKnownAid::Ndef,
        WellKnownAid::Visa,
        WellKnownAid::Mastercard,
        WellKnownAid::Maestro,
        WellKnownAid::AmericanExpress,
        WellKnownAid::Discover,
        WellKnownAid::Jcb,
        WellKnownAid::UnionPay,
        WellKnownAid::Interac,
    ];

    /// Raw AID bytes.
    pub fn aid(self) -> &'static [u8] {
        match self {
            WellKnownAid::GlobalPlatformIsd => &[0xA0, 0x00, 0x00, 0x01, 0x51, 0x00, 0x00, 0x00],
            WellKnownAid::OpenPlatformCardManager => {
                &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00]
            }
            WellKnownAid::Piv => &[0xA0, 0x00, 0x00, 0x03, 0x08, 0x00, 0x00, 0x10, 0x00, 0x01, 0x00],
            WellKnownAid::OpenPgp => &[0xD2, 0x76, 0x00, 0x01, 0x24, 0x01],
            WellKnownAid::FidoU2f => &[0xA0, 0x00, 0x00, 0x06, 0x47, 0x2F, 0x00, 0x01],
            WellKnownAid::YubicoOtp => &[0xA0, 0x00, 0x00, 0x05, 0x27, 0x20, 0x01],
            WellKnownAid::Visa => &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10],
            WellKnownAid::Mastercard => &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10],
            WellKnownAid::Maestro => &[0xA0, 0x00, 0x00, 0x00, 0x04, 0x30, 0x60],
            WellKnownAid::AmericanExpress => &[0xA0, 0x00, 0x00, 0x00, 0x25, 0x01],
            WellKnownAid::Discover => &[0xA0, 0x00, 0x00, 0x01, 0x52, 0x30, 0x10],
            WellKnownAid::Jcb => &[0xA0, 0x00, 0x00, 0x00, 0x65, 0x10, 0x10],
            WellKnownAid::UnionPay => &[0xA0, 0x00, 0x00, 0x03, 0x33, 0x01, 0x01],
            WellKnownAid::Interac => &[0xA0, 0x00, 0x00, 0x02, 0x77, 0x10, 0x10],
            WellKnownAid::MemoryManager => &[
                0xA0, 0x00, 0x00, 0x08, 0x46, 0x6D, 0x65, 0x6D, 0x6F, 0x72, 0x79, 0x01,
            ],
            WellKnownAid::FidesmoPlatform => &[0xA0, 0x00, 0x00, 0x06, 0x17, 0x02, 0x00, 0x01, 0x01],
            WellKnownAid::Ndef => &[0xD2, 0x76, 0x00, 0x00, 0x85, 0x01, 0x01],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WellKnownAid::GlobalPlatformIsd => "GlobalPlatform Issuer Security Domain",
            WellKnownAid::OpenPlatformCardManager => "OpenPlatform Card Manager",
            WellKnownAid::Piv => "PIV",
            WellKnownAid::OpenPgp => "OpenPGP",
            WellKnownAid::FidoU2f => "FIDO U2F",
            WellKnownAid::YubicoOtp => "OTP",
            WellKnownAid::Visa => "Visa",
            WellKnownAid::Mastercard => "Mastercard",
            WellKnownAid::Maestro => "Maestro",
            WellKnownAid::AmericanExpress => "American Express",
            WellKnownAid::Discover => "Discover",
            WellKnownAid::Jcb => "JCB",
            WellKnownAid::UnionPay => "UnionPay",
            WellKnownAid::Interac => "Interac",
            WellKnownAid::MemoryManager => "JavaCard Memory Manager",
            WellKnownAid::FidesmoPlatform => "Fidesmo Platform",
            WellKnownAid::Ndef => "NFC Forum NDEF",
        }
    }

    pub fn category(self) -> AppletCategory {
        match self {
            WellKnownAid::GlobalPlatformIsd | WellKnownAid::OpenPlatformCardManager => {
                AppletCategory::CardManager
            }
            WellKnownAid::Piv
            | WellKnownAid::OpenPgp
            | WellKnownAid::FidoU2f
            | WellKnownAid::YubicoOtp => AppletCategory::Identity,
            WellKnownAid::Visa
            | WellKnownAid::Mastercard
            | WellKnownAid::Maestro
            | WellKnownAid::AmericanExpress
            | WellKnownAid::Discover
            | WellKnownAid::Jcb
            | WellKnownAid::UnionPay
            | WellKnownAid::Interac => AppletCategory::Payment,
            WellKnownAid::MemoryManager => AppletCategory::MemoryManagement,
            WellKnownAid::FidesmoPlatform => AppletCategory::PlatformDiscovery,
            WellKnownAid::Ndef => AppletCategory::Ndef,
        }
    }

    pub fn is_payment(self) -> bool {
        self.category() == AppletCategory::Payment
    }

    /// SELECT command for this application.
    pub fn select(self) -> Apdu {
        // Registry AIDs are all within the SELECT length bounds.
        Apdu {
            data: Bytes::from_static(self.aid()),
            ..Apdu::new(CLA_ISO, INS_SELECT, 0x04, 0x00)
        }
        .with_le(0x00)
    }

    /// Reverse lookup by AID bytes.
    pub fn from_aid(aid: &[u8]) -> Option<WellKnownAid> {
        Self::CARD_MANAGERS
            .iter()
            .chain(Self::PROBE_SET.iter())
            .copied()
            .find(|known| known.aid() == aid)
    }
}
