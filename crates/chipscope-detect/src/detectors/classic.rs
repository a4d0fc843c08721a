//! MIFARE Classic detection from SAK and the platform capacity hint.
//!
//! No frames are exchanged: a Classic tag without ISO-DEP exposes nothing a
//! probe could read without keys.

use chipscope_core::{ChipIdentity, Confidence, RawTagReading, TechCapability, Transponder};
use tracing::debug;

/// Classic identity implied by a SAK value, including vendor aliases.
pub fn identity_for_sak(sak: u8) -> Option<ChipIdentity> {
    match sak {
        0x08 | 0x88 | 0x28 | 0x01 => Some(ChipIdentity::MifareClassic1k),
        0x18 | 0x38 | 0x98 => Some(ChipIdentity::MifareClassic4k),
        0x09 => Some(ChipIdentity::MifareClassicMini),
        _ => None,
    }
}

/// Classic identity implied by the platform's capacity hint.
pub fn identity_for_capacity(bytes: u32) -> Option<ChipIdentity> {
    match bytes {
        320 => Some(ChipIdentity::MifareClassicMini),
        1024 => Some(ChipIdentity::MifareClassic1k),
        4096 => Some(ChipIdentity::MifareClassic4k),
        _ => None,
    }
}

/// Classify a reading as MIFARE Classic.
///
/// Only applies when ISO-DEP is absent. The capacity hint takes priority
/// over SAK. When neither resolves but the platform reports the Classic
/// technology, the tag is reported as a 1K at Low confidence.
pub fn detect(reading: &RawTagReading) -> Option<Transponder> {
    if reading.has_iso_dep() {
        return None;
    }
    let resolved = reading
        .classic_capacity_hint
        .and_then(identity_for_capacity)
        .or_else(|| reading.sak.and_then(identity_for_sak));

    let (identity, confidence) = match resolved {
        Some(identity) => (identity, Confidence::High),
        None if reading.has(TechCapability::MifareClassic) => {
            (ChipIdentity::MifareClassic1k, Confidence::Low)
        }
        None => return None,
    };

    debug!(
        "Classic identity {} from SAK {:02X?} ({} confidence)",
        identity, reading.sak, confidence
    );
    Some(Transponder::builder(identity, confidence, reading.clone()).build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0xDE, 0xAD, 0xBE, 0xEF]).unwrap()
    }

    #[test]
    fn test_sak_08_is_1k_high() {
        let t = detect(&reading().with_sak(0x08)).unwrap();
        assert_eq!(t.identity(), ChipIdentity::MifareClassic1k);
        assert_eq!(t.confidence, Confidence::High);
        assert_eq!(t.memory_bytes, Some(1024));
    }

    #[rstest]
    #[case(0x08, ChipIdentity::MifareClassic1k)]
    #[case(0x88, ChipIdentity::MifareClassic1k)]
    #[case(0x01, ChipIdentity::MifareClassic1k)]
    #[case(0x18, ChipIdentity::MifareClassic4k)]
    #[case(0x98, ChipIdentity::MifareClassic4k)]
    #[case(0x09, ChipIdentity::MifareClassicMini)]
    fn test_sak_aliases(#[case] sak: u8, #[case] expected: ChipIdentity) {
        assert_eq!(detect(&reading().with_sak(sak)).unwrap().identity(), expected);
    }

    #[test]
    fn test_capacity_hint_wins() {
        let t = detect(&reading().with_sak(0x08).with_classic_capacity_hint(4096)).unwrap();
        assert_eq!(t.identity(), ChipIdentity::MifareClassic4k);
    }

    #[test]
    fn test_iso_dep_excludes_classic() {
        assert!(detect(&reading().with_sak(0x28)).is_none());
        assert!(
            detect(&reading().with_sak(0x08).with_capability(TechCapability::IsoDep)).is_none()
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0x10))]
    #[case(Some(0x11))]
    fn test_capability_only_is_low_1k(#[case] sak: Option<u8>) {
        let mut r = reading().with_capability(TechCapability::MifareClassic);
        r.sak = sak;
        let t = detect(&r).unwrap();
        assert_eq!(t.identity(), ChipIdentity::MifareClassic1k);
        assert_eq!(t.confidence, Confidence::Low);
    }

    #[test]
    fn test_capability_with_known_sak_stays_high() {
        let r = reading().with_sak(0x18).with_capability(TechCapability::MifareClassic);
        let t = detect(&r).unwrap();
        assert_eq!(t.identity(), ChipIdentity::MifareClassic4k);
        assert_eq!(t.confidence, Confidence::High);
    }

    #[test]
    fn test_unknown_sak() {
        assert!(detect(&reading().with_sak(0x00)).is_none());
        assert!(detect(&reading()).is_none());
    }
}
