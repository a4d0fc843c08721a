//! SAK-swap anomaly analyzer.
//!
//! Flags readings whose SAK, ATQA and ATS cannot all come from one factory
//! chip. The diagnostic rides next to the identity and never replaces it.

use chipscope_core::{AnomalyKind, Confidence, RawTagReading, SakSwapAnomaly};

use super::classic::identity_for_sak;

/// SAK/ATQA pairs genuine Classic-compatible silicon reports.
pub const FACTORY_COMBINATIONS: &[(u8, u16)] = &[
    (0x08, 0x0004),
    (0x08, 0x0044),
    (0x18, 0x0002),
    (0x18, 0x0042),
    (0x09, 0x0004),
    (0x88, 0x0004),
    (0x28, 0x0004),
    (0x38, 0x0002),
];

/// Historical-byte prefix of MIFARE Plus / upgradable security chips.
const UPGRADABLE_PREFIX: [u8; 2] = [0xC1, 0x05];

/// Analyze a reading. Returns `None` when it is internally consistent.
pub fn analyze(reading: &RawTagReading) -> Option<SakSwapAnomaly> {
    let sak = reading.sak?;
    identity_for_sak(sak)?;

    if reading
        .historical()
        .is_some_and(|historical| historical.starts_with(&UPGRADABLE_PREFIX))
    {
        return Some(SakSwapAnomaly {
            kind: AnomalyKind::UpgradableSecurityChip,
            confidence: Confidence::Medium,
            description: format!(
                "SAK {sak:02X} reports MIFARE Classic but the historical bytes identify an upgradable security chip (MIFARE Plus class)"
            ),
        });
    }

    if reading.has_iso_dep() {
        return Some(SakSwapAnomaly {
            kind: AnomalyKind::SakSwap,
            confidence: Confidence::Medium,
            description: format!(
                "SAK {sak:02X} reports MIFARE Classic on a chip that also speaks ISO-DEP; a secure element is emulating Classic"
            ),
        });
    }

    let atqa = reading.atqa?;
    if !FACTORY_COMBINATIONS.contains(&(sak, atqa)) {
        return Some(SakSwapAnomaly {
            kind: AnomalyKind::NonFactoryCombination,
            confidence: Confidence::Low,
            description: format!(
                "SAK {sak:02X} with ATQA {atqa:04X} is not a factory combination; possibly a UID-changeable clone"
            ),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipscope_core::TechCapability;
    use rstest::rstest;

    fn reading() -> RawTagReading {
        RawTagReading::new(vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]).unwrap()
    }

    #[rstest]
    #[case(0x08, 0x0004)]
    #[case(0x08, 0x0044)]
    #[case(0x18, 0x0002)]
    #[case(0x09, 0x0004)]
    fn test_factory_pairs_are_clean(#[case] sak: u8, #[case] atqa: u16) {
        assert_eq!(analyze(&reading().with_sak(sak).with_atqa(atqa)), None);
    }

    #[test]
    fn test_non_factory_pair() {
        let anomaly = analyze(&reading().with_sak(0x08).with_atqa(0x0400)).unwrap();
        assert_eq!(anomaly.kind, AnomalyKind::NonFactoryCombination);
        assert_eq!(anomaly.confidence, Confidence::Low);
    }

    #[test]
    fn test_classic_sak_with_iso_dep() {
        let r = reading()
            .with_sak(0x08)
            .with_atqa(0x0004)
            .with_capability(TechCapability::IsoDep);
        assert_eq!(analyze(&r).unwrap().kind, AnomalyKind::SakSwap);
        assert_eq!(analyze(&reading().with_sak(0x28).with_atqa(0x0004)).unwrap().kind, AnomalyKind::SakSwap);
    }

    #[test]
    fn test_upgradable_security_chip() {
        let r = reading()
            .with_sak(0x18)
            .with_atqa(0x0002)
            .with_historical_bytes(vec![0xC1, 0x05, 0x2F, 0x2F, 0x01, 0xBC, 0xD6]);
        assert_eq!(analyze(&r).unwrap().kind, AnomalyKind::UpgradableSecurityChip);
    }

    #[test]
    fn test_non_classic_sak_is_ignored() {
        assert_eq!(analyze(&reading().with_sak(0x20).with_atqa(0x0344)), None);
        assert_eq!(analyze(&reading().with_sak(0x00).with_atqa(0x0044)), None);
        assert_eq!(analyze(&reading()), None);
    }
}
