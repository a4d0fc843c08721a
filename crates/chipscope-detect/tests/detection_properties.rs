//! Property-based tests for detection.
//!
//! These check that lookups never promote inferred results above exact
//! ones, and that the waterfall terminates with a transponder for any
//! reading when the tag answers nothing.

use chipscope_core::{ChipIdentity, Confidence, RawTagReading, TechCapability};
use chipscope_detect::Detector;
use chipscope_detect::detectors::{anomaly, classic};
use chipscope_detect::tables::{desfire, iso15693};
use chipscope_hardware::MockTransport;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn capability_strategy() -> impl Strategy<Value = TechCapability> {
    prop_oneof![
        Just(TechCapability::NfcA),
        Just(TechCapability::NfcB),
        Just(TechCapability::NfcF),
        Just(TechCapability::NfcV),
        Just(TechCapability::IsoDep),
        Just(TechCapability::MifareClassic),
        Just(TechCapability::MifareUltralight),
        Just(TechCapability::Ndef),
    ]
}

/// Arbitrary readings, including contradictory capability sets.
fn reading_strategy() -> impl Strategy<Value = RawTagReading> {
    (
        prop::collection::vec(any::<u8>(), 4..=10),
        prop::option::of(any::<u8>()),
        prop::option::of(any::<u16>()),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..16)),
        prop::collection::vec(capability_strategy(), 0..5),
    )
        .prop_map(|(uid, sak, atqa, ats, capabilities)| {
            let mut reading = RawTagReading::new(uid).unwrap();
            reading.sak = sak;
            reading.atqa = atqa;
            reading.ats = ats;
            for capability in capabilities {
                reading = reading.with_capability(capability);
            }
            reading
        })
}

// ============================================================================
// Confidence ordering
// ============================================================================

/// Exact DESFire hardware-major bytes.
const EXACT_MAJORS: [u8; 6] = [0x00, 0x01, 0x12, 0x22, 0x30, 0x33];

proptest! {
    /// Property: an inferred DESFire generation never outranks the exact
    /// match of the same generation.
    #[test]
    fn prop_desfire_range_never_beats_exact(major in any::<u8>()) {
        let (identity, confidence) = desfire::desfire_generation(major);
        if EXACT_MAJORS.contains(&major) {
            prop_assert_eq!(confidence, Confidence::High);
        } else {
            prop_assert!(confidence <= Confidence::Medium);
            let exact = EXACT_MAJORS
                .iter()
                .map(|m| desfire::desfire_generation(*m))
                .find(|(id, _)| *id == identity);
            if let Some((_, exact_confidence)) = exact {
                prop_assert!(exact_confidence > confidence);
            }
        }
    }

    /// Property: ISO 15693 resolution by memory alone is never High, and
    /// adding a known IC reference never lowers confidence.
    #[test]
    fn prop_iso15693_ic_reference_never_lowers(blocks in 1u16..=600, ic in any::<u8>()) {
        let (_, memory_only) = iso15693::resolve(None, Some(blocks));
        let (_, both) = iso15693::resolve(Some(ic), Some(blocks));
        prop_assert!(memory_only <= Confidence::Medium);
        prop_assert!(both >= memory_only);
    }

    /// Property: the Classic fast path never fires for ISO-DEP tags, and is
    /// High only when SAK or the capacity hint corroborates it.
    #[test]
    fn prop_classic_confidence_tracks_evidence(reading in reading_strategy()) {
        if let Some(t) = classic::detect(&reading) {
            prop_assert!(!reading.has_iso_dep());
            let corroborated = reading.sak.and_then(classic::identity_for_sak).is_some();
            if corroborated {
                prop_assert_eq!(t.confidence, Confidence::High);
            } else {
                prop_assert_eq!(t.confidence, Confidence::Low);
                prop_assert!(reading.has(TechCapability::MifareClassic));
            }
        }
    }

    /// Property: anomalies only ever accompany Classic SAK values.
    #[test]
    fn prop_anomaly_requires_classic_sak(reading in reading_strategy()) {
        if anomaly::analyze(&reading).is_some() {
            prop_assert!(reading.sak.and_then(classic::identity_for_sak).is_some());
        }
    }
}

// ============================================================================
// Waterfall totality
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: with a tag that answers nothing, every reading still ends in
    /// a transponder, and only terminal fallbacks report Low.
    #[test]
    fn prop_waterfall_always_terminates(reading in reading_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (transport, _handle) = MockTransport::new(reading.clone());

        let t = runtime
            .block_on(Detector::default().scan(transport, None))
            .unwrap();

        prop_assert_eq!(&t.reading, &reading);
        if t.identity() == ChipIdentity::Unknown {
            prop_assert_eq!(t.confidence, Confidence::Low);
        }
    }
}
