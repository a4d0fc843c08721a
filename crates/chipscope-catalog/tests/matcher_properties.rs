//! Property-based tests for the product matcher.

use std::collections::HashSet;

use chipscope_catalog::{Matcher, PRODUCTS, match_transponder};
use chipscope_core::{ChipIdentity, Confidence, RawTagReading, Transponder};
use proptest::prelude::*;

fn identity_strategy() -> impl Strategy<Value = ChipIdentity> {
    prop::sample::select(ChipIdentity::ALL.to_vec())
}

fn transponder_strategy() -> impl Strategy<Value = Transponder> {
    (identity_strategy(), 4usize..=10, any::<bool>()).prop_map(|(identity, uid_length, payment)| {
        let reading = RawTagReading::new(vec![0x04; uid_length]).unwrap();
        let mut builder = Transponder::builder(identity, Confidence::High, reading);
        if payment {
            builder = builder.payment_network("Visa");
        }
        builder.build()
    })
}

proptest! {
    /// Property: a product appears in at most one partition.
    #[test]
    fn prop_partitions_disjoint(t in transponder_strategy()) {
        let result = match_transponder(&t);
        let all: Vec<_> = result
            .exact_matches
            .iter()
            .chain(&result.clone_targets)
            .chain(&result.family_matches)
            .map(|p| p.id)
            .collect();
        let unique: HashSet<_> = all.iter().collect();
        prop_assert_eq!(unique.len(), all.len());
    }

    /// Property: the verdict is the identity's static cloneability entry.
    #[test]
    fn prop_cloneability_copied(t in transponder_strategy()) {
        let result = match_transponder(&t);
        prop_assert_eq!(result.cloneability, t.identity().cloneability());
    }

    /// Property: conversion is recommended exactly when nothing fits as-is,
    /// the chip is not cloneable, or it is a payment instrument.
    #[test]
    fn prop_conversion_rule(t in transponder_strategy()) {
        let result = match_transponder(&t);
        let expected = t.is_payment_instrument()
            || !result.cloneable()
            || (result.exact_matches.is_empty() && result.clone_targets.is_empty());
        prop_assert_eq!(result.conversion_recommended, expected);
    }

    /// Property: non-cloneable chips never get clone targets.
    #[test]
    fn prop_no_clone_targets_without_cloneability(t in transponder_strategy()) {
        let result = match_transponder(&t);
        if !result.cloneable() {
            prop_assert!(result.clone_targets.is_empty());
        }
    }

    /// Property: matching is deterministic.
    #[test]
    fn prop_matching_deterministic(t in transponder_strategy()) {
        let matcher = Matcher::new(PRODUCTS);
        prop_assert_eq!(matcher.match_transponder(&t), matcher.match_transponder(&t));
    }
}
