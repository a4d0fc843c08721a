//! Product matcher.
//!
//! Catalog products are partitioned against a scanned chip in priority
//! order, and each product lands in at most one partition:
//!
//! 1. **Exact**: the product ships with this exact chip.
//! 2. **Clone target**: the chip is cloneable and the product accepts its
//!    data at the chip's UID length.
//! 3. **Family**: the product belongs to the same chip family.
//!
//! A payment instrument only family-matches payment-capable products and
//! always recommends conversion.

use std::fmt;

use chipscope_core::{ChipIdentity, Cloneability, Transponder};
use serde::Serialize;
use tracing::debug;

use crate::catalog::{PRODUCTS, Product};

/// Products compatible with a scanned chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult<'a> {
    pub identity: ChipIdentity,
    pub exact_matches: Vec<&'a Product>,
    pub clone_targets: Vec<&'a Product>,
    pub family_matches: Vec<&'a Product>,

    /// Copied from the identity's static cloneability entry.
    pub cloneability: Cloneability,

    /// No product fits as-is, the chip cannot be cloned, or it is a payment
    /// instrument.
    pub conversion_recommended: bool,
}

impl MatchResult<'_> {
    pub fn cloneable(&self) -> bool {
        self.cloneability.cloneable
    }

    pub fn cloneability_note(&self) -> &'static str {
        self.cloneability.note
    }

    pub fn is_empty(&self) -> bool {
        self.exact_matches.is_empty() && self.clone_targets.is_empty() && self.family_matches.is_empty()
    }
}

/// Advisory warning about a matched product. Never changes the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// The product's DESFire generation is older than the scanned card's.
    DesfireEvMismatch {
        product: &'static str,
        product_ev: u8,
        card_ev: u8,
    },
    /// A Classic 4K card cloned onto a 1K-only product loses sectors.
    ClassicCapacityMismatch { product: &'static str },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::DesfireEvMismatch {
                product,
                product_ev,
                card_ev,
            } => write!(
                f,
                "{product} is DESFire EV{product_ev}; systems relying on EV{card_ev} features may reject it"
            ),
            Advisory::ClassicCapacityMismatch { product } => write!(
                f,
                "{product} holds 1K; sectors 16-39 of the 4K card will not be copied"
            ),
        }
    }
}

/// Matches transponders against a product list.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    products: &'a [Product],
}

impl Default for Matcher<'static> {
    fn default() -> Self {
        Self::new(PRODUCTS)
    }
}

impl<'a> Matcher<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    /// Partition the catalog for a transponder.
    pub fn match_transponder(&self, transponder: &Transponder) -> MatchResult<'a> {
        let identity = transponder.identity();
        let family = transponder.family();
        let cloneability = transponder.cloneability();
        let uid_length = transponder.reading.uid.len();
        let payment = transponder.is_payment_instrument();

        let mut result = MatchResult {
            identity,
            exact_matches: Vec::new(),
            clone_targets: Vec::new(),
            family_matches: Vec::new(),
            cloneability,
            conversion_recommended: false,
        };

        for product in self.products {
            if product.is_native(identity) {
                result.exact_matches.push(product);
            } else if cloneability.cloneable && product.accepts_clone_of(identity, uid_length) {
                result.clone_targets.push(product);
            } else if product.family == family && (!payment || product.payment) {
                result.family_matches.push(product);
            }
        }

        result.conversion_recommended = payment
            || !cloneability.cloneable
            || (result.exact_matches.is_empty() && result.clone_targets.is_empty());

        debug!(
            "Matched {}: {} exact, {} clone targets, {} family, conversion {}",
            identity,
            result.exact_matches.len(),
            result.clone_targets.len(),
            result.family_matches.len(),
            result.conversion_recommended
        );
        result
    }

    /// Warnings for matched products. Computed separately so they never
    /// affect the partition.
    pub fn advisories(&self, transponder: &Transponder, result: &MatchResult<'_>) -> Vec<Advisory> {
        let mut advisories = Vec::new();

        if let Some(card_ev) = transponder.identity().desfire_ev_level() {
            for product in result.exact_matches.iter().chain(&result.family_matches) {
                if let Some(product_ev) = product.desfire_ev.filter(|ev| *ev < card_ev) {
                    advisories.push(Advisory::DesfireEvMismatch {
                        product: product.name,
                        product_ev,
                        card_ev,
                    });
                }
            }
        }

        if transponder.identity() == ChipIdentity::MifareClassic4k {
            for product in &result.clone_targets {
                if !product.is_native(ChipIdentity::MifareClassic4k) {
                    advisories.push(Advisory::ClassicCapacityMismatch { product: product.name });
                }
            }
        }
        advisories
    }
}

/// Match against the built-in catalog.
pub fn match_transponder(transponder: &Transponder) -> MatchResult<'static> {
    Matcher::default().match_transponder(transponder)
}

/// Advisories against the built-in catalog.
pub fn advisories(transponder: &Transponder, result: &MatchResult<'_>) -> Vec<Advisory> {
    Matcher::default().advisories(transponder, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipscope_core::{ChipFamily, Confidence, RawTagReading};
    use rstest::rstest;

    fn transponder(identity: ChipIdentity, uid_length: usize) -> Transponder {
        let reading = RawTagReading::new(vec![0x04; uid_length]).unwrap();
        Transponder::builder(identity, Confidence::High, reading).build()
    }

    fn ids(products: &[&Product]) -> Vec<&'static str> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_cloneable_exact_only_chip() {
        let result = match_transponder(&transponder(ChipIdentity::IcodeSlix2, 8));

        assert_eq!(ids(&result.exact_matches), vec!["xslx", "flexslx"]);
        assert!(result.clone_targets.is_empty());
        assert!(result.cloneable());
        assert!(!result.conversion_recommended);
    }

    #[test]
    fn test_non_cloneable_without_matches() {
        let result = match_transponder(&transponder(ChipIdentity::Iso14443bUnknown, 4));

        assert!(result.is_empty());
        assert!(!result.cloneable());
        assert!(result.conversion_recommended);
    }

    #[test]
    fn test_classic_clone_targets_respect_uid_length() {
        let four = match_transponder(&transponder(ChipIdentity::MifareClassic4k, 4));
        assert_eq!(ids(&four.clone_targets), vec!["xm1", "flexm1"]);
        assert_eq!(ids(&four.family_matches), vec!["flexm1-7b"]);
        assert!(!four.conversion_recommended);

        let seven = match_transponder(&transponder(ChipIdentity::MifareClassic4k, 7));
        assert_eq!(ids(&seven.clone_targets), vec!["flexm1-7b"]);
    }

    #[test]
    fn test_exact_takes_priority_over_clone() {
        // Classic 1K is native to the magic Classic products and also a
        // clone source for them.
        let result = match_transponder(&transponder(ChipIdentity::MifareClassic1k, 4));
        assert_eq!(ids(&result.exact_matches), vec!["xm1", "flexm1", "flexm1-7b"]);
        assert!(result.clone_targets.is_empty());
        assert!(result.family_matches.is_empty());
    }

    #[test]
    fn test_clone_takes_priority_over_family() {
        let result = match_transponder(&transponder(ChipIdentity::Ntag213, 7));
        assert!(result.exact_matches.is_empty());
        assert_eq!(ids(&result.clone_targets), vec!["flexmn"]);
        assert!(!ids(&result.family_matches).contains(&"flexmn"));
    }

    #[test]
    fn test_non_cloneable_chip_gets_family_only() {
        let result = match_transponder(&transponder(ChipIdentity::Ntag424Dna, 7));
        assert!(result.exact_matches.is_empty());
        assert!(result.clone_targets.is_empty());
        assert!(ids(&result.family_matches).contains(&"xnt"));
        assert!(result.conversion_recommended);
    }

    #[test]
    fn test_unknown_ntag_dna_matches_ntag_products_only() {
        let result = match_transponder(&transponder(ChipIdentity::NtagDnaUnknown, 7));
        assert!(result.clone_targets.is_empty());
        assert!(!result.family_matches.is_empty());
        assert!(result.family_matches.iter().all(|p| p.family == ChipFamily::Ntag));
        assert!(!ids(&result.family_matches).contains(&"xdf2"));
        assert!(result.conversion_recommended);
    }

    #[test]
    fn test_payment_instrument_restricts_family() {
        let reading = RawTagReading::new(vec![0x08, 0x01, 0x02, 0x03]).unwrap();
        let card = Transponder::builder(ChipIdentity::JavaCardUnknown, Confidence::Low, reading)
            .payment_network("Visa")
            .build();

        let result = match_transponder(&card);
        assert_eq!(ids(&result.family_matches), vec!["walletmor", "payment-conversion"]);
        assert!(result.conversion_recommended);
    }

    #[test]
    fn test_payment_instrument_always_recommends_conversion() {
        let reading = RawTagReading::new(vec![0x08, 0x01, 0x02, 0x03]).unwrap();
        let card = Transponder::builder(ChipIdentity::Jcop4, Confidence::High, reading)
            .payment_network("Mastercard")
            .build();

        let result = match_transponder(&card);
        assert_eq!(ids(&result.exact_matches), vec!["apex-flex", "flexsecure"]);
        assert!(result.conversion_recommended);
    }

    #[rstest]
    #[case(ChipIdentity::DesfireEv3, 2)]
    #[case(ChipIdentity::DesfireEv2, 0)]
    #[case(ChipIdentity::DesfireEv1, 0)]
    fn test_desfire_ev_advisory(#[case] identity: ChipIdentity, #[case] expected: usize) {
        let t = transponder(identity, 7);
        let result = match_transponder(&t);
        let warnings = advisories(&t, &result);
        assert_eq!(warnings.len(), expected);
        assert!(
            warnings
                .iter()
                .all(|w| matches!(w, Advisory::DesfireEvMismatch { card_ev: 3, .. }))
        );
    }

    #[test]
    fn test_classic_4k_advisory_leaves_result_unchanged() {
        let t = transponder(ChipIdentity::MifareClassic4k, 4);
        let result = match_transponder(&t);
        let before = result.clone();

        let warnings = advisories(&t, &result);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].to_string().contains("xM1"));
        assert_eq!(result, before);
    }

    #[test]
    fn test_serializes_product_ids() {
        let result = match_transponder(&transponder(ChipIdentity::IcodeSlix2, 8));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["exact_matches"][0]["id"], "xslx");
        assert_eq!(json["cloneability"]["cloneable"], true);
    }
}
