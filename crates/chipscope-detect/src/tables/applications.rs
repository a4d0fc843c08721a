//! DESFire application-ID registry.
//!
//! Maps 24-bit DESFire application identifiers to the deployed systems that
//! use them. Informational only: a match never changes the chip identity.

use chipscope_core::{AppletCategory, AppletInfo};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownApplication {
    pub label: &'static str,
    pub category: AppletCategory,
}

const fn app(label: &'static str, category: AppletCategory) -> KnownApplication {
    KnownApplication { label, category }
}

static EXACT: Lazy<HashMap<u32, KnownApplication>> = Lazy::new(|| {
    HashMap::from([
        (0x000001, app("NFC Forum NDEF", AppletCategory::Ndef)),
        (0x9011F2, app("Clipper", AppletCategory::Transit)),
        (0x314553, app("Opal", AppletCategory::Transit)),
        (0xF51CD8, app("HID access control", AppletCategory::AccessControl)),
        (0xF532F0, app("Campus card", AppletCategory::Campus)),
    ])
});

static RANGES: Lazy<Vec<(RangeInclusive<u32>, KnownApplication)>> = Lazy::new(|| {
    vec![(0xF21030..=0xF2103F, app("ORCA", AppletCategory::Transit))]
});

/// Look up an application ID, exact entries first.
pub fn lookup(aid: u32) -> Option<KnownApplication> {
    EXACT.get(&aid).copied().or_else(|| {
        RANGES
            .iter()
            .find(|(range, _)| range.contains(&aid))
            .map(|(_, known)| *known)
    })
}

/// Describe an application ID for the transponder's applet list.
///
/// Unknown IDs are kept with an "Unknown application" label.
pub fn describe(aid: u32) -> AppletInfo {
    let bytes = aid.to_be_bytes()[1..].to_vec();
    match lookup(aid) {
        Some(known) => AppletInfo::new(bytes, known.label, known.category),
        None => AppletInfo::new(bytes, "Unknown application", AppletCategory::Other),
    }
}
