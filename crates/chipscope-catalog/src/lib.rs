//! Product catalog and compatibility matcher.
//!
//! The catalog is compiled-in data. [`match_transponder`] partitions it
//! against a scanned [`Transponder`](chipscope_core::Transponder) and
//! [`advisories`] reports the mismatches worth warning about.

pub mod catalog;
pub mod matcher;

pub use catalog::{PRODUCTS, Product, product};
pub use matcher::{Advisory, MatchResult, Matcher, advisories, match_transponder};
