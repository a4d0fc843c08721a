//! Chip identification waterfall.
//!
//! This crate classifies the tag behind a [`Session`] into a
//! [`Transponder`]: per-protocol detectors probe the tag through the
//! command codec, static tables turn version codes into identities, and the
//! [`Detector`] runs the detectors in a fixed order until one of them
//! terminates.
//!
//! [`Session`]: chipscope_hardware::Session
//! [`Transponder`]: chipscope_core::Transponder

pub mod config;
pub mod detectors;
pub mod error;
pub mod orchestrator;
pub mod tables;

pub use config::DetectorConfig;
pub use error::{ProbeError, Result};
pub use orchestrator::{DetectionStep, Detector, IsoDepStep, Progress, WaterfallStep};
