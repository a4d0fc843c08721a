//! Detector configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the detection waterfall.
///
/// # Examples
///
/// ```
/// use chipscope_detect::DetectorConfig;
///
/// let config = DetectorConfig {
///     probe_sensors: false,
///     ..Default::default()
/// };
/// assert_eq!(config.harvest_timeout().as_millis(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Delay between energy-harvest status polls
    pub harvest_poll_interval_ms: u64,

    /// Overall energy-harvest budget
    pub harvest_timeout_ms: u64,

    /// Attempts per temperature register read
    pub sensor_read_retries: u32,

    pub probe_implant_name: bool,
    pub enumerate_desfire_apps: bool,
    pub probe_sensors: bool,

    /// Cap on additional-frame requests per command
    pub max_continuation_frames: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            harvest_poll_interval_ms: 50,
            harvest_timeout_ms: 1000,
            sensor_read_retries: 3,
            probe_implant_name: true,
            enumerate_desfire_apps: true,
            probe_sensors: true,
            max_continuation_frames: 8,
        }
    }
}

impl DetectorConfig {
    pub fn harvest_poll_interval(&self) -> Duration {
        Duration::from_millis(self.harvest_poll_interval_ms)
    }

    pub fn harvest_timeout(&self) -> Duration {
        Duration::from_millis(self.harvest_timeout_ms)
    }
}
