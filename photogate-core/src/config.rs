//! Device configuration type definitions
//!
//! One configurable core replaces the per-board firmware variants: pin
//! assignments, timing thresholds, and the device name all live in
//! [`GateConfig`]. The configuration is stored in flash as
//! postcard-serialized binary data, with compiled-in defaults as the
//! fallback.

use heapless::String;

use photogate_protocol::MAX_DEVICE_ID_LEN;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default debounce window shared by all trigger sources (ms)
pub const DEFAULT_DEBOUNCE_MS: u32 = 10;

/// Default minimum accepted run duration (ms)
pub const DEFAULT_MIN_ELAPSED_MS: u32 = 500;

/// Default maximum run duration before a stuck run is abandoned (ms)
pub const DEFAULT_MAX_ELAPSED_MS: u32 = 600_000;

/// GPIO assignments for the trigger sources
///
/// Button pins are optional; a gate without wired buttons simply never
/// produces manual hardware edges (the API manual operations still
/// work).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinAssignments {
    /// Beam-break sensor input
    pub sensor: u8,
    /// Manual start button input
    pub manual_start: Option<u8>,
    /// Manual stop button input
    pub manual_stop: Option<u8>,
}

impl Default for PinAssignments {
    fn default() -> Self {
        Self {
            sensor: 16,
            manual_start: Some(14),
            manual_stop: Some(15),
        }
    }
}

/// Complete gate configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GateConfig {
    /// Device identifier stamped into every result record
    pub device_id: String<MAX_DEVICE_ID_LEN>,
    /// Debounce window shared by all trigger sources (ms)
    pub debounce_ms: u32,
    /// Minimum elapsed time for a finish to count (ms)
    pub min_elapsed_ms: u32,
    /// Maximum run duration before abandonment; 0 disables the guard (ms)
    pub max_elapsed_ms: u32,
    /// GPIO assignments
    pub pins: PinAssignments,
}

impl Default for GateConfig {
    fn default() -> Self {
        let mut device_id = String::new();
        // "gate-01" always fits in MAX_DEVICE_ID_LEN
        let _ = device_id.push_str("gate-01");
        Self {
            device_id,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            min_elapsed_ms: DEFAULT_MIN_ELAPSED_MS,
            max_elapsed_ms: DEFAULT_MAX_ELAPSED_MS,
            pins: PinAssignments::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Two trigger sources share a GPIO
    PinConflict,
    /// Minimum elapsed time does not exceed the debounce window
    WindowConflict,
    /// Non-zero maximum run duration not above the minimum
    TimeoutConflict,
    /// Empty device identifier
    MissingDeviceId,
}

impl GateConfig {
    /// Validate internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_id.is_empty() {
            return Err(ConfigError::MissingDeviceId);
        }

        let pins = [
            Some(self.pins.sensor),
            self.pins.manual_start,
            self.pins.manual_stop,
        ];
        for (i, a) in pins.iter().enumerate() {
            for b in pins.iter().skip(i + 1) {
                if a.is_some() && a == b {
                    return Err(ConfigError::PinConflict);
                }
            }
        }

        if self.min_elapsed_ms <= self.debounce_ms {
            return Err(ConfigError::WindowConflict);
        }
        if self.max_elapsed_ms != 0 && self.max_elapsed_ms <= self.min_elapsed_ms {
            return Err(ConfigError::TimeoutConflict);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(GateConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_pin_conflict() {
        let mut config = GateConfig::default();
        config.pins.manual_stop = Some(config.pins.sensor);
        assert_eq!(config.validate(), Err(ConfigError::PinConflict));
    }

    #[test]
    fn test_absent_buttons_do_not_conflict() {
        let mut config = GateConfig::default();
        config.pins.manual_start = None;
        config.pins.manual_stop = None;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_window_conflict() {
        let mut config = GateConfig::default();
        config.min_elapsed_ms = config.debounce_ms;
        assert_eq!(config.validate(), Err(ConfigError::WindowConflict));
    }

    #[test]
    fn test_disabled_timeout_is_valid() {
        let mut config = GateConfig::default();
        config.max_elapsed_ms = 0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_timeout_below_minimum_rejected() {
        let mut config = GateConfig::default();
        config.max_elapsed_ms = config.min_elapsed_ms;
        assert_eq!(config.validate(), Err(ConfigError::TimeoutConflict));
    }
}
