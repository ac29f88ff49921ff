//! Configuration persistence
//!
//! Loads the gate configuration from the flash config partition,
//! falling back to compiled-in defaults when flash is empty or holds
//! something invalid. The stored form is postcard-serialized binary.

use defmt::*;

use photogate_core::config::GateConfig;

use crate::flash::{FlashError, FlashStore, StorageKey};

/// Maximum serialized config size
const MAX_CONFIG_SIZE: usize = 256;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Stored config fails validation
    Invalid,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

/// Load the gate configuration from flash
///
/// A config that deserializes but fails validation is rejected the same
/// way as a corrupt one; the caller falls back to defaults.
pub async fn load_config(storage: &mut FlashStore<'_>) -> Result<GateConfig, ConfigError> {
    let mut buffer = [0u8; MAX_CONFIG_SIZE];
    let len = storage.read_config(StorageKey::GateConfig, &mut buffer).await?;

    debug!("Read {} bytes of config from flash", len);

    let config: GateConfig =
        postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

    if let Err(e) = config.validate() {
        warn!("Stored config failed validation: {:?}", e);
        return Err(ConfigError::Invalid);
    }

    info!(
        "Config: device={} debounce={}ms min={}ms max={}ms sensor_pin={}",
        config.device_id.as_str(),
        config.debounce_ms,
        config.min_elapsed_ms,
        config.max_elapsed_ms,
        config.pins.sensor
    );
    Ok(config)
}

/// Persist the gate configuration to flash
pub async fn save_config(
    storage: &mut FlashStore<'_>,
    config: &GateConfig,
) -> Result<(), ConfigError> {
    let mut buffer = [0u8; MAX_CONFIG_SIZE];
    let data = postcard::to_slice(config, &mut buffer).map_err(|_| ConfigError::Deserialize)?;
    storage.write_config(StorageKey::GateConfig, data).await?;
    Ok(())
}
