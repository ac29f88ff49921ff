//! Flash storage driver
//!
//! Two partitions at the top of flash, both managed by
//! sequential-storage for wear leveling:
//!
//! - a 16KB key-value map holding the device configuration
//! - a 64KB queue holding the append-only result log, one encoded line
//!   per entry, oldest entries reclaimed when the partition fills

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::{map, queue};

use photogate_core::store::TailReader;
use photogate_protocol::MAX_LINE_LEN;

/// Total flash size (2MB on the Pico)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Result-log partition, topmost 64KB
pub const RESULTS_PARTITION_SIZE: usize = 64 * 1024;

/// Config partition, 16KB below the result log
pub const CONFIG_PARTITION_SIZE: usize = 16 * 1024;

/// Flash erase size for RP2040
pub const FLASH_ERASE_SIZE: usize = ERASE_SIZE;

const RESULTS_START: usize = FLASH_SIZE - RESULTS_PARTITION_SIZE;
const CONFIG_START: usize = RESULTS_START - CONFIG_PARTITION_SIZE;

/// Flash range for the result-log queue
pub const RESULTS_RANGE: core::ops::Range<u32> = (RESULTS_START as u32)..(FLASH_SIZE as u32);

/// Flash range for the config map
pub const CONFIG_RANGE: core::ops::Range<u32> = (CONFIG_START as u32)..(RESULTS_START as u32);

/// Storage keys for the config map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageKey {
    /// Device configuration (binary postcard format)
    GateConfig = 0,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl map::Key for StorageKey {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, map::SerializationError> {
        if buffer.is_empty() {
            return Err(map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), map::SerializationError> {
        if buffer.is_empty() {
            return Err(map::SerializationError::BufferTooSmall);
        }
        let key = match buffer[0] {
            0 => StorageKey::GateConfig,
            _ => return Err(map::SerializationError::InvalidFormat),
        };
        Ok((key, 1))
    }
}

/// Errors from flash operations
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Storage operation failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small
    BufferTooSmall,
    /// Entry does not fit in one queue item
    EntryTooLarge,
}

/// Scratch buffer size for sequential-storage operations
const SCRATCH_SIZE: usize = 512;

/// Flash storage interface
///
/// Owns the flash peripheral; only the storage task holds one.
pub struct FlashStore<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> FlashStore<'d> {
    /// Create a new flash storage instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Read a config value by key into the provided buffer
    ///
    /// Returns the number of bytes read.
    pub async fn read_config(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> Result<usize, FlashError> {
        let mut scratch = [0u8; SCRATCH_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut scratch,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(FlashError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(FlashError::NotFound),
            Err(_) => Err(FlashError::Storage),
        }
    }

    /// Write a config value by key
    pub async fn write_config(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        let mut scratch = [0u8; SCRATCH_SIZE];

        map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut scratch,
            &key,
            &data,
        )
        .await
        .map_err(|_| FlashError::Storage)
    }

    /// Append one encoded record line to the result log
    ///
    /// Oldest entries are overwritten once the partition is full; the
    /// log is append-only from the caller's point of view.
    pub async fn append_result(&mut self, line: &[u8]) -> Result<(), FlashError> {
        if line.len() > MAX_LINE_LEN {
            return Err(FlashError::EntryTooLarge);
        }
        queue::push(
            &mut self.flash,
            RESULTS_RANGE,
            &mut NoCache::new(),
            line,
            true,
        )
        .await
        .map_err(|_| FlashError::Storage)
    }

    /// Scan the whole result log, oldest first, into a tail reader
    ///
    /// Entries that are not valid UTF-8 count as corrupt lines, same as
    /// lines that fail to parse.
    pub async fn read_results(&mut self, reader: &mut TailReader) -> Result<(), FlashError> {
        let mut iter = queue::iter(&mut self.flash, RESULTS_RANGE, &mut NoCache::new())
            .await
            .map_err(|_| FlashError::Storage)?;

        let mut buf = [0u8; MAX_LINE_LEN + 8];
        while let Some(entry) = iter.next(&mut buf).await.map_err(|_| FlashError::Storage)? {
            match core::str::from_utf8(&entry) {
                Ok(line) => reader.push_line(line),
                Err(_) => reader.push_line(""),
            }
        }
        Ok(())
    }
}
