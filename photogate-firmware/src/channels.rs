//! Inter-task communication channels
//!
//! All cross-task traffic flows through these static embassy-sync
//! primitives. Edge tasks and the link RX task are producers only; the
//! controller owns the timing session and is the single consumer of
//! triggers and requests. The storage task is the only task that
//! touches flash.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use photogate_core::timing::TriggerEdge;
use photogate_protocol::{ApiRequest, ApiResponse, ResultRecord};

/// Channel capacity for captured trigger edges
const TRIGGER_CHANNEL_SIZE: usize = 8;

/// Channel capacity for API requests and responses
const LINK_CHANNEL_SIZE: usize = 4;

/// Commands to the storage task
#[derive(Debug)]
pub enum StoreCommand {
    /// Persist one completed result record
    Append(ResultRecord),
    /// Read the newest records; the storage task answers on
    /// [`RESPONSE_CHANNEL`] directly
    List { limit: Option<usize> },
}

/// Captured edges from the sensor and manual buttons
///
/// `try_send` only: when processing lags far enough that eight edges
/// queue up, further edges are dropped and counted rather than blocking
/// the capture path.
pub static TRIGGER_CHANNEL: Channel<CriticalSectionRawMutex, TriggerEdge, TRIGGER_CHANNEL_SIZE> =
    Channel::new();

/// Parsed API requests from the link RX task
pub static REQUEST_CHANNEL: Channel<CriticalSectionRawMutex, ApiRequest, LINK_CHANNEL_SIZE> =
    Channel::new();

/// API responses to the link TX task
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, ApiResponse, LINK_CHANNEL_SIZE> =
    Channel::new();

/// Commands to the storage task
pub static STORE_CHANNEL: Channel<CriticalSectionRawMutex, StoreCommand, LINK_CHANNEL_SIZE> =
    Channel::new();
