//! Tick task for time-based updates
//!
//! Provides periodic ticks to the controller for the stuck-run guard
//! and anything else that needs wall-clock progress without an edge.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u32 = 100;

/// Signal carrying the current timestamp in µs (truncated to u32)
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Current monotonic timestamp, µs truncated to u32
///
/// All session arithmetic is wraparound-safe, so the ~71 minute wrap
/// of the truncated counter is harmless.
pub fn now_us() -> u32 {
    Instant::now().as_micros() as u32
}

/// Tick task - sends periodic tick signals with timestamp
#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS as u64));

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(now_us());
    }
}
