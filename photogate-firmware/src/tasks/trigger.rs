//! Trigger edge capture tasks
//!
//! One task instance per wired trigger source. Each waits for a
//! falling edge on its input, stamps it with the capture-time clock,
//! and enqueues it for the controller. The session is never touched
//! here; a slow controller costs queue depth, not timestamps.

use defmt::*;
use embassy_rp::gpio::Input;
use portable_atomic::{AtomicU32, Ordering};

use photogate_core::timing::{TriggerEdge, TriggerSource};

use crate::channels::TRIGGER_CHANNEL;
use crate::tasks::tick::now_us;

/// Edges dropped because the trigger queue was full
pub static DROPPED_EDGES: AtomicU32 = AtomicU32::new(0);

/// Edge capture task, one per trigger source
#[embassy_executor::task(pool_size = 3)]
pub async fn trigger_task(mut pin: Input<'static>, source: TriggerSource) {
    info!("Trigger task started: {:?}", source);

    loop {
        pin.wait_for_falling_edge().await;
        let edge = TriggerEdge {
            source,
            ts_us: now_us(),
        };
        if TRIGGER_CHANNEL.try_send(edge).is_err() {
            let dropped = DROPPED_EDGES.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("Trigger queue full, dropped edge ({} total)", dropped);
        }
    }
}
