//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod controller;
pub mod link_rx;
pub mod link_tx;
pub mod store;
pub mod tick;
pub mod trigger;

pub use controller::controller_task;
pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use store::store_task;
pub use tick::tick_task;
pub use trigger::trigger_task;
