//! Timing state machine and trigger handling
//!
//! The session is the single shared mutable resource of the device.
//! Trigger callbacks never touch it directly: edge sources enqueue
//! `(source, timestamp)` pairs and one owner drains them through the
//! operations defined here, so every transition is serialized.

pub mod debounce;
pub mod events;
pub mod session;

pub use debounce::DebounceGate;
pub use events::{EdgeOutcome, SuppressReason, TriggerEdge, TriggerSource};
pub use session::{SessionError, TimingSession};
