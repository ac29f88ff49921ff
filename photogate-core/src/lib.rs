//! Board-agnostic core logic for the Photogate light-gate timer
//!
//! This crate contains all timing logic that does not depend on
//! specific hardware implementations:
//!
//! - Monotonic clock helpers (wraparound-safe microsecond arithmetic)
//! - The timing session state machine (start/finish/manual arbitration)
//! - The shared debounce gate for all trigger sources
//! - Result-store read logic over an abstract line log
//! - Device configuration type definitions
//!
//! Everything here is `no_std` and owns no I/O, so the whole crate is
//! testable on the host. The firmware crate wires trigger edges, the
//! flash-backed result log, and the control link around it.

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod store;
pub mod timing;
