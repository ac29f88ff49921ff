//! Photogate wire protocol and shared record types
//!
//! This crate defines everything that crosses a boundary of the timer:
//! the participant and result-record types, the `key=value` line codec
//! used for the persisted result log, and the request/response messages
//! of the control API.
//!
//! # Line format
//!
//! Every persisted record and every API message is a single line of
//! ASCII text: a leading tag word followed by space-separated
//! `key=value` pairs, terminated by `\n`:
//!
//! ```text
//! run device=gate-01 dog_name=Rex start_ms=1234 finish_ms=1739 elapsed_ms=505 received_ms=1740
//! ```
//!
//! Lines are self-describing and human-inspectable, so a result log can
//! be examined with nothing more than a serial terminal. Unknown keys
//! are ignored on parse, and a corrupt line never poisons its neighbors.
//!
//! The transport carrying these lines (UART, TCP, ...) is out of scope
//! here; the codec is byte-order and transport agnostic.

#![no_std]
#![deny(unsafe_code)]

pub mod kv;
pub mod record;
pub mod request;
pub mod response;

pub use kv::{pairs, KvWriter, LineError, MAX_LINE_LEN};
pub use record::{Participant, ResultRecord, RunState, MAX_DEVICE_ID_LEN, MAX_ID_LEN, MAX_NAME_LEN};
pub use request::ApiRequest;
pub use response::{ApiResponse, CurrentStatus, ErrorReason, MAX_RESULTS_PAGE};
