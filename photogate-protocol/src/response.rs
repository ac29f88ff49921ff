//! Control API responses
//!
//! Every response starts with an `ok` or `err` header line tagged with
//! the operation it answers. Responses that carry records (`results`,
//! `stop`) follow the header with one `run ...` line per record, in
//! write order, so clients reuse the record parser for both the log and
//! the API.

use heapless::Vec;

use crate::kv::{KvWriter, LineError, MAX_LINE_LEN};
use crate::record::{Participant, ResultRecord, RunState};

/// Maximum records returned by one list query
pub const MAX_RESULTS_PAGE: usize = 16;

/// Reason codes for rejected requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorReason {
    /// Participant binding without `dog_id` or `dog_name`
    NoIdentifierProvided,
    /// Participant binding while a run is active
    RunActive,
    /// Manual start while a run is active
    AlreadyRunning,
    /// Manual stop with no run in flight
    NoActiveRun,
    /// Manual stop before the minimum elapsed time
    MinElapsedNotReached,
    /// Manual request lost the shared debounce race
    Debounced,
    /// The request line could not be parsed
    BadRequest,
}

impl ErrorReason {
    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorReason::NoIdentifierProvided => "no_identifier_provided",
            ErrorReason::RunActive => "run_active",
            ErrorReason::AlreadyRunning => "already_running",
            ErrorReason::NoActiveRun => "no_active_run",
            ErrorReason::MinElapsedNotReached => "min_elapsed_not_reached",
            ErrorReason::Debounced => "debounced",
            ErrorReason::BadRequest => "bad_request",
        }
    }
}

/// Snapshot of the live session for the `current` query
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurrentStatus {
    pub state: RunState,
    pub sensor_enabled: bool,
    pub manual_active: bool,
    pub participant: Option<Participant>,
    /// Start timestamp in ms, 0 when unset
    pub start_ms: u32,
    /// Finish timestamp in ms, 0 when unset
    pub finish_ms: u32,
    /// Live elapsed while running, final elapsed once finished
    pub elapsed_ms: Option<u32>,
}

/// A response to one API request
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApiResponse {
    /// Participant accepted for the next run
    ParticipantBound { participant: Participant },
    /// Live session state
    Current(CurrentStatus),
    /// Stored results: `total` parsed, `skipped` corrupt, last page in order
    Results {
        total: u32,
        skipped: u32,
        records: Vec<ResultRecord, MAX_RESULTS_PAGE>,
    },
    /// Session forced back to idle
    ResetAck,
    /// New sensor flag value
    SensorFlag { enabled: bool },
    /// Manual run started
    ManualStarted {
        start_ms: u32,
        participant: Option<Participant>,
    },
    /// Manual run finished; the full record follows the header
    ManualStopped { record: ResultRecord },
    /// Health probe answer
    Pong,
    /// Request rejected
    Error { reason: ErrorReason },
}

impl ApiResponse {
    /// Encode the header line
    pub fn header_line(&self) -> Result<heapless::String<MAX_LINE_LEN>, LineError> {
        match self {
            ApiResponse::ParticipantBound { participant } => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "participant")?;
                participant.write_fields(&mut w)?;
                Ok(w.finish())
            }
            ApiResponse::Current(status) => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "current")?;
                w.pair("state", status.state.as_str())?;
                w.pair_flag("sensor", status.sensor_enabled)?;
                w.pair_flag("manual", status.manual_active)?;
                if let Some(participant) = &status.participant {
                    participant.write_fields(&mut w)?;
                }
                w.pair_u32("start_ms", status.start_ms)?;
                w.pair_u32("finish_ms", status.finish_ms)?;
                w.pair_opt_u32("elapsed_ms", status.elapsed_ms)?;
                Ok(w.finish())
            }
            ApiResponse::Results {
                total,
                skipped,
                records,
            } => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "results")?;
                w.pair_u32("count", records.len() as u32)?;
                w.pair_u32("total", *total)?;
                w.pair_u32("skipped", *skipped)?;
                Ok(w.finish())
            }
            ApiResponse::ResetAck => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "reset")?;
                Ok(w.finish())
            }
            ApiResponse::SensorFlag { enabled } => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "sensor")?;
                w.pair_flag("enabled", *enabled)?;
                Ok(w.finish())
            }
            ApiResponse::ManualStarted {
                start_ms,
                participant,
            } => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "start")?;
                w.pair_u32("start_ms", *start_ms)?;
                if let Some(participant) = participant {
                    participant.write_fields(&mut w)?;
                }
                Ok(w.finish())
            }
            ApiResponse::ManualStopped { record } => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "stop")?;
                w.pair_opt_u32("finish_ms", record.finish_ms)?;
                w.pair_opt_u32("elapsed_ms", record.elapsed_ms)?;
                Ok(w.finish())
            }
            ApiResponse::Pong => {
                let mut w = KvWriter::new("ok")?;
                w.pair("op", "ping")?;
                Ok(w.finish())
            }
            ApiResponse::Error { reason } => {
                let mut w = KvWriter::new("err")?;
                w.pair("reason", reason.as_str())?;
                Ok(w.finish())
            }
        }
    }

    /// Records to emit as `run ...` lines after the header
    pub fn record_lines(&self) -> &[ResultRecord] {
        match self {
            ApiResponse::Results { records, .. } => records,
            ApiResponse::ManualStopped { record } => core::slice::from_ref(record),
            _ => &[],
        }
    }
}
