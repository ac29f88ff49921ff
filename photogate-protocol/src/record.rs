//! Participant and result-record types
//!
//! A [`ResultRecord`] is the immutable outcome of one completed run.
//! Records are persisted one per line in the result log and echoed over
//! the API; both uses share the same encoding.

use heapless::String;

use crate::kv::{self, KvWriter, LineError, MAX_LINE_LEN};

/// Maximum device identifier length
pub const MAX_DEVICE_ID_LEN: usize = 16;

/// Maximum dog/club identifier length
pub const MAX_ID_LEN: usize = 16;

/// Maximum dog name length
pub const MAX_NAME_LEN: usize = 24;

/// Line tag for persisted result records
pub const RECORD_TAG: &str = "run";

/// Run state of the timing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    /// No run in flight; waiting for a start trigger
    #[default]
    Idle,
    /// A run is in flight; waiting for a finish trigger
    Running,
}

impl RunState {
    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, RunState::Running)
    }
}

/// Participant bound to a run
///
/// All fields are optional on the wire, but a participant accepted by
/// the binding operation carries at least one of `dog_id`/`dog_name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Participant {
    pub dog_id: Option<String<MAX_ID_LEN>>,
    pub dog_name: Option<String<MAX_NAME_LEN>>,
    pub club_id: Option<String<MAX_ID_LEN>>,
    pub lane: Option<u8>,
}

impl Participant {
    /// True when the participant can be used for binding
    pub fn has_identifier(&self) -> bool {
        self.dog_id.is_some() || self.dog_name.is_some()
    }

    /// Append this participant's fields to a line under construction
    pub fn write_fields(&self, w: &mut KvWriter) -> Result<(), LineError> {
        w.pair_opt("dog_id", self.dog_id.as_deref())?;
        w.pair_opt("dog_name", self.dog_name.as_deref())?;
        w.pair_opt("club_id", self.club_id.as_deref())?;
        w.pair_opt_u32("lane", self.lane.map(u32::from))?;
        Ok(())
    }

    /// Absorb one `key=value` pair, ignoring unknown keys
    pub(crate) fn absorb(&mut self, key: &str, value: &str) -> Result<(), LineError> {
        match key {
            "dog_id" => self.dog_id = Some(parse_token(value)?),
            "dog_name" => self.dog_name = Some(parse_token(value)?),
            "club_id" => self.club_id = Some(parse_token(value)?),
            "lane" => {
                let lane = kv::parse_u32(value)?;
                self.lane = Some(u8::try_from(lane).map_err(|_| LineError::BadNumber)?);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Parse one string field under the token rules of the writer
///
/// Anything accepted here can be echoed and persisted again; a value
/// the writer would refuse is refused on input too.
fn parse_token<const N: usize>(value: &str) -> Result<String<N>, LineError> {
    if !kv::is_valid_token(value) {
        return Err(LineError::InvalidToken);
    }
    String::try_from(value).map_err(|_| LineError::LineTooLong)
}

/// One persisted, immutable outcome of a completed timed run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResultRecord {
    /// Identifier of the device that timed the run
    pub device: String<MAX_DEVICE_ID_LEN>,
    /// Snapshot of the participant bound when the run finished
    pub participant: Participant,
    /// Start timestamp, milliseconds since boot
    pub start_ms: Option<u32>,
    /// Finish timestamp, milliseconds since boot
    pub finish_ms: Option<u32>,
    /// Run duration; absent when start or finish is missing
    pub elapsed_ms: Option<u32>,
    /// When this record was computed, milliseconds since boot
    pub received_ms: u32,
}

impl ResultRecord {
    /// Encode as one log line
    pub fn encode_line(&self) -> Result<String<MAX_LINE_LEN>, LineError> {
        let mut w = KvWriter::new(RECORD_TAG)?;
        w.pair("device", &self.device)?;
        self.participant.write_fields(&mut w)?;
        w.pair_opt_u32("start_ms", self.start_ms)?;
        w.pair_opt_u32("finish_ms", self.finish_ms)?;
        w.pair_opt_u32("elapsed_ms", self.elapsed_ms)?;
        w.pair_u32("received_ms", self.received_ms)?;
        Ok(w.finish())
    }

    /// Parse one log line
    ///
    /// `device` and `received_ms` are required; everything else is
    /// optional. Unknown keys are ignored so newer firmware can extend
    /// the format without breaking old readers.
    pub fn parse_line(line: &str) -> Result<Self, LineError> {
        let (tag, body) = kv::split_tag(line);
        if tag != RECORD_TAG {
            return Err(LineError::UnknownTag);
        }

        let mut device: Option<String<MAX_DEVICE_ID_LEN>> = None;
        let mut participant = Participant::default();
        let mut start_ms = None;
        let mut finish_ms = None;
        let mut elapsed_ms = None;
        let mut received_ms = None;

        for (key, value) in kv::pairs(body) {
            match key {
                "device" => device = Some(parse_token(value)?),
                "start_ms" => start_ms = Some(kv::parse_u32(value)?),
                "finish_ms" => finish_ms = Some(kv::parse_u32(value)?),
                "elapsed_ms" => elapsed_ms = Some(kv::parse_u32(value)?),
                "received_ms" => received_ms = Some(kv::parse_u32(value)?),
                _ => participant.absorb(key, value)?,
            }
        }

        Ok(Self {
            device: device.ok_or(LineError::MissingField)?,
            participant,
            start_ms,
            finish_ms,
            elapsed_ms,
            received_ms: received_ms.ok_or(LineError::MissingField)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ResultRecord {
        ResultRecord {
            device: String::try_from("gate-01").unwrap(),
            participant: Participant {
                dog_id: Some(String::try_from("17").unwrap()),
                dog_name: Some(String::try_from("Rex").unwrap()),
                club_id: None,
                lane: Some(2),
            },
            start_ms: Some(1234),
            finish_ms: Some(1739),
            elapsed_ms: Some(505),
            received_ms: 1740,
        }
    }

    #[test]
    fn test_encode_line() {
        let line = sample_record().encode_line().unwrap();
        assert_eq!(
            line.as_str(),
            "run device=gate-01 dog_id=17 dog_name=Rex lane=2 \
             start_ms=1234 finish_ms=1739 elapsed_ms=505 received_ms=1740"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let record = sample_record();
        let line = record.encode_line().unwrap();
        assert_eq!(ResultRecord::parse_line(&line).unwrap(), record);
    }

    #[test]
    fn test_parse_without_participant() {
        let record =
            ResultRecord::parse_line("run device=gate-01 start_ms=5 finish_ms=905 elapsed_ms=900 received_ms=905")
                .unwrap();
        assert_eq!(record.participant, Participant::default());
        assert_eq!(record.elapsed_ms, Some(900));
    }

    #[test]
    fn test_parse_missing_required_field() {
        assert_eq!(
            ResultRecord::parse_line("run dog_name=Rex elapsed_ms=505 received_ms=505"),
            Err(LineError::MissingField)
        );
        assert_eq!(
            ResultRecord::parse_line("run device=gate-01 elapsed_ms=505"),
            Err(LineError::MissingField)
        );
    }

    #[test]
    fn test_parse_rejects_wrong_tag_and_garbage() {
        assert_eq!(
            ResultRecord::parse_line("hello device=gate-01 received_ms=1"),
            Err(LineError::UnknownTag)
        );
        assert_eq!(
            ResultRecord::parse_line("run device=gate-01 received_ms=abc"),
            Err(LineError::BadNumber)
        );
        assert_eq!(
            ResultRecord::parse_line("run device=gate-01 lane=900 received_ms=1"),
            Err(LineError::BadNumber)
        );
    }

    #[test]
    fn test_parse_rejects_unencodable_values() {
        // Values the writer would refuse are refused on input too, so
        // every parsed record can be echoed and persisted again
        assert_eq!(
            ResultRecord::parse_line("run device=gate-01 dog_name=Réx received_ms=1"),
            Err(LineError::InvalidToken)
        );
        assert_eq!(
            ResultRecord::parse_line("run device=gate-01 dog_name=a=b received_ms=1"),
            Err(LineError::InvalidToken)
        );
        assert_eq!(
            ResultRecord::parse_line("run device=gaté-01 received_ms=1"),
            Err(LineError::InvalidToken)
        );
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let record =
            ResultRecord::parse_line("run device=gate-01 wind_speed=3 received_ms=10").unwrap();
        assert_eq!(record.received_ms, 10);
        assert_eq!(record.elapsed_ms, None);
    }
}
