//! Control API requests
//!
//! One request per line. The verb is the tag word; arguments are
//! `key=value` pairs (or a bare `on`/`off` for the sensor toggle):
//!
//! ```text
//! participant dog_id=17 dog_name=Rex club_id=5 lane=2
//! current
//! results limit=2
//! reset
//! sensor off
//! start
//! stop
//! ping
//! ```

use crate::kv::{self, KvWriter, LineError, MAX_LINE_LEN};
use crate::record::Participant;

use heapless::String;

/// A parsed API request
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApiRequest {
    /// Bind a participant to the next run
    BindParticipant(Participant),
    /// Query the live session state
    QueryCurrent,
    /// List stored results, newest page or last `limit`
    ListResults { limit: Option<usize> },
    /// Force the session back to idle
    Reset,
    /// Enable or disable the beam sensor
    SetSensor { enabled: bool },
    /// Start a manual (hand-timed) run
    ManualStart,
    /// Finish the active run manually
    ManualStop,
    /// Health probe
    Ping,
}

impl ApiRequest {
    /// Parse one request line
    pub fn parse_line(line: &str) -> Result<Self, LineError> {
        let (verb, body) = kv::split_tag(line);
        match verb {
            "participant" => {
                let mut participant = Participant::default();
                for (key, value) in kv::pairs(body) {
                    participant.absorb(key, value)?;
                }
                Ok(ApiRequest::BindParticipant(participant))
            }
            "current" => Ok(ApiRequest::QueryCurrent),
            "results" => {
                let mut limit = None;
                for (key, value) in kv::pairs(body) {
                    if key == "limit" {
                        limit = Some(kv::parse_u32(value)? as usize);
                    }
                }
                Ok(ApiRequest::ListResults { limit })
            }
            "reset" => Ok(ApiRequest::Reset),
            "sensor" => {
                let enabled = kv::parse_flag(body.trim())?;
                Ok(ApiRequest::SetSensor { enabled })
            }
            "start" => Ok(ApiRequest::ManualStart),
            "stop" => Ok(ApiRequest::ManualStop),
            "ping" => Ok(ApiRequest::Ping),
            _ => Err(LineError::UnknownTag),
        }
    }

    /// Encode this request as a line (for host-side clients and tests)
    pub fn encode_line(&self) -> Result<String<MAX_LINE_LEN>, LineError> {
        match self {
            ApiRequest::BindParticipant(p) => {
                let mut w = KvWriter::new("participant")?;
                p.write_fields(&mut w)?;
                Ok(w.finish())
            }
            ApiRequest::QueryCurrent => Ok(KvWriter::new("current")?.finish()),
            ApiRequest::ListResults { limit } => {
                let mut w = KvWriter::new("results")?;
                w.pair_opt_u32("limit", limit.map(|l| l as u32))?;
                Ok(w.finish())
            }
            ApiRequest::Reset => Ok(KvWriter::new("reset")?.finish()),
            ApiRequest::SetSensor { enabled } => {
                let mut line: String<MAX_LINE_LEN> = String::new();
                line.push_str(if *enabled { "sensor on" } else { "sensor off" })
                    .map_err(|_| LineError::LineTooLong)?;
                Ok(line)
            }
            ApiRequest::ManualStart => Ok(KvWriter::new("start")?.finish()),
            ApiRequest::ManualStop => Ok(KvWriter::new("stop")?.finish()),
            ApiRequest::Ping => Ok(KvWriter::new("ping")?.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_participant() {
        let req = ApiRequest::parse_line("participant dog_id=17 dog_name=Rex lane=2").unwrap();
        match req {
            ApiRequest::BindParticipant(p) => {
                assert_eq!(p.dog_id.as_deref(), Some("17"));
                assert_eq!(p.dog_name.as_deref(), Some("Rex"));
                assert_eq!(p.club_id, None);
                assert_eq!(p.lane, Some(2));
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_participant_is_accepted_here() {
        // Identifier validation is a session concern, not a codec concern
        let req = ApiRequest::parse_line("participant").unwrap();
        assert_eq!(req, ApiRequest::BindParticipant(Participant::default()));
    }

    #[test]
    fn test_parse_rejects_unencodable_participant() {
        // A bound participant is echoed in responses and stamped into
        // records, so values the writer cannot emit are refused here
        assert_eq!(
            ApiRequest::parse_line("participant dog_name=Réx"),
            Err(LineError::InvalidToken)
        );
        assert_eq!(
            ApiRequest::parse_line("participant dog_id=a=b"),
            Err(LineError::InvalidToken)
        );

        // Whatever parses encodes into the response header
        match ApiRequest::parse_line("participant dog_id=17 dog_name=Rex").unwrap() {
            ApiRequest::BindParticipant(participant) => {
                let resp = crate::response::ApiResponse::ParticipantBound { participant };
                assert!(resp.header_line().is_ok());
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }

    #[test]
    fn test_parse_results_limit() {
        assert_eq!(
            ApiRequest::parse_line("results limit=2").unwrap(),
            ApiRequest::ListResults { limit: Some(2) }
        );
        assert_eq!(
            ApiRequest::parse_line("results").unwrap(),
            ApiRequest::ListResults { limit: None }
        );
        assert_eq!(
            ApiRequest::parse_line("results limit=abc"),
            Err(LineError::BadNumber)
        );
    }

    #[test]
    fn test_parse_sensor() {
        assert_eq!(
            ApiRequest::parse_line("sensor on").unwrap(),
            ApiRequest::SetSensor { enabled: true }
        );
        assert_eq!(
            ApiRequest::parse_line("sensor off").unwrap(),
            ApiRequest::SetSensor { enabled: false }
        );
        assert!(ApiRequest::parse_line("sensor maybe").is_err());
    }

    #[test]
    fn test_parse_bare_verbs() {
        assert_eq!(ApiRequest::parse_line("current").unwrap(), ApiRequest::QueryCurrent);
        assert_eq!(ApiRequest::parse_line(" reset ").unwrap(), ApiRequest::Reset);
        assert_eq!(ApiRequest::parse_line("start").unwrap(), ApiRequest::ManualStart);
        assert_eq!(ApiRequest::parse_line("stop").unwrap(), ApiRequest::ManualStop);
        assert_eq!(ApiRequest::parse_line("ping").unwrap(), ApiRequest::Ping);
    }

    #[test]
    fn test_parse_unknown_verb() {
        assert_eq!(ApiRequest::parse_line("launch"), Err(LineError::UnknownTag));
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let requests = [
            ApiRequest::QueryCurrent,
            ApiRequest::ListResults { limit: Some(5) },
            ApiRequest::Reset,
            ApiRequest::SetSensor { enabled: false },
            ApiRequest::ManualStart,
            ApiRequest::ManualStop,
            ApiRequest::Ping,
        ];
        for req in requests {
            let line = req.encode_line().unwrap();
            assert_eq!(ApiRequest::parse_line(&line).unwrap(), req);
        }
    }
}
