//! The timing session state machine
//!
//! One [`TimingSession`] exists per device. It owns the run state, the
//! bound participant, and the shared debounce gate, and is mutated only
//! through the operations below. Callers pass the capture timestamp of
//! the event they are delivering; the session never samples a clock.
//!
//! Completion never blocks on persistence: a finish hands the built
//! [`ResultRecord`] back to the caller, and a failed write downstream
//! does not roll the transition back. Losing one record is preferable
//! to a session stuck in `Running`.

use heapless::String;

use photogate_protocol::{
    ErrorReason, Participant, ResultRecord, RunState, MAX_DEVICE_ID_LEN,
};

use crate::clock;
use crate::config::GateConfig;

use super::debounce::DebounceGate;
use super::events::{EdgeOutcome, SuppressReason};

/// Rejected session operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Binding without `dog_id` or `dog_name`
    NoIdentifier,
    /// Binding while a run is active
    RunActive,
    /// Manual start while a run is active
    AlreadyRunning,
    /// Manual stop with no run in flight
    NoActiveRun,
    /// Manual stop before the minimum elapsed time
    MinElapsedNotReached,
    /// Lost the shared debounce race
    Debounced,
}

impl From<SessionError> for ErrorReason {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NoIdentifier => ErrorReason::NoIdentifierProvided,
            SessionError::RunActive => ErrorReason::RunActive,
            SessionError::AlreadyRunning => ErrorReason::AlreadyRunning,
            SessionError::NoActiveRun => ErrorReason::NoActiveRun,
            SessionError::MinElapsedNotReached => ErrorReason::MinElapsedNotReached,
            SessionError::Debounced => ErrorReason::Debounced,
        }
    }
}

/// The mutable core state of the timer
#[derive(Debug, Clone)]
pub struct TimingSession {
    state: RunState,
    /// Start timestamp in µs; 0 means unset
    start_ts_us: u32,
    /// Finish timestamp in µs; 0 means unset
    finish_ts_us: u32,
    /// True while the current run was started manually
    manual_active: bool,
    /// Independent sensor toggle; edges are ignored entirely when off
    sensor_enabled: bool,
    participant: Option<Participant>,
    gate: DebounceGate,
    device_id: String<MAX_DEVICE_ID_LEN>,
    min_elapsed_ms: u32,
    max_elapsed_ms: u32,
}

impl TimingSession {
    /// Create the session in its initial idle state
    pub fn new(config: &GateConfig) -> Self {
        Self {
            state: RunState::Idle,
            start_ts_us: 0,
            finish_ts_us: 0,
            manual_active: false,
            sensor_enabled: true,
            participant: None,
            gate: DebounceGate::new(config.debounce_ms),
            device_id: config.device_id.clone(),
            min_elapsed_ms: config.min_elapsed_ms,
            max_elapsed_ms: config.max_elapsed_ms,
        }
    }

    // --- Accessors -----------------------------------------------------

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn sensor_enabled(&self) -> bool {
        self.sensor_enabled
    }

    pub fn manual_active(&self) -> bool {
        self.manual_active
    }

    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    /// Start timestamp in ms, 0 when unset
    pub fn start_ms(&self) -> u32 {
        clock::ms_from_us(self.start_ts_us)
    }

    /// Finish timestamp in ms, 0 when unset
    pub fn finish_ms(&self) -> u32 {
        clock::ms_from_us(self.finish_ts_us)
    }

    /// Elapsed time for display
    ///
    /// Live `now - start` while running, the stored `finish - start`
    /// once both ends are set, `None` before any run has started.
    pub fn elapsed_ms(&self, now_us: u32) -> Option<u32> {
        if self.start_ts_us != 0 && self.finish_ts_us != 0 {
            Some(clock::elapsed_ms(self.start_ts_us, self.finish_ts_us))
        } else if self.start_ts_us != 0 && self.state.is_running() {
            Some(clock::elapsed_ms(self.start_ts_us, now_us))
        } else {
            None
        }
    }

    // --- Trigger-driven transitions ------------------------------------

    /// Feed one sensor edge
    ///
    /// Suppression checks run before the debounce gate so that ignored
    /// edges (sensor off, manual lockout) do not consume the window.
    pub fn sensor_edge(&mut self, now_us: u32) -> EdgeOutcome {
        if !self.sensor_enabled {
            return EdgeOutcome::Suppressed(SuppressReason::SensorDisabled);
        }
        if self.manual_active {
            return EdgeOutcome::Suppressed(SuppressReason::ManualActive);
        }
        if !self.gate.check(now_us) {
            return EdgeOutcome::Suppressed(SuppressReason::Debounced);
        }

        match self.state {
            RunState::Idle => {
                self.begin_run(now_us, false);
                EdgeOutcome::Started {
                    start_ms: self.start_ms(),
                }
            }
            RunState::Running => {
                if clock::elapsed_ms(self.start_ts_us, now_us) < self.min_elapsed_ms {
                    // Same pass of the same dog; not a finish
                    EdgeOutcome::Suppressed(SuppressReason::FalseFinish)
                } else {
                    EdgeOutcome::Finished(self.complete_run(now_us))
                }
            }
        }
    }

    /// Start a run manually, locking the sensor out until completion
    ///
    /// Returns the start timestamp in ms.
    pub fn manual_start(&mut self, now_us: u32) -> Result<u32, SessionError> {
        if !self.gate.check(now_us) {
            return Err(SessionError::Debounced);
        }
        if self.state.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.begin_run(now_us, true);
        Ok(self.start_ms())
    }

    /// Finish the active run manually
    ///
    /// Works for sensor-started runs as well, with the same
    /// minimum-elapsed guard as a sensor finish.
    pub fn manual_stop(&mut self, now_us: u32) -> Result<ResultRecord, SessionError> {
        if !self.gate.check(now_us) {
            return Err(SessionError::Debounced);
        }
        if !self.state.is_running() {
            return Err(SessionError::NoActiveRun);
        }
        if clock::elapsed_ms(self.start_ts_us, now_us) < self.min_elapsed_ms {
            return Err(SessionError::MinElapsedNotReached);
        }
        Ok(self.complete_run(now_us))
    }

    // --- Request-driven operations -------------------------------------

    /// Bind a participant to the next run
    ///
    /// Rejections leave any previously bound participant in place.
    pub fn bind_participant(&mut self, participant: Participant) -> Result<(), SessionError> {
        if !participant.has_identifier() {
            return Err(SessionError::NoIdentifier);
        }
        if self.state.is_running() {
            return Err(SessionError::RunActive);
        }
        self.participant = Some(participant);
        Ok(())
    }

    /// Set the sensor toggle, returning the new value
    ///
    /// Idempotent, and deliberately independent of the run state: a
    /// manual run keeps going regardless.
    pub fn set_sensor_enabled(&mut self, enabled: bool) -> bool {
        self.sensor_enabled = enabled;
        enabled
    }

    /// Force the session back to its initial values
    ///
    /// Never writes a record. The sensor toggle survives a reset.
    pub fn reset(&mut self) {
        self.state = RunState::Idle;
        self.start_ts_us = 0;
        self.finish_ts_us = 0;
        self.manual_active = false;
        self.participant = None;
        self.gate.reset();
    }

    /// Abandon a run stuck past the maximum duration
    ///
    /// Returns the abandoned elapsed time when the guard fired. No
    /// record is written; the run never legitimately finished. A zero
    /// `max_elapsed_ms` disables the guard.
    pub fn check_timeout(&mut self, now_us: u32) -> Option<u32> {
        if self.max_elapsed_ms == 0 || !self.state.is_running() {
            return None;
        }
        let elapsed = clock::elapsed_ms(self.start_ts_us, now_us);
        if elapsed <= self.max_elapsed_ms {
            return None;
        }
        self.reset();
        Some(elapsed)
    }

    // --- Internals -----------------------------------------------------

    fn begin_run(&mut self, now_us: u32, manual: bool) {
        // A microsecond counter can legitimately read 0; nudge to keep
        // the "0 = unset" convention intact
        self.start_ts_us = if now_us == 0 { 1 } else { now_us };
        self.finish_ts_us = 0;
        self.state = RunState::Running;
        self.manual_active = manual;
    }

    /// Common completion path for sensor and manual finishes
    fn complete_run(&mut self, now_us: u32) -> ResultRecord {
        self.finish_ts_us = if now_us == 0 { 1 } else { now_us };

        let record = ResultRecord {
            device: self.device_id.clone(),
            participant: self.participant.clone().unwrap_or_default(),
            start_ms: Some(self.start_ms()),
            finish_ms: Some(self.finish_ms()),
            elapsed_ms: Some(clock::elapsed_ms(self.start_ts_us, self.finish_ts_us)),
            received_ms: clock::ms_from_us(now_us),
        };

        // Timestamps stay readable until the next run or reset
        self.state = RunState::Idle;
        self.manual_active = false;
        self.participant = None;

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::events::{EdgeOutcome, SuppressReason};

    const MS: u32 = 1_000;

    fn session() -> TimingSession {
        TimingSession::new(&GateConfig::default())
    }

    fn rex() -> Participant {
        Participant {
            dog_id: Some(String::try_from("17").unwrap()),
            dog_name: Some(String::try_from("Rex").unwrap()),
            club_id: None,
            lane: Some(1),
        }
    }

    #[test]
    fn test_sensor_start_and_finish() {
        let mut s = session();
        assert!(matches!(s.sensor_edge(10 * MS), EdgeOutcome::Started { .. }));
        assert!(s.state().is_running());

        match s.sensor_edge(515 * MS) {
            EdgeOutcome::Finished(record) => {
                assert_eq!(record.elapsed_ms, Some(505));
                assert_eq!(
                    record.elapsed_ms,
                    Some(record.finish_ms.unwrap() - record.start_ms.unwrap())
                );
            }
            other => panic!("expected finish, got {:?}", other),
        }
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_false_finish_keeps_running() {
        let mut s = session();
        s.sensor_edge(MS);
        // 499 ms < minimum elapsed: same pass, not a finish
        assert_eq!(
            s.sensor_edge(500 * MS),
            EdgeOutcome::Suppressed(SuppressReason::FalseFinish)
        );
        assert!(s.state().is_running());
        // The real finish still works afterwards
        assert!(matches!(s.sensor_edge(601 * MS), EdgeOutcome::Finished(_)));
    }

    #[test]
    fn test_debounce_drops_chatter() {
        let mut s = session();
        assert!(matches!(s.sensor_edge(MS), EdgeOutcome::Started { .. }));
        // Electrical chatter 2 ms after the accepted edge
        assert_eq!(
            s.sensor_edge(3 * MS),
            EdgeOutcome::Suppressed(SuppressReason::Debounced)
        );
        assert!(s.state().is_running());
    }

    #[test]
    fn test_sensor_disabled_ignores_edges() {
        let mut s = session();
        assert!(!s.set_sensor_enabled(false));
        assert_eq!(
            s.sensor_edge(0),
            EdgeOutcome::Suppressed(SuppressReason::SensorDisabled)
        );
        assert_eq!(s.state(), RunState::Idle);

        // Re-enabling is idempotent and takes effect immediately
        assert!(s.set_sensor_enabled(true));
        assert!(s.set_sensor_enabled(true));
        assert!(matches!(s.sensor_edge(MS), EdgeOutcome::Started { .. }));
    }

    #[test]
    fn test_manual_run_locks_out_sensor() {
        let mut s = session();
        s.manual_start(MS).unwrap();
        assert!(s.manual_active());

        assert_eq!(
            s.sensor_edge(600 * MS),
            EdgeOutcome::Suppressed(SuppressReason::ManualActive)
        );
        assert!(s.state().is_running());

        let record = s.manual_stop(701 * MS).unwrap();
        assert_eq!(record.elapsed_ms, Some(700));
        assert!(!s.manual_active());

        // Lockout ends with the run
        assert!(matches!(s.sensor_edge(800 * MS), EdgeOutcome::Started { .. }));
    }

    #[test]
    fn test_sensor_toggle_does_not_disturb_manual_run() {
        let mut s = session();
        s.manual_start(MS).unwrap();
        s.set_sensor_enabled(false);
        s.set_sensor_enabled(true);
        assert!(s.state().is_running());
        assert!(s.manual_active());
    }

    #[test]
    fn test_manual_start_while_running_rejected() {
        let mut s = session();
        s.manual_start(MS).unwrap();
        assert_eq!(s.manual_start(600 * MS), Err(SessionError::AlreadyRunning));
        // The rejected start must not clobber the original start time
        assert_eq!(s.start_ms(), 1);
        assert!(s.state().is_running());
    }

    #[test]
    fn test_manual_stop_while_idle_rejected() {
        let mut s = session();
        assert_eq!(s.manual_stop(MS), Err(SessionError::NoActiveRun));
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_premature_manual_stop_rejected() {
        let mut s = session();
        s.manual_start(MS).unwrap();
        assert_eq!(
            s.manual_stop(51 * MS),
            Err(SessionError::MinElapsedNotReached)
        );
        assert!(s.state().is_running());
        // And the run can still be finished properly
        assert!(s.manual_stop(601 * MS).is_ok());
    }

    #[test]
    fn test_bind_participant_idle_only() {
        let mut s = session();
        s.bind_participant(rex()).unwrap();
        assert_eq!(s.participant().unwrap().dog_name.as_deref(), Some("Rex"));

        s.manual_start(MS).unwrap();
        let other = Participant {
            dog_name: Some(String::try_from("Luna").unwrap()),
            ..Participant::default()
        };
        assert_eq!(s.bind_participant(other), Err(SessionError::RunActive));
        // Previous binding untouched
        assert_eq!(s.participant().unwrap().dog_name.as_deref(), Some("Rex"));
    }

    #[test]
    fn test_bind_requires_identifier() {
        let mut s = session();
        let anonymous = Participant {
            club_id: Some(String::try_from("5").unwrap()),
            lane: Some(2),
            ..Participant::default()
        };
        assert_eq!(s.bind_participant(anonymous), Err(SessionError::NoIdentifier));
        assert!(s.participant().is_none());
    }

    #[test]
    fn test_completion_snapshots_and_clears_participant() {
        let mut s = session();
        s.bind_participant(rex()).unwrap();
        s.sensor_edge(10 * MS);
        match s.sensor_edge(515 * MS) {
            EdgeOutcome::Finished(record) => {
                assert_eq!(record.participant.dog_name.as_deref(), Some("Rex"));
                assert_eq!(record.device.as_str(), "gate-01");
            }
            other => panic!("expected finish, got {:?}", other),
        }
        assert!(s.participant().is_none());
    }

    #[test]
    fn test_elapsed_query_lifecycle() {
        let mut s = session();
        assert_eq!(s.elapsed_ms(MS), None);

        s.sensor_edge(MS);
        assert_eq!(s.elapsed_ms(43 * MS), Some(42));

        s.sensor_edge(506 * MS);
        // Finished: stored elapsed, independent of the query time
        assert_eq!(s.elapsed_ms(900 * MS), Some(505));

        s.reset();
        assert_eq!(s.elapsed_ms(901 * MS), None);
    }

    #[test]
    fn test_reset_clears_everything_but_sensor_flag() {
        let mut s = session();
        s.set_sensor_enabled(false);
        s.bind_participant(rex()).unwrap();
        s.manual_start(10 * MS).unwrap();

        s.reset();
        assert_eq!(s.state(), RunState::Idle);
        assert_eq!(s.start_ms(), 0);
        assert_eq!(s.finish_ms(), 0);
        assert!(!s.manual_active());
        assert!(s.participant().is_none());
        assert!(!s.sensor_enabled());
    }

    #[test]
    fn test_timeout_abandons_stuck_run() {
        let mut s = session();
        s.sensor_edge(MS);
        assert_eq!(s.check_timeout(600_000 * MS), None);

        // Past 600 s: abandon without a record
        let abandoned = s.check_timeout(600_002 * MS).unwrap();
        assert!(abandoned > 600_000);
        assert_eq!(s.state(), RunState::Idle);
        assert_eq!(s.elapsed_ms(600_003 * MS), None);
    }

    #[test]
    fn test_timeout_disabled_with_zero() {
        let mut config = GateConfig::default();
        config.max_elapsed_ms = 0;
        let mut s = TimingSession::new(&config);
        s.sensor_edge(MS);
        assert_eq!(s.check_timeout(4_000_000 * MS), None);
        assert!(s.state().is_running());
    }

    #[test]
    fn test_timeout_idle_is_noop() {
        let mut s = session();
        assert_eq!(s.check_timeout(700_000 * MS), None);
    }

    #[test]
    fn test_start_at_counter_zero_still_counts_as_started() {
        let mut s = session();
        s.sensor_edge(0);
        assert!(s.state().is_running());
        assert!(s.elapsed_ms(100 * MS).is_some());
    }

    #[test]
    fn test_debounced_manual_request_reported() {
        let mut s = session();
        s.manual_start(MS).unwrap();
        // A stop 5 ms after the accepted start edge loses the gate race
        assert_eq!(s.manual_stop(6 * MS), Err(SessionError::Debounced));
        assert!(s.state().is_running());
    }
}
