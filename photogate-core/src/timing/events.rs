//! Trigger edges and their outcomes

use photogate_protocol::ResultRecord;

/// Physical source of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSource {
    /// Beam-break sensor
    Sensor,
    /// Manual start button
    ManualStart,
    /// Manual stop button
    ManualStop,
}

/// One captured edge: source plus the timestamp taken at capture time
///
/// This is the only thing an edge callback produces; the session never
/// samples the clock itself, so a queued edge keeps the time it
/// actually happened even when processing lags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerEdge {
    pub source: TriggerSource,
    pub ts_us: u32,
}

/// Why an edge was dropped before causing a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SuppressReason {
    /// Sensor toggle is off
    SensorDisabled,
    /// A manual run is in flight; the sensor is locked out
    ManualActive,
    /// Within the shared debounce window
    Debounced,
    /// Finish edge before the minimum elapsed time
    FalseFinish,
}

/// Result of feeding a sensor edge to the session
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// The edge started a run
    Started { start_ms: u32 },
    /// The edge finished the run; the record still needs persisting
    Finished(ResultRecord),
    /// The edge was dropped
    Suppressed(SuppressReason),
}
