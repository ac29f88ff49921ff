//! Main controller task
//!
//! Sole owner of the timing session. Drains captured trigger edges in
//! arrival order, answers API requests, and runs the stuck-run guard
//! on every tick. Completed records are handed off to the storage task
//! and never awaited; a slow flash write costs queue depth here, not
//! timing accuracy.

use defmt::*;
use embassy_futures::select::{select3, Either3};

use photogate_core::config::GateConfig;
use photogate_core::timing::{EdgeOutcome, TimingSession, TriggerEdge, TriggerSource};
use photogate_protocol::{ApiRequest, ApiResponse, CurrentStatus};

use crate::channels::{
    StoreCommand, REQUEST_CHANNEL, RESPONSE_CHANNEL, STORE_CHANNEL, TRIGGER_CHANNEL,
};
use crate::tasks::tick::{now_us, TICK_SIGNAL};

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task(config: GateConfig) {
    info!("Controller task started");

    let mut session = TimingSession::new(&config);

    loop {
        match select3(
            TRIGGER_CHANNEL.receive(),
            REQUEST_CHANNEL.receive(),
            TICK_SIGNAL.wait(),
        )
        .await
        {
            Either3::First(edge) => handle_edge(&mut session, edge),

            Either3::Second(request) => {
                if let Some(response) = handle_request(&mut session, request).await {
                    RESPONSE_CHANNEL.send(response).await;
                }
            }

            Either3::Third(now) => {
                if let Some(elapsed) = session.check_timeout(now) {
                    warn!("Abandoned stuck run after {} ms", elapsed);
                }
            }
        }
    }
}

/// Apply one captured hardware edge to the session
fn handle_edge(session: &mut TimingSession, edge: TriggerEdge) {
    match edge.source {
        TriggerSource::Sensor => match session.sensor_edge(edge.ts_us) {
            EdgeOutcome::Started { start_ms } => {
                info!("Run started at {} ms", start_ms);
            }
            EdgeOutcome::Finished(record) => {
                info!("Run finished, elapsed {} ms", record.elapsed_ms.unwrap_or(0));
                persist(record);
            }
            EdgeOutcome::Suppressed(reason) => {
                debug!("Sensor edge suppressed: {:?}", reason);
            }
        },
        TriggerSource::ManualStart => match session.manual_start(edge.ts_us) {
            Ok(start_ms) => info!("Manual run started at {} ms", start_ms),
            Err(e) => debug!("Start button rejected: {:?}", e),
        },
        TriggerSource::ManualStop => match session.manual_stop(edge.ts_us) {
            Ok(record) => {
                info!(
                    "Manual run finished, elapsed {} ms",
                    record.elapsed_ms.unwrap_or(0)
                );
                persist(record);
            }
            Err(e) => debug!("Stop button rejected: {:?}", e),
        },
    }
}

/// Answer one API request, or hand it to the storage task
///
/// `None` means the storage task will respond by itself.
async fn handle_request(
    session: &mut TimingSession,
    request: ApiRequest,
) -> Option<ApiResponse> {
    let response = match request {
        ApiRequest::BindParticipant(participant) => {
            match session.bind_participant(participant.clone()) {
                Ok(()) => ApiResponse::ParticipantBound { participant },
                Err(e) => ApiResponse::Error { reason: e.into() },
            }
        }

        ApiRequest::QueryCurrent => ApiResponse::Current(CurrentStatus {
            state: session.state(),
            sensor_enabled: session.sensor_enabled(),
            manual_active: session.manual_active(),
            participant: session.participant().cloned(),
            start_ms: session.start_ms(),
            finish_ms: session.finish_ms(),
            elapsed_ms: session.elapsed_ms(now_us()),
        }),

        ApiRequest::ListResults { limit } => {
            // The storage task never sends back to the controller, so
            // this send cannot deadlock; the caller always gets a reply
            STORE_CHANNEL.send(StoreCommand::List { limit }).await;
            return None;
        }

        ApiRequest::Reset => {
            session.reset();
            info!("Session reset");
            ApiResponse::ResetAck
        }

        ApiRequest::SetSensor { enabled } => {
            let enabled = session.set_sensor_enabled(enabled);
            info!("Sensor {}", if enabled { "enabled" } else { "disabled" });
            ApiResponse::SensorFlag { enabled }
        }

        ApiRequest::ManualStart => match session.manual_start(now_us()) {
            Ok(start_ms) => {
                info!("Manual run started via link at {} ms", start_ms);
                ApiResponse::ManualStarted {
                    start_ms,
                    participant: session.participant().cloned(),
                }
            }
            Err(e) => ApiResponse::Error { reason: e.into() },
        },

        ApiRequest::ManualStop => match session.manual_stop(now_us()) {
            Ok(record) => {
                info!(
                    "Manual run finished via link, elapsed {} ms",
                    record.elapsed_ms.unwrap_or(0)
                );
                persist(record.clone());
                ApiResponse::ManualStopped { record }
            }
            Err(e) => ApiResponse::Error { reason: e.into() },
        },

        ApiRequest::Ping => ApiResponse::Pong,
    };

    Some(response)
}

/// Queue a completed record for the storage task
///
/// The record is dropped with a warning when the queue is full; the
/// completed transition stands either way.
fn persist(record: photogate_protocol::ResultRecord) {
    if STORE_CHANNEL.try_send(StoreCommand::Append(record)).is_err() {
        warn!("Storage queue full, result record dropped");
    }
}
