//! Control link receive task
//!
//! Assembles incoming UART bytes into request lines and hands parsed
//! requests to the controller. Unparseable lines get a `bad_request`
//! error response straight away; the controller never sees them.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use photogate_protocol::{ApiRequest, ApiResponse, ErrorReason, MAX_LINE_LEN};

use crate::channels::{REQUEST_CHANNEL, RESPONSE_CHANNEL};

/// Buffer size for UART reads
const RX_BUF_SIZE: usize = 64;

/// Link RX task - reads and parses request lines
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut line: heapless::String<MAX_LINE_LEN> = heapless::String::new();
    // Set when the current line overflowed and is being discarded
    let mut overflow = false;
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    match byte {
                        b'\n' => {
                            if overflow {
                                overflow = false;
                            } else if !line.trim().is_empty() {
                                dispatch_line(line.trim()).await;
                            }
                            line.clear();
                        }
                        b'\r' => {}
                        _ => {
                            if !overflow && line.push(byte as char).is_err() {
                                warn!("Request line too long, discarding");
                                overflow = true;
                                line.clear();
                                RESPONSE_CHANNEL
                                    .send(ApiResponse::Error {
                                        reason: ErrorReason::BadRequest,
                                    })
                                    .await;
                            }
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Parse one complete line and route it
async fn dispatch_line(line: &str) {
    match ApiRequest::parse_line(line) {
        Ok(request) => {
            debug!("Request: {:?}", request);
            REQUEST_CHANNEL.send(request).await;
        }
        Err(e) => {
            warn!("Bad request line: {:?}", e);
            RESPONSE_CHANNEL
                .send(ApiResponse::Error {
                    reason: ErrorReason::BadRequest,
                })
                .await;
        }
    }
}
