//! Control link transmit task
//!
//! Writes responses back over the UART: the header line, then one
//! `run ...` line per attached record.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use photogate_protocol::ApiResponse;

use crate::channels::RESPONSE_CHANNEL;

/// Link TX task - sends response lines
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let response = RESPONSE_CHANNEL.receive().await;
        send_response(&mut tx, &response).await;
    }
}

/// Write one response, header first, records after
async fn send_response(tx: &mut BufferedUartTx, response: &ApiResponse) {
    match response.header_line() {
        Ok(header) => {
            write_line(tx, &header).await;
        }
        Err(e) => {
            // Encoding a header can only fail on oversized participant
            // fields, which the request parser already bounds
            warn!("Failed to encode response header: {:?}", e);
            return;
        }
    }

    for record in response.record_lines() {
        match record.encode_line() {
            Ok(line) => write_line(tx, &line).await,
            Err(e) => warn!("Failed to encode record line: {:?}", e),
        }
    }
}

async fn write_line(tx: &mut BufferedUartTx, line: &str) {
    if let Err(e) = tx.write_all(line.as_bytes()).await {
        warn!("UART write error: {:?}", e);
        return;
    }
    if let Err(e) = tx.write_all(b"\n").await {
        warn!("UART write error: {:?}", e);
    }
}
