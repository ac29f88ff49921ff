//! Storage task
//!
//! Sole owner of the flash peripheral. Appends completed records to
//! the result-log queue and answers list queries by scanning the log
//! into a bounded tail. Append failures are logged and dropped; the
//! session completed either way and a retry would only reorder the log.

use defmt::*;

use photogate_core::store::TailReader;
use photogate_protocol::ApiResponse;

use crate::channels::{StoreCommand, RESPONSE_CHANNEL, STORE_CHANNEL};
use crate::flash::FlashStore;

/// Storage task - drains append and list commands
#[embassy_executor::task]
pub async fn store_task(mut storage: FlashStore<'static>) {
    info!("Storage task started");

    loop {
        match STORE_CHANNEL.receive().await {
            StoreCommand::Append(record) => match record.encode_line() {
                Ok(line) => {
                    if let Err(e) = storage.append_result(line.as_bytes()).await {
                        warn!("Failed to append result: {:?}", e);
                    } else {
                        debug!("Result appended: {} bytes", line.len());
                    }
                }
                Err(e) => warn!("Failed to encode result: {:?}", e),
            },

            StoreCommand::List { limit } => {
                let mut reader = TailReader::new(limit);
                if let Err(e) = storage.read_results(&mut reader).await {
                    warn!("Result log scan failed: {:?}", e);
                    // Whatever was read before the failure still counts
                }
                let page = reader.finish();
                debug!(
                    "List: {} returned, {} total, {} skipped",
                    page.records.len(),
                    page.total,
                    page.skipped
                );
                RESPONSE_CHANNEL
                    .send(ApiResponse::Results {
                        total: page.total,
                        skipped: page.skipped,
                        records: page.records,
                    })
                    .await;
            }
        }
    }
}
