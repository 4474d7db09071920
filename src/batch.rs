//! Batch processing: the per-send loop the host pipeline drives.
//!
//! Readings arrive in storage order and are walked exactly once. Each one
//! either resolves to a trap (encode, dispatch) or is skipped because no
//! OID is bound to its asset. Either way it counts as processed: the host
//! uses the returned numbers to advance its stream position, so "skipped"
//! must still mean "consumed".

use crate::bindings::BindingTable;
use crate::core::{BatchResult, PayloadEncoder, Reading};
use crate::dispatch::TrapDispatcher;
use std::sync::Arc;
use tracing::{debug, error};

/// Drives one batch of readings through resolve -> encode -> dispatch.
pub struct BatchProcessor {
    table: Arc<BindingTable>,
    encoder: Arc<dyn PayloadEncoder>,
    dispatcher: TrapDispatcher,
}

impl BatchProcessor {
    pub fn new(
        table: Arc<BindingTable>,
        encoder: Arc<dyn PayloadEncoder>,
        dispatcher: TrapDispatcher,
    ) -> Self {
        Self {
            table,
            encoder,
            dispatcher,
        }
    }

    /// Processes the readings in order and reports batch consumption.
    ///
    /// Transport failures never abort the batch; they are logged by the
    /// dispatcher and the loop moves on. An encoding failure does abort:
    /// the remaining readings are left untouched and the result reports
    /// no progress, so the host will offer the batch again.
    ///
    /// Cancelling the surrounding task drops the batch mid-dispatch; no
    /// result reaches the host in that case.
    pub async fn process(&self, readings: &[Reading]) -> BatchResult {
        let mut last_object_id = 0;
        let mut processed: u64 = 0;

        for reading in readings {
            last_object_id = reading.id;
            match self.table.resolve(&reading.asset_code) {
                Some(oid) => {
                    let payload = match self.encoder.encode(&reading.user_ts, &reading.reading) {
                        Ok(payload) => payload,
                        Err(e) => {
                            error!(
                                id = reading.id,
                                asset = %reading.asset_code,
                                error = %e,
                                "failed to encode trap payload, aborting batch"
                            );
                            return BatchResult {
                                any_sent: false,
                                last_object_id,
                                sent_count: 0,
                            };
                        }
                    };
                    self.dispatcher.dispatch(oid, &payload).await;
                }
                None => {
                    debug!(asset = %reading.asset_code, "no OID bound for asset, skipping trap");
                    metrics::counter!("traps_skipped_total").increment(1);
                }
            }
            processed += 1;
            metrics::counter!("readings_processed_total").increment(1);
        }

        BatchResult {
            any_sent: true,
            last_object_id,
            sent_count: processed,
        }
    }
}
