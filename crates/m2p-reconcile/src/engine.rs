use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::repo::{DownstreamStore, UpstreamSource};
use crate::types::{BarcodeBatch, BatchOutcome, BatchReport, RunReport, TimeWindow};

/// Drives one reconciliation pass: pull recently updated MES batches, derive
/// the order code for each, compare serial sets, apply the guard sequence
/// and, only when safe, replace the PLUS imported set atomically.
///
/// Batches are processed sequentially in last-update DESC order (most recent
/// drift first). Each batch is independent; the write transaction scope is
/// exactly one order code and is resolved before the next batch starts.
pub struct SyncEngine<U, D> {
    upstream: U,
    downstream: D,
    config: SyncConfig,
}

impl<U: UpstreamSource, D: DownstreamStore> SyncEngine<U, D> {
    pub fn new(upstream: U, downstream: D, config: SyncConfig) -> Self {
        Self {
            upstream,
            downstream,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// One pass over the current recency window.
    ///
    /// Read errors (batch list, barcode fetch, PLUS lookups) abort the run:
    /// guard evaluation needs consistent reads, so there is no partial-result
    /// tolerance. A failed write only fails the run when
    /// `fail_on_reimport_error` is set.
    pub async fn run(&self) -> Result<RunReport> {
        self.run_window(self.config.current_window()).await
    }

    /// Same as [`run`](Self::run) with an explicit window (tests, backfills).
    pub async fn run_window(&self, window: TimeWindow) -> Result<RunReport> {
        let batches = self
            .upstream
            .recent_batches(window)
            .await
            .context("listing recently updated barcode batches failed")?;
        info!(batches = batches.len(), "recently updated barcode batches");

        let mut report = RunReport::default();
        for batch in batches {
            let entry = self.process_batch(&batch).await?;
            report.batches.push(entry);
        }

        info!(
            processed = report.processed(),
            reimported = report.reimported(),
            in_sync = report.in_sync(),
            movement_locked = report.movement_locked(),
            failed = report.failed(),
            "reconciliation pass complete"
        );
        Ok(report)
    }

    /// Guard sequence for one batch:
    ///
    /// 1. count mismatch: drift signal only, never a skip
    /// 2. set equality: in sync, skip
    /// 3. movement lock: received/shipped serials exist, skip
    /// 4. otherwise: atomic delete + reimport
    async fn process_batch(&self, batch: &BarcodeBatch) -> Result<BatchReport> {
        let order_code = m2p_ordercode::extract(&batch.raw_order);
        info!(
            batch_id = batch.batch_id,
            task = batch.task_code.as_deref().unwrap_or("-"),
            order = %order_code,
            "processing batch"
        );

        let barcodes = self
            .upstream
            .batch_barcodes(batch.batch_id)
            .await
            .with_context(|| format!("fetching MES barcodes for batch {} failed", batch.batch_id))?;
        let upstream_codes: BTreeSet<String> = barcodes.iter().map(|b| b.code.clone()).collect();

        let imported = self
            .downstream
            .imported_codes(&order_code)
            .await
            .with_context(|| format!("fetching PLUS imported serials for {order_code} failed"))?;
        let downstream_codes: BTreeSet<String> = imported.iter().cloned().collect();

        let report = |outcome| BatchReport {
            batch_id: batch.batch_id,
            task_code: batch.task_code.clone(),
            order_code: order_code.clone(),
            upstream: barcodes.len(),
            downstream: imported.len(),
            outcome,
        };

        if barcodes.len() != imported.len() {
            info!(
                upstream = barcodes.len(),
                downstream = imported.len(),
                "serial counts differ"
            );
        }

        if upstream_codes == downstream_codes {
            info!("serial sets already in sync, skipping");
            return Ok(report(BatchOutcome::InSync));
        }

        // Movement lock, checked immediately before the write: once serials
        // have moved into receiving or shipping, rewriting the imported set
        // would desynchronize them from their physical goods.
        let incoming = self
            .downstream
            .incoming_codes(&order_code)
            .await
            .with_context(|| format!("fetching PLUS incoming serials for {order_code} failed"))?;
        let outgoing = self
            .downstream
            .outgoing_codes(&order_code)
            .await
            .with_context(|| format!("fetching PLUS outgoing serials for {order_code} failed"))?;
        if !incoming.is_empty() || !outgoing.is_empty() {
            warn!(
                incoming = incoming.len(),
                outgoing = outgoing.len(),
                "movement lock: serials already received or shipped, skipping"
            );
            return Ok(report(BatchOutcome::MovementLocked {
                incoming: incoming.len(),
                outgoing: outgoing.len(),
            }));
        }

        // Deduplicated, deterministic insert order.
        let codes: Vec<String> = upstream_codes.into_iter().collect();
        match self
            .downstream
            .replace_imported(&order_code, &batch.item_code, &codes)
            .await
        {
            Ok(counts) => {
                info!(
                    deleted = counts.deleted,
                    inserted = counts.inserted,
                    "reimported serial set"
                );
                Ok(report(BatchOutcome::Reimported {
                    deleted: counts.deleted,
                    inserted: counts.inserted,
                }))
            }
            Err(e) if self.config.fail_on_reimport_error => {
                Err(e).with_context(|| format!("reimport for {order_code} failed"))
            }
            Err(e) => {
                // Rolled back by the store; this order keeps its old rows and
                // the pass moves on to the next batch.
                let msg = format!("{e:#}");
                error!(order = %order_code, error = %msg, "reimport failed, continuing");
                Ok(report(BatchOutcome::Failed { error: msg }))
            }
        }
    }
}
