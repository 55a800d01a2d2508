//! Repository seams between the engine and the two databases.
//!
//! Concrete sqlx implementations live in m2p-db; deterministic in-memory
//! fakes live in m2p-testkit.

use anyhow::Result;

use crate::types::{Barcode, BarcodeBatch, ReplaceCounts, TimeWindow};

/// Read-only view of the MES barcode registry.
#[async_trait::async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Batches whose last update falls inside `window`, most recent first.
    /// Restricted to the inventory category the implementation was
    /// constructed with.
    async fn recent_batches(&self, window: TimeWindow) -> Result<Vec<BarcodeBatch>>;

    /// Non-deleted barcodes of one batch. Order is not meaningful.
    async fn batch_barcodes(&self, batch_id: i64) -> Result<Vec<Barcode>>;
}

/// Read/write view of the PLUS serial registries.
#[async_trait::async_trait]
pub trait DownstreamStore: Send + Sync {
    /// Serial codes imported against the order code. Empty is a valid result.
    async fn imported_codes(&self, order_code: &str) -> Result<Vec<String>>;

    /// Serial codes already received into stock for the order code.
    async fn incoming_codes(&self, order_code: &str) -> Result<Vec<String>>;

    /// Serial codes already shipped out for the order code.
    async fn outgoing_codes(&self, order_code: &str) -> Result<Vec<String>>;

    /// Replace the full imported set for one order code: delete every
    /// existing row, then insert `codes`, inside a single write transaction.
    ///
    /// Contract: on any error the transaction is rolled back and the
    /// pre-existing rows remain exactly as they were. A concurrent reader
    /// must never observe the partially rewritten set.
    async fn replace_imported(
        &self,
        order_code: &str,
        item_code: &str,
        codes: &[String],
    ) -> Result<ReplaceCounts>;
}
