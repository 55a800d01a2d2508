use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One barcode-generation event in MES, joined with its inventory item and
/// production task. Read-only here; MES owns the lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarcodeBatch {
    /// MES batch id (`bc_id`), unique per generation event.
    pub batch_id: i64,
    /// Free-form sales-order reference as typed into MES. The canonical
    /// order code is derived from this by `m2p_ordercode::extract`.
    pub raw_order: String,
    pub item_code: String,
    pub item_name: String,
    /// Production task code; the join in MES is a LEFT JOIN, so the task may
    /// be absent.
    pub task_code: Option<String>,
}

/// A single generated serial number within a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Barcode {
    pub barcode_id: i64,
    pub code: String,
}

/// Half-open-in-spirit recency window on MES `last_update_date`, expressed in
/// the wall-clock timezone both databases store their DATETIME columns in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Row counts from an atomic delete-and-reimport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceCounts {
    pub deleted: u64,
    pub inserted: u64,
}

/// Terminal state of one batch's pass through the guard sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Drift repaired: imported set replaced with the upstream set.
    Reimported { deleted: u64, inserted: u64 },
    /// Upstream and downstream code sets are already equal.
    InSync,
    /// Received or shipped serials exist for the order code; the imported
    /// set is frozen and must not be rewritten.
    MovementLocked { incoming: usize, outgoing: usize },
    /// The write transaction failed and was rolled back; the order's
    /// pre-existing rows are untouched.
    Failed { error: String },
}

impl BatchOutcome {
    pub fn is_reimport(&self) -> bool {
        matches!(self, BatchOutcome::Reimported { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

/// Per-batch entry in the run report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: i64,
    pub task_code: Option<String>,
    /// Canonical order code extracted from the raw order string.
    pub order_code: String,
    /// Upstream (MES) serial count for the batch.
    pub upstream: usize,
    /// Downstream (PLUS) imported serial count before any write.
    pub downstream: usize,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Result of one full reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub batches: Vec<BatchReport>,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.batches.len()
    }

    pub fn reimported(&self) -> usize {
        self.batches.iter().filter(|b| b.outcome.is_reimport()).count()
    }

    pub fn in_sync(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.outcome == BatchOutcome::InSync)
            .count()
    }

    pub fn movement_locked(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| matches!(b.outcome, BatchOutcome::MovementLocked { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.batches.iter().filter(|b| b.outcome.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}
