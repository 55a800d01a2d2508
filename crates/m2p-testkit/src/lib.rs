//! m2p-testkit
//!
//! Deterministic in-memory stand-ins for the MES and PLUS repositories.
//! No database, no network I/O; scenario tests drive the real `SyncEngine`
//! against these fakes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::NaiveDate;

use m2p_reconcile::{
    Barcode, BarcodeBatch, DownstreamStore, ReplaceCounts, TimeWindow, UpstreamSource,
};

/// Fixed reference window for scenario tests. The fakes do not filter by
/// window (that is the SQL layer's job); the engine only threads it through.
pub fn test_window() -> TimeWindow {
    let now = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    m2p_reconcile::SyncConfig::default().window_around(now)
}

/// Convenience batch constructor for scenarios.
pub fn batch(batch_id: i64, raw_order: &str, item_code: &str) -> BarcodeBatch {
    BarcodeBatch {
        batch_id,
        raw_order: raw_order.to_string(),
        item_code: item_code.to_string(),
        item_name: format!("item {item_code}"),
        task_code: Some(format!("TASK-{batch_id:04}")),
    }
}

// ---------------------------------------------------------------------------
// FakeMes
// ---------------------------------------------------------------------------

/// Seeded, immutable upstream registry. Batches are returned in seed order,
/// which scenarios treat as last-update DESC.
#[derive(Clone, Default)]
pub struct FakeMes {
    batches: Vec<BarcodeBatch>,
    barcodes: BTreeMap<i64, Vec<Barcode>>,
}

impl FakeMes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: BarcodeBatch, codes: &[&str]) -> Self {
        let barcodes = codes
            .iter()
            .enumerate()
            .map(|(i, code)| Barcode {
                barcode_id: batch.batch_id * 1_000 + i as i64,
                code: (*code).to_string(),
            })
            .collect();
        self.barcodes.insert(batch.batch_id, barcodes);
        self.batches.push(batch);
        self
    }
}

#[async_trait::async_trait]
impl UpstreamSource for FakeMes {
    async fn recent_batches(&self, _window: TimeWindow) -> Result<Vec<BarcodeBatch>> {
        Ok(self.batches.clone())
    }

    async fn batch_barcodes(&self, batch_id: i64) -> Result<Vec<Barcode>> {
        Ok(self.barcodes.get(&batch_id).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// FakePlus
// ---------------------------------------------------------------------------

/// A row of the fake imported-serials table, provenance stamp included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedRow {
    pub code: String,
    pub item_code: String,
    pub import_source: String,
    pub entered_by: String,
}

#[derive(Default)]
struct PlusState {
    imported: BTreeMap<String, Vec<ImportedRow>>,
    incoming: BTreeMap<String, Vec<String>>,
    outgoing: BTreeMap<String, Vec<String>>,
    /// When set, `replace_imported` for this order code fails after
    /// computing the delete count but before touching any row, the
    /// in-memory analog of a rolled-back transaction.
    fail_insert_for: Option<String>,
    replace_calls: u64,
    deleted_total: u64,
    inserted_total: u64,
}

/// Shared-handle fake of the PLUS registries. Clone the handle before moving
/// it into the engine to keep inspecting state after the run.
#[derive(Clone, Default)]
pub struct FakePlus {
    state: Arc<Mutex<PlusState>>,
}

impl FakePlus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_imported(&self, order_code: &str, item_code: &str, codes: &[&str]) {
        let rows = codes
            .iter()
            .map(|code| ImportedRow {
                code: (*code).to_string(),
                item_code: item_code.to_string(),
                import_source: "seed".to_string(),
                entered_by: "seed".to_string(),
            })
            .collect();
        self.lock().imported.insert(order_code.to_string(), rows);
    }

    pub fn seed_incoming(&self, order_code: &str, codes: &[&str]) {
        self.lock()
            .incoming
            .insert(order_code.to_string(), to_strings(codes));
    }

    pub fn seed_outgoing(&self, order_code: &str, codes: &[&str]) {
        self.lock()
            .outgoing
            .insert(order_code.to_string(), to_strings(codes));
    }

    pub fn fail_insert_for(&self, order_code: &str) {
        self.lock().fail_insert_for = Some(order_code.to_string());
    }

    pub fn imported_rows(&self, order_code: &str) -> Vec<ImportedRow> {
        self.lock()
            .imported
            .get(order_code)
            .cloned()
            .unwrap_or_default()
    }

    pub fn imported_code_set(&self, order_code: &str) -> Vec<String> {
        let mut codes: Vec<String> = self
            .imported_rows(order_code)
            .into_iter()
            .map(|r| r.code)
            .collect();
        codes.sort();
        codes
    }

    pub fn replace_calls(&self) -> u64 {
        self.lock().replace_calls
    }

    pub fn write_totals(&self) -> (u64, u64) {
        let s = self.lock();
        (s.deleted_total, s.inserted_total)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlusState> {
        self.state.lock().expect("fake PLUS state lock poisoned")
    }
}

fn to_strings(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| (*c).to_string()).collect()
}

#[async_trait::async_trait]
impl DownstreamStore for FakePlus {
    async fn imported_codes(&self, order_code: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .imported
            .get(order_code)
            .map(|rows| rows.iter().map(|r| r.code.clone()).collect())
            .unwrap_or_default())
    }

    async fn incoming_codes(&self, order_code: &str) -> Result<Vec<String>> {
        Ok(self.lock().incoming.get(order_code).cloned().unwrap_or_default())
    }

    async fn outgoing_codes(&self, order_code: &str) -> Result<Vec<String>> {
        Ok(self.lock().outgoing.get(order_code).cloned().unwrap_or_default())
    }

    async fn replace_imported(
        &self,
        order_code: &str,
        item_code: &str,
        codes: &[String],
    ) -> Result<ReplaceCounts> {
        let mut s = self.lock();
        s.replace_calls += 1;

        if s.fail_insert_for.as_deref() == Some(order_code) {
            // State untouched: the caller must observe the pre-reimport rows.
            bail!("injected insert failure for {order_code}");
        }

        let deleted = s
            .imported
            .get(order_code)
            .map(|rows| rows.len() as u64)
            .unwrap_or(0);
        let rows: Vec<ImportedRow> = codes
            .iter()
            .map(|code| ImportedRow {
                code: code.clone(),
                item_code: item_code.to_string(),
                import_source: "robot".to_string(),
                entered_by: "robot".to_string(),
            })
            .collect();
        let inserted = rows.len() as u64;
        s.imported.insert(order_code.to_string(), rows);

        s.deleted_total += deleted;
        s.inserted_total += inserted;
        Ok(ReplaceCounts { deleted, inserted })
    }
}
