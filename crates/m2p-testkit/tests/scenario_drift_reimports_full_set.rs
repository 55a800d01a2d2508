//! Scenario: upstream batch holds {A1,A2,A3} for order "ORD-5", PLUS has
//! only {A1,A2} imported and no movement rows. The engine must delete the 2
//! stale rows and insert the full 3-code set in their place.

use m2p_reconcile::{BatchOutcome, SyncConfig, SyncEngine};
use m2p_testkit::{batch, test_window, FakeMes, FakePlus};

#[tokio::test]
async fn drift_is_repaired_with_a_full_replace() {
    let mes = FakeMes::new().with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    assert_eq!(report.processed(), 1);
    let entry = &report.batches[0];
    assert_eq!(entry.order_code, "ORD-5");
    assert_eq!(entry.upstream, 3);
    assert_eq!(entry.downstream, 2);
    assert_eq!(
        entry.outcome,
        BatchOutcome::Reimported {
            deleted: 2,
            inserted: 3
        }
    );

    assert_eq!(plus.imported_code_set("ORD-5"), vec!["A1", "A2", "A3"]);
}

#[tokio::test]
async fn reimported_rows_carry_the_robot_stamp() {
    let mes = FakeMes::new().with_batch(batch(1, "ORD-5", "INV-001"), &["A1"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["STALE"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    engine.run_window(test_window()).await.expect("run");

    let rows = plus.imported_rows("ORD-5");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "A1");
    assert_eq!(rows[0].item_code, "INV-001");
    assert_eq!(rows[0].import_source, "robot");
    assert_eq!(rows[0].entered_by, "robot");
}

#[tokio::test]
async fn order_code_is_extracted_before_the_downstream_lookup() {
    // The raw order carries a -1-2 line/split suffix; PLUS is keyed by the
    // order-level code.
    let mes = FakeMes::new().with_batch(batch(7, "ABC-123-1-2", "INV-002"), &["B1", "B2"]);
    let plus = FakePlus::new();
    plus.seed_imported("ABC-123", "INV-002", &["B1"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    assert_eq!(report.batches[0].order_code, "ABC-123");
    assert_eq!(plus.imported_code_set("ABC-123"), vec!["B1", "B2"]);
}
