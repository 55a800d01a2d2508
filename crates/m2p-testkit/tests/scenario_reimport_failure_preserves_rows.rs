//! Scenario: a write failure mid-reimport must leave the order's imported
//! rows exactly as they were (rollback), and by default must not stop the
//! rest of the pass.

use m2p_reconcile::{BatchOutcome, SyncConfig, SyncEngine};
use m2p_testkit::{batch, test_window, FakeMes, FakePlus};

#[tokio::test]
async fn failed_write_rolls_back_and_the_pass_continues() {
    let mes = FakeMes::new()
        .with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"])
        .with_batch(batch(2, "ORD-6", "INV-002"), &["B1", "B2"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);
    plus.seed_imported("ORD-6", "INV-002", &["B1"]);
    plus.fail_insert_for("ORD-5");

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    // First batch failed, rows preserved: neither empty nor partial.
    assert!(report.batches[0].outcome.is_failure());
    assert_eq!(plus.imported_code_set("ORD-5"), vec!["A1", "A2"]);

    // Second batch was still repaired.
    assert_eq!(
        report.batches[1].outcome,
        BatchOutcome::Reimported {
            deleted: 1,
            inserted: 2
        }
    );
    assert_eq!(plus.imported_code_set("ORD-6"), vec!["B1", "B2"]);

    assert_eq!(report.failed(), 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn failed_write_aborts_the_run_when_configured() {
    let mes = FakeMes::new()
        .with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"])
        .with_batch(batch(2, "ORD-6", "INV-002"), &["B1", "B2"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);
    plus.seed_imported("ORD-6", "INV-002", &["B1"]);
    plus.fail_insert_for("ORD-5");

    let config = SyncConfig {
        fail_on_reimport_error: true,
        ..SyncConfig::default()
    };
    let engine = SyncEngine::new(mes, plus.clone(), config);
    let err = engine
        .run_window(test_window())
        .await
        .expect_err("run must fail");
    assert!(err.to_string().contains("ORD-5"));

    // The failing order is untouched and the second batch was never reached.
    assert_eq!(plus.imported_code_set("ORD-5"), vec!["A1", "A2"]);
    assert_eq!(plus.imported_code_set("ORD-6"), vec!["B1"]);
}
