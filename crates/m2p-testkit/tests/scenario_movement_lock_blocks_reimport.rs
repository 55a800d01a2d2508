//! Scenario: once any serial for an order has been received into stock or
//! shipped out, the imported set is frozen: drift or not, the engine must
//! not rewrite it.

use m2p_reconcile::{BatchOutcome, SyncConfig, SyncEngine};
use m2p_testkit::{batch, test_window, FakeMes, FakePlus};

#[tokio::test]
async fn incoming_rows_block_the_rewrite() {
    let mes = FakeMes::new().with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);
    plus.seed_incoming("ORD-5", &["A1"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    assert_eq!(
        report.batches[0].outcome,
        BatchOutcome::MovementLocked {
            incoming: 1,
            outgoing: 0
        }
    );
    assert_eq!(plus.replace_calls(), 0);
    // Stale rows survive untouched; repair requires manual intervention.
    assert_eq!(plus.imported_code_set("ORD-5"), vec!["A1", "A2"]);
}

#[tokio::test]
async fn outgoing_rows_block_the_rewrite() {
    let mes = FakeMes::new().with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);
    plus.seed_outgoing("ORD-5", &["A2"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    assert_eq!(
        report.batches[0].outcome,
        BatchOutcome::MovementLocked {
            incoming: 0,
            outgoing: 1
        }
    );
    assert_eq!(plus.replace_calls(), 0);
}

#[tokio::test]
async fn lock_is_not_consulted_for_batches_already_in_sync() {
    // Equality short-circuits before the movement check; an in-sync order
    // with shipped serials is still just "in sync".
    let mes = FakeMes::new().with_batch(batch(1, "ORD-5", "INV-001"), &["A1"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1"]);
    plus.seed_outgoing("ORD-5", &["A1"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());
    let report = engine.run_window(test_window()).await.expect("run");

    assert_eq!(report.batches[0].outcome, BatchOutcome::InSync);
}
