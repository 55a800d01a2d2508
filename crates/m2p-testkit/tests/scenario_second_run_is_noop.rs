//! Scenario: reconciliation is idempotent. After a repair, a second pass
//! over unchanged data finds every order in sync and performs zero writes.

use m2p_reconcile::{BatchOutcome, SyncConfig, SyncEngine};
use m2p_testkit::{batch, test_window, FakeMes, FakePlus};

#[tokio::test]
async fn second_run_performs_zero_writes() {
    let mes = FakeMes::new()
        .with_batch(batch(1, "ORD-5", "INV-001"), &["A1", "A2", "A3"])
        .with_batch(batch(2, "ORD-6", "INV-002"), &["B1"]);
    let plus = FakePlus::new();
    plus.seed_imported("ORD-5", "INV-001", &["A1", "A2"]);

    let engine = SyncEngine::new(mes, plus.clone(), SyncConfig::default());

    let first = engine.run_window(test_window()).await.expect("first run");
    assert_eq!(first.reimported(), 2);
    assert_eq!(plus.replace_calls(), 2);

    let second = engine.run_window(test_window()).await.expect("second run");
    assert_eq!(second.reimported(), 0);
    assert!(second
        .batches
        .iter()
        .all(|b| b.outcome == BatchOutcome::InSync));
    // No further writes beyond the first pass.
    assert_eq!(plus.replace_calls(), 2);
}
