//! The two fixed sequences against a live deployment

use crudcheck_core::sequences;
use crudcheck_e2e_tests::utils::live_runner;

#[tokio::test]
#[ignore = "needs a running items service and database"]
async fn live_smoke_sequence() {
    let runner = live_runner().expect("runner");
    let report = runner.run(&sequences::smoke().unwrap()).await;
    assert!(report.passed(), "{}", report);
}

#[tokio::test]
#[ignore = "needs a running items service and database"]
async fn live_integration_sequence() {
    let runner = live_runner().expect("runner");
    let report = runner.run(&sequences::integration().unwrap()).await;
    assert!(report.passed(), "{}", report);
}
