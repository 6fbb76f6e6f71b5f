//! Both fixed sequences against the in-process items service.

use std::sync::Arc;

use crudcheck_core::error::AssertionFailure;
use crudcheck_core::scenario::{ScenarioRunner, StepOutcome};
use crudcheck_core::scenario::runner::DEFAULT_HEADERS;
use crudcheck_core::{sequences, RequestFactory};
use crudcheck_test_utils::{InMemoryItemStore, ItemsService, RunningService};
use pretty_assertions::assert_eq;

async fn start_service() -> (ItemsService, RunningService, ScenarioRunner) {
    let store = InMemoryItemStore::new();
    let service = ItemsService::new(store.clone());
    let running = service.start().await.expect("service should start");

    let factory = RequestFactory::new(running.base_url(), DEFAULT_HEADERS).unwrap();
    let runner = ScenarioRunner::new(factory).with_store(Arc::new(store));

    (service, running, runner)
}

fn outcomes(report: &crudcheck_core::SequenceReport) -> Vec<StepOutcome> {
    report.steps.iter().map(|s| s.outcome.clone()).collect()
}

#[tokio::test]
async fn test_smoke_sequence_passes() {
    let (service, _running, runner) = start_service().await;

    let report = runner.run(&sequences::smoke().unwrap()).await;

    assert!(report.passed(), "{}", report);
    assert_eq!(outcomes(&report), vec![StepOutcome::Passed; 4]);
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_integration_sequence_passes() {
    let (service, _running, runner) = start_service().await;

    let report = runner.run(&sequences::integration().unwrap()).await;

    assert!(report.passed(), "{}", report);
    assert_eq!(report.steps.len(), 9);
    // "Test Item" and "DB Test" remain; the two deleted items are gone
    assert_eq!(service.store().len(), 2);
}

#[tokio::test]
async fn test_sequences_run_concurrently_with_separate_state() {
    let (_service, _running, runner) = start_service().await;

    let integration = sequences::integration().unwrap();
    let smoke = sequences::smoke().unwrap();
    let (a, b) = tokio::join!(runner.run(&integration), runner.run(&smoke));

    assert!(a.passed(), "{}", a);
    assert!(b.passed(), "{}", b);
}

#[tokio::test]
async fn test_split_brain_delete_is_detected() {
    let (service, _running, runner) = start_service().await;
    service.keep_rows_on_delete(true);

    let report = runner.run(&sequences::integration().unwrap()).await;

    // The API claims success for the first delete, which has no store check
    assert_eq!(report.outcome_of(5), Some(&StepOutcome::Passed));
    let temp_id = service
        .store()
        .find_by_name("To Be Deleted")
        .expect("row should be left behind")
        .id;
    assert_eq!(
        report.outcome_of(7),
        Some(&StepOutcome::Failed(AssertionFailure::RowStillPresent { id: temp_id }))
    );
    assert_eq!(report.outcome_of(8), Some(&StepOutcome::Skipped));
    assert_eq!(report.outcome_of(9), Some(&StepOutcome::Skipped));
}

#[tokio::test]
async fn test_acknowledged_create_without_row_is_detected() {
    let (service, _running, runner) = start_service().await;
    service.skip_rows_on_create(true);

    let report = runner.run(&sequences::integration().unwrap()).await;

    // Reads are served by the API, so only the store check notices
    assert_eq!(report.outcome_of(1), Some(&StepOutcome::Passed));
    assert_eq!(report.outcome_of(2), Some(&StepOutcome::Passed));
    let db_item_id = service
        .unpersisted_item("DB Test")
        .expect("create should be acknowledged")
        .id;
    assert_eq!(
        report.outcome_of(3),
        Some(&StepOutcome::Failed(AssertionFailure::RowMissing { id: db_item_id }))
    );
    for ordinal in 4..=9 {
        assert_eq!(report.outcome_of(ordinal), Some(&StepOutcome::Skipped));
    }
    assert!(service.store().is_empty());
}

#[tokio::test]
async fn test_unreachable_database_is_infrastructure_failure() {
    let (service, _running, runner) = start_service().await;
    service.store().set_unreachable(true);

    let report = runner.run(&sequences::integration().unwrap()).await;

    assert_eq!(report.outcome_of(1), Some(&StepOutcome::Passed));
    assert_eq!(report.outcome_of(2), Some(&StepOutcome::Passed));
    match report.outcome_of(3) {
        Some(StepOutcome::Errored(message)) => assert!(message.contains("Database error")),
        other => panic!("expected an infrastructure failure, got {:?}", other),
    }
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_smoke_sequence_against_wrong_service_fails() {
    let (_service, running, _runner) = start_service().await;
    let factory =
        RequestFactory::new(format!("{}/v2", running.base_url()), DEFAULT_HEADERS).unwrap();
    let runner = ScenarioRunner::new(factory);

    let report = runner.run(&sequences::smoke().unwrap()).await;

    assert!(matches!(
        report.outcome_of(1),
        Some(StepOutcome::Failed(AssertionFailure::Mismatch { subject, .. })) if subject == "status"
    ));
    assert_eq!(report.outcome_of(4), Some(&StepOutcome::Skipped));
}
