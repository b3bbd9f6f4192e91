use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use provisioner_errors::ClusterNotFound;
use provisioner_errors::OperationNotFound;
use provisioner_models::constants::STAGE_FINISHED;
use provisioner_models::OperationFailureKind;
use provisioner_models::OperationKind;
use provisioner_models::OperationStage;
use provisioner_models::OperationState;
use provisioner_models::StageResult;
use provisioner_stage::errors::StageNotRegistered;
use provisioner_stage::ScriptedStage;
use provisioner_store::query::LookupOperation;

use super::Fixtures;
use super::CLUSTER_ID;
use super::STAGE_ONE;
use super::STAGE_TWO;

#[tokio::test]
async fn start_persists_operation() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED);
    let fixtures = Fixtures::with_stages([one]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::InProgress);
    assert_eq!(operation.stage, OperationStage::from(STAGE_ONE));

    let stored = fixtures
        .store
        .query(&fixtures.context, LookupOperation::from(&operation))
        .await
        .unwrap();
    assert_eq!(stored, Some(operation));
}

#[tokio::test]
async fn start_unknown_cluster() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED);
    let fixtures = Fixtures::with_stages([one]).await;
    let error = fixtures
        .orchestrator
        .start(&fixtures.context, "missing", OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap_err();
    assert!(error.is::<ClusterNotFound>());
    assert_eq!(fixtures.store_fixture.operation_writes(), 0);
}

#[tokio::test]
async fn start_unknown_stage() {
    let fixtures = Fixtures::with_stages([]).await;
    let error = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap_err();
    assert!(error.is::<StageNotRegistered>());
}

#[tokio::test]
async fn progress_advances_through_stages() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_TWO);
    let two = ScriptedStage::advance(STAGE_TWO, STAGE_FINISHED);
    let fixtures = Fixtures::with_stages([one.clone(), two.clone()]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    let id = operation.operation_id;

    let operation = fixtures.orchestrator.progress(&fixtures.context, id).await.unwrap();
    assert_eq!(operation.stage, OperationStage::from(STAGE_TWO));
    assert_eq!(operation.state, OperationState::InProgress);
    assert_eq!(operation.delay, Duration::ZERO);

    let operation = fixtures.orchestrator.progress(&fixtures.context, id).await.unwrap();
    assert!(operation.stage.is_finished());
    assert_eq!(operation.state, OperationState::Succeeded);

    // Final operations are not progressed any further.
    let operation = fixtures.orchestrator.progress(&fixtures.context, id).await.unwrap();
    assert_eq!(operation.state, OperationState::Succeeded);
    assert_eq!(one.calls(), 1);
    assert_eq!(two.calls(), 1);
}

#[tokio::test]
async fn progress_records_wait() {
    let one = ScriptedStage::waiting(STAGE_ONE, Duration::from_secs(5));
    let fixtures = Fixtures::with_stages([one]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    let started = operation.stage_started;

    let operation = fixtures
        .orchestrator
        .progress(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.stage, OperationStage::from(STAGE_ONE));
    assert_eq!(operation.delay, Duration::from_secs(5));
    assert_eq!(operation.stage_started, started);
    assert_eq!(fixtures.store_fixture.operation_writes(), 2);
}

#[tokio::test]
async fn progress_records_stage_failure() {
    let one = ScriptedStage::failing(STAGE_ONE, "agent exploded");
    let fixtures = Fixtures::with_stages([one]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();

    let operation = fixtures
        .orchestrator
        .progress(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::Failed);
    assert!(operation.message.contains("agent exploded"));
    let failure = operation.failure.unwrap();
    assert_eq!(failure.kind, OperationFailureKind::StageFailed);
    assert_eq!(failure.stage, OperationStage::from(STAGE_ONE));
}

#[tokio::test]
async fn progress_enforces_time_budget() {
    let one = ScriptedStage::waiting(STAGE_ONE, Duration::from_secs(5))
        .with_budget(Duration::from_secs(60));
    let fixtures = Fixtures::with_stages([one.clone()]).await;
    let mut operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    operation.stage_started = OffsetDateTime::now_utc() - time::Duration::minutes(2);
    fixtures
        .store
        .persist(&fixtures.context, operation.clone())
        .await
        .unwrap();

    let operation = fixtures
        .orchestrator
        .progress(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::Failed);
    let failure = operation.failure.unwrap();
    assert_eq!(failure.kind, OperationFailureKind::StageTimeout);
    assert_eq!(one.calls(), 0);
}

#[tokio::test]
async fn progress_unregistered_stage_fails_operation() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_TWO);
    let fixtures = Fixtures::with_stages([one]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    let id = operation.operation_id;

    fixtures.orchestrator.progress(&fixtures.context, id).await.unwrap();
    let operation = fixtures.orchestrator.progress(&fixtures.context, id).await.unwrap();
    assert_eq!(operation.state, OperationState::Failed);
    let failure = operation.failure.unwrap();
    assert_eq!(failure.kind, OperationFailureKind::StageFailed);
    assert_eq!(failure.stage, OperationStage::from(STAGE_TWO));
}

#[tokio::test]
async fn progress_unknown_operation() {
    let fixtures = Fixtures::with_stages([]).await;
    let error = fixtures
        .orchestrator
        .progress(&fixtures.context, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(error.is::<OperationNotFound>());
}

#[tokio::test(start_paused = true)]
async fn drive_waits_between_invocations() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED)
        .then(StageResult::wait(STAGE_ONE, Duration::from_secs(5)))
        .then(StageResult::wait(STAGE_ONE, Duration::from_secs(10)));
    let fixtures = Fixtures::with_stages([one.clone()]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();

    let start = tokio::time::Instant::now();
    let operation = fixtures
        .orchestrator
        .drive(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::Succeeded);
    assert_eq!(one.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn drive_stops_on_failure() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED)
        .then(StageResult::wait(STAGE_ONE, Duration::from_secs(5)))
        .then_fail("remediation failed");
    let fixtures = Fixtures::with_stages([one.clone()]).await;
    let operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();

    let operation = fixtures
        .orchestrator
        .drive(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::Failed);
    assert_eq!(one.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn drive_resumes_with_remaining_delay() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED);
    let fixtures = Fixtures::with_stages([one.clone()]).await;
    let mut operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    operation.delay = Duration::from_secs(30);
    operation.last_transition = OffsetDateTime::now_utc() - time::Duration::seconds(10);
    fixtures
        .store
        .persist(&fixtures.context, operation.clone())
        .await
        .unwrap();

    let start = tokio::time::Instant::now();
    let orchestrator = fixtures.orchestrator.clone();
    let context = fixtures.context.clone();
    let driver =
        tokio::spawn(async move { orchestrator.drive(&context, operation.operation_id).await });

    tokio::time::sleep(Duration::from_secs(19)).await;
    assert_eq!(one.calls(), 0);

    let operation = driver.await.unwrap().unwrap();
    assert_eq!(operation.state, OperationState::Succeeded);
    assert_eq!(one.calls(), 1);
    assert!(start.elapsed() <= Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn drive_resumes_immediately_after_elapsed_delay() {
    let one = ScriptedStage::advance(STAGE_ONE, STAGE_FINISHED);
    let fixtures = Fixtures::with_stages([one.clone()]).await;
    let mut operation = fixtures
        .orchestrator
        .start(&fixtures.context, CLUSTER_ID, OperationKind::Provision, STAGE_ONE)
        .await
        .unwrap();
    operation.delay = Duration::from_secs(30);
    operation.last_transition = OffsetDateTime::now_utc() - time::Duration::seconds(45);
    fixtures
        .store
        .persist(&fixtures.context, operation.clone())
        .await
        .unwrap();

    let start = tokio::time::Instant::now();
    let operation = fixtures
        .orchestrator
        .drive(&fixtures.context, operation.operation_id)
        .await
        .unwrap();
    assert_eq!(operation.state, OperationState::Succeeded);
    assert_eq!(one.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}
