use super::*;
use axum::http::StatusCode;
use serde_json::json;

use crate::{
    auth::Route,
    error::TRANSPORT_ERROR_MESSAGE,
    test_support::{receipt_json, unauthorized_body, Harness},
};

fn sample_file() -> UploadFile {
    UploadFile {
        filename: "ticket.png".into(),
        mime_type: Some("image/png".into()),
        bytes: b"png-bytes".to_vec(),
    }
}

#[tokio::test]
async fn empty_form_fails_validation_without_network() {
    let harness = Harness::logged_in().await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    let state = machine.submit(&UploadForm::default()).await;

    assert_eq!(
        state,
        SubmissionState::Failed(FailureReport::validation(NO_FILE_SELECTED))
    );
    if let SubmissionState::Failed(report) = &state {
        assert_eq!(report.errors, vec!["no file selected".to_string()]);
    }
    assert!(harness.backend.hits().await.is_empty());
}

#[tokio::test]
async fn successful_upload_yields_receipt_and_detail_view() {
    let harness = Harness::logged_in().await;
    harness
        .backend
        .script(
            "POST /receipt",
            StatusCode::OK,
            json!({"message": "Receipt created successfully", "receipt": receipt_json(4, "Dia", &[(1, "Milk"), (2, "Eggs")])}),
        )
        .await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    let state = machine.submit(&UploadForm::with_file(sample_file())).await;

    let SubmissionState::Succeeded(receipt) = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(receipt.supermarket, "Dia");
    assert_eq!(harness.backend.hits_for("/receipt").await.len(), 1);

    match machine.view().await {
        SubmissionView::Succeeded { heading, detail } => {
            assert_eq!(heading, RECEIPT_PROCESSED);
            assert_eq!(detail.rows.len(), 2);
            assert!(detail.rows.iter().all(|row| !row.highlighted));
        }
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn application_error_enters_failed_with_details() {
    let harness = Harness::logged_in().await;
    harness
        .backend
        .script(
            "POST /receipt",
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"message": "Error analyzing file", "errors": ["no total found"]}),
        )
        .await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    let state = machine.submit(&UploadForm::with_file(sample_file())).await;

    assert_eq!(
        state,
        SubmissionState::Failed(FailureReport::new(
            "Error analyzing file",
            vec!["no total found".to_string()]
        ))
    );
    assert_eq!(machine.state().await, state);
}

#[tokio::test]
async fn transport_error_enters_failed_with_generic_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let harness = Harness::logged_in().await;
    let gateway = Arc::new(GatewayClient::new(format!("http://{addr}"), harness.auth.clone()));
    let machine = SubmissionMachine::new(gateway, harness.auth.clone());

    let SubmissionState::Failed(report) = machine.submit(&UploadForm::with_file(sample_file())).await
    else {
        panic!("expected failure");
    };
    assert_eq!(report.message, TRANSPORT_ERROR_MESSAGE);
    assert_eq!(report.errors.len(), 1);
}

#[tokio::test]
async fn unauthorized_upload_logs_out_instead_of_failing() {
    let harness = Harness::logged_in().await;
    harness
        .backend
        .script("POST /receipt", StatusCode::UNAUTHORIZED, unauthorized_body())
        .await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    let state = machine.submit(&UploadForm::with_file(sample_file())).await;

    assert_eq!(state, SubmissionState::Idle);
    assert!(harness.session_cleared());
    assert_eq!(harness.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let harness = Harness::logged_in().await;
    let gate = harness
        .backend
        .script_gated(
            "POST /receipt",
            StatusCode::OK,
            json!({"receipt": receipt_json(5, "Eroski", &[])}),
        )
        .await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    let first = tokio::spawn({
        let machine = machine.clone();
        async move { machine.submit(&UploadForm::with_file(sample_file())).await }
    });
    harness.backend.wait_for_hits(1).await;
    assert_eq!(machine.view().await, SubmissionView::Processing);

    let second = machine.submit(&UploadForm::with_file(sample_file())).await;
    assert_eq!(second, SubmissionState::Submitting);

    gate.notify_one();
    let settled = first.await.expect("join");
    assert!(matches!(settled, SubmissionState::Succeeded(_)));
    assert_eq!(harness.backend.hits_for("/receipt").await.len(), 1);
}

#[tokio::test]
async fn result_persists_until_next_accepted_submission() {
    let harness = Harness::logged_in().await;
    harness
        .backend
        .script(
            "POST /receipt",
            StatusCode::OK,
            json!({"receipt": receipt_json(6, "Aldi", &[])}),
        )
        .await;
    let machine = SubmissionMachine::new(harness.gateway.clone(), harness.auth.clone());

    machine.submit(&UploadForm::with_file(sample_file())).await;
    assert!(matches!(machine.state().await, SubmissionState::Succeeded(_)));
    assert!(matches!(machine.state().await, SubmissionState::Succeeded(_)));

    let state = machine.submit(&UploadForm::default()).await;
    assert!(matches!(state, SubmissionState::Failed(_)));
}
