use std::path::PathBuf;
use std::time::Duration;

use easier_client::client::ServiceClient;
use easier_client::error::ClientError;
use easier_client::session::Session;
use easier_core::models::chat_history::ChatRole;
use easier_core::models::document::RetrieveRequest;
use easier_core::models::role::Role;
use easier_core::progress::{ProgressStage, ProgressTracker};
use easier_services::documents::{
    DocumentChat, generate_answer, retrieve_passages, upload_document,
};
use easier_services::error::ServiceError;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
    Session::signed_in("tok", "alice", Role::User)
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn setup() -> (MockServer, ServiceClient) {
    let server = MockServer::start().await;
    let client = ServiceClient::new(&server.uri(), None).unwrap();
    (server, client)
}

#[tokio::test]
async fn upload_sends_file_as_multipart() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"notes.txt\""))
        .and(body_string_contains("Quarterly revenue grew."))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Uploaded 1 documents successfully!"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "notes.txt", "Quarterly revenue grew.\n");
    let tracker = ProgressTracker::new();

    let receipt = upload_document(&client, &session(), &file, Some(&tracker))
        .await
        .unwrap();

    assert_eq!(receipt.summary(), Some("Uploaded 1 documents successfully!"));
    assert_eq!(tracker.current(), ProgressStage::Done);
}

#[tokio::test]
async fn upload_rejects_unsupported_files_locally() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "slides.pptx", "binary");
    let tracker = ProgressTracker::new();

    let err = upload_document(&client, &session(), &file, Some(&tracker))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
    assert_eq!(tracker.current(), ProgressStage::Failed);

    let missing = dir.path().join("missing.pdf");
    let err = upload_document(&client, &session(), &missing, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn upload_requires_a_session() {
    let (_server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "notes.txt", "text");

    let err = upload_document(&client, &Session::anonymous(), &file, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Client(ClientError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn upload_error_detail_is_kept() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "No readable content found"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "empty.txt", "");
    let err = upload_document(&client, &session(), &file, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "No readable content found (HTTP 400)");
}

#[tokio::test]
async fn retrieve_posts_query_with_defaults() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .and(body_json(json!({
            "query": "revenue",
            "top_k": 3,
            "similarity_threshold": 0.3,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": "Quarterly revenue grew.", "similarity": 0.82, "index": 0},
            {"answer": "Costs were flat."},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let passages = retrieve_passages(&client, &session(), &RetrieveRequest::new("revenue"), None)
        .await
        .unwrap();

    assert_eq!(passages.len(), 2);
    assert_eq!(passages[0].text(), Some("Quarterly revenue grew."));
    assert_eq!(passages[0].similarity, Some(0.82));
    assert_eq!(passages[1].text(), Some("Costs were flat."));
    assert_eq!(passages[1].similarity, None);
}

#[tokio::test]
async fn retrieve_validates_before_sending() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let blank = RetrieveRequest::new("   ");
    let err = retrieve_passages(&client, &session(), &blank, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let mut zero = RetrieveRequest::new("revenue");
    zero.top_k = 0;
    let err = retrieve_passages(&client, &session(), &zero, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn generate_trims_answer() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({"query": "What grew?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "  Revenue.\n"})))
        .mount(&server)
        .await;

    let answer = generate_answer(&client, &session(), "  What grew? ", None)
        .await
        .unwrap();
    assert_eq!(answer, "Revenue.");
}

#[tokio::test]
async fn chat_records_successful_exchanges_only() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Uploaded"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({"query": "good question"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "good answer"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_json(json!({"query": "bad question"})))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(&dir, "report.pdf", "%PDF-1.4");
    let chat = DocumentChat::new(client);
    let session = session();

    chat.upload(&session, &file, None).await.unwrap();
    assert_eq!(chat.file_name().as_deref(), Some("report.pdf"));
    assert_eq!(chat.upload_message().as_deref(), Some("Uploaded"));

    assert_eq!(
        chat.ask(&session, "good question", None).await.unwrap(),
        "good answer"
    );
    assert!(chat.ask(&session, "bad question", None).await.is_err());
    assert!(matches!(
        chat.ask(&session, "", None).await,
        Err(ServiceError::Validation(_))
    ));

    let history = chat.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[0].content, "good question");
    assert_eq!(history[1].role, ChatRole::Assistant);
    assert_eq!(history[1].content, "good answer");
}

#[tokio::test]
async fn reset_discards_answer_in_flight() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"answer": "late answer"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let chat = DocumentChat::new(client);
    let session = session();

    let (result, ()) = tokio::join!(chat.ask(&session, "slow question", None), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        chat.reset();
    });

    assert!(matches!(result, Err(ServiceError::Superseded)), "{result:?}");
    assert!(chat.history().is_empty());
    assert!(chat.file_name().is_none());
}
