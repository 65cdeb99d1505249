use easier_core::models::document::{RetrieveRequest, RetrievedPassage, UploadReceipt};
use easier_core::models::image::ImageDescription;
use easier_core::models::role::Role;
use easier_core::models::synthetic_user::{UsersOutcome, UsersResponse};
use easier_core::models::topic::TopicSummary;

#[test]
fn upload_receipt_prefers_message() {
    let receipt: UploadReceipt =
        serde_json::from_str(r#"{"message": "Uploaded 4 documents successfully!"}"#).unwrap();
    assert_eq!(receipt.summary(), Some("Uploaded 4 documents successfully!"));

    let receipt: UploadReceipt = serde_json::from_str(r#"{"description": "a memo"}"#).unwrap();
    assert_eq!(receipt.summary(), Some("a memo"));

    assert_eq!(UploadReceipt::default().summary(), None);
}

#[test]
fn retrieve_request_defaults() {
    let json = serde_json::to_value(RetrieveRequest::new("what is due?")).unwrap();
    assert_eq!(json["query"], "what is due?");
    assert_eq!(json["top_k"], 3);
    assert!((json["similarity_threshold"].as_f64().unwrap() - 0.3).abs() < 1e-6);
}

#[test]
fn passage_text_falls_back_to_answer() {
    let passages: Vec<RetrievedPassage> = serde_json::from_str(
        r#"[{"document": "clause 4", "similarity": 0.82, "index": 3}, {"answer": "yes"}, {}]"#,
    )
    .unwrap();
    assert_eq!(passages[0].text(), Some("clause 4"));
    assert_eq!(passages[0].similarity, Some(0.82));
    assert_eq!(passages[1].text(), Some("yes"));
    assert_eq!(passages[2].text(), None);
}

#[test]
fn plain_image_description() {
    let desc: ImageDescription = serde_json::from_str(
        r#"{"description": "A red barn", "input_token_count": 12, "output_token_count": 30, "total_token_count": 42}"#,
    )
    .unwrap();
    assert!(!desc.is_structured());
    assert_eq!(desc.description.as_deref(), Some("A red barn"));
    assert_eq!(desc.tokens().unwrap().total_tokens, 42);
}

#[test]
fn structured_image_description() {
    let desc: ImageDescription = serde_json::from_str(
        r##"{"hero_text": "Ship faster", "color_palette": ["#000", "#fff"], "font_palette": ["Inter"]}"##,
    )
    .unwrap();
    assert!(desc.is_structured());
    assert!(desc.description.is_none());
    assert!(desc.tokens().is_none());
    assert_eq!(desc.color_palette.unwrap().len(), 2);
}

#[test]
fn topic_summary_with_tokens() {
    let summary: TopicSummary = serde_json::from_str(
        r#"{
            "topic": "rust",
            "articles": [{"title": "Why Rust", "summary": "It is fast.", "reference_link": "https://example.com/a"}],
            "tokens": {"prompt_tokens": 10, "response_tokens": 5, "total_tokens": 15}
        }"#,
    )
    .unwrap();
    assert_eq!(summary.articles.len(), 1);
    assert_eq!(summary.articles[0].reference_link, "https://example.com/a");
    assert_eq!(summary.tokens.unwrap().total_tokens, 15);
}

#[test]
fn users_fill_gaps_with_not_available() {
    let response: UsersResponse = serde_json::from_str(
        r#"{"users": [
            {"firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com", "date_of_birth": "1815-12-10", "salary": 5200.5},
            {"firstname": "", "salary": "310"},
            {"salary": 0}
        ]}"#,
    )
    .unwrap();
    let UsersOutcome::Users(rows) = response.into_outcome() else {
        panic!("expected users");
    };
    assert_eq!(rows[0].salary, "$5200.50");
    assert_eq!(rows[0].date_of_birth, "1815-12-10");
    assert_eq!(rows[1].firstname, "N/A");
    assert_eq!(rows[1].email, "N/A");
    assert_eq!(rows[1].salary, "$310.00");
    assert_eq!(rows[2].salary, "N/A");
}

#[test]
fn users_error_shape() {
    let response: UsersResponse = serde_json::from_str(
        r#"{"users": [], "error": "Failed to parse JSON response", "raw_response": "[{oops"}"#,
    )
    .unwrap();
    assert_eq!(
        response.into_outcome(),
        UsersOutcome::Failed {
            error: "Failed to parse JSON response".to_string(),
            raw_response: Some("[{oops".to_string()),
        }
    );
}

#[test]
fn roles_round_trip_unknown_values() {
    assert!(Role::from("admin").is_admin());
    assert_eq!(Role::from("user"), Role::User);
    let auditor: Role = serde_json::from_str(r#""auditor""#).unwrap();
    assert_eq!(auditor, Role::Other("auditor".to_string()));
    assert_eq!(serde_json::to_string(&auditor).unwrap(), r#""auditor""#);
}
