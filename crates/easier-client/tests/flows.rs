use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use easier_client::client::ServiceClient;
use easier_client::error::ClientError;
use easier_client::flows::{authenticate, register};
use easier_core::models::role::Role;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jwt(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

async fn client_for(server: &MockServer) -> ServiceClient {
    ServiceClient::new(&server.uri(), None).expect("client should build")
}

#[tokio::test]
async fn authenticate_posts_password_grant_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("password=adminpassword"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "opaque-token",
            "token_type": "bearer",
            "role": "admin",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let session = authenticate(&client, "admin", "adminpassword").await.unwrap();

    assert!(session.is_authenticated());
    assert!(session.is_admin());
    assert_eq!(session.username(), Some("admin"));
    assert_eq!(session.bearer().unwrap(), "opaque-token");
}

#[tokio::test]
async fn authenticate_falls_back_to_token_role_claim() {
    let server = MockServer::start().await;
    let token = jwt(json!({"sub": "root", "role": "admin", "exp": 4_102_444_800_i64}));
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer",
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let session = authenticate(&client, "root", "pw").await.unwrap();
    assert_eq!(session.role(), Some(&Role::Admin));
}

#[tokio::test]
async fn authenticate_surfaces_detail_on_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Incorrect username or password"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = authenticate(&client, "admin", "wrong").await.unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Incorrect username or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn authenticate_rejects_blank_credentials_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = authenticate(&client, "  ", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredentials));
}

#[tokio::test]
async fn malformed_token_response_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = authenticate(&client, "admin", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn register_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .and(body_json(json!({
            "username": "newbie",
            "password": "s3cret",
            "role": "user",
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "User registered successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let message = register(&client, "newbie", "s3cret", &Role::User)
        .await
        .unwrap();
    assert_eq!(message.as_deref(), Some("User registered successfully"));
}

#[tokio::test]
async fn register_duplicate_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Username already registered"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = register(&client, "admin", "pw", &Role::Admin)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Username already registered (HTTP 400)");
}
