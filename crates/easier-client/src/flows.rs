use easier_core::models::role::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ServiceClient;
use crate::error::ClientError;
use crate::jwt::peek_claims;
use crate::session::Session;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    password: &'a str,
    role: &'a Role,
}

#[derive(Debug, Default, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Exchange a username and password for a signed-in [`Session`].
///
/// Uses the OAuth2 password grant on `/token`. The role comes from the
/// response, falling back to the token's `role` claim and then to `user`.
pub async fn authenticate(
    client: &ServiceClient,
    username: &str,
    password: &str,
) -> Result<Session, ClientError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ClientError::MissingCredentials);
    }

    info!(username = username, "authenticating");

    let request = client.post("/token").form(&[
        ("username", username),
        ("password", password),
        ("grant_type", "password"),
    ]);
    let response: TokenResponse = client.send_json(request).await?;

    let claimed_role = peek_claims(&response.access_token)
        .ok()
        .and_then(|claims| claims.role)
        .map(Role::from);
    let role = response.role.or(claimed_role).unwrap_or_default();

    Ok(Session::signed_in(response.access_token, username, role))
}

/// Create an account. Returns the service's confirmation message, if any.
pub async fn register(
    client: &ServiceClient,
    username: &str,
    password: &str,
    role: &Role,
) -> Result<Option<String>, ClientError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(ClientError::MissingCredentials);
    }

    info!(username = username, role = %role, "registering account");

    let request = client.post("/register").json(&RegisterRequest {
        username,
        password,
        role,
    });
    let response = client.send(request).await?;
    let body = response.bytes().await?;

    // Any 2xx is success; the body is informational only.
    let parsed: RegisterResponse = serde_json::from_slice(&body).unwrap_or_default();
    Ok(parsed.message)
}
