use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status. `message` is the service's `detail` when it sent one.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("not signed in: run `easier login` first")]
    NotAuthenticated,

    #[error("session expired: sign in again")]
    SessionExpired,

    #[error("this action requires the admin role")]
    AdminRequired,

    #[error("username and password are required")]
    MissingCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("session store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
