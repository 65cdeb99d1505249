use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown usage field: {0} (expected username, feature, input_tokens, output_tokens, total_tokens or timestamp)")]
    UnknownField(String),

    #[error("invalid sort direction: {0} (expected asc or desc)")]
    InvalidDirection(String),
}
