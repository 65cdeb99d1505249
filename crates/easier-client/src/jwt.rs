use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::ClientError;

/// Claims the service puts in its access tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry, seconds since the Unix epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.is_some_and(|exp| now_secs >= exp)
    }
}

/// Read the claims of a JWT without verifying its signature.
///
/// The signing key belongs to the service; the client only looks at the
/// payload to learn who it is signed in as and when to ask for a new login.
/// Expiry is checked by the caller against its own clock.
pub fn peek_claims(token: &str) -> Result<TokenClaims, ClientError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}
