use std::fmt;

use easier_core::models::role::Role;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ClientError;
use crate::jwt::{TokenClaims, peek_claims};

/// Token, username and role of a signed-in user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// Who the client is acting as.
///
/// Passed explicitly to every authenticated call; `login` and `logout` are
/// the only transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        let mut session = Self::anonymous();
        session.login(token, username, role);
        session
    }

    pub fn login(&mut self, token: impl Into<String>, username: impl Into<String>, role: Role) {
        let credentials = Credentials {
            token: token.into(),
            username: username.into(),
            role,
        };
        info!(username = %credentials.username, role = %credentials.role, "signed in");
        self.credentials = Some(credentials);
    }

    pub fn logout(&mut self) {
        if let Some(credentials) = self.credentials.take() {
            info!(username = %credentials.username, "signed out");
        }
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn role(&self) -> Option<&Role> {
        self.credentials.as_ref().map(|c| &c.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(Role::is_admin)
    }

    pub fn bearer(&self) -> Result<&str, ClientError> {
        self.credentials
            .as_ref()
            .map(|c| c.token.as_str())
            .ok_or(ClientError::NotAuthenticated)
    }

    /// Claims of the current token. `None` when signed out or when the token
    /// is opaque rather than a JWT.
    pub fn claims(&self) -> Option<TokenClaims> {
        peek_claims(self.bearer().ok()?).ok()
    }

    /// Whether the token's `exp` has passed. Opaque tokens never expire
    /// client-side.
    pub fn is_expired(&self, now: jiff::Timestamp) -> bool {
        self.claims()
            .is_some_and(|claims| claims.is_expired_at(now.as_second()))
    }

    /// Gate for authenticated views: signed in and not expired.
    pub fn ensure_active(&self, now: jiff::Timestamp) -> Result<(), ClientError> {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if self.is_expired(now) {
            return Err(ClientError::SessionExpired);
        }
        Ok(())
    }

    /// Gate for admin-only views.
    pub fn ensure_admin(&self, now: jiff::Timestamp) -> Result<(), ClientError> {
        self.ensure_active(now)?;
        if !self.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        Ok(())
    }
}

impl From<Credentials> for Session {
    fn from(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}
