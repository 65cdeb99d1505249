use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ClientError;
use crate::session::{Credentials, Session};

/// Current session file version. Bump when the shape changes.
const CURRENT_VERSION: u32 = 1;

const FILE_NAME: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    session_version: u32,
    #[serde(flatten)]
    credentials: Credentials,
}

/// Persists the signed-in session between invocations.
///
/// Written on login, removed on logout, read before every authenticated
/// command.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/easier/session.json`.
    pub fn default_location() -> Result<Self, ClientError> {
        let base = dirs::data_dir()
            .ok_or_else(|| ClientError::Store("no data directory found".to_string()))?;
        Ok(Self::at(base.join("easier").join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session; a missing file is an anonymous session.
    pub fn load(&self) -> Result<Session, ClientError> {
        if !self.path.exists() {
            return Ok(Session::anonymous());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            ClientError::Store(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let file: SessionFile = serde_json::from_str(&contents)?;

        if file.session_version > CURRENT_VERSION {
            return Err(ClientError::Store(format!(
                "session_version {} is newer than this build supports ({CURRENT_VERSION})",
                file.session_version
            )));
        }

        Ok(Session::from(file.credentials))
    }

    /// Persist `session`. Saving an anonymous session clears the store.
    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        let Some(credentials) = session.credentials() else {
            return self.clear();
        };

        let dir = self
            .path
            .parent()
            .ok_or_else(|| ClientError::Store("session path has no parent".to_string()))?;
        std::fs::create_dir_all(dir).map_err(store_error)?;

        let file = SessionFile {
            session_version: CURRENT_VERSION,
            credentials: credentials.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        // Write to a temp file then rename for atomicity
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes()).map_err(store_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(store_error)?;
        }

        std::fs::rename(&tmp_path, &self.path).map_err(store_error)?;

        info!(path = %self.path.display(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(store_error)?;
            info!(path = %self.path.display(), "session cleared");
        }
        Ok(())
    }
}

fn store_error(e: std::io::Error) -> ClientError {
    ClientError::Store(e.to_string())
}
