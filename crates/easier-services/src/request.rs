//! Plumbing shared by every feature call: session gating, input checks,
//! file parts and progress reporting around a single request.

use std::path::{Path, PathBuf};

use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::progress::{ProgressStage, ProgressTracker};
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ServiceError;

/// Optional tracker wrapper so calls without a watcher stay quiet.
#[derive(Clone, Copy)]
pub(crate) struct Stages<'a>(Option<&'a ProgressTracker>);

impl<'a> Stages<'a> {
    pub(crate) fn new(tracker: Option<&'a ProgressTracker>) -> Self {
        Self(tracker)
    }

    pub(crate) fn advance(self, stage: ProgressStage) {
        if let Some(tracker) = self.0 {
            tracker.advance(stage);
        }
    }

    pub(crate) fn finish<T>(self, result: &Result<T, ServiceError>) {
        if let Some(tracker) = self.0 {
            tracker.finish(result);
        }
    }
}

/// Attach the bearer token of an active session to `request`.
pub(crate) fn authorize(
    client: &ServiceClient,
    session: &Session,
    request: RequestBuilder,
) -> Result<RequestBuilder, ServiceError> {
    session.ensure_active(jiff::Timestamp::now())?;
    Ok(client.authorized(request, session)?)
}

/// Send `request` and decode its JSON body, moving through `Sending` and
/// `Receiving` as the response arrives.
pub(crate) async fn exchange<T: DeserializeOwned>(
    client: &ServiceClient,
    request: RequestBuilder,
    stages: Stages<'_>,
) -> Result<T, ServiceError> {
    stages.advance(ProgressStage::Sending);
    let response = client.send(request).await?;
    stages.advance(ProgressStage::Receiving);
    Ok(ServiceClient::read_json(response).await?)
}

/// Trimmed `value`, or a validation error naming `what` when blank.
pub(crate) fn require_text<'v>(value: &'v str, what: &str) -> Result<&'v str, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

/// A local file ready to go into a multipart form.
#[derive(Debug)]
pub(crate) struct UploadFile {
    pub(crate) file_name: String,
    pub(crate) mime: mime_guess::Mime,
    pub(crate) bytes: Vec<u8>,
}

impl UploadFile {
    pub(crate) async fn read(path: &Path) -> Result<Self, ServiceError> {
        if !path.is_file() {
            return Err(ServiceError::Validation(format!(
                "no file at {}",
                path.display()
            )));
        }

        let bytes = tokio::fs::read(path).await.map_err(|source| ServiceError::Io {
            path: PathBuf::from(path),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        debug!(file_name = %file_name, mime = %mime, size = bytes.len(), "read upload");

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Multipart form with the file under the `file` field.
    pub(crate) fn into_form(self) -> Result<Form, ServiceError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime.as_ref())?;
        Ok(Form::new().part("file", part))
    }
}
