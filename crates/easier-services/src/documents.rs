//! Chat with a document.
//!
//! The service keeps one indexed document per deployment. Uploading replaces
//! it; `/retrieve` returns the passages most similar to a query and
//! `/generate` answers a question from those passages.
//!
//! [`DocumentChat`] is the stateful view on top: it remembers what was
//! uploaded and the question/answer history, and drops answers that arrive
//! after the conversation was reset.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::models::chat_history::ChatMessage;
use easier_core::models::document::{
    GenerateRequest, GeneratedAnswer, RetrieveRequest, RetrievedPassage, UploadReceipt,
};
use easier_core::progress::{ProgressStage, ProgressTracker, RequestGate};
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::request::{Stages, UploadFile, authorize, exchange, require_text};

/// File extensions the service can index.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

// ── Stateless calls ─────────────────────────────────────────────────────────

/// Upload a PDF or text file for indexing.
pub async fn upload_document(
    client: &ServiceClient,
    session: &Session,
    path: &Path,
    progress: Option<&ProgressTracker>,
) -> Result<UploadReceipt, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<UploadReceipt, ServiceError> = async {
        check_extension(path)?;
        let file = UploadFile::read(path).await?;
        info!(file_name = %file.file_name, "uploading document");
        let request = authorize(client, session, client.post("/upload"))?
            .multipart(file.into_form()?);
        exchange(client, request, stages).await
    }
    .await;

    stages.finish(&result);
    result
}

/// Passages of the uploaded document most similar to `request.query`.
pub async fn retrieve_passages(
    client: &ServiceClient,
    session: &Session,
    request: &RetrieveRequest,
    progress: Option<&ProgressTracker>,
) -> Result<Vec<RetrievedPassage>, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<Vec<RetrievedPassage>, ServiceError> = async {
        require_text(&request.query, "query")?;
        if request.top_k == 0 {
            return Err(ServiceError::Validation(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&request.similarity_threshold) {
            return Err(ServiceError::Validation(
                "similarity threshold must be between 0 and 1".to_string(),
            ));
        }
        let http = authorize(client, session, client.post("/retrieve"))?.json(request);
        exchange(client, http, stages).await
    }
    .await;

    stages.finish(&result);
    result
}

/// Answer `query` from the uploaded document.
pub async fn generate_answer(
    client: &ServiceClient,
    session: &Session,
    query: &str,
    progress: Option<&ProgressTracker>,
) -> Result<String, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<String, ServiceError> = async {
        let query = require_text(query, "question")?;
        let body = GenerateRequest {
            query: query.to_string(),
        };
        let request = authorize(client, session, client.post("/generate"))?.json(&body);
        let answer: GeneratedAnswer = exchange(client, request, stages).await?;
        Ok(answer.answer.trim().to_string())
    }
    .await;

    stages.finish(&result);
    result
}

fn check_extension(path: &Path) -> Result<(), ServiceError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension {
        Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ServiceError::Validation(format!(
            "unsupported file type: {} (expected .pdf or .txt)",
            path.display()
        ))),
    }
}

// ── Conversation ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ChatState {
    file_name: Option<String>,
    upload_message: Option<String>,
    history: Vec<ChatMessage>,
}

/// A conversation about one uploaded document.
#[derive(Debug)]
pub struct DocumentChat {
    client: ServiceClient,
    gate: RequestGate,
    state: Mutex<ChatState>,
}

impl DocumentChat {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            gate: RequestGate::new(),
            state: Mutex::new(ChatState::default()),
        }
    }

    /// Upload `path` and start a fresh history for it.
    pub async fn upload(
        &self,
        session: &Session,
        path: &Path,
        progress: Option<&ProgressTracker>,
    ) -> Result<UploadReceipt, ServiceError> {
        let ticket = self.gate.begin();
        let result = upload_document(&self.client, session, path, progress).await;
        let receipt = self
            .gate
            .accept(ticket, result)
            .ok_or(ServiceError::Superseded)??;

        let mut state = self.lock();
        state.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        state.upload_message = receipt.summary().map(str::to_string);
        state.history.clear();
        Ok(receipt)
    }

    /// Ask a question. The exchange is added to the history only when an
    /// answer comes back for the current conversation.
    pub async fn ask(
        &self,
        session: &Session,
        query: &str,
        progress: Option<&ProgressTracker>,
    ) -> Result<String, ServiceError> {
        let query = require_text(query, "question")?;
        let ticket = self.gate.begin();
        let result = generate_answer(&self.client, session, query, progress).await;

        let Some(result) = self.gate.accept(ticket, result) else {
            warn!("discarding answer for a superseded question");
            return Err(ServiceError::Superseded);
        };
        let answer = result?;

        let mut state = self.lock();
        state.history.push(ChatMessage::user(query));
        state.history.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }

    /// Forget the document and history. Answers still in flight are
    /// discarded when they arrive.
    pub fn reset(&self) {
        self.gate.invalidate();
        *self.lock() = ChatState::default();
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.lock().history.clone()
    }

    pub fn file_name(&self) -> Option<String> {
        self.lock().file_name.clone()
    }

    pub fn upload_message(&self) -> Option<String> {
        self.lock().upload_message.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
