use serde::{Deserialize, Serialize};

/// Passages returned by default when retrieving against an uploaded document.
pub const DEFAULT_TOP_K: u32 = 3;

/// Minimum cosine similarity a passage needs to be returned.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Response to a document upload. Deployments answer with either a
/// `message` or a `description`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl UploadReceipt {
    pub fn summary(&self) -> Option<&str> {
        self.message.as_deref().or(self.description.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    pub top_k: u32,
    pub similarity_threshold: f32,
}

impl RetrieveRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// One passage from `/retrieve`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedPassage {
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
    #[serde(default)]
    pub index: Option<u64>,
}

impl RetrievedPassage {
    /// The passage text, preferring the matched document over an answer.
    pub fn text(&self) -> Option<&str> {
        self.document.as_deref().or(self.answer.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub answer: String,
}
