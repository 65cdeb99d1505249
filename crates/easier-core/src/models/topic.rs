use serde::{Deserialize, Serialize};

use super::token_count::TokenCount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub topic: String,
}

/// Response of `/summarize-topic`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicSummary {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub tokens: Option<TokenCount>,
}

/// A summarised article and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub reference_link: String,
}
