use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::models::topic::{SummarizeRequest, TopicSummary};
use easier_core::progress::{ProgressStage, ProgressTracker};
use tracing::info;

use crate::error::ServiceError;
use crate::request::{Stages, authorize, exchange, require_text};

/// Search the web for `topic` and summarise the articles found.
pub async fn summarize_topic(
    client: &ServiceClient,
    session: &Session,
    topic: &str,
    progress: Option<&ProgressTracker>,
) -> Result<TopicSummary, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<TopicSummary, ServiceError> = async {
        let topic = require_text(topic, "topic")?;
        info!(topic = topic, "summarising topic");
        let body = SummarizeRequest {
            topic: topic.to_string(),
        };
        let request = authorize(client, session, client.post("/summarize-topic"))?.json(&body);
        exchange(client, request, stages).await
    }
    .await;

    stages.finish(&result);
    result
}
