use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::models::usage::UsageRecord;
use easier_core::progress::{ProgressStage, ProgressTracker};
use tracing::debug;

use crate::error::ServiceError;
use crate::request::{Stages, authorize, exchange};

/// Every recorded token usage entry. Admin only.
pub async fn fetch_usage(
    client: &ServiceClient,
    session: &Session,
    progress: Option<&ProgressTracker>,
) -> Result<Vec<UsageRecord>, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<Vec<UsageRecord>, ServiceError> = async {
        session.ensure_admin(jiff::Timestamp::now())?;
        let request = authorize(client, session, client.get("/token-usage"))?;
        let records: Vec<UsageRecord> = exchange(client, request, stages).await?;
        debug!(count = records.len(), "fetched usage records");
        Ok(records)
    }
    .await;

    stages.finish(&result);
    result
}
