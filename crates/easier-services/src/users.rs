use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::models::synthetic_user::{UsersOutcome, UsersResponse};
use easier_core::progress::{ProgressStage, ProgressTracker};
use tracing::warn;

use crate::error::ServiceError;
use crate::request::{Stages, authorize, exchange};

/// Ask the service to generate a batch of synthetic users.
///
/// A generation the service could not parse is an `Ok(UsersOutcome::Failed)`,
/// not an error: the call itself succeeded.
pub async fn fetch_users(
    client: &ServiceClient,
    session: &Session,
    progress: Option<&ProgressTracker>,
) -> Result<UsersOutcome, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<UsersOutcome, ServiceError> = async {
        let request = authorize(client, session, client.get("/users"))?;
        let response: UsersResponse = exchange(client, request, stages).await?;
        let outcome = response.into_outcome();
        if let UsersOutcome::Failed { error, .. } = &outcome {
            warn!(error = %error, "service could not generate users");
        }
        Ok(outcome)
    }
    .await;

    stages.finish(&result);
    result
}
