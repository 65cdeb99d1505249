use std::path::Path;

use easier_client::client::ServiceClient;
use easier_client::session::Session;
use easier_core::models::image::ImageDescription;
use easier_core::progress::{ProgressStage, ProgressTracker};
use tracing::info;

use crate::error::ServiceError;
use crate::request::{Stages, UploadFile, authorize, exchange};

/// Describe the image at `path`.
///
/// Only files whose extension maps to an `image/*` type are sent.
pub async fn describe_image(
    client: &ServiceClient,
    session: &Session,
    path: &Path,
    progress: Option<&ProgressTracker>,
) -> Result<ImageDescription, ServiceError> {
    let stages = Stages::new(progress);
    stages.advance(ProgressStage::Preparing);

    let result: Result<ImageDescription, ServiceError> = async {
        let file = UploadFile::read(path).await?;
        if file.mime.type_().as_str() != "image" {
            return Err(ServiceError::Validation(format!(
                "{} is not an image ({})",
                path.display(),
                file.mime
            )));
        }

        info!(file_name = %file.file_name, "describing image");
        let request =
            authorize(client, session, client.post("/describe"))?.multipart(file.into_form()?);
        exchange(client, request, stages).await
    }
    .await;

    stages.finish(&result);
    result
}
