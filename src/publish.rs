//! Publish pipeline: upload the package artifact, then point the extension record at it.
//!
//! The two steps run strictly in order. If the upload fails, the update is never
//! attempted. A manifest or update failure after a successful upload leaves the
//! uploaded artifact on the service; nothing is rolled back.
//!
//! # Navigation
//! - Entrypoint: [`publish`]
//! - Output: [`PublishReport`]

use tracing::{error, info};

use crate::config::PublishConfig;
use crate::contract::{Distribution, UploadedPackage};
use crate::error::PublishError;
use crate::manifest::load_manifest;

/// What a successful run published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub package: UploadedPackage,
    pub slug: String,
}

pub async fn publish<D>(config: &PublishConfig, distribution: &D) -> Result<PublishReport, PublishError>
where
    D: Distribution + ?Sized,
{
    config.validate()?;

    // --- Step 1: Upload ---
    info!(artifact = %config.artifact.display(), "[PUBLISH] Uploading package artifact");
    let package = match distribution.upload_package(&config.artifact).await {
        Ok(package) => {
            info!(
                package_id = %package.id,
                file_name = %package.file_name,
                size_bytes = package.size_bytes,
                sha256 = %package.sha256,
                "[PUBLISH] Upload succeeded"
            );
            package
        }
        Err(e) => {
            error!(error = %e, "[PUBLISH][ERROR] Upload failed");
            return Err(PublishError::Upload(e));
        }
    };

    // --- Step 2: Update the extension record ---
    let manifest = load_manifest(&config.manifest)?;
    let body = manifest.into_update_body(&package.id)?;
    info!(
        slug = %config.slug,
        body = %serde_json::Value::Object(body.clone()),
        "[PUBLISH] Updating extension record"
    );

    if let Err(e) = distribution.update_extension(&config.slug, &body).await {
        error!(slug = %config.slug, error = %e, "[PUBLISH][ERROR] Update failed");
        return Err(PublishError::Update(e));
    }
    info!(slug = %config.slug, package_id = %package.id, "[PUBLISH] Extension record updated");

    Ok(PublishReport {
        package,
        slug: config.slug.clone(),
    })
}
