use crate::contract::DistributionError;
use crate::manifest::ManifestError;

/// Everything that can stop a publish run. All variants are terminal.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("error uploading file: {0}")]
    Upload(#[source] DistributionError),
    #[error("error reading manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("error updating extension: {0}")]
    Update(#[source] DistributionError),
}

impl PublishError {
    /// Diagnostic to show the user: the remote payload when the service sent
    /// one, otherwise the error text.
    pub fn payload(&self) -> String {
        match self {
            PublishError::Upload(e) | PublishError::Update(e) => e.payload(),
            other => other.to_string(),
        }
    }
}
