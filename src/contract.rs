//! # contract: the seam between the publish pipeline and the distribution service
//!
//! The [`Distribution`] trait captures the two calls the pipeline makes against
//! the remote service: uploading a package artifact and patching the extension
//! record that should point at it. The real implementation (an HTTP client)
//! lives in the CLI crate; tests use the generated `MockDistribution`.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` when the `test-export-mocks` feature
//!   is enabled (the default), so dependent crates can drive the pipeline
//!   without a network.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// JSON body sent to the update endpoint.
pub type UpdateBody = Map<String, Value>;

/// Identifier the distribution service assigns to an uploaded package.
///
/// The service answers with either a string or a number; the value is kept
/// as received and echoed back unmodified in the update body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PackageId(Value);

impl PackageId {
    /// Accepts only scalar identifiers (strings and numbers).
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Number(_) => Some(PackageId(value)),
            _ => None,
        }
    }

    /// Extracts `doc.id` from an upload response document.
    pub fn from_response(response: &Value) -> Option<Self> {
        response
            .get("doc")
            .and_then(|doc| doc.get("id"))
            .cloned()
            .and_then(PackageId::from_value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for PackageId {
    fn from(id: &str) -> Self {
        PackageId(Value::String(id.to_owned()))
    }
}

impl From<u64> for PackageId {
    fn from(id: u64) -> Self {
        PackageId(Value::from(id))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// What the client learned while uploading an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedPackage {
    pub id: PackageId,
    /// File name sent in the multipart part.
    pub file_name: String,
    pub size_bytes: u64,
    /// Hex-encoded SHA-256 of the uploaded bytes.
    pub sha256: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("failed to read artifact {path:?}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("upload response carries no usable doc.id: {body}")]
    MissingPackageId { body: String },
}

impl DistributionError {
    /// The remote payload when one was received, otherwise the error text.
    pub fn payload(&self) -> String {
        match self {
            DistributionError::Status { body, .. }
            | DistributionError::MissingPackageId { body } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Remote operations needed to publish a package.
///
/// Implementors own transport, authentication and the concrete endpoints.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait Distribution: Send + Sync {
    /// Upload the artifact at `artifact` and return the identifier assigned to it.
    async fn upload_package(&self, artifact: &Path) -> Result<UploadedPackage, DistributionError>;

    /// Patch the extension record selected by `slug` with `body`.
    async fn update_extension(
        &self,
        slug: &str,
        body: &UpdateBody,
    ) -> Result<(), DistributionError>;
}
