//! # Distribution client
//!
//! [`DistributionClient`] implements the core [`Distribution`] trait against the
//! distribution service's HTTP API:
//!
//! - `POST <base>/api/blender-package` with a multipart `file` part uploads the
//!   package; the new record's id is read from `doc.id` of the JSON answer.
//! - `PATCH <base>/api/blender?where[slug][equals]=<slug>` with a JSON body
//!   updates the extension record.
//!
//! Both calls authenticate with `Authorization: users API-Key <key>`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart;
use sha2::{Digest, Sha256};

use blender_publish::contract::UpdateBody;
use blender_publish::{Distribution, DistributionError, PackageId, PublishConfig, UploadedPackage};

/// Content type declared for the uploaded archive.
pub const ZIP_CONTENT_TYPE: &str = "application/x-zip-compressed";

const PACKAGE_ENDPOINT: &str = "/api/blender-package";
const EXTENSION_ENDPOINT: &str = "/api/blender";

pub struct DistributionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DistributionClient {
    pub fn new(distribution_url: &str, api_key: &str) -> Result<Self, DistributionError> {
        let base_url = distribution_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                transport_error(&base_url, &e)
            })?;
        tracing::info!(
            base_url = %base_url,
            api_key_set = !api_key.is_empty(),
            "Initialized DistributionClient"
        );
        Ok(DistributionClient {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &PublishConfig) -> Result<Self, DistributionError> {
        Self::new(&config.distribution_url, &config.api_key)
    }

    pub fn package_url(&self) -> String {
        format!("{}{}", self.base_url, PACKAGE_ENDPOINT)
    }

    pub fn extension_url(&self, slug: &str) -> String {
        format!("{}{}?where[slug][equals]={}", self.base_url, EXTENSION_ENDPOINT, slug)
    }

    fn authorization(&self) -> String {
        format!("users API-Key {}", self.api_key)
    }

    /// Sends a prepared request and returns the body text of a successful answer.
    async fn execute(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, DistributionError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = ?e, url, "Request failed before a response was received");
            transport_error(url, &e)
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = ?e, url, %status, "Failed to read response body");
            transport_error(url, &e)
        })?;
        if !status.is_success() {
            tracing::error!(url, status = status.as_u16(), body = %body, "Distribution service rejected request");
            return Err(DistributionError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Distribution for DistributionClient {
    async fn upload_package(&self, artifact: &Path) -> Result<UploadedPackage, DistributionError> {
        let url = self.package_url();

        let bytes = tokio::fs::read(artifact).await.map_err(|e| {
            tracing::error!(error = ?e, artifact = %artifact.display(), "Failed to read artifact");
            DistributionError::Artifact {
                path: artifact.to_path_buf(),
                source: e,
            }
        })?;
        let file_name = artifact
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("package.zip")
            .to_string();
        let size_bytes = bytes.len() as u64;
        let sha256 = {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            format!("{:x}", hasher.finalize())
        };

        tracing::info!(
            url = %url,
            file_name = %file_name,
            size_bytes,
            sha256 = %sha256,
            "Uploading package artifact"
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(ZIP_CONTENT_TYPE)
            .map_err(|e| transport_error(&url, &e))?;
        let form = multipart::Form::new().part("file", part);

        let request = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .multipart(form);
        let body = self.execute(&url, request).await?;

        let id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|document| PackageId::from_response(&document));
        match id {
            Some(id) => {
                tracing::info!(package_id = %id, "Package artifact uploaded");
                Ok(UploadedPackage {
                    id,
                    file_name,
                    size_bytes,
                    sha256,
                })
            }
            None => {
                tracing::error!(body = %body, "Upload response has no doc.id");
                Err(DistributionError::MissingPackageId { body })
            }
        }
    }

    async fn update_extension(
        &self,
        slug: &str,
        body: &UpdateBody,
    ) -> Result<(), DistributionError> {
        let url = self.extension_url(slug);
        tracing::info!(url = %url, slug, fields = body.len() as u64, "Updating extension record");

        let request = self
            .http
            .patch(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.authorization())
            .json(body);
        self.execute(&url, request).await?;

        tracing::info!(slug, "Extension record updated");
        Ok(())
    }
}

/// Flattens an error and its sources into one line.
fn transport_error(url: &str, error: &(dyn std::error::Error + 'static)) -> DistributionError {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    DistributionError::Transport {
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_joined_to_the_base_url() {
        let client = DistributionClient::new("https://extensions.example.org/", "k1").unwrap();
        assert_eq!(
            client.package_url(),
            "https://extensions.example.org/api/blender-package"
        );
        assert_eq!(
            client.extension_url("my-addon"),
            "https://extensions.example.org/api/blender?where[slug][equals]=my-addon"
        );
    }

    #[test]
    fn authorization_uses_users_api_key_scheme() {
        let client = DistributionClient::new("https://extensions.example.org", "k1").unwrap();
        assert_eq!(client.authorization(), "users API-Key k1");
    }

    #[tokio::test]
    async fn missing_artifact_is_reported_before_any_request() {
        let client = DistributionClient::new("http://127.0.0.1:9", "k1").unwrap();
        let err = client
            .upload_package(Path::new("does/not/exist.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, DistributionError::Artifact { .. }));
    }

    #[tokio::test]
    async fn invalid_base_url_is_a_transport_error() {
        let client = DistributionClient::new("not a url", "k1").unwrap();
        let err = client
            .update_extension("my-addon", &UpdateBody::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DistributionError::Transport { .. }));
    }
}
