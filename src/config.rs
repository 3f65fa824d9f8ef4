use std::path::PathBuf;

use tracing::{error, info};

use crate::error::PublishError;

/// The five invocation parameters of a publish run.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Base address of the distribution service, e.g. `https://extensions.example.org`.
    pub distribution_url: String,
    pub api_key: String,
    /// Selects the extension record to update.
    pub slug: String,
    /// Packaged extension (zip) to upload.
    pub artifact: PathBuf,
    /// `blender_manifest.toml` describing the extension.
    pub manifest: PathBuf,
}

impl PublishConfig {
    /// Rejects empty parameters. Runs before any network activity.
    pub fn validate(&self) -> Result<(), PublishError> {
        let checks: [(&'static str, bool); 5] = [
            ("distribution_url", self.distribution_url.trim().is_empty()),
            ("api_key", self.api_key.trim().is_empty()),
            ("slug", self.slug.trim().is_empty()),
            ("artifact", self.artifact.as_os_str().is_empty()),
            ("manifest", self.manifest.as_os_str().is_empty()),
        ];
        if let Some((name, _)) = checks.into_iter().find(|(_, missing)| *missing) {
            error!(parameter = name, "Required parameter is missing");
            return Err(PublishError::MissingParameter(name));
        }
        info!(
            distribution_url = %self.distribution_url,
            slug = %self.slug,
            artifact = %self.artifact.display(),
            manifest = %self.manifest.display(),
            api_key_set = true,
            "Publish configuration validated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PublishConfig {
        PublishConfig {
            distribution_url: "https://extensions.example.org".into(),
            api_key: "k1".into(),
            slug: "my-addon".into(),
            artifact: PathBuf::from("dist/my-addon.zip"),
            manifest: PathBuf::from("blender_manifest.toml"),
        }
    }

    #[test]
    fn accepts_complete_parameters() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn each_empty_parameter_is_reported_by_name() {
        for name in ["distribution_url", "api_key", "slug", "artifact", "manifest"] {
            let mut config = valid();
            match name {
                "distribution_url" => config.distribution_url.clear(),
                "api_key" => config.api_key = "   ".into(),
                "slug" => config.slug = "  ".into(),
                "artifact" => config.artifact = PathBuf::new(),
                _ => config.manifest = PathBuf::new(),
            }
            match config.validate() {
                Err(PublishError::MissingParameter(reported)) => assert_eq!(reported, name),
                other => panic!("expected missing {name}, got {other:?}"),
            }
        }
    }
}
