///
/// This module implements the command line of blender-publish: argument parsing, the
/// `run` entrypoint and the user-visible diagnostics.
///
/// All publishing logic (manifest handling, the upload → update pipeline) lives in the
/// `blender-publish` core crate. This module only wires the HTTP client into it.
///
/// ## How To Use
/// - From CI: `blender-publish <DISTRIBUTION_URL> <API_KEY> <SLUG> <ARTIFACT> <MANIFEST>`.
/// - Programmatically or from tests: construct a [`Cli`] and call [`run`].
///
/// ## Exit codes
/// `0` when both steps succeed, `1` for anything else, usage errors included.
use anyhow::Result;
use blender_publish::{publish, PublishConfig, PublishError, PublishReport};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

use crate::client::DistributionClient;

pub const EXIT_FAILURE: u8 = 1;

const USAGE: &str =
    "Usage: blender-publish <DISTRIBUTION_URL> <API_KEY> <SLUG> <ARTIFACT> <MANIFEST>";

/// Upload a Blender extension package and point its distribution record at it.
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "blender-publish",
    version,
    about = "Upload a Blender extension package and update its record on the distribution service"
)]
pub struct Cli {
    /// Base URL of the distribution service
    pub distribution_url: String,
    /// API key of the publishing user
    pub api_key: String,
    /// Slug of the extension record to update
    pub slug: String,
    /// Path to the packaged extension (zip)
    pub artifact: PathBuf,
    /// Path to blender_manifest.toml
    pub manifest: PathBuf,
}

impl From<Cli> for PublishConfig {
    fn from(cli: Cli) -> Self {
        PublishConfig {
            distribution_url: cli.distribution_url,
            api_key: cli.api_key,
            slug: cli.slug,
            artifact: cli.artifact,
            manifest: cli.manifest,
        }
    }
}

/// Parses the process arguments. Help and version exit 0; every other parse
/// failure prints the clap error and exits with [`EXIT_FAILURE`].
pub fn parse_or_exit() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                tracing::error!(error = %e, "Invalid invocation");
                let _ = e.print();
                std::process::exit(EXIT_FAILURE.into());
            }
        },
    }
}

/// Text printed to stderr for a failed run.
pub fn diagnostic(error: &PublishError) -> String {
    match error {
        PublishError::MissingParameter(_) => format!("{error}\n{USAGE}"),
        PublishError::Upload(_) => format!("Error uploading file: {}", error.payload()),
        PublishError::Manifest(_) | PublishError::Update(_) => {
            format!("Error updating Blender: {}", error.payload())
        }
    }
}

/// Async CLI entrypoint used by main() and integration tests.
pub async fn run(cli: Cli) -> Result<PublishReport> {
    tracing::info!("publish_started");

    let config = PublishConfig::from(cli);

    let client = DistributionClient::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to construct distribution client");
        eprintln!("Error uploading file: {}", e.payload());
        e
    })?;

    match publish(&config, &client).await {
        Ok(report) => {
            tracing::info!(
                slug = %report.slug,
                package_id = %report.package.id,
                sha256 = %report.package.sha256,
                "Publish complete"
            );
            println!("Blender package updated successfully");
            Ok(report)
        }
        Err(e) => {
            tracing::error!(error = %e, "Publish failed");
            eprintln!("{}", diagnostic(&e));
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blender_publish::DistributionError;

    #[test]
    fn parses_five_positionals_in_order() {
        let cli = Cli::try_parse_from([
            "blender-publish",
            "https://extensions.example.org",
            "k1",
            "my-addon",
            "dist/my-addon.zip",
            "blender_manifest.toml",
        ])
        .unwrap();
        let config = PublishConfig::from(cli);
        assert_eq!(config.distribution_url, "https://extensions.example.org");
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.slug, "my-addon");
        assert_eq!(config.artifact, PathBuf::from("dist/my-addon.zip"));
        assert_eq!(config.manifest, PathBuf::from("blender_manifest.toml"));
    }

    #[test]
    fn missing_manifest_argument_is_a_parse_error() {
        let err = Cli::try_parse_from([
            "blender-publish",
            "https://extensions.example.org",
            "k1",
            "my-addon",
            "dist/my-addon.zip",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn diagnostics_name_the_failed_step() {
        let upload = PublishError::Upload(DistributionError::Status {
            url: "u".into(),
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(diagnostic(&upload), "Error uploading file: boom");

        let missing = PublishError::MissingParameter("api_key");
        assert!(diagnostic(&missing).contains(USAGE));
    }
}
