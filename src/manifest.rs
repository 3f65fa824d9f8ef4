/// `manifest` module: reads a `blender_manifest.toml` and turns it into the JSON body
/// the distribution service expects for an extension record.
///
/// # Transformations
/// - `id` is dropped; the service owns record identity.
/// - `license`, a list of license identifiers, becomes a list of `{ "value": <entry> }`
///   objects. A manifest without `license` yields an empty list.
/// - `package` is set to the identifier of the uploaded artifact.
///
/// Every other key is forwarded unchanged, in file order.
///
/// # Errors
/// Read, parse and shape failures are reported as [`ManifestError`].
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Number, Value};
use tracing::{debug, error, info};

use crate::contract::{PackageId, UpdateBody};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("manifest field `license` must be an array, found {found}")]
    License { found: &'static str },
}

/// A parsed manifest, keys in file order.
#[derive(Debug, Clone)]
pub struct Manifest {
    fields: Map<String, Value>,
}

/// Reads and parses the manifest at `path`.
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Manifest, ManifestError> {
    let path_ref = path.as_ref();
    info!(manifest_path = ?path_ref, "Loading manifest from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, manifest_path = ?path_ref, "Failed to read manifest file");
            return Err(ManifestError::Read {
                path: path_ref.to_path_buf(),
                source: e,
            });
        }
    };

    match Manifest::parse(&content) {
        Ok(manifest) => {
            info!(
                manifest_path = ?path_ref,
                fields = manifest.fields.len(),
                "Parsed manifest TOML successfully"
            );
            Ok(manifest)
        }
        Err(e) => {
            error!(error = %e, manifest_path = ?path_ref, "Failed to parse manifest TOML");
            Err(ManifestError::Parse {
                path: path_ref.to_path_buf(),
                source: e,
            })
        }
    }
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        let fields = table
            .into_iter()
            .map(|(key, value)| (key, toml_to_json(value)))
            .collect();
        Ok(Manifest { fields })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Builds the update body for the extension record, pointing it at `package`.
    pub fn into_update_body(self, package: &PackageId) -> Result<UpdateBody, ManifestError> {
        let mut body = self.fields;

        if let Some(id) = body.shift_remove("id") {
            debug!(%id, "Dropped manifest id from update body");
        }

        let licenses = match body.get("license") {
            None => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(|entry| json!({ "value": entry }))
                .collect(),
            Some(other) => {
                return Err(ManifestError::License {
                    found: json_type_name(other),
                })
            }
        };
        body.insert("license".to_owned(), Value::Array(licenses));
        body.insert("package".to_owned(), package.as_value().clone());

        Ok(body)
    }
}

/// Converts a TOML value into JSON. Datetimes keep their textual form and
/// non-finite floats become `null`.
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
