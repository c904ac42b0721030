//! Runtime configuration.
//!
//! Resolved from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. an optional YAML (`.yaml`/`.yml`) or JSON config file
//! 3. environment variables
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `LAYERTYPE_CACHE_DIR` | `$HOME/.cache/layertype` | Root of the blob cache |
//! | `LAYERTYPE_SCHEMA` | `oci` | Layer media-type convention: `oci` or `docker` |

use std::fs;
use std::path::{Path, PathBuf};

use layertype_oci::LayerSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const ENV_CACHE_DIR: &str = "LAYERTYPE_CACHE_DIR";
pub const ENV_SCHEMA: &str = "LAYERTYPE_SCHEMA";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `blobs/sha256/<hex>`.
    pub cache_dir: PathBuf,
    /// Convention used when naming detected or converted layers.
    pub schema: LayerSchema,
}

/// On-disk config file.  Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub schema: Option<LayerSchema>,
}

impl Config {
    /// Load configuration from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => load_document(p)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge `file` with values looked up through `env`.
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_value = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let schema = match env_value(ENV_SCHEMA) {
            Some(raw) => raw
                .parse::<LayerSchema>()
                .map_err(|e| Error::Config(format!("{ENV_SCHEMA}: {e}")))?,
            None => file.schema.unwrap_or_default(),
        };

        let cache_dir = match env_value(ENV_CACHE_DIR).map(PathBuf::from).or(file.cache_dir) {
            Some(dir) => dir,
            None => {
                let home = env_value("HOME").ok_or_else(|| {
                    Error::Config(format!(
                        "cannot determine cache directory; set {ENV_CACHE_DIR} or HOME"
                    ))
                })?;
                PathBuf::from(home).join(".cache").join("layertype")
            }
        };

        Ok(Self { cache_dir, schema })
    }
}

/// Read a YAML or JSON document, choosing the format by file extension.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid YAML {}: {}", path.display(), e)))
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("invalid JSON {}: {}", path.display(), e)))
    }
}
