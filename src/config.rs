//! Configuration module.
//!
//! Handles loading, validating, and merging the `cropvariant.toml` file.
//! Stock defaults are the base layer; a user config file overrides only the
//! keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [storage]
//! base_dir = "uploads"                      # Local directory holding the originals
//! base_url = "https://localhost/uploads"    # Public URL of that directory
//!
//! [request]
//! scheme = "https"          # Scheme every returned URL is rewritten to
//!
//! [output]
//! quality = 90              # Lossy encoding quality (1-100)
//!
//! [cache]
//! reuse_existing = false    # Return existing variants without re-encoding
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [attachments]
//! "42" = "https://localhost/uploads/2017/12/wallpaper.jpg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::materialize::MaterializeOptions;
use crate::scheme::Scheme;
use crate::storage::UploadsMapping;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `cropvariant.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where originals live on disk and on the web.
    pub storage: StorageConfig,
    /// Settings of the request being served.
    pub request: RequestConfig,
    /// Encoder settings for written variants.
    pub output: OutputConfig,
    pub cache: CacheConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Attachment ID → image URL. Keys are decimal IDs.
    pub attachments: BTreeMap<String, String>,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        let url = self.storage.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")) {
            return Err(ConfigError::Validation(
                "storage.base_url must be an absolute http(s) or protocol-relative URL".into(),
            ));
        }
        if let Some(key) = self.attachments.keys().find(|k| k.parse::<u64>().is_err()) {
            return Err(ConfigError::Validation(format!(
                "attachments key {:?} is not a numeric ID",
                key
            )));
        }
        Ok(())
    }

    /// Directory ↔ URL mapping for the configured uploads location.
    pub fn uploads_mapping(&self) -> UploadsMapping {
        UploadsMapping::new(
            &self.storage.base_dir,
            &self.storage.base_url,
            self.request.scheme,
        )
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            quality: Quality::new(self.output.quality),
            reuse_existing: self.cache.reuse_existing,
        }
    }
}

/// Uploads location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub base_dir: PathBuf,
    pub base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("uploads"),
            base_url: "https://localhost/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    pub scheme: Scheme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub reuse_existing: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Worker count for batch requests: `max_processes` clamped to `1..=cores`,
/// or every core when unset.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`.
///
/// A missing file yields the stock defaults. Otherwise user values are merged
/// on top of the defaults, unknown keys are rejected, and the result is
/// validated.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `cropvariant.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cropvariant configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Uploads location
# ---------------------------------------------------------------------------
[storage]
# Local directory that holds the original images. Variants are written next
# to their originals inside this directory.
base_dir = "uploads"

# Public URL the web server exposes base_dir under.
base_url = "https://localhost/uploads"

# ---------------------------------------------------------------------------
# Request
# ---------------------------------------------------------------------------
[request]
# Scheme the current request is served over ("http" or "https").
# Stored http://, https:// and //host URLs are all rewritten to it.
scheme = "https"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# Lossy encoding quality for JPEG/AVIF variants (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# Return an existing variant file of the right size instead of re-encoding.
reuse_existing = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers for batch requests.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Attachments
# ---------------------------------------------------------------------------
[attachments]
# Attachment ID -> image URL, for requests that name an image by ID.
# "42" = "https://localhost/uploads/2017/12/wallpaper.jpg"
"##
}
