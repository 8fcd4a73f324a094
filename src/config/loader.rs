//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::RetryPolicy;
use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub scans: ScansConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub pack: PackConfig,
}

/// Catalog search endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Page fetched before each search to reset session cookies.
    #[serde(default = "default_home_url")]
    pub home_url: String,

    /// Endpoint receiving the `query` form field.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Prefix of catalog links; the slug is whatever follows it.
    #[serde(default = "default_catalog_url_prefix")]
    pub catalog_url_prefix: String,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

/// Scan download configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScansConfig {
    /// Base URL under which `{title}/{chapter}/{page}.{ext}` images live.
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Image file extension (without dot).
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    /// Referer header sent with image requests.
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Directory holding one folder per title.
    #[serde(default = "default_scans_directory")]
    pub scans_directory: PathBuf,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Lower bound of the pause after each saved page.
    #[serde(default)]
    pub page_delay_min_ms: u64,

    /// Upper bound of the pause after each saved page.
    #[serde(default)]
    pub page_delay_max_ms: u64,

    /// Extra full walk attempts after a failed run.
    #[serde(default = "default_run_retries")]
    pub run_retries: u32,
}

impl Default for ScansConfig {
    fn default() -> Self {
        Self {
            image_base_url: default_image_base_url(),
            image_extension: default_image_extension(),
            referer: default_referer(),
            scans_directory: default_scans_directory(),
            request_timeout_seconds: default_request_timeout(),
            page_delay_min_ms: 0,
            page_delay_max_ms: 0,
            run_retries: default_run_retries(),
        }
    }
}

/// Network retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles on each further attempt.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to every delay.
    #[serde(default = "default_max_jitter")]
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_jitter_ms: default_max_jitter(),
        }
    }
}

/// Post-processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    /// Directory receiving CBZ archives (and the temporary split folder).
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// Target page height in pixels.
    #[serde(default = "default_page_height")]
    pub page_height: u32,

    /// Images taller than `page_height * height_threshold` are split.
    #[serde(default = "default_height_threshold")]
    pub height_threshold: f64,

    /// Maximum size of a single archive in MiB.
    #[serde(default = "default_max_archive_mb")]
    pub max_archive_mb: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            page_height: default_page_height(),
            height_threshold: default_height_threshold(),
            max_archive_mb: default_max_archive_mb(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            home_url: default_home_url(),
            search_url: default_search_url(),
            catalog_url_prefix: default_catalog_url_prefix(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

fn default_home_url() -> String {
    "https://anime-sama.fr/".to_string()
}

fn default_search_url() -> String {
    "https://anime-sama.fr/template-php/defaut/fetch.php".to_string()
}

fn default_catalog_url_prefix() -> String {
    "https://anime-sama.fr/catalogue/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7".to_string()
}

fn default_image_base_url() -> String {
    "https://anime-sama.fr/s2/scans/".to_string()
}

fn default_image_extension() -> String {
    "jpg".to_string()
}

fn default_referer() -> String {
    "https://anime-sama.fr/catalogue/".to_string()
}

fn default_scans_directory() -> PathBuf {
    PathBuf::from("scans")
}

fn default_request_timeout() -> u64 {
    30
}

fn default_run_retries() -> u32 {
    1
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_jitter() -> u64 {
    1000
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("splitted")
}

fn default_page_height() -> u32 {
    1600
}

fn default_height_threshold() -> f64 {
    1.2
}

fn default_max_archive_mb() -> u64 {
    700
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Retry policy for image requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_jitter: Duration::from_millis(self.retry.max_jitter_ms),
        }
    }

    /// Archive size cap in bytes, saturating at `u64::MAX`.
    pub fn max_archive_bytes(&self) -> u64 {
        self.pack.max_archive_mb.saturating_mul(1024 * 1024)
    }
}
