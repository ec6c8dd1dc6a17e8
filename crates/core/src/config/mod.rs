//! Application configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (BNSS_*)
//! 2. TOML config file (if BNSS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Pipeline configuration.
///
/// Directory paths are resolved relative to `project_root`. HTTP tuning
/// parameters are all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory all other paths resolve under.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Directory for content-addressed raw HTML bodies and sidecar metadata.
    #[serde(default = "default_raw_html_dir")]
    pub raw_html_dir: PathBuf,

    /// Directory for the URL cache document and fetch manifests.
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,

    /// Directory for the output JSONL datasets.
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request.
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Minimum inter-request delay in milliseconds (politeness floor).
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Total HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total tries per URL, including the first attempt.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff growth factor between retries.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial retry delay in milliseconds.
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,

    /// Retry delay ceiling in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Canonical source URL of the BNSS section index page.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Canonical source URL of the BNSS/CrPC section table page.
    #[serde(default = "default_section_table_url")]
    pub section_table_url: String,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_raw_html_dir() -> PathBuf {
    PathBuf::from("raw_html")
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_datasets_dir() -> PathBuf {
    PathBuf::from("datasets")
}

fn default_user_agent() -> String {
    "bnss-pipeline/0.1 (contact: your-email@example.com)".into()
}

fn default_accept_language() -> String {
    "en-IN,en;q=0.9".into()
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_backoff_min_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

fn default_index_url() -> String {
    "https://cytrain.ncrb.gov.in/staticpage/web_pages/IndexBNSS.html".into()
}

fn default_section_table_url() -> String {
    "https://cytrain.ncrb.gov.in/staticpage/web_pages/SectionTableBNSS.html".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            raw_html_dir: default_raw_html_dir(),
            manifests_dir: default_manifests_dir(),
            datasets_dir: default_datasets_dir(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            min_delay_ms: default_min_delay_ms(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_multiplier: default_backoff_multiplier(),
            backoff_min_ms: default_backoff_min_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            index_url: default_index_url(),
            section_table_url: default_section_table_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `BNSS_`
    /// 2. TOML file from `BNSS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("BNSS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("BNSS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Timeout as Duration for the HTTP client.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Politeness floor as Duration.
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Initial retry delay as Duration.
    pub fn backoff_min(&self) -> Duration {
        Duration::from_millis(self.backoff_min_ms)
    }

    /// Retry delay ceiling as Duration.
    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Resolved raw HTML store directory.
    pub fn raw_html_path(&self) -> PathBuf {
        self.project_root.join(&self.raw_html_dir)
    }

    /// Resolved manifests directory.
    pub fn manifests_path(&self) -> PathBuf {
        self.project_root.join(&self.manifests_dir)
    }

    /// Resolved datasets directory.
    pub fn datasets_path(&self) -> PathBuf {
        self.project_root.join(&self.datasets_dir)
    }

    /// The two canonical source URLs, fetch order preserved.
    pub fn seed_urls(&self) -> Vec<String> {
        vec![self.index_url.clone(), self.section_table_url.clone()]
    }

    /// Create output directories if they don't exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.raw_html_dir, &self.manifests_dir, &self.datasets_dir] {
            let path = self.project_root.join(dir);
            std::fs::create_dir_all(&path)?;
            tracing::debug!("ensured directory: {}", path.display());
        }
        Ok(())
    }

    /// A config rooted at `root`, used by tests and the CLI `--root` override.
    pub fn rooted_at(root: &Path) -> Self {
        Self { project_root: root.to_path_buf(), ..Default::default() }
    }
}
