//! Configuration loading.
//!
//! [`RowmapConfig::load`] reads `config/config.toml` (optional) and then
//! environment variables prefixed with `ROWMAP`, using `__` as the section
//! separator (`ROWMAP__PAGINATION__MIN_PAGE_SIZE=25`).
//!
//! ```toml
//! [scan]
//! strict = true
//! name_match = "normalized"
//!
//! [pagination]
//! min_page_size = 10
//! ```

use crate::scan::NameMatch;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "ROWMAP";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RowmapConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub name_match: NameMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_min_page_size")]
    pub min_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            min_page_size: default_min_page_size(),
        }
    }
}

fn default_min_page_size() -> u64 {
    crate::query::paginate::MIN_PAGE_SIZE
}

impl RowmapConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // File present but unreadable: retry from the environment alone.
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        Self::from_config(settings)
    }

    /// Deserialize from an already built `config::Config`.
    pub fn from_config(settings: Config) -> Result<Self, ConfigError> {
        settings.try_deserialize::<RowmapConfig>().map_err(|e| {
            ConfigError::Message(format!("rowmap configuration could not be loaded: {}", e))
        })
    }
}
