//! Client configuration
//!
//! ## Configuration Resolution
//!
//! 1. Embedded defaults (`config/tillroll.toml`, compiled into the binary)
//! 2. Override file (`~/.config/tillroll/config.toml`, or an explicit path)
//! 3. Environment (`TILLROLL_API_URL`, `TILLROLL_DATA_DIR`)
//! 4. Command-line flags, applied by the caller via the `with_*` methods
//!
//! Each layer only replaces the keys it sets.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tillroll.toml");

pub const ENV_API_URL: &str = "TILLROLL_API_URL";
pub const ENV_DATA_DIR: &str = "TILLROLL_DATA_DIR";

/// Name of the session storage file inside the data directory
const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend base URL, including the `/api` prefix
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Page size used when loading the receipt collection
    pub page_size: u32,
    /// Budget for the "remaining this month" figure
    pub monthly_budget: f64,
    /// Directory holding the session storage file
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(30),
            page_size: 100,
            monthly_budget: crate::stats::DEFAULT_MONTHLY_BUDGET,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load defaults plus the override file (explicit path, or the default location)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = parse_config(DEFAULT_CONFIG, Config::default())?;

        match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                config = config.merge_file(path)?;
            }
            None => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    config = config.merge_file(&path)?;
                }
            }
        }

        Ok(config)
    }

    fn merge_file(self, path: &Path) -> Result<Self> {
        debug!("Loading config override from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        parse_config(&content, self)
    }

    /// Apply `TILLROLL_*` environment variables
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_url = normalize_url(&url);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_url(url);
        self
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = dir;
        self
    }

    /// Path of the local session storage file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tillroll").join("config.toml"))
}

/// Default data directory (~/.local/share/tillroll on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tillroll"))
        .unwrap_or_else(|| PathBuf::from(".tillroll"))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    api: Option<RawApi>,
    dashboard: Option<RawDashboard>,
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawDashboard {
    monthly_budget: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    data_dir: Option<PathBuf>,
}

/// Parse TOML content on top of `base`
fn parse_config(content: &str, base: Config) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = base;

    if let Some(api) = raw.api {
        if let Some(url) = api.base_url {
            if url.trim().is_empty() {
                return Err(Error::Config("api.base_url must not be empty".into()));
            }
            config.api_url = normalize_url(&url);
        }
        if let Some(timeout) = api.timeout_secs {
            if timeout == 0 {
                return Err(Error::Config("api.timeout_secs must be positive".into()));
            }
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(size) = api.page_size {
            if size == 0 {
                return Err(Error::Config("api.page_size must be positive".into()));
            }
            config.page_size = size;
        }
    }

    if let Some(dashboard) = raw.dashboard {
        if let Some(budget) = dashboard.monthly_budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(Error::Config(
                    "dashboard.monthly_budget must be a non-negative number".into(),
                ));
            }
            config.monthly_budget = budget;
        }
    }

    if let Some(storage) = raw.storage {
        if let Some(dir) = storage.data_dir {
            config.data_dir = dir;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG, Config::default()).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.monthly_budget, 50_000.0);
    }

    #[test]
    fn test_override_only_replaces_set_keys() {
        let content = r#"
            [api]
            base_url = "https://receipts.example.com/api/"

            [dashboard]
            monthly_budget = 1200.0
        "#;
        let config = parse_config(content, Config::default()).unwrap();
        assert_eq!(config.api_url, "https://receipts.example.com/api");
        assert_eq!(config.monthly_budget, 1200.0);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse_config("[api]\ntimeout_secs = 0", Config::default()).is_err());
        assert!(parse_config("[api]\npage_size = 0", Config::default()).is_err());
        assert!(parse_config("[dashboard]\nmonthly_budget = -1.0", Config::default()).is_err());
        assert!(parse_config("not toml at all [", Config::default()).is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\ntimeout_secs = 5\n[storage]\ndata_dir = \"/tmp/tr\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tr"));
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/tr/storage.json"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().apply_env_from(|key| match key {
            ENV_API_URL => Some("http://10.0.0.2:9000/api/".to_string()),
            ENV_DATA_DIR => Some("/var/lib/tillroll".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url, "http://10.0.0.2:9000/api");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tillroll"));
    }

    #[test]
    fn test_flag_overrides() {
        let config = Config::default()
            .with_api_url(" http://localhost:9999/api ")
            .with_data_dir(PathBuf::from("data"));
        assert_eq!(config.api_url, "http://localhost:9999/api");
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }
}
