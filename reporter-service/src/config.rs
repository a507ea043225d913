use std::{fmt, fs, path::Path, path::PathBuf, time::Duration};

use homeflux_client::{api::IngestTarget, api::DEFAULT_ENDPOINT, domain::SourceRef};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "HOMEFLUX_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "homeflux.toml";
pub const DEFAULT_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ReporterConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub token: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("interval_secs", &self.interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Entity ids for the five measurement slots. Any of them may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_power: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_power: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_import_total: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_export_total: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pv_total: Option<SourceRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateApiConfig {
    pub http_bind_addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_bearer_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub reporter: ReporterConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_api: Option<StateApiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl AppConfig {
    /// Load from the file named by `HOMEFLUX_CONFIG`, or `homeflux.toml`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reporter;
        if r.token.trim().is_empty() {
            return Err(ConfigError::Invalid("reporter.token must not be empty".to_string()));
        }
        if r.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("reporter.endpoint must not be empty".to_string()));
        }
        if r.interval_secs == 0 {
            return Err(ConfigError::Invalid("reporter.interval_secs must be positive".to_string()));
        }
        if r.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "reporter.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Same configuration with only the reporting interval changed.
    pub fn with_interval(mut self, interval_secs: u64) -> Result<Self, ConfigError> {
        self.reporter.interval_secs = interval_secs;
        self.validate()?;
        Ok(self)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.reporter.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.reporter.request_timeout_secs)
    }

    pub fn ingest_target(&self) -> IngestTarget {
        IngestTarget::new(&self.reporter.endpoint, &self.reporter.token).with_timeout(self.request_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [reporter]
        endpoint = "https://ingest.example.test/"
        token = "abc"
        interval_secs = 30
        request_timeout_secs = 5

        [sources]
        grid_power = "sensor.grid_power"
        pv_total = "sensor.pv_energy"

        [state_api]
        http_bind_addr = "127.0.0.1:8124"

        [metrics]
        bind_addr = "127.0.0.1:9000"
    "#;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str("[reporter]\ntoken = \"abc\"\n").unwrap();
        assert_eq!(cfg.reporter.endpoint, "https://api.homeflux.io");
        assert_eq!(cfg.interval(), Duration::from_secs(60));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.sources, SourcesConfig::default());
        assert!(cfg.state_api.is_none());
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn full_config_parses() {
        let cfg = AppConfig::from_toml_str(FULL).unwrap();
        assert_eq!(cfg.interval(), Duration::from_secs(30));
        assert_eq!(cfg.sources.grid_power, Some(SourceRef::new("sensor.grid_power")));
        assert_eq!(cfg.sources.pv_total, Some(SourceRef::new("sensor.pv_energy")));
        assert!(cfg.sources.pv_power.is_none());
        assert_eq!(cfg.ingest_target().ingest_url(), "https://ingest.example.test/ingest");
        assert_eq!(cfg.ingest_target().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = AppConfig::from_toml_str("[reporter]\ntoken = \"abc\"\ninterval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = AppConfig::from_toml_str("[reporter]\ntoken = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn with_interval_changes_only_the_interval() {
        let cfg = AppConfig::from_toml_str(FULL).unwrap();
        let updated = cfg.clone().with_interval(120).unwrap();
        assert_eq!(updated.interval(), Duration::from_secs(120));
        assert_eq!(updated.sources, cfg.sources);
        assert_eq!(updated.reporter.token, cfg.reporter.token);
        assert!(cfg.with_interval(0).is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let cfg = AppConfig::from_toml_str(FULL).unwrap();
        let path = std::env::temp_dir().join(format!("homeflux-config-{}.toml", std::process::id()));
        cfg.save(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.sources, cfg.sources);
        assert_eq!(loaded.reporter.endpoint, cfg.reporter.endpoint);
        assert_eq!(loaded.interval(), cfg.interval());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let cfg = AppConfig::from_toml_str(FULL).unwrap();
        assert!(!format!("{cfg:?}").contains("\"abc\""));
    }
}
