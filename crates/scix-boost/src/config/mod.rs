mod ranking;

pub use ranking::{
    RankingConfig, DEFAULT_COLLECTIONS, DEFAULT_RECENCY_MAX_AGE_MONTHS,
    DEFAULT_RECENCY_MULTIPLIER, DOCTYPE_WEIGHT_KEY, RECENCY_WEIGHT_KEY, REFEREED_WEIGHT_KEY,
};

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::warn;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub ranking: RankingSource,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let path = env::var("BOOST_RANKING_CONFIG")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            ranking: RankingSource { path },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Line format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Where the ranking tables come from. Read once at startup.
#[derive(Debug, Clone, Default)]
pub struct RankingSource {
    pub path: Option<PathBuf>,
}

impl RankingSource {
    pub fn load(&self) -> Result<RankingConfig, ConfigError> {
        match &self.path {
            Some(path) => RankingConfig::from_path(path),
            None => {
                warn!("BOOST_RANKING_CONFIG not set, every ranking section falls back to defaults");
                Ok(RankingConfig::default())
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    RankingFile {
        path: PathBuf,
        source: std::io::Error,
    },
    RankingJson {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    InvalidWeight {
        key: String,
        value: f64,
    },
    InvalidRecencyMultiplier(f64),
    InvalidRecencyHorizon(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::RankingFile { path, .. } => {
                write!(f, "unable to read ranking config {}", path.display())
            }
            ConfigError::RankingJson {
                path: Some(path), ..
            } => write!(f, "ranking config {} is not valid JSON", path.display()),
            ConfigError::RankingJson { path: None, .. } => {
                write!(f, "ranking config is not valid JSON")
            }
            ConfigError::InvalidWeight { key, value } => write!(
                f,
                "BOOST_FACTOR_WEIGHTS.{key} must be a non-negative number (got {value})"
            ),
            ConfigError::InvalidRecencyMultiplier(value) => write!(
                f,
                "RECENCY_BOOST_MULTIPLIER must be a positive number (got {value})"
            ),
            ConfigError::InvalidRecencyHorizon(value) => write!(
                f,
                "RECENCY_BOOST_MAX_AGE_MONTHS must be a non-negative number (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::RankingFile { source, .. } => Some(source),
            ConfigError::RankingJson { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidWeight { .. }
            | ConfigError::InvalidRecencyMultiplier(_)
            | ConfigError::InvalidRecencyHorizon(_) => None,
        }
    }
}
