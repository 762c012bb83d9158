use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EvaluationLimits;

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
    pub evaluation: EvaluationSettings,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            evaluation: EvaluationSettings::from_env()?,
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
}

/// Where account data comes from and how far a single evaluation may run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// Fixture snapshot to serve; an empty store is used when unset.
    pub data_path: Option<PathBuf>,
    pub max_sources: Option<usize>,
    pub time_budget: Option<Duration>,
}

impl EvaluationSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let data_path = non_empty_var("ELIGIBILITY_DATA_PATH").map(PathBuf::from);

        let max_sources = non_empty_var("ELIGIBILITY_MAX_SOURCES")
            .map(|raw| match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(ConfigError::InvalidMaxSources),
                Ok(max) => Ok(max),
            })
            .transpose()?;

        let time_budget = non_empty_var("ELIGIBILITY_TIME_BUDGET_MS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::InvalidTimeBudget)
            })
            .transpose()?;

        Ok(Self {
            data_path,
            max_sources,
            time_budget,
        })
    }

    pub fn limits(&self) -> EvaluationLimits {
        EvaluationLimits {
            max_sources: self.max_sources,
            time_budget: self.time_budget,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMaxSources,
    InvalidTimeBudget,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMaxSources => {
                write!(f, "ELIGIBILITY_MAX_SOURCES must be a positive integer")
            }
            ConfigError::InvalidTimeBudget => {
                write!(f, "ELIGIBILITY_TIME_BUDGET_MS must be a whole number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMaxSources
            | ConfigError::InvalidTimeBudget => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ELIGIBILITY_DATA_PATH");
        env::remove_var("ELIGIBILITY_MAX_SOURCES");
        env::remove_var("ELIGIBILITY_TIME_BUDGET_MS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.evaluation, EvaluationSettings::default());
        assert_eq!(config.evaluation.limits(), EvaluationLimits::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_evaluation_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ELIGIBILITY_DATA_PATH", "fixtures/accounts.json");
        env::set_var("ELIGIBILITY_MAX_SOURCES", "25");
        env::set_var("ELIGIBILITY_TIME_BUDGET_MS", "1500");

        let config = AppConfig::load().expect("config loads");
        let limits = config.evaluation.limits();
        reset_env();

        assert_eq!(
            config.evaluation.data_path,
            Some(PathBuf::from("fixtures/accounts.json"))
        );
        assert_eq!(limits.max_sources, Some(25));
        assert_eq!(limits.time_budget, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn rejects_invalid_limits() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("ELIGIBILITY_MAX_SOURCES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidMaxSources)
        ));
        env::remove_var("ELIGIBILITY_MAX_SOURCES");

        env::set_var("ELIGIBILITY_TIME_BUDGET_MS", "soon");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimeBudget)
        ));
        reset_env();
    }
}
