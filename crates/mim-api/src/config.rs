//! Environment configuration

use mim_core::ProbeConfig;
use std::str::FromStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Accepted values for `API_LOG_LEVEL`
pub const VALID_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown log level '{0}', expected one of DEBUG, INFO, WARNING, ERROR, CRITICAL")]
    UnknownLogLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Parse a configured level, falling back to `INFO` for anything unknown
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// `tracing` has no level above ERROR, so CRITICAL shares it
    pub fn as_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(ConfigError::UnknownLogLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub log_level: LogLevel,
    pub bind_addr: String,
    pub probe: ProbeConfig,
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            bind_addr: "0.0.0.0:8000".to_string(),
            probe: ProbeConfig::default(),
            max_upload_bytes: 256 * 1024 * 1024, // 256MB
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let timeout_secs = lookup("API_PROBE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.probe.timeout_secs);

        Self {
            log_level: LogLevel::parse_or_default(lookup("API_LOG_LEVEL").as_deref()),
            bind_addr: lookup("API_BIND").unwrap_or(defaults.bind_addr),
            probe: ProbeConfig {
                timeout_secs,
                ..defaults.probe
            },
            max_upload_bytes: lookup("API_MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!(
            "verbose".parse::<LogLevel>(),
            Err(ConfigError::UnknownLogLevel("verbose".to_string()))
        );
        for level in VALID_LOG_LEVELS {
            assert_eq!(level.parse::<LogLevel>().unwrap().as_str(), *level);
        }
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(LogLevel::parse_or_default(Some("TRACE")), LogLevel::Info);
        assert_eq!(LogLevel::parse_or_default(None), LogLevel::Info);
        assert_eq!(LogLevel::parse_or_default(Some("critical")), LogLevel::Critical);
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Warning.as_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.as_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[]));
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.probe.timeout_secs, 10);
    }

    #[test]
    fn test_config_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("API_LOG_LEVEL", "error"),
            ("API_BIND", "127.0.0.1:9000"),
            ("API_PROBE_TIMEOUT_SECS", "3"),
            ("API_MAX_UPLOAD_BYTES", "not-a-number"),
        ]));
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.probe.timeout_secs, 3);
        assert_eq!(config.max_upload_bytes, 256 * 1024 * 1024);
    }
}
