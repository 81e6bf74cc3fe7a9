//! Logging and tracing utilities

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// Newline-delimited JSON
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn,agent_advisor=info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_LEVEL` and `LOG_FORMAT`, keeping defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(level) = crate::env_opt("LOG_LEVEL") {
            config.level = level;
        }
        if let Some(format) = crate::env_opt("LOG_FORMAT").and_then(|f| f.parse().ok()) {
            config.format = format;
        }
        config
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
    tracing::debug!(format = ?config.format, "Tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("TEXT".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.level.contains("agent_advisor"));
    }
}
