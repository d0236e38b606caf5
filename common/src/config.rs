//! Service configuration.
//!
//! Loaded from environment variables with defaults suitable for local use.

use std::str::FromStr;

/// Runtime configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name used in logs and response metadata.
    pub service_name: String,

    /// Bind address host.
    pub host: String,

    /// Bind address port.
    pub port: u16,

    /// Database connect/acquire timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum connections per database pool.
    pub max_connections: u32,

    /// Gemini API key from `GOOGLE_API_KEY`. A key supplied through the UI
    /// takes precedence over this value.
    pub google_api_key: Option<String>,

    /// Gemini model identifier used for SQL generation.
    pub gemini_model: String,
}

impl AppConfig {
    /// Loads configuration from the environment for the given service.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("SERVER_PORT", 8080),
            connect_timeout_secs: env_parse("CONNECT_TIMEOUT_SECS", 10),
            max_connections: env_parse("MAX_CONNECTIONS", 5),
            google_api_key: std::env::var("GOOGLE_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash-latest".to_string()),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_absent() {
        let config = AppConfig::load_with_service("text2sql-service");
        assert_eq!(config.service_name, "text2sql-service");
        assert_eq!(config.gemini_model, "gemini-1.5-flash-latest");
        assert!(config.max_connections > 0);
    }
}
