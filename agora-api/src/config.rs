//! API Configuration Module
//!
//! This module provides configuration for the HTTP listener and CORS.
//! Configuration is loaded from environment variables with sensible
//! defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for the listener and CORS.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind the HTTP listener to.
    pub bind_host: String,

    /// Port to bind the HTTP listener to.
    pub bind_port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 3000,
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `AGORA_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `AGORA_API_PORT` / `PORT`: Bind port (default: 3000)
    /// - `AGORA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `AGORA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("AGORA_API_BIND").unwrap_or_else(|_| defaults.bind_host.clone());

        let bind_port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("AGORA_API_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.bind_port);

        let cors_origins = std::env::var("AGORA_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("AGORA_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            bind_host,
            bind_port,
            cors_origins,
            cors_max_age_secs,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }
        self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.bind_port, 3000);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://agora.example".to_string()];
        assert!(config.is_production());
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.example"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_origin_allowed_production() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec![
            "https://agora.example".to_string(),
            "https://app.agora.example".to_string(),
        ];

        assert!(config.is_origin_allowed("https://agora.example"));
        assert!(config.is_origin_allowed("https://app.agora.example"));
        assert!(!config.is_origin_allowed("https://evil.example"));
    }
}
