//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID; when unset the server runs on the in-memory store
    pub gcp_project_id: Option<String>,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development, values can be set via a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").ok(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: None,
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so both cases run in one test.
    #[test]
    fn test_config_from_env() {
        env::remove_var("JWT_SIGNING_KEY");
        match Config::from_env() {
            Err(ConfigError::Missing(name)) => assert_eq!(name, "JWT_SIGNING_KEY"),
            other => panic!("expected missing-variable error, got {:?}", other),
        }

        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::remove_var("PORT");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.port, 8080);
        assert!(!config.jwt_signing_key.is_empty());
    }
}
