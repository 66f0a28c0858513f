//! Configuration management for the AquaMon application
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AQM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Local storage configuration
    pub storage: StorageConfig,

    /// Mock one-time-code flow configuration
    pub auth: AuthConfig,

    /// Gemini API configuration
    pub gemini: GeminiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the persisted profile and report entries
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Fixed placeholder code standing in for a real SMS provider
    pub mock_otp: String,

    /// Simulated network latency for the OTP send step, in milliseconds
    pub otp_latency_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API key; absent means every AI call fails fast with a
    /// configuration error
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// API base URL (overridable for tests)
    pub base_url: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("AQM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("storage.data_dir", "./data")?
            .set_default("auth.mock_otp", "1234")?
            .set_default("auth.otp_latency_ms", 1000)?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default(
                "gemini.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AQM_ prefix)
            .add_source(
                Environment::with_prefix("AQM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mock_otp: "1234".to_string(),
            otp_latency_ms: 1000,
        }
    }
}
