//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AUTHNET_API_LOGIN_ID` - Merchant API login ID
//! - `AUTHNET_TRANSACTION_KEY` - Merchant transaction key (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `AUTHNET_ENDPOINT` - Gateway endpoint URL (default: sandbox)
//! - `AUTHNET_TIMEOUT_SECS` - Transport timeout in seconds (default: 30)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Sandbox gateway endpoint.
pub const SANDBOX_ENDPOINT: &str = "https://apitest.authorize.net/xml/v1/request.api";

/// Production gateway endpoint.
pub const PRODUCTION_ENDPOINT: &str = "https://api.authorize.net/xml/v1/request.api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Immutable gateway configuration.
///
/// One instance is built at startup and handed to every component at
/// construction; there is no implicit global gateway state.
///
/// Implements `Debug` manually to redact the HIGH PRIVILEGE transaction key.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Merchant API login ID.
    pub api_login_id: String,
    /// Merchant transaction key (HIGH PRIVILEGE - can charge and refund).
    pub transaction_key: SecretString,
    /// Gateway endpoint URL; every request kind multiplexes over it.
    pub endpoint: String,
    /// Transport timeout; expiry surfaces as a transport error.
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_login_id", &self.api_login_id)
            .field("transaction_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the transaction key fails placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_login_id = get_required_env("AUTHNET_API_LOGIN_ID")?;
        let transaction_key = get_validated_secret("AUTHNET_TRANSACTION_KEY")?;
        let endpoint = get_env_or_default("AUTHNET_ENDPOINT", SANDBOX_ENDPOINT);
        let timeout_secs = get_env_or_default(
            "AUTHNET_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("AUTHNET_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_login_id,
            transaction_key,
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// A sandbox configuration with the default timeout.
    #[must_use]
    pub fn sandbox(api_login_id: impl Into<String>, transaction_key: SecretString) -> Self {
        Self {
            api_login_id: api_login_id.into(),
            transaction_key,
            endpoint: SANDBOX_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a secret is not an obvious placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_transaction_key() {
        let config = GatewayConfig::sandbox(
            "merchant-login",
            SecretString::from("5KP3u95vRz4B2jmc"),
        );

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("merchant-login"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("5KP3u95vRz4B2jmc"));
    }

    #[test]
    fn test_sandbox_defaults() {
        let config = GatewayConfig::sandbox("login", SecretString::from("k3y"));
        assert_eq!(config.endpoint, SANDBOX_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-transaction-key", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("5KP3u95vRz4B2jmc", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_endpoints_differ() {
        assert_ne!(SANDBOX_ENDPOINT, PRODUCTION_ENDPOINT);
        assert!(SANDBOX_ENDPOINT.starts_with("https://"));
        assert!(PRODUCTION_ENDPOINT.starts_with("https://"));
    }
}
