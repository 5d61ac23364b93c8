//! Rolodex Configuration Management
//!
//! Handles configuration from environment variables and config files with
//! sensible defaults for development. Configuration is loaded and validated
//! once at process start and passed by reference into the components that
//! need it; nothing re-reads the environment per request.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Minimum signing-secret length accepted in production
pub const MIN_SECRET_LEN: usize = 32;

/// Length of auto-generated development secrets
const GENERATED_SECRET_LEN: usize = 64;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,

    /// Server configuration
    pub server: ServerConfig,

    /// Token signing and verification configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(env) = std::env::var("APP_ENV") {
            config.environment = env.parse()?;
        }

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }

        // CORS origins from environment variable (comma-separated)
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Token signing
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.secret = secret;
        }
        if let Ok(algorithm) = std::env::var("JWT_ALGORITHM") {
            config.auth.algorithm = algorithm;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.auth.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("JWT_AUDIENCE") {
            config.auth.audience = audience;
        }
        if let Ok(ttl) = std::env::var("JWT_ACCESS_TTL") {
            config.auth.access_token_ttl = ttl;
        }
        if let Ok(ttl) = std::env::var("JWT_REFRESH_TTL") {
            config.auth.refresh_token_ttl = ttl;
        }
        if let Ok(ms) = std::env::var("REVOCATION_TIMEOUT_MS") {
            config.auth.revocation_timeout_ms =
                ms.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "REVOCATION_TIMEOUT_MS".to_string(),
                    value: ms,
                })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Validate the configuration, filling in what may be generated.
    ///
    /// Must be called once before the process starts serving traffic.
    /// A failure here is fatal: a production deployment without a proper
    /// signing secret must not come up and degrade per request.
    ///
    /// In non-production environments a missing secret is replaced with an
    /// ephemeral random one. Every restart then invalidates all outstanding
    /// tokens, which is why this is only permitted outside production.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.auth.secret.is_empty() {
            if self.environment == Environment::Production {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
            }
            tracing::warn!(
                "JWT_SECRET is not set; generated an ephemeral signing secret. \
                 All issued tokens become invalid on restart. Do not run this \
                 configuration in production."
            );
            self.auth.secret = generate_secret();
        } else if self.environment == Environment::Production
            && self.auth.secret.len() < MIN_SECRET_LEN
        {
            return Err(ConfigError::InvalidValue {
                key: "JWT_SECRET".to_string(),
                value: format!("<{MIN_SECRET_LEN} chars"),
            });
        }

        if !matches!(self.auth.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                value: self.auth.algorithm.clone(),
            });
        }

        parse_duration(&self.auth.access_token_ttl).map_err(|_| ConfigError::InvalidValue {
            key: "JWT_ACCESS_TTL".to_string(),
            value: self.auth.access_token_ttl.clone(),
        })?;
        parse_duration(&self.auth.refresh_token_ttl).map_err(|_| ConfigError::InvalidValue {
            key: "JWT_REFRESH_TTL".to_string(),
            value: self.auth.refresh_token_ttl.clone(),
        })?;

        Ok(self)
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Token signing and verification configuration
///
/// Algorithm, issuer, and audience are fixed process configuration, never
/// request-controlled, to rule out algorithm-confusion attacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for HMAC signing (at least 32 chars in production)
    pub secret: String,

    /// Signing algorithm (HS256, HS384, or HS512)
    pub algorithm: String,

    /// Token issuer identifier
    pub issuer: String,

    /// Token audience identifier
    pub audience: String,

    /// Access token lifetime as a duration string (e.g. "15m", "900s")
    pub access_token_ttl: String,

    /// Refresh token lifetime as a duration string (e.g. "7d")
    pub refresh_token_ttl: String,

    /// Upper bound on a revocation-store lookup before it is treated as
    /// unreachable, in milliseconds
    pub revocation_timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
            issuer: "rolodex-api".to_string(),
            audience: "rolodex-clients".to_string(),
            access_token_ttl: "15m".to_string(),
            refresh_token_ttl: "7d".to_string(),
            revocation_timeout_ms: 500,
        }
    }
}

impl AuthConfig {
    /// Access token lifetime (validated at startup)
    pub fn access_ttl(&self) -> Duration {
        parse_duration(&self.access_token_ttl).unwrap_or(Duration::from_secs(15 * 60))
    }

    /// Refresh token lifetime (validated at startup)
    pub fn refresh_ttl(&self) -> Duration {
        parse_duration(&self.refresh_token_ttl).unwrap_or(Duration::from_secs(7 * 24 * 3600))
    }

    /// Revocation-store lookup timeout
    pub fn revocation_timeout(&self) -> Duration {
        Duration::from_millis(self.revocation_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Parse a duration string such as "900s", "15m", "12h", or "7d".
///
/// A bare integer is taken as seconds. Zero durations are rejected; an
/// expiry window of zero would mean issuing tokens that are already dead.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidValue {
        key: "duration".to_string(),
        value: s.to_string(),
    };

    if s.is_empty() {
        return Err(invalid());
    }

    let (value, multiplier) = match s.chars().last() {
        Some('s') => (&s[..s.len() - 1], 1u64),
        Some('m') => (&s[..s.len() - 1], 60),
        Some('h') => (&s[..s.len() - 1], 3600),
        Some('d') => (&s[..s.len() - 1], 86_400),
        Some(c) if c.is_ascii_digit() => (s, 1),
        _ => return Err(invalid()),
    };

    let value: u64 = value.parse().map_err(|_| invalid())?;
    if value == 0 {
        return Err(invalid());
    }

    Ok(Duration::from_secs(value * multiplier))
}

/// Generate a random alphanumeric signing secret
fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
