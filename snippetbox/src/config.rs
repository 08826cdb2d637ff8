//! Application configuration read from the environment

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:4000";
const DEFAULT_DATABASE_URL: &str = "sqlite:snippetbox.db";
const DEFAULT_SESSION_COOKIE_NAME: &str = "session";
const DEFAULT_SESSION_LIFETIME_SECS: i64 = 12 * 60 * 60;
const DEFAULT_LOGIN_PATH: &str = "/user/login";
const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 600_000;
const DEFAULT_SESSION_CLEANUP_INTERVAL_SECS: u64 = 300;

/// Session cookie and lifetime settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Time to live of a session, counted from its last write
    pub lifetime: Duration,
    /// Whether the cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            lifetime: Duration::seconds(DEFAULT_SESSION_LIFETIME_SECS),
            cookie_secure: true,
        }
    }
}

/// Process-wide settings, read once at startup and passed to whoever needs them
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: String,
    pub database_url: String,
    pub session: SessionConfig,
    /// Where unauthenticated requests to guarded routes are sent
    pub login_path: String,
    pub password_hash_iterations: u32,
    pub session_cleanup_interval_secs: u64,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            session: SessionConfig::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            password_hash_iterations: DEFAULT_PASSWORD_HASH_ITERATIONS,
            session_cleanup_interval_secs: DEFAULT_SESSION_CLEANUP_INTERVAL_SECS,
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let lifetime_secs = parse_or(
            &lookup,
            "SESSION_LIFETIME_SECS",
            DEFAULT_SESSION_LIFETIME_SECS,
        );

        Self {
            addr: lookup("SNIPPETBOX_ADDR").unwrap_or(defaults.addr),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            session: SessionConfig {
                cookie_name: lookup("SESSION_COOKIE_NAME")
                    .unwrap_or(defaults.session.cookie_name),
                lifetime: Duration::seconds(lifetime_secs),
                cookie_secure: lookup("SESSION_COOKIE_SECURE")
                    .map(|val| val.to_lowercase() != "false")
                    .unwrap_or(true),
            },
            login_path: lookup("LOGIN_PATH").unwrap_or(defaults.login_path),
            password_hash_iterations: parse_or(
                &lookup,
                "PASSWORD_HASH_ITERATIONS",
                DEFAULT_PASSWORD_HASH_ITERATIONS,
            ),
            session_cleanup_interval_secs: parse_or(
                &lookup,
                "SESSION_CLEANUP_INTERVAL_SECS",
                DEFAULT_SESSION_CLEANUP_INTERVAL_SECS,
            ),
            tls_cert_path: lookup("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: lookup("TLS_KEY_PATH").map(PathBuf::from),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl AppConfig {
    /// Rejects combinations that would only fail later, at serve time
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Invalid {
                key: "SESSION_COOKIE_NAME",
                reason: format!("{:?} is not a valid cookie name", self.session.cookie_name),
            });
        }
        if self.session.lifetime <= Duration::zero() {
            return Err(ConfigError::Invalid {
                key: "SESSION_LIFETIME_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if !self.login_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                key: "LOGIN_PATH",
                reason: "must be an absolute path".to_string(),
            });
        }
        if self.password_hash_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "PASSWORD_HASH_ITERATIONS",
                reason: "must be positive".to_string(),
            });
        }
        if self.session_cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_CLEANUP_INTERVAL_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            return Err(ConfigError::Invalid {
                key: "TLS_CERT_PATH",
                reason: "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {raw:?} for {key}, using default {default}");
            default
        }),
    }
}
