use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Offset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Public URL of this service, used for the OAuth redirect URI
    pub base_url: String,

    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Remote instances
    pub client_name: String,
    pub instance_scheme: InstanceScheme,
    pub http_timeout: Duration,

    // Sync
    pub sync_page_delay: Duration,

    // Sessions
    pub session_ttl: chrono::Duration,

    // Rendering
    pub display_offset: FixedOffset,
    pub page_size: i64,
}

/// Scheme used to reach remote instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceScheme {
    Https,
    /// Plain HTTP, only useful against local test servers.
    Http,
}

impl InstanceScheme {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: required_env("BASE_URL")?
                .trim_end_matches('/')
                .to_string(),

            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/mirror.sqlite")),

            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 1323)?,

            client_name: env_or_default("CLIENT_NAME", crate::constants::DEFAULT_CLIENT_NAME),
            instance_scheme: parse_instance_scheme(&env_or_default("INSTANCE_SCHEME", "https"))?,
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            sync_page_delay: Duration::from_millis(parse_env_u64("SYNC_PAGE_DELAY_MS", 2000)?),

            session_ttl: parse_session_ttl(parse_env_i64("SESSION_TTL_DAYS", 7)?)?,

            display_offset: parse_utc_offset(&env_or_default("DISPLAY_UTC_OFFSET", "+09:00"))?,
            page_size: parse_env_i64("PAGE_SIZE", 50)?,
        })
    }

    /// Configuration suitable for tests: plain HTTP instances, no pacing delay.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://localhost:1323".to_string(),
            database_path: PathBuf::from(":memory:"),
            web_host: "127.0.0.1".to_string(),
            web_port: 1323,
            client_name: crate::constants::DEFAULT_CLIENT_NAME.to_string(),
            instance_scheme: InstanceScheme::Http,
            http_timeout: Duration::from_secs(10),
            sync_page_delay: Duration::ZERO,
            session_ttl: chrono::Duration::days(7),
            display_offset: utc_offset(),
            page_size: 50,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "BASE_URL".to_string(),
                message: format!("'{}' is not an absolute URL", self.base_url),
            });
        }
        if self.page_size < 1 {
            return Err(ConfigError::InvalidValue {
                name: "PAGE_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.session_ttl <= chrono::Duration::zero() {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_TTL_DAYS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// OAuth redirect URI registered with every instance.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/authorize", self.base_url)
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

/// Longest session lifetime accepted, in days.
const MAX_SESSION_TTL_DAYS: i64 = 3650;

fn parse_session_ttl(days: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_SESSION_TTL_DAYS).contains(&days) {
        return Err(ConfigError::InvalidValue {
            name: "SESSION_TTL_DAYS".to_string(),
            message: format!("must be between 1 and {MAX_SESSION_TTL_DAYS}, got {days}"),
        });
    }
    chrono::Duration::try_days(days).ok_or_else(|| ConfigError::InvalidValue {
        name: "SESSION_TTL_DAYS".to_string(),
        message: format!("{days} days is out of range"),
    })
}

fn parse_instance_scheme(value: &str) -> Result<InstanceScheme, ConfigError> {
    match value.to_lowercase().as_str() {
        "https" => Ok(InstanceScheme::Https),
        "http" => Ok(InstanceScheme::Http),
        _ => Err(ConfigError::InvalidValue {
            name: "INSTANCE_SCHEME".to_string(),
            message: format!("must be 'https' or 'http', got '{value}'"),
        }),
    }
}

/// Parse an offset like `+09:00`, `-05:30` or `Z`.
fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        name: "DISPLAY_UTC_OFFSET".to_string(),
        message: format!("expected an offset like +09:00, got '{value}'"),
    };

    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Ok(utc_offset());
    }

    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn utc_offset() -> FixedOffset {
    chrono::Utc.fix()
}
