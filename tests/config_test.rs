//! Environment-driven configuration tests.
//!
//! These mutate process environment, so they run serially.

use std::time::Duration;

use chrono::FixedOffset;
use fedi_timeline_mirror::config::{Config, ConfigError, InstanceScheme};
use serial_test::serial;

const VARS: &[&str] = &[
    "BASE_URL",
    "DATABASE_PATH",
    "WEB_HOST",
    "WEB_PORT",
    "CLIENT_NAME",
    "INSTANCE_SCHEME",
    "SYNC_PAGE_DELAY_MS",
    "HTTP_TIMEOUT_SECS",
    "SESSION_TTL_DAYS",
    "DISPLAY_UTC_OFFSET",
    "PAGE_SIZE",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_with_only_base_url() {
    clear_env();
    std::env::set_var("BASE_URL", "https://mirror.example/");

    let config = Config::from_env().unwrap();

    assert_eq!(config.base_url, "https://mirror.example");
    assert_eq!(config.redirect_uri(), "https://mirror.example/authorize");
    assert_eq!(config.database_path.to_str(), Some("./data/mirror.sqlite"));
    assert_eq!(config.web_port, 1323);
    assert_eq!(config.instance_scheme, InstanceScheme::Https);
    assert_eq!(config.sync_page_delay, Duration::from_millis(2000));
    assert_eq!(config.session_ttl, chrono::Duration::days(7));
    assert_eq!(config.display_offset, FixedOffset::east_opt(9 * 3600).unwrap());
    assert_eq!(config.page_size, 50);
    assert!(config.validate().is_ok());

    clear_env();
}

#[test]
#[serial]
fn test_missing_base_url() {
    clear_env();

    let err = Config::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "BASE_URL"));
}

#[test]
#[serial]
fn test_overrides_and_parse_errors() {
    clear_env();
    std::env::set_var("BASE_URL", "http://localhost:8080");
    std::env::set_var("INSTANCE_SCHEME", "http");
    std::env::set_var("SYNC_PAGE_DELAY_MS", "0");
    std::env::set_var("DISPLAY_UTC_OFFSET", "-05:00");

    let config = Config::from_env().unwrap();
    assert_eq!(config.instance_scheme, InstanceScheme::Http);
    assert!(config.sync_page_delay.is_zero());
    assert_eq!(config.display_offset, FixedOffset::west_opt(5 * 3600).unwrap());

    std::env::set_var("WEB_PORT", "not-a-port");
    assert!(matches!(
        Config::from_env().unwrap_err(),
        ConfigError::ParseInt { .. }
    ));

    clear_env();
}

#[test]
#[serial]
fn test_validate_rejects_bad_values() {
    clear_env();
    std::env::set_var("BASE_URL", "not a url");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    std::env::set_var("BASE_URL", "https://mirror.example");
    std::env::set_var("PAGE_SIZE", "0");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_out_of_range_session_ttl_is_an_error() {
    clear_env();
    std::env::set_var("BASE_URL", "https://mirror.example");

    for days in ["0", "999999999999999", "9223372036854775807"] {
        std::env::set_var("SESSION_TTL_DAYS", days);
        assert!(matches!(
            Config::from_env().unwrap_err(),
            ConfigError::InvalidValue { name, .. } if name == "SESSION_TTL_DAYS"
        ));
    }

    std::env::set_var("SESSION_TTL_DAYS", "30");
    assert_eq!(Config::from_env().unwrap().session_ttl, chrono::Duration::days(30));

    clear_env();
}
