//! Shared constants used across the application.

/// User agent string sent with every request to a remote instance.
pub const USER_AGENT: &str = concat!("fedi-timeline-mirror/", env!("CARGO_PKG_VERSION"));

/// Application name registered with instances unless `CLIENT_NAME` overrides it.
pub const DEFAULT_CLIENT_NAME: &str = "fedi-timeline-mirror";

/// OAuth scope requested at authorization time.
pub const OAUTH_SCOPE: &str = "read";

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "session";

/// Cookie holding `state:host` while an OAuth authorization is in flight.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// How long an in-flight OAuth authorization stays valid, in seconds.
pub const OAUTH_STATE_TTL_SECS: i64 = 300;
