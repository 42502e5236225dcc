use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Generate a random session token for the browser cookie.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// When a session created now with the given lifetime expires.
///
/// `None` if the lifetime runs past the representable date range.
#[must_use]
pub fn session_expiry(ttl: chrono::Duration) -> Option<DateTime<Utc>> {
    Utc::now().checked_add_signed(ttl)
}

/// Build the `Set-Cookie` value for a session token.
#[must_use]
pub fn session_cookie(token: &str, ttl: chrono::Duration) -> String {
    format!(
        "{}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        crate::constants::SESSION_COOKIE,
        ttl.num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        crate::constants::SESSION_COOKIE
    )
}
