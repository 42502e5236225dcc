use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::constants::{OAUTH_STATE_COOKIE, OAUTH_STATE_TTL_SECS};

/// Generate the `state` value that ties an OAuth callback to the browser
/// that started the login.
pub fn generate_oauth_state() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Cookie carrying the pending state and the instance being logged into.
///
/// Scoped to the callback path so it is only sent back once.
#[must_use]
pub fn oauth_state_cookie(state: &str, host: &str) -> String {
    format!(
        "{OAUTH_STATE_COOKIE}={state}:{}; Path=/authorize; Max-Age={OAUTH_STATE_TTL_SECS}; HttpOnly; SameSite=Lax",
        urlencoding::encode(host)
    )
}

#[must_use]
pub fn clear_oauth_state_cookie() -> String {
    format!("{OAUTH_STATE_COOKIE}=; Path=/authorize; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Split a state cookie value into `(state, host)`.
#[must_use]
pub fn parse_oauth_state(value: &str) -> Option<(String, String)> {
    let (state, host) = value.split_once(':')?;
    if state.is_empty() || host.is_empty() {
        return None;
    }
    let host = urlencoding::decode(host).ok()?.into_owned();
    Some((state.to_string(), host))
}
