pub mod cleanup;
pub mod csrf;
pub mod middleware;
pub mod session;

pub use cleanup::{run_cleanup_worker, CLEANUP_INTERVAL};
pub use csrf::{clear_oauth_state_cookie, generate_oauth_state, oauth_state_cookie, parse_oauth_state};
pub use middleware::{cookie_value, MaybeSession, RequireSession};
pub use session::{clear_session_cookie, generate_session_token, session_cookie, session_expiry};
