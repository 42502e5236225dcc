//! Instance sign-in over OAuth, and logout.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::pages;
use super::AppState;
use crate::auth::{
    clear_oauth_state_cookie, clear_session_cookie, cookie_value, generate_oauth_state,
    generate_session_token, oauth_state_cookie, parse_oauth_state, session_cookie, session_expiry,
    MaybeSession,
};
use crate::constants::OAUTH_STATE_COOKIE;
use crate::db::{
    create_session, delete_session, get_app_by_host, insert_account_if_absent, insert_app, App,
    NewSession,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/sign_in", post(sign_in))
        .route("/authorize", get(authorize))
        .route("/logout", get(logout))
}

/// GET /login - Show the instance sign-in form.
async fn login_page(MaybeSession(session): MaybeSession) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(pages::render_login_page(None).into_string()).into_response()
}

fn login_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Html(pages::render_login_page(Some(message)).into_string()),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    host: String,
}

/// Reduce user input like `https://Mastodon.Social/` to a bare host.
///
/// Returns `None` for input that cannot be a host (empty, paths, spaces, userinfo).
#[must_use]
pub fn normalize_host(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let host = without_scheme.trim_end_matches('/').to_ascii_lowercase();

    let valid = !host.is_empty()
        && !host.starts_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    valid.then_some(host)
}

/// POST /sign_in - Register with the instance if needed and start authorization.
async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let Some(host) = normalize_host(&form.host) else {
        return login_error(StatusCode::BAD_REQUEST, "Enter an instance host such as mastodon.social.");
    };
    let redirect_uri = state.config.redirect_uri();

    let app = match get_app_by_host(state.db.pool(), &host).await {
        Ok(Some(app)) => app,
        Ok(None) => match register_app(&state, &host, &redirect_uri).await {
            Ok(app) => app,
            Err(response) => return response,
        },
        Err(e) => {
            error!("Failed to look up app for {host}: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let oauth_state = generate_oauth_state();
    let authorize_url = match state
        .mastodon
        .authorize_url(&app, &redirect_uri, &oauth_state)
    {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot build authorize URL for {host}: {e}");
            return login_error(StatusCode::BAD_REQUEST, "That instance host is not valid.");
        }
    };

    (
        AppendHeaders([(header::SET_COOKIE, oauth_state_cookie(&oauth_state, &host))]),
        Redirect::to(authorize_url.as_str()),
    )
        .into_response()
}

async fn register_app(state: &AppState, host: &str, redirect_uri: &str) -> Result<App, Response> {
    let app = state
        .mastodon
        .register_app(host, &state.config.client_name, redirect_uri)
        .await
        .map_err(|e| {
            warn!("App registration with {host} failed: {e}");
            login_error(
                StatusCode::BAD_GATEWAY,
                &format!("Could not register with {host}. Check the host and try again."),
            )
        })?;

    if let Err(e) = insert_app(state.db.pool(), &app).await {
        error!("Failed to store app for {host}: {e:#}");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response());
    }
    // Re-read so a registration that raced with ours wins consistently
    match get_app_by_host(state.db.pool(), host).await {
        Ok(Some(stored)) => {
            info!(host = %host, "Registered OAuth application");
            Ok(stored)
        }
        Ok(None) => Ok(app),
        Err(e) => {
            error!("Failed to reload app for {host}: {e:#}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /authorize - OAuth callback from the instance.
async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    if let Some(error) = params.error {
        warn!("Instance denied authorization: {error}");
        return login_error(StatusCode::UNAUTHORIZED, "Authorization was denied.");
    }

    let pending = cookie_value(&headers, OAUTH_STATE_COOKIE).and_then(parse_oauth_state);
    let (Some((expected_state, host)), Some(returned_state), Some(code)) =
        (pending, params.state, params.code)
    else {
        return login_error(StatusCode::BAD_REQUEST, "Sign-in expired. Please try again.");
    };
    if expected_state != returned_state {
        warn!(host = %host, "OAuth state mismatch");
        return login_error(StatusCode::BAD_REQUEST, "Sign-in expired. Please try again.");
    }

    let app = match get_app_by_host(state.db.pool(), &host).await {
        Ok(Some(app)) => app,
        Ok(None) => {
            return login_error(StatusCode::BAD_REQUEST, "Sign-in expired. Please try again.");
        }
        Err(e) => {
            error!("Failed to look up app for {host}: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let redirect_uri = state.config.redirect_uri();
    let token = match state.mastodon.exchange_code(&app, &code, &redirect_uri).await {
        Ok(t) => t,
        Err(e) => {
            warn!("Code exchange with {host} failed: {e}");
            return login_error(StatusCode::BAD_GATEWAY, "Could not complete sign-in.");
        }
    };

    let account = match state
        .mastodon
        .verify_credentials(&host, &token.access_token)
        .await
    {
        Ok(a) => a,
        Err(e) => {
            warn!("Credential check with {host} failed: {e}");
            return login_error(StatusCode::BAD_GATEWAY, "Could not complete sign-in.");
        }
    };

    let pool = state.db.pool();
    match insert_account_if_absent(pool, &account.id, &account.username, &host).await {
        Ok(true) => info!(account_id = %account.id, host = %host, "New account registered"),
        Ok(false) => {}
        Err(e) => {
            error!("Failed to store account: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    }

    let session_token = generate_session_token();
    let ttl = state.config.session_ttl;
    let Some(expires_at) = session_expiry(ttl) else {
        error!(ttl_seconds = ttl.num_seconds(), "Session lifetime overflows the clock");
        return login_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not start a session.");
    };
    let new_session = NewSession {
        token: session_token.clone(),
        access_token: token.access_token,
        host: host.clone(),
        account_id: account.id.clone(),
        username: account.username.clone(),
        expires_at,
    };
    if let Err(e) = create_session(pool, &new_session).await {
        error!("Failed to create session: {e:#}");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
    }

    info!(username = %account.username, host = %host, "Signed in");
    (
        AppendHeaders([
            (header::SET_COOKIE, session_cookie(&session_token, ttl)),
            (header::SET_COOKIE, clear_oauth_state_cookie()),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /logout - End the session.
async fn logout(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    if let Some(session) = session {
        if let Err(e) = delete_session(state.db.pool(), &session.token).await {
            error!("Failed to delete session: {e:#}");
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/login"),
    )
        .into_response()
}
