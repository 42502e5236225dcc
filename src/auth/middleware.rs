use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tracing::warn;

use crate::constants::SESSION_COOKIE;
use crate::db::{self as queries, format_timestamp, Session};

/// The signed-in session, if any.
/// Use this extractor when authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let Some(token) = cookie_value(&parts.headers, SESSION_COOKIE) else {
            return Ok(MaybeSession(None));
        };

        let session = match queries::get_session_by_token(&pool, token).await {
            Ok(Some(s)) => s,
            Ok(None) => return Ok(MaybeSession(None)),
            Err(e) => {
                warn!("Session lookup failed: {e:#}");
                return Ok(MaybeSession(None));
            }
        };

        // Timestamps share one fixed RFC3339 UTC format, so they compare as strings
        if session.expires_at < format_timestamp(chrono::Utc::now()) {
            let _ = queries::delete_session(&pool, token).await;
            return Ok(MaybeSession(None));
        }

        Ok(MaybeSession(Some(session)))
    }
}

/// The signed-in session (required).
/// Redirects to the login page if there is none.
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;

        match session {
            Some(s) => Ok(RequireSession(s)),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}

/// Read a cookie from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then_some(value)
        })
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let headers = headers_with_cookie("theme=dark; session=abc123; other=1");
        assert_eq!(cookie_value(&headers, "session"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
    }

    #[test]
    fn test_cookie_value_ignores_prefix_matches() {
        let headers = headers_with_cookie("old_session=zzz");
        assert_eq!(cookie_value(&headers, "session"), None);
    }

    #[test]
    fn test_cookie_value_empty_is_none() {
        let headers = headers_with_cookie("session=");
        assert_eq!(cookie_value(&headers, "session"), None);
    }
}
