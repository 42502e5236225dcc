use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{error, warn};

use super::pages::{self, HomePageParams};
use super::AppState;
use crate::auth::{clear_session_cookie, MaybeSession, RequireSession};
use crate::components::Pagination;
use crate::db::{
    count_account_statuses, delete_session, get_account, get_statuses_by_username,
    search_account_statuses, Session,
};
use crate::sync::{SyncError, SyncOutcome, SyncTarget};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/statuses/sync/newer", post(sync_newer))
        .route("/statuses/sync/older", post(sync_older))
        .route("/users/:host/:username", get(user_statuses))
        .route("/healthz", get(health))
}

fn handle(session: &Session) -> String {
    format!("{}@{}", session.username, session.host)
}

// ========== Home ==========

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    q: Option<String>,
    page: Option<usize>,
    #[serde(default)]
    all_fetched: bool,
}

async fn home(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Query(params): Query<HomeParams>,
) -> Response {
    let pool = state.db.pool();
    let query = params.q.unwrap_or_default();
    let query = query.trim();
    let page = params.page.unwrap_or(0);
    let per_page = state.config.page_size;
    let offset = i64::try_from(page).unwrap_or(i64::MAX).saturating_mul(per_page);

    let account = match get_account(pool, &session.account_id, &session.host).await {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to fetch account: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let total = match count_account_statuses(pool, &session.account_id, &session.host, query).await
    {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to count statuses: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let statuses = match search_account_statuses(
        pool,
        &session.account_id,
        &session.host,
        query,
        per_page,
        offset,
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to fetch statuses: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
        }
    };

    let handle = handle(&session);
    let html = pages::render_home_page(&HomePageParams {
        handle: &handle,
        statuses: &statuses,
        query,
        page,
        total_pages: Pagination::pages_for(total, per_page),
        total_statuses: total,
        fully_backfilled: account.is_some_and(|a| a.fully_backfilled),
        show_all_fetched_notice: params.all_fetched,
        offset: state.config.display_offset,
    });
    Html(html.into_string()).into_response()
}

// ========== Sync ==========

async fn sync_newer(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Response {
    match state.sync.sync_newer(target(&session)).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => sync_error_response(&state, &session, &e).await,
    }
}

async fn sync_older(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Response {
    match state.sync.sync_older(target(&session)).await {
        Ok(report) if report.outcome == SyncOutcome::AlreadyBackfilled => {
            Redirect::to("/?all_fetched=true").into_response()
        }
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => sync_error_response(&state, &session, &e).await,
    }
}

fn target(session: &Session) -> SyncTarget<'_> {
    SyncTarget {
        host: &session.host,
        account_id: &session.account_id,
        credential: &session.access_token,
    }
}

/// HTTP status reported for a failed sync.
#[must_use]
pub fn sync_error_status(err: &SyncError) -> StatusCode {
    match err {
        SyncError::Auth(_) => StatusCode::UNAUTHORIZED,
        SyncError::Transient(_) | SyncError::Parse(_) | SyncError::CursorStalled { .. } => {
            StatusCode::BAD_GATEWAY
        }
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::InProgress | SyncError::NoLocalHistory => StatusCode::CONFLICT,
    }
}

async fn sync_error_response(state: &AppState, session: &Session, err: &SyncError) -> Response {
    let status = sync_error_status(err);
    if status.is_server_error() {
        error!(account_id = %session.account_id, host = %session.host, "Sync failed: {err}");
    } else {
        warn!(account_id = %session.account_id, host = %session.host, "Sync rejected: {err}");
    }

    if let SyncError::Auth(_) = err {
        // The stored token is no longer accepted; force a fresh login
        if let Err(e) = delete_session(state.db.pool(), &session.token).await {
            error!("Failed to delete session: {e:#}");
        }
        return (
            status,
            AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
            "Your instance rejected the stored credential. Please log in again.",
        )
            .into_response();
    }

    (status, err.to_string()).into_response()
}

// ========== Public pages ==========

#[derive(Debug, Deserialize)]
pub struct PageParams {
    page: Option<usize>,
}

async fn user_statuses(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path((host, username)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> Response {
    let page = params.page.unwrap_or(0);
    let per_page = state.config.page_size;
    let offset = i64::try_from(page).unwrap_or(i64::MAX).saturating_mul(per_page);

    // One extra row tells whether another page exists
    let mut statuses =
        match get_statuses_by_username(state.db.pool(), &username, &host, per_page + 1, offset)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to fetch statuses for {username}@{host}: {e:#}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response();
            }
        };
    let has_next = statuses.len() > usize::try_from(per_page).unwrap_or(usize::MAX);
    statuses.truncate(usize::try_from(per_page).unwrap_or(usize::MAX));

    let signed_in_as = session.as_ref().map(handle);
    let html = pages::render_user_page(
        &username,
        &host,
        &statuses,
        page,
        has_next,
        state.config.display_offset,
        signed_in_as.as_deref(),
    );
    Html(html.into_string()).into_response()
}

async fn health() -> &'static str {
    "ok"
}
