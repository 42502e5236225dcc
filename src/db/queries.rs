use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{Account, App, NewSession, Session, Status, StatusId, StatusRow};

/// Format an instant the way every timestamp column stores it.
#[must_use]
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn into_statuses(rows: Vec<StatusRow>) -> Result<Vec<Status>> {
    rows.into_iter().map(Status::try_from).collect()
}

// ========== Apps ==========

/// Get the OAuth client registered with an instance.
pub async fn get_app_by_host(pool: &SqlitePool, host: &str) -> Result<Option<App>> {
    sqlx::query_as("SELECT host, client_id, client_secret FROM app WHERE host = ?")
        .bind(host)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch app by host")
}

/// Store an OAuth client registration. An existing registration for the host is kept.
pub async fn insert_app(pool: &SqlitePool, app: &App) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO app (host, client_id, client_secret)
        VALUES (?, ?, ?)
        ON CONFLICT(host) DO NOTHING
        ",
    )
    .bind(&app.host)
    .bind(&app.client_id)
    .bind(&app.client_secret)
    .execute(pool)
    .await
    .context("Failed to insert app")?;

    Ok(())
}

// ========== Accounts ==========

/// Insert an account unless `(id, host)` already exists.
///
/// Returns `true` when a row was created. An existing row is never touched.
pub async fn insert_account_if_absent(
    pool: &SqlitePool,
    id: &str,
    username: &str,
    host: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO account (id, host, username, all_fetched)
        VALUES (?, ?, ?, 0)
        ON CONFLICT(id, host) DO NOTHING
        ",
    )
    .bind(id)
    .bind(host)
    .bind(username)
    .execute(pool)
    .await
    .context("Failed to insert account")?;

    Ok(result.rows_affected() == 1)
}

/// Get an account by its composite key.
pub async fn get_account(pool: &SqlitePool, id: &str, host: &str) -> Result<Option<Account>> {
    sqlx::query_as("SELECT id, host, username, all_fetched FROM account WHERE id = ? AND host = ?")
        .bind(id)
        .bind(host)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch account")
}

/// Whether the backward sync already reached the account's first post.
///
/// An unknown account reports `false`.
pub async fn is_account_fully_backfilled(pool: &SqlitePool, id: &str, host: &str) -> Result<bool> {
    let row: Option<(bool,)> =
        sqlx::query_as("SELECT all_fetched FROM account WHERE id = ? AND host = ?")
            .bind(id)
            .bind(host)
            .fetch_optional(pool)
            .await
            .context("Failed to fetch account backfill flag")?;

    Ok(row.is_some_and(|(all_fetched,)| all_fetched))
}

/// Latch the backfill flag for an account.
pub async fn mark_account_fully_backfilled(pool: &SqlitePool, id: &str, host: &str) -> Result<()> {
    sqlx::query("UPDATE account SET all_fetched = 1 WHERE id = ? AND host = ?")
        .bind(id)
        .bind(host)
        .execute(pool)
        .await
        .context("Failed to mark account fully backfilled")?;

    Ok(())
}

// ========== Statuses ==========

/// Insert one page of statuses for an account in a single statement.
///
/// Rows whose `(id, host)` already exists are skipped; the rest persist.
/// Returns the number of rows actually inserted.
pub async fn insert_statuses(
    pool: &SqlitePool,
    statuses: &[Status],
    account_id: &str,
    host: &str,
) -> Result<u64> {
    if statuses.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "INSERT INTO status (id, host, account_id, text, url, created_at, visibility) ",
    );
    builder.push_values(statuses, |mut row, status| {
        row.push_bind(status.id.as_str())
            .push_bind(host)
            .push_bind(account_id)
            .push_bind(status.text.as_str())
            .push_bind(status.url.as_str())
            .push_bind(format_timestamp(status.created_at))
            .push_bind(status.visibility.as_deref());
    });
    builder.push(" ON CONFLICT(id, host) DO NOTHING");

    let result = builder
        .build()
        .execute(pool)
        .await
        .context("Failed to insert statuses")?;

    Ok(result.rows_affected())
}

/// Highest stored status id for an account, if any.
pub async fn newest_status_id(
    pool: &SqlitePool,
    account_id: &str,
    host: &str,
) -> Result<Option<StatusId>> {
    let row: Option<(String,)> = sqlx::query_as(
        r"
        SELECT id FROM status
        WHERE account_id = ? AND host = ?
        ORDER BY length(id) DESC, id DESC
        LIMIT 1
        ",
    )
    .bind(account_id)
    .bind(host)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch newest status id")?;

    Ok(row.map(|(id,)| StatusId::from(id)))
}

/// Lowest stored status id for an account, if any.
pub async fn oldest_status_id(
    pool: &SqlitePool,
    account_id: &str,
    host: &str,
) -> Result<Option<StatusId>> {
    let row: Option<(String,)> = sqlx::query_as(
        r"
        SELECT id FROM status
        WHERE account_id = ? AND host = ?
        ORDER BY length(id) ASC, id ASC
        LIMIT 1
        ",
    )
    .bind(account_id)
    .bind(host)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch oldest status id")?;

    Ok(row.map(|(id,)| StatusId::from(id)))
}

/// List an account's statuses newest-first, optionally filtered by a text substring.
pub async fn search_account_statuses(
    pool: &SqlitePool,
    account_id: &str,
    host: &str,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Status>> {
    let rows: Vec<StatusRow> = sqlx::query_as(
        r"
        SELECT id, host, account_id, text, url, created_at, visibility
        FROM status
        WHERE account_id = ? AND host = ?
          AND text LIKE '%' || ? || '%' ESCAPE '\'
        ORDER BY length(id) DESC, id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(account_id)
    .bind(host)
    .bind(escape_like(query))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to search account statuses")?;

    into_statuses(rows)
}

/// Count an account's statuses matching a text substring (empty matches all).
pub async fn count_account_statuses(
    pool: &SqlitePool,
    account_id: &str,
    host: &str,
    query: &str,
) -> Result<i64> {
    sqlx::query_scalar(
        r"
        SELECT COUNT(*) FROM status
        WHERE account_id = ? AND host = ?
          AND text LIKE '%' || ? || '%' ESCAPE '\'
        ",
    )
    .bind(account_id)
    .bind(host)
    .bind(escape_like(query))
    .fetch_one(pool)
    .await
    .context("Failed to count account statuses")
}

/// List statuses of the account known as `username` on `host`, newest-first.
pub async fn get_statuses_by_username(
    pool: &SqlitePool,
    username: &str,
    host: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Status>> {
    let rows: Vec<StatusRow> = sqlx::query_as(
        r"
        SELECT s.id, s.host, s.account_id, s.text, s.url, s.created_at, s.visibility
        FROM status s
        INNER JOIN account a ON s.account_id = a.id AND s.host = a.host
        WHERE a.username = ? AND a.host = ?
        ORDER BY length(s.id) DESC, s.id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(username)
    .bind(host)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .context("Failed to fetch statuses by username")?;

    into_statuses(rows)
}

// ========== Sessions ==========

/// Create a new session.
pub async fn create_session(pool: &SqlitePool, session: &NewSession) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO session (token, access_token, host, account_id, username, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&session.token)
    .bind(&session.access_token)
    .bind(&session.host)
    .bind(&session.account_id)
    .bind(&session.username)
    .bind(format_timestamp(Utc::now()))
    .bind(format_timestamp(session.expires_at))
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(())
}

/// Get a session by token.
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
    sqlx::query_as("SELECT * FROM session WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch session by token")
}

/// Delete a session.
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM session WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

/// Delete every session past its expiry. Returns how many were removed.
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM session WHERE expires_at < ?")
        .bind(format_timestamp(Utc::now()))
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected())
}
