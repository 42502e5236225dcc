use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Schema version after every migration below has run.
pub const LATEST_SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let version = current_version(pool).await?;

    if version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

/// Version recorded in `_schema_version`, or 0 on a fresh file.
pub async fn current_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating initial schema");

    // OAuth client registrations, one per instance
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS app (
            host TEXT PRIMARY KEY NOT NULL,
            client_id TEXT NOT NULL,
            client_secret TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create app table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS account (
            id TEXT NOT NULL,
            host TEXT NOT NULL,
            username TEXT NOT NULL,
            all_fetched INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (id, host)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create account table")?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS status (
            id TEXT NOT NULL,
            host TEXT NOT NULL,
            account_id TEXT NOT NULL,
            text TEXT NOT NULL,
            url TEXT NOT NULL,
            created_at TEXT NOT NULL,
            visibility TEXT,
            PRIMARY KEY (id, host),
            FOREIGN KEY (account_id, host) REFERENCES account (id, host)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create status table")?;

    // Watermark lookups order by (length(id), id) within an account
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_status_account ON status(account_id, host, length(id), id)",
    )
    .execute(pool)
    .await
    .context("Failed to create status account index")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_account_username ON account(username, host)")
        .execute(pool)
        .await
        .context("Failed to create account username index")?;

    Ok(())
}

async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: sessions");

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS session (
            token TEXT PRIMARY KEY NOT NULL,
            access_token TEXT NOT NULL,
            host TEXT NOT NULL,
            account_id TEXT NOT NULL,
            username TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY (account_id, host) REFERENCES account (id, host)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create session table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_session_expires_at ON session(expires_at)")
        .execute(pool)
        .await
        .context("Failed to create session expiry index")?;

    Ok(())
}
