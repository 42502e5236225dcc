mod migrations;
mod models;
mod queries;

pub use migrations::LATEST_SCHEMA_VERSION;
pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

/// File name used by [`Database::open_in`].
pub const DATABASE_FILE_NAME: &str = "mirror.sqlite";

/// Handle to the mirror's SQLite file: statuses, accounts, apps and sessions.
///
/// Cheap to clone; every clone shares one connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the mirror database at `path`, creating the file and its parent
    /// directory if needed, and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the file cannot be
    /// opened for writing, or a migration fails.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options(path))
            .await
            .with_context(|| format!("Failed to open mirror database at {}", path.display()))?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        db.verify_writable(path).await?;

        info!(
            path = %path.display(),
            schema_version = db.schema_version().await?,
            "Mirror database ready"
        );
        Ok(db)
    }

    /// Open [`DATABASE_FILE_NAME`] inside `dir`.
    ///
    /// # Errors
    ///
    /// Same as [`Database::open`].
    pub async fn open_in(dir: &Path) -> Result<Self> {
        Self::open(&dir.join(DATABASE_FILE_NAME)).await
    }

    /// Schema version recorded by the last migration.
    ///
    /// # Errors
    ///
    /// Returns an error if the version table cannot be read.
    pub async fn schema_version(&self) -> Result<i32> {
        migrations::current_version(&self.pool).await
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Mirror database closed");
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn verify_writable(&self, path: &Path) -> Result<()> {
        // Opening a transaction needs write access, so a read-only mount fails
        // here instead of on the first stored page.
        let tx = self.pool.begin().await.with_context(|| {
            format!(
                "Mirror database is not writable (path: {}). Check volume permissions",
                path.display()
            )
        })?;
        tx.commit()
            .await
            .context("Failed to commit database writability check")?;
        Ok(())
    }
}

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        // Syncs for different accounts write at the same time as session
        // lookups; wait on SQLITE_BUSY instead of failing the page.
        .busy_timeout(Duration::from_secs(10))
}
