use anyhow::Result;
use async_trait::async_trait;

use crate::db::{Status, StatusId};
use crate::mastodon::ApiError;

/// Position to request the next page from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// The newest page, with no bound. Used when nothing is stored yet.
    Latest,
    /// Statuses strictly newer than the id.
    After(StatusId),
    /// Statuses strictly older than the id.
    Before(StatusId),
}

/// Source of an account's statuses, one page at a time.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch one page, newest first. An empty page means there is nothing
    /// further in the cursor's direction.
    async fn fetch_page(
        &self,
        host: &str,
        credential: &str,
        account_id: &str,
        cursor: &PageCursor,
    ) -> Result<Vec<Status>, ApiError>;
}

/// Persisted statuses and the watermarks derived from them.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a page, skipping ids already stored. Returns the number inserted.
    async fn insert_batch(&self, statuses: &[Status], account_id: &str, host: &str) -> Result<u64>;

    /// Highest stored id, `None` when the account has no statuses.
    async fn newest_id(&self, account_id: &str, host: &str) -> Result<Option<StatusId>>;

    /// Lowest stored id, `None` when the account has no statuses.
    async fn oldest_id(&self, account_id: &str, host: &str) -> Result<Option<StatusId>>;
}

/// Per-account backfill completion state.
#[async_trait]
pub trait AccountLedger: Send + Sync {
    /// Insert the account if `(id, host)` is unknown. Returns whether a row was created.
    async fn ensure_account(&self, id: &str, username: &str, host: &str) -> Result<bool>;

    async fn is_fully_backfilled(&self, id: &str, host: &str) -> Result<bool>;

    async fn mark_fully_backfilled(&self, id: &str, host: &str) -> Result<()>;
}
