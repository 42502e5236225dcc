use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::error::SyncError;
use super::guard::AccountLocks;
use super::traits::{AccountLedger, FeedClient, PageCursor, PostStore};
use crate::db::{Database, StatusId};

/// The account a sync runs for, and the credential to fetch with.
#[derive(Debug, Clone, Copy)]
pub struct SyncTarget<'a> {
    pub host: &'a str,
    pub account_id: &'a str,
    pub credential: &'a str,
}

/// Direction a sync walks the remote timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Catch up towards the newest status.
    Newer,
    /// Backfill towards the account's first status.
    Older,
}

/// How a sync that did not fail ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote had nothing newer than the stored watermark.
    CaughtUp,
    /// The remote had nothing older; the account is now marked fully backfilled.
    FullyBackfilled,
    /// The account was already fully backfilled; nothing was requested.
    AlreadyBackfilled,
}

/// Summary of one sync invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub direction: SyncDirection,
    /// Non-empty pages fetched and stored.
    pub pages: u32,
    /// Rows actually inserted (duplicates excluded).
    pub inserted: u64,
    pub outcome: SyncOutcome,
}

/// Reconciles a remote paginated timeline with the local store.
///
/// Every cursor is re-read from the store after each page, so the engine
/// holds no state between calls and an interrupted sync resumes by simply
/// running it again.
pub struct SyncEngine {
    feed: Arc<dyn FeedClient>,
    posts: Arc<dyn PostStore>,
    ledger: Arc<dyn AccountLedger>,
    locks: AccountLocks,
    page_delay: Duration,
}

impl SyncEngine {
    /// Create an engine over explicit collaborators.
    ///
    /// `page_delay` is slept between consecutive remote requests of one sync.
    #[must_use]
    pub fn new(
        feed: Arc<dyn FeedClient>,
        posts: Arc<dyn PostStore>,
        ledger: Arc<dyn AccountLedger>,
        page_delay: Duration,
    ) -> Self {
        Self {
            feed,
            posts,
            ledger,
            locks: AccountLocks::new(),
            page_delay,
        }
    }

    /// Create an engine that stores statuses and backfill state in `db`.
    #[must_use]
    pub fn with_database(feed: Arc<dyn FeedClient>, db: Database, page_delay: Duration) -> Self {
        let db = Arc::new(db);
        Self::new(feed, db.clone(), db, page_delay)
    }

    /// Fetch pages newer than the newest stored status until the remote
    /// returns an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InProgress`] if the account is already syncing,
    /// otherwise propagates the first remote or store failure. Pages stored
    /// before the failure stay stored.
    pub async fn sync_newer(&self, target: SyncTarget<'_>) -> Result<SyncReport, SyncError> {
        let _permit = self
            .locks
            .try_acquire(target.account_id, target.host)
            .await
            .ok_or(SyncError::InProgress)?;

        let mut report = SyncReport {
            direction: SyncDirection::Newer,
            pages: 0,
            inserted: 0,
            outcome: SyncOutcome::CaughtUp,
        };
        let mut newest = self.posts.newest_id(target.account_id, target.host).await?;

        loop {
            let cursor = newest.clone().map_or(PageCursor::Latest, PageCursor::After);
            if report.pages > 0 {
                self.pace().await;
            }

            let page = self
                .feed
                .fetch_page(target.host, target.credential, target.account_id, &cursor)
                .await?;
            if page.is_empty() {
                debug!(account_id = target.account_id, host = target.host, cursor = ?cursor, "No newer statuses");
                break;
            }

            let inserted = self
                .posts
                .insert_batch(&page, target.account_id, target.host)
                .await?;
            report.pages += 1;
            report.inserted += inserted;
            debug!(
                account_id = target.account_id,
                host = target.host,
                fetched = page.len(),
                inserted,
                "Stored page of newer statuses"
            );

            let next = self.posts.newest_id(target.account_id, target.host).await?;
            let advanced = match (&newest, &next) {
                (_, None) => false,
                (None, Some(_)) => true,
                (Some(prev), Some(next)) => next > prev,
            };
            if !advanced {
                return Err(SyncError::CursorStalled {
                    cursor: describe(newest.as_ref()),
                });
            }
            newest = next;
        }

        info!(
            account_id = target.account_id,
            host = target.host,
            pages = report.pages,
            inserted = report.inserted,
            "Caught up with newer statuses"
        );
        Ok(report)
    }

    /// Fetch pages older than the oldest stored status until the remote
    /// returns an empty page, then mark the account fully backfilled.
    ///
    /// Returns immediately with [`SyncOutcome::AlreadyBackfilled`] once the
    /// flag is set; the remote is not asked again.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoLocalHistory`] when nothing is stored yet,
    /// [`SyncError::InProgress`] if the account is already syncing, and
    /// otherwise the first remote or store failure. The flag is only set on
    /// success.
    pub async fn sync_older(&self, target: SyncTarget<'_>) -> Result<SyncReport, SyncError> {
        let _permit = self
            .locks
            .try_acquire(target.account_id, target.host)
            .await
            .ok_or(SyncError::InProgress)?;

        let mut report = SyncReport {
            direction: SyncDirection::Older,
            pages: 0,
            inserted: 0,
            outcome: SyncOutcome::FullyBackfilled,
        };

        if self
            .ledger
            .is_fully_backfilled(target.account_id, target.host)
            .await?
        {
            debug!(account_id = target.account_id, host = target.host, "Account already fully backfilled");
            report.outcome = SyncOutcome::AlreadyBackfilled;
            return Ok(report);
        }

        let mut oldest = self
            .posts
            .oldest_id(target.account_id, target.host)
            .await?
            .ok_or(SyncError::NoLocalHistory)?;

        loop {
            let cursor = PageCursor::Before(oldest.clone());
            if report.pages > 0 {
                self.pace().await;
            }

            let page = self
                .feed
                .fetch_page(target.host, target.credential, target.account_id, &cursor)
                .await?;
            if page.is_empty() {
                self.ledger
                    .mark_fully_backfilled(target.account_id, target.host)
                    .await?;
                break;
            }

            let inserted = self
                .posts
                .insert_batch(&page, target.account_id, target.host)
                .await?;
            report.pages += 1;
            report.inserted += inserted;
            debug!(
                account_id = target.account_id,
                host = target.host,
                fetched = page.len(),
                inserted,
                "Stored page of older statuses"
            );

            let next = self
                .posts
                .oldest_id(target.account_id, target.host)
                .await?
                .ok_or(SyncError::NoLocalHistory)?;
            if next >= oldest {
                return Err(SyncError::CursorStalled {
                    cursor: oldest.to_string(),
                });
            }
            oldest = next;
        }

        info!(
            account_id = target.account_id,
            host = target.host,
            pages = report.pages,
            inserted = report.inserted,
            "Account fully backfilled"
        );
        Ok(report)
    }

    async fn pace(&self) {
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
    }
}

fn describe(id: Option<&StatusId>) -> String {
    id.map_or_else(|| "<latest>".to_string(), ToString::to_string)
}
