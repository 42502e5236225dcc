//! SQLite-backed implementations of the engine's store traits.

use anyhow::Result;
use async_trait::async_trait;

use super::traits::{AccountLedger, PostStore};
use crate::db::{
    insert_account_if_absent, insert_statuses, is_account_fully_backfilled,
    mark_account_fully_backfilled, newest_status_id, oldest_status_id, Database, Status, StatusId,
};

#[async_trait]
impl PostStore for Database {
    async fn insert_batch(&self, statuses: &[Status], account_id: &str, host: &str) -> Result<u64> {
        insert_statuses(self.pool(), statuses, account_id, host).await
    }

    async fn newest_id(&self, account_id: &str, host: &str) -> Result<Option<StatusId>> {
        newest_status_id(self.pool(), account_id, host).await
    }

    async fn oldest_id(&self, account_id: &str, host: &str) -> Result<Option<StatusId>> {
        oldest_status_id(self.pool(), account_id, host).await
    }
}

#[async_trait]
impl AccountLedger for Database {
    async fn ensure_account(&self, id: &str, username: &str, host: &str) -> Result<bool> {
        insert_account_if_absent(self.pool(), id, username, host).await
    }

    async fn is_fully_backfilled(&self, id: &str, host: &str) -> Result<bool> {
        is_account_fully_backfilled(self.pool(), id, host).await
    }

    async fn mark_fully_backfilled(&self, id: &str, host: &str) -> Result<()> {
        mark_account_fully_backfilled(self.pool(), id, host).await
    }
}
