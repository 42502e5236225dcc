use thiserror::Error;

use crate::mastodon::ApiError;

/// Why a sync stopped before reaching its terminal state.
///
/// None of these mark the account as backfilled, and every cursor is derived
/// from the store, so calling the same sync again resumes where this one stopped.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("instance rejected the credential: {0}")]
    Auth(String),
    #[error("transient instance failure: {0}")]
    Transient(String),
    #[error("malformed instance response: {0}")]
    Parse(String),
    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
    #[error("a sync for this account is already running")]
    InProgress,
    #[error("no stored statuses to backfill from; sync newer statuses first")]
    NoLocalHistory,
    #[error("cursor did not advance past {cursor} after inserting a page")]
    CursorStalled { cursor: String },
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(msg) => Self::Auth(msg),
            ApiError::Transient(msg) => Self::Transient(msg),
            ApiError::Parse(msg) => Self::Parse(msg),
        }
    }
}
