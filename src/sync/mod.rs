//! Bidirectional timeline sync.
//!
//! [`SyncEngine`] walks a remote account timeline page by page, forward from
//! the newest stored status or backward from the oldest, writing each page to
//! a [`PostStore`] as it goes.

mod engine;
mod error;
mod guard;
mod store;
mod traits;

pub use engine::{SyncDirection, SyncEngine, SyncOutcome, SyncReport, SyncTarget};
pub use error::SyncError;
pub use guard::{AccountLocks, AccountPermit};
pub use traits::{AccountLedger, FeedClient, PageCursor, PostStore};
