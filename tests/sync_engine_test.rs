//! Integration tests for the sync engine against a real SQLite store.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fedi_timeline_mirror::db::{
    count_account_statuses, is_account_fully_backfilled, newest_status_id, oldest_status_id,
    search_account_statuses, Database, Status, StatusId,
};
use fedi_timeline_mirror::mastodon::ApiError;
use fedi_timeline_mirror::sync::{
    AccountLedger, FeedClient, PageCursor, SyncEngine, SyncError, SyncOutcome, SyncTarget,
};
use tempfile::TempDir;
use tokio::sync::Notify;

const HOST: &str = "example.social";
const ACCOUNT: &str = "42";

fn target() -> SyncTarget<'static> {
    SyncTarget {
        host: HOST,
        account_id: ACCOUNT,
        credential: "token",
    }
}

fn status(id: u64) -> Status {
    Status {
        id: StatusId::new(id.to_string()),
        host: HOST.to_string(),
        account_id: ACCOUNT.to_string(),
        text: format!("post number {id}"),
        url: format!("https://{HOST}/@alice/{id}"),
        created_at: Utc
            .timestamp_opt(1_700_000_000 + i64::try_from(id).unwrap() * 60, 0)
            .unwrap(),
        visibility: Some("public".to_string()),
    }
}

/// A remote timeline that pages the way Mastodon does: newest first, `min_id`
/// returning the statuses immediately above the cursor.
struct FakeTimeline {
    ids: Mutex<BTreeSet<u64>>,
    page_size: usize,
    calls: AtomicUsize,
    fail_on_call: Mutex<Option<(usize, ApiError)>>,
    cursors: Mutex<Vec<PageCursor>>,
}

impl FakeTimeline {
    fn new(ids: impl IntoIterator<Item = u64>, page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            ids: Mutex::new(ids.into_iter().collect()),
            page_size,
            calls: AtomicUsize::new(0),
            fail_on_call: Mutex::new(None),
            cursors: Mutex::new(Vec::new()),
        })
    }

    fn publish(&self, ids: impl IntoIterator<Item = u64>) {
        self.ids.lock().unwrap().extend(ids);
    }

    fn fail_on(&self, call: usize, err: ApiError) {
        *self.fail_on_call.lock().unwrap() = Some((call, err));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn cursors(&self) -> Vec<PageCursor> {
        self.cursors.lock().unwrap().clone()
    }
}

fn numeric(id: &StatusId) -> u64 {
    id.as_str().parse().unwrap()
}

#[async_trait]
impl FeedClient for FakeTimeline {
    async fn fetch_page(
        &self,
        _host: &str,
        credential: &str,
        account_id: &str,
        cursor: &PageCursor,
    ) -> Result<Vec<Status>, ApiError> {
        assert_eq!(credential, "token");
        assert_eq!(account_id, ACCOUNT);

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.cursors.lock().unwrap().push(cursor.clone());

        let mut failure = self.fail_on_call.lock().unwrap();
        if failure.as_ref().is_some_and(|(n, _)| *n == call) {
            if let Some((_, err)) = failure.take() {
                return Err(err);
            }
        }
        drop(failure);

        let ids = self.ids.lock().unwrap();
        let mut page: Vec<u64> = match cursor {
            PageCursor::Latest => ids.iter().rev().take(self.page_size).copied().collect(),
            PageCursor::Before(max) => ids
                .range(..numeric(max))
                .rev()
                .take(self.page_size)
                .copied()
                .collect(),
            PageCursor::After(min) => ids
                .range(numeric(min) + 1..)
                .take(self.page_size)
                .copied()
                .collect(),
        };
        page.sort_unstable_by(|a, b| b.cmp(a));
        Ok(page.into_iter().map(status).collect())
    }
}

async fn setup() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in(temp_dir.path())
        .await
        .expect("Failed to create database");
    db.ensure_account(ACCOUNT, "alice", HOST).await.unwrap();
    (db, temp_dir)
}

fn engine(feed: Arc<dyn FeedClient>, db: &Database) -> SyncEngine {
    SyncEngine::with_database(feed, db.clone(), Duration::ZERO)
}

async fn stored_ids(db: &Database) -> Vec<u64> {
    let mut ids: Vec<u64> = search_account_statuses(db.pool(), ACCOUNT, HOST, "", 10_000, 0)
        .await
        .unwrap()
        .iter()
        .map(|s| numeric(&s.id))
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_backward_sync_walks_to_first_status() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=11, 5);
    let engine = engine(feed.clone(), &db);

    // Seed the newest status as a forward sync would
    feed.ids.lock().unwrap().retain(|id| *id == 11);
    engine.sync_newer(target()).await.unwrap();
    feed.publish(1..=10);

    let mut outcomes = Vec::new();
    for _ in 0..3 {
        outcomes.push(engine.sync_older(target()).await.unwrap().outcome);
    }

    assert_eq!(stored_ids(&db).await, (1..=11).collect::<Vec<_>>());
    assert!(is_account_fully_backfilled(db.pool(), ACCOUNT, HOST).await.unwrap());
    assert_eq!(
        outcomes,
        vec![
            SyncOutcome::FullyBackfilled,
            SyncOutcome::AlreadyBackfilled,
            SyncOutcome::AlreadyBackfilled,
        ]
    );

    let backward: Vec<PageCursor> = feed
        .cursors()
        .into_iter()
        .filter(|c| matches!(c, PageCursor::Before(_)))
        .collect();
    assert_eq!(
        backward,
        vec![
            PageCursor::Before(StatusId::from("11")),
            PageCursor::Before(StatusId::from("6")),
            PageCursor::Before(StatusId::from("1")),
        ]
    );
}

#[tokio::test]
async fn test_fresh_account_forward_sync_is_idempotent() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=5, 20);
    let engine = engine(feed.clone(), &db);

    let first = engine.sync_newer(target()).await.unwrap();
    let second = engine.sync_newer(target()).await.unwrap();

    assert_eq!(first.inserted, 5);
    assert_eq!(first.outcome, SyncOutcome::CaughtUp);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.pages, 0);
    assert_eq!(feed.cursors()[0], PageCursor::Latest);
    assert_eq!(
        feed.cursors().last(),
        Some(&PageCursor::After(StatusId::from("5")))
    );
    assert!(!is_account_fully_backfilled(db.pool(), ACCOUNT, HOST).await.unwrap());
}

#[tokio::test]
async fn test_forward_sync_picks_up_new_posts() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=3, 2);
    let engine = engine(feed.clone(), &db);

    engine.sync_newer(target()).await.unwrap();
    feed.publish(4..=9);
    let report = engine.sync_newer(target()).await.unwrap();

    assert_eq!(report.inserted, 6);
    assert_eq!(report.pages, 3);
    assert_eq!(
        newest_status_id(db.pool(), ACCOUNT, HOST).await.unwrap(),
        Some(StatusId::from("9"))
    );
}

#[tokio::test]
async fn test_interleaved_syncs_keep_store_contiguous() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=30, 4);
    let engine = engine(feed.clone(), &db);

    // Latest page only: 27..=30
    engine.sync_newer(target()).await.unwrap();
    assert_eq!(stored_ids(&db).await, (27..=30).collect::<Vec<_>>());

    feed.publish(31..=35);
    engine.sync_older(target()).await.unwrap();
    engine.sync_newer(target()).await.unwrap();

    let ids = stored_ids(&db).await;
    let oldest = numeric(&oldest_status_id(db.pool(), ACCOUNT, HOST).await.unwrap().unwrap());
    let newest = numeric(&newest_status_id(db.pool(), ACCOUNT, HOST).await.unwrap().unwrap());
    assert!(ids.iter().all(|id| (oldest..=newest).contains(id)));
    assert_eq!(ids, (1..=35).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_transient_failure_resumes_from_store() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=20, 5);
    let engine = engine(feed.clone(), &db);
    engine.sync_newer(target()).await.unwrap(); // 16..=20, calls 1-2

    feed.fail_on(4, ApiError::Transient("503 Service Unavailable".to_string()));
    let err = engine.sync_older(target()).await.unwrap_err();
    assert!(matches!(err, SyncError::Transient(_)));
    assert!(!is_account_fully_backfilled(db.pool(), ACCOUNT, HOST).await.unwrap());
    // The page fetched before the failure stays stored
    assert_eq!(
        oldest_status_id(db.pool(), ACCOUNT, HOST).await.unwrap(),
        Some(StatusId::from("11"))
    );

    let report = engine.sync_older(target()).await.unwrap();
    assert_eq!(report.outcome, SyncOutcome::FullyBackfilled);
    assert_eq!(feed.cursors()[4], PageCursor::Before(StatusId::from("11")));
    assert_eq!(count_account_statuses(db.pool(), ACCOUNT, HOST, "").await.unwrap(), 20);
}

#[tokio::test]
async fn test_auth_and_parse_failures_leave_flag_unset() {
    for err in [
        ApiError::Auth("401 Unauthorized".to_string()),
        ApiError::Parse("expected array".to_string()),
    ] {
        let (db, _temp_dir) = setup().await;
        let feed = FakeTimeline::new(1..=3, 5);
        let engine = engine(feed.clone(), &db);
        engine.sync_newer(target()).await.unwrap();

        feed.fail_on(feed.calls() + 1, err);
        let result = engine.sync_older(target()).await;

        assert!(matches!(
            result,
            Err(SyncError::Auth(_) | SyncError::Parse(_))
        ));
        assert!(!is_account_fully_backfilled(db.pool(), ACCOUNT, HOST).await.unwrap());
    }
}

#[tokio::test]
async fn test_backward_sync_without_history_is_rejected() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=3, 5);
    let engine = engine(feed.clone(), &db);

    let err = engine.sync_older(target()).await.unwrap_err();

    assert!(matches!(err, SyncError::NoLocalHistory));
    assert_eq!(feed.calls(), 0);
}

#[tokio::test]
async fn test_backfilled_account_makes_no_remote_call() {
    let (db, _temp_dir) = setup().await;
    let feed = FakeTimeline::new(1..=3, 5);
    let engine = engine(feed.clone(), &db);
    engine.sync_newer(target()).await.unwrap();
    engine.sync_older(target()).await.unwrap();
    let calls = feed.calls();

    let report = engine.sync_older(target()).await.unwrap();

    assert_eq!(report.outcome, SyncOutcome::AlreadyBackfilled);
    assert_eq!(feed.calls(), calls);
}

/// Blocks inside the first fetch until released.
struct GatedFeed {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl FeedClient for GatedFeed {
    async fn fetch_page(
        &self,
        _host: &str,
        _credential: &str,
        _account_id: &str,
        _cursor: &PageCursor,
    ) -> Result<Vec<Status>, ApiError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_concurrent_sync_of_same_account_is_rejected() {
    let (db, _temp_dir) = setup().await;
    let feed = Arc::new(GatedFeed {
        entered: Notify::new(),
        release: Notify::new(),
    });
    let engine = Arc::new(engine(feed.clone(), &db));

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.sync_newer(target()).await })
    };
    feed.entered.notified().await;

    let err = engine.sync_older(target()).await.unwrap_err();
    assert!(matches!(err, SyncError::InProgress));

    feed.release.notify_one();
    let report = running.await.unwrap().unwrap();
    assert_eq!(report.outcome, SyncOutcome::CaughtUp);

    // Released once the first sync finished
    feed.release.notify_one();
    assert!(engine.sync_newer(target()).await.is_ok());
}
