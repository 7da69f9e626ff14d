//! Scaffold Store - persistence seam used by the services
//!
//! `replace_summary` and `create_scaffold` are atomic: each runs as a single
//! transaction, and concurrent readers observe either the state before it or
//! the state after it.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::db::{keys, scaffolds, summaries, ScaffoldDb};
use crate::types::{
    OpenKey, Page, PageRequest, Result, SaveScaffoldRequest, Scaffold, ScaffoldSummary,
    SummarySnapshot, User,
};

/// Persistence operations for scaffolds, summaries and key records
#[async_trait::async_trait]
pub trait ScaffoldStore: Send + Sync {
    async fn create_user(&self, google_id: &str) -> Result<User>;

    async fn find_user(&self, google_id: &str) -> Result<Option<User>>;

    async fn create_open_key(
        &self,
        user_id: i64,
        value: &str,
        expired_date: Option<DateTime<Utc>>,
    ) -> Result<OpenKey>;

    /// Find an enabled, unexpired key by its value
    async fn find_open_key(&self, value: &str, now: DateTime<Utc>) -> Result<Option<OpenKey>>;

    async fn find_open_keys_by_user(&self, user_id: i64) -> Result<Vec<OpenKey>>;

    async fn get_open_key(&self, id: i64) -> Result<Option<OpenKey>>;

    /// Link a key without an account; `false` if it was already linked
    async fn set_state_account_id(&self, key_id: i64, account_id: i64) -> Result<bool>;

    /// Insert a scaffold and its properties atomically
    async fn create_scaffold(
        &self,
        open_key_id: i64,
        request: &SaveScaffoldRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Scaffold>;

    async fn update_scaffold(&self, scaffold: &Scaffold) -> Result<Scaffold>;

    /// Find a scaffold owned by the user
    async fn find_scaffold(&self, address: &str, user_id: i64) -> Result<Option<Scaffold>>;

    async fn find_scaffold_by_address(&self, address: &str) -> Result<Option<Scaffold>>;

    async fn list_scaffolds(&self, user_id: i64, page: PageRequest) -> Result<Page<Scaffold>>;

    async fn find_summary(&self, scaffold_id: i64) -> Result<Option<ScaffoldSummary>>;

    /// Upsert the summary and replace its share holders atomically
    async fn replace_summary(&self, scaffold_id: i64, snapshot: SummarySnapshot) -> Result<ScaffoldSummary>;

    async fn count_disabled_scaffolds(&self, user_id: i64) -> Result<u64>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteScaffoldStore {
    db: Arc<ScaffoldDb>,
}

impl SqliteScaffoldStore {
    pub fn new(db: Arc<ScaffoldDb>) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(ScaffoldDb::open(path)?)))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(ScaffoldDb::open_in_memory()?)))
    }
}

#[async_trait::async_trait]
impl ScaffoldStore for SqliteScaffoldStore {
    async fn create_user(&self, google_id: &str) -> Result<User> {
        self.db.with_conn(|conn| keys::create_user(conn, google_id))
    }

    async fn find_user(&self, google_id: &str) -> Result<Option<User>> {
        self.db
            .with_conn(|conn| keys::find_user_by_google_id(conn, google_id))
    }

    async fn create_open_key(
        &self,
        user_id: i64,
        value: &str,
        expired_date: Option<DateTime<Utc>>,
    ) -> Result<OpenKey> {
        self.db
            .with_conn(|conn| keys::create_open_key(conn, user_id, value, expired_date))
    }

    async fn find_open_key(&self, value: &str, now: DateTime<Utc>) -> Result<Option<OpenKey>> {
        self.db
            .with_conn(|conn| keys::find_active_open_key(conn, value, now))
    }

    async fn find_open_keys_by_user(&self, user_id: i64) -> Result<Vec<OpenKey>> {
        self.db
            .with_conn(|conn| keys::list_open_keys_by_user(conn, user_id))
    }

    async fn get_open_key(&self, id: i64) -> Result<Option<OpenKey>> {
        self.db.with_conn(|conn| keys::get_open_key(conn, id))
    }

    async fn set_state_account_id(&self, key_id: i64, account_id: i64) -> Result<bool> {
        self.db
            .with_conn(|conn| keys::set_state_account_id(conn, key_id, account_id))
    }

    async fn create_scaffold(
        &self,
        open_key_id: i64,
        request: &SaveScaffoldRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Scaffold> {
        self.db
            .with_conn_mut(|conn| scaffolds::create_scaffold(conn, open_key_id, request, created_at))
    }

    async fn update_scaffold(&self, scaffold: &Scaffold) -> Result<Scaffold> {
        self.db
            .with_conn(|conn| scaffolds::update_scaffold(conn, scaffold))
    }

    async fn find_scaffold(&self, address: &str, user_id: i64) -> Result<Option<Scaffold>> {
        self.db
            .with_conn(|conn| scaffolds::find_scaffold(conn, address, user_id))
    }

    async fn find_scaffold_by_address(&self, address: &str) -> Result<Option<Scaffold>> {
        self.db
            .with_conn(|conn| scaffolds::find_scaffold_by_address(conn, address))
    }

    async fn list_scaffolds(&self, user_id: i64, page: PageRequest) -> Result<Page<Scaffold>> {
        self.db
            .with_conn(|conn| scaffolds::list_scaffolds(conn, user_id, page))
    }

    async fn find_summary(&self, scaffold_id: i64) -> Result<Option<ScaffoldSummary>> {
        self.db
            .with_conn(|conn| summaries::find_summary(conn, scaffold_id))
    }

    async fn replace_summary(&self, scaffold_id: i64, snapshot: SummarySnapshot) -> Result<ScaffoldSummary> {
        self.db
            .with_conn_mut(|conn| summaries::replace_summary(conn, scaffold_id, &snapshot))
    }

    async fn count_disabled_scaffolds(&self, user_id: i64) -> Result<u64> {
        self.db
            .with_conn(|conn| summaries::count_disabled_scaffolds(conn, user_id))
    }
}
