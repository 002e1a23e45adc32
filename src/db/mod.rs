mod from_row;
mod repository;
mod schema;
pub mod queries;

pub use repository::{
    AttributionRepository, PartnerRepository, ReferralVisitRepository, Store, UserRepository,
};
pub use schema::init_db;

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;
use crate::models::{CreateAttribution, Partner, PartnerAttribution, ReferralVisit};
use crate::platform::OrderClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Settings the webhook endpoint needs at request time.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Shared HMAC secret. `None` accepts unsigned deliveries (development only).
    pub secret: Option<String>,
    /// Deadline for fetch + store work on one delivery.
    pub deadline: Duration,
    pub attribution_window_days: i64,
}

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orders: OrderClient,
    pub webhook: WebhookSettings,
}

pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });
    Pool::builder().max_size(10).build(manager)
}

/// Pooled SQLite implementation of every repository trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl ReferralVisitRepository for SqliteStore {
    fn record_visit(&self, code: &str, created_at: i64) -> Result<ReferralVisit> {
        let conn = self.pool.get()?;
        queries::create_referral_visit(&conn, code, created_at)
    }

    fn latest_unconverted_visit(&self, since: i64) -> Result<Option<ReferralVisit>> {
        let conn = self.pool.get()?;
        queries::latest_unconverted_visit(&conn, since)
    }

    fn latest_unconverted_visit_for_code(
        &self,
        code: &str,
        since: i64,
    ) -> Result<Option<ReferralVisit>> {
        let conn = self.pool.get()?;
        queries::latest_unconverted_visit_for_code(&conn, code, since)
    }

    fn mark_visit_converted(
        &self,
        visit_id: &str,
        order_id: &str,
        converted_at: i64,
    ) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::mark_visit_converted(&conn, visit_id, order_id, converted_at)
    }
}

impl PartnerRepository for SqliteStore {
    fn partner_by_code(&self, code: &str) -> Result<Option<Partner>> {
        let conn = self.pool.get()?;
        queries::get_partner_by_code(&conn, code)
    }
}

impl AttributionRepository for SqliteStore {
    fn active_attribution_for_order(&self, order_id: &str) -> Result<Option<PartnerAttribution>> {
        let conn = self.pool.get()?;
        queries::get_active_attribution_for_order(&conn, order_id)
    }

    fn create_attribution(&self, input: &CreateAttribution) -> Result<Option<PartnerAttribution>> {
        let conn = self.pool.get()?;
        queries::try_create_attribution(&conn, input)
    }

    fn cancel_attributions_for_order(&self, order_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        queries::cancel_attributions_for_order(&conn, order_id)
    }
}

impl UserRepository for SqliteStore {
    fn user_exists(&self, email: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        queries::user_exists_by_email(&conn, email)
    }
}
