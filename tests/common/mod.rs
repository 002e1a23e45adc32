//! Test utilities and fixtures for attribution integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tower::ServiceExt;

pub use affiliate_attribution::config::PlatformConfig;
pub use affiliate_attribution::db::{
    AppState, AttributionRepository, DbPool, PartnerRepository, ReferralVisitRepository,
    SqliteStore, UserRepository, WebhookSettings, init_db, queries,
};
pub use affiliate_attribution::error::{AppError, Result};
pub use affiliate_attribution::handlers;
pub use affiliate_attribution::handlers::webhooks::{WebhookAction, WebhookResponse};
pub use affiliate_attribution::models::*;
pub use affiliate_attribution::platform::{
    OrderClient, OrderRecord, SIGNATURE_HEADER, compute_webhook_signature,
};

pub const TEST_SECRET: &str = "whsec_attribution_test";
pub const TEST_STORE_ID: &str = "1003";
pub const TEST_TOKEN: &str = "secret_test_token";
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// In-memory pool. Every pooled connection to `:memory:` is its own database,
/// so the pool holds exactly one; release it before driving a handler.
pub fn setup_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().expect("Failed to get test connection");
        init_db(&conn).expect("Failed to initialize schema");
    }
    pool
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn days_ago(days: i64) -> i64 {
    now() - days * SECONDS_PER_DAY
}

/// Create an approved partner with a flat rate
pub fn create_test_partner(conn: &Connection, code: &str, base_rate_bps: i64) -> Partner {
    create_test_partner_with(conn, code, PartnerStatus::Approved, base_rate_bps, vec![])
}

pub fn create_test_partner_with(
    conn: &Connection,
    code: &str,
    status: PartnerStatus,
    base_rate_bps: i64,
    tiers: Vec<CommissionTier>,
) -> Partner {
    let input = CreatePartner {
        name: format!("Partner {}", code),
        referral_code: code.to_string(),
        status,
        base_rate_bps,
        tiers,
    };
    queries::create_partner(conn, &input).expect("Failed to create test partner")
}

pub fn create_test_visit(conn: &Connection, code: &str, created_at: i64) -> ReferralVisit {
    queries::create_referral_visit(conn, code, created_at).expect("Failed to create test visit")
}

/// Insert a storefront customer account (accounts are created outside this service)
pub fn create_test_user(conn: &Connection, email: &str) {
    conn.execute(
        "INSERT INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![uuid::Uuid::new_v4().to_string(), email, "Test Customer", now()],
    )
    .expect("Failed to create test user");
}

pub fn set_test_partner_status(conn: &Connection, partner_id: &str, status: PartnerStatus) {
    conn.execute(
        "UPDATE partners SET status = ?1 WHERE id = ?2",
        rusqlite::params![status.as_ref(), partner_id],
    )
    .expect("Failed to update partner status");
}

pub fn tier(label: &str, min_order_cents: i64, rate_bps: i64) -> CommissionTier {
    CommissionTier {
        label: label.to_string(),
        min_order_cents,
        rate_bps,
    }
}

pub fn test_attribution(partner_id: &str, order_id: &str) -> CreateAttribution {
    CreateAttribution {
        partner_id: partner_id.to_string(),
        order_id: order_id.to_string(),
        order_total_cents: 50_000,
        commission_cents: 4_000,
        rate_bps: 800,
        tier: "base".to_string(),
        customer_email: "buyer@example.com".to_string(),
        customer_name: Some("Dana Reyes".to_string()),
    }
}

pub fn sign(body: &[u8]) -> String {
    compute_webhook_signature(body, TEST_SECRET).expect("HMAC can take key of any size")
}

/// Order payload as the platform's order-detail endpoint returns it
pub fn order_json(
    id: &str,
    email: Option<&str>,
    total: f64,
    payment_status: &str,
    referral_code: Option<&str>,
) -> serde_json::Value {
    let extra_fields: Vec<serde_json::Value> = referral_code
        .map(|code| serde_json::json!({"id": "referral_code", "value": code}))
        .into_iter()
        .collect();

    serde_json::json!({
        "id": id.parse::<i64>().map(serde_json::Value::from).unwrap_or_else(|_| id.into()),
        "email": email,
        "total": total,
        "paymentStatus": payment_status,
        "fulfillmentStatus": "AWAITING_PROCESSING",
        "billingPerson": {"name": "Dana Reyes"},
        "orderExtraFields": extra_fields,
    })
}

pub fn webhook_body(scope: &str, order_id: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "eventId": "evt_1",
        "scope": scope,
        "data": {"id": order_id}
    }))
    .expect("serialize webhook body")
}

/// Failures and delays injected into `CountingStore`.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Sleep this long in `partner_by_code` before answering
    pub partner_lookup_delay: Option<Duration>,
    pub fail_partner_lookup: bool,
    pub fail_visit_conversion: bool,
}

fn injected(operation: &str) -> AppError {
    AppError::Internal(format!("injected {} failure", operation))
}

/// Store wrapper counting every repository call, to prove a code path never
/// touched persistence. Optionally injects faults.
pub struct CountingStore {
    inner: SqliteStore,
    calls: AtomicUsize,
    faults: Faults,
}

impl CountingStore {
    pub fn new(pool: DbPool) -> Self {
        Self::with_faults(pool, Faults::default())
    }

    pub fn with_faults(pool: DbPool, faults: Faults) -> Self {
        Self {
            inner: SqliteStore::new(pool),
            calls: AtomicUsize::new(0),
            faults,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn pool(&self) -> &DbPool {
        self.inner.pool()
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl ReferralVisitRepository for CountingStore {
    fn record_visit(&self, code: &str, created_at: i64) -> Result<ReferralVisit> {
        self.tick();
        self.inner.record_visit(code, created_at)
    }

    fn latest_unconverted_visit(&self, since: i64) -> Result<Option<ReferralVisit>> {
        self.tick();
        self.inner.latest_unconverted_visit(since)
    }

    fn latest_unconverted_visit_for_code(
        &self,
        code: &str,
        since: i64,
    ) -> Result<Option<ReferralVisit>> {
        self.tick();
        self.inner.latest_unconverted_visit_for_code(code, since)
    }

    fn mark_visit_converted(
        &self,
        visit_id: &str,
        order_id: &str,
        converted_at: i64,
    ) -> Result<bool> {
        self.tick();
        if self.faults.fail_visit_conversion {
            return Err(injected("visit conversion"));
        }
        self.inner.mark_visit_converted(visit_id, order_id, converted_at)
    }
}

impl PartnerRepository for CountingStore {
    fn partner_by_code(&self, code: &str) -> Result<Option<Partner>> {
        self.tick();
        if let Some(delay) = self.faults.partner_lookup_delay {
            std::thread::sleep(delay);
        }
        if self.faults.fail_partner_lookup {
            return Err(injected("partner lookup"));
        }
        self.inner.partner_by_code(code)
    }
}

impl AttributionRepository for CountingStore {
    fn active_attribution_for_order(&self, order_id: &str) -> Result<Option<PartnerAttribution>> {
        self.tick();
        self.inner.active_attribution_for_order(order_id)
    }

    fn create_attribution(&self, input: &CreateAttribution) -> Result<Option<PartnerAttribution>> {
        self.tick();
        self.inner.create_attribution(input)
    }

    fn cancel_attributions_for_order(&self, order_id: &str) -> Result<usize> {
        self.tick();
        self.inner.cancel_attributions_for_order(order_id)
    }
}

impl UserRepository for CountingStore {
    fn user_exists(&self, email: &str) -> Result<bool> {
        self.tick();
        self.inner.user_exists(email)
    }
}

pub fn test_platform_config(api_base_url: &str) -> PlatformConfig {
    PlatformConfig {
        api_base_url: api_base_url.to_string(),
        store_id: Some(TEST_STORE_ID.to_string()),
        access_token: Some(TEST_TOKEN.to_string()),
        timeout: Duration::from_secs(5),
    }
}

/// App state backed by a counting in-memory store and an order client
/// pointed at `api_base_url` (usually a mockito server).
pub fn test_state(api_base_url: &str, secret: Option<&str>) -> (AppState, Arc<CountingStore>) {
    test_state_with(api_base_url, secret, Faults::default(), Duration::from_secs(5))
}

pub fn test_state_with(
    api_base_url: &str,
    secret: Option<&str>,
    faults: Faults,
    deadline: Duration,
) -> (AppState, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::with_faults(setup_test_pool(), faults));
    let state = AppState {
        store: store.clone(),
        orders: OrderClient::new(&test_platform_config(api_base_url)),
        webhook: WebhookSettings {
            secret: secret.map(String::from),
            deadline,
            attribution_window_days: 90,
        },
    };
    (state, store)
}

pub fn app(state: AppState) -> Router {
    handlers::router().with_state(state)
}

/// POST a webhook body, optionally signed, and decode the JSON reply.
pub async fn post_webhook(
    app: Router,
    body: Vec<u8>,
    signature: Option<String>,
) -> (StatusCode, WebhookResponse) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook/orders")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header(SIGNATURE_HEADER, signature);
    }

    let response = app
        .oneshot(request.body(Body::from(body)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let reply: WebhookResponse = serde_json::from_slice(&bytes).unwrap();
    (status, reply)
}

/// Register the order-detail stub for `order` on the mock platform.
pub async fn mock_order(
    server: &mut mockito::ServerGuard,
    order_id: &str,
    order: &serde_json::Value,
) -> mockito::Mock {
    server
        .mock("GET", format!("/{}/orders/{}", TEST_STORE_ID, order_id).as_str())
        .match_header("authorization", format!("Bearer {}", TEST_TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(order.to_string())
        .create_async()
        .await
}
