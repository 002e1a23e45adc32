//! Narrow per-entity persistence interfaces consumed by the attribution core.
//!
//! Handlers and services depend on these traits rather than on a connection,
//! so the same logic runs against the pooled SQLite store in production and
//! against wrapped or fake stores in tests.

use crate::error::Result;
use crate::models::{CreateAttribution, Partner, PartnerAttribution, ReferralVisit};

pub trait ReferralVisitRepository {
    fn record_visit(&self, code: &str, created_at: i64) -> Result<ReferralVisit>;

    /// Most recent unconverted visit created at or after `since`, regardless of code.
    fn latest_unconverted_visit(&self, since: i64) -> Result<Option<ReferralVisit>>;

    fn latest_unconverted_visit_for_code(
        &self,
        code: &str,
        since: i64,
    ) -> Result<Option<ReferralVisit>>;

    /// Returns false when the visit was already converted.
    fn mark_visit_converted(&self, visit_id: &str, order_id: &str, converted_at: i64)
    -> Result<bool>;
}

pub trait PartnerRepository {
    fn partner_by_code(&self, code: &str) -> Result<Option<Partner>>;
}

pub trait AttributionRepository {
    fn active_attribution_for_order(&self, order_id: &str) -> Result<Option<PartnerAttribution>>;

    /// `Ok(None)` when an active attribution for the order already exists.
    fn create_attribution(&self, input: &CreateAttribution) -> Result<Option<PartnerAttribution>>;

    /// Cancel all non-PAID, non-CANCELLED attributions for the order.
    fn cancel_attributions_for_order(&self, order_id: &str) -> Result<usize>;
}

pub trait UserRepository {
    fn user_exists(&self, email: &str) -> Result<bool>;
}

/// Everything the webhook pipeline needs from persistence.
pub trait Store:
    ReferralVisitRepository + PartnerRepository + AttributionRepository + UserRepository + Send + Sync
{
}

impl<T> Store for T where
    T: ReferralVisitRepository
        + PartnerRepository
        + AttributionRepository
        + UserRepository
        + Send
        + Sync
{
}
