use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributionStatus {
    Pending,
    Paid,
    Cancelled,
}

/// A commission claim: this order, for this partner, at this rate.
///
/// Total, commission and rate are snapshots taken at creation and are never
/// recomputed. Only `status` changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerAttribution {
    pub id: String,
    pub partner_id: String,
    /// Platform order identifier (external key)
    pub order_id: String,
    pub order_total_cents: i64,
    pub commission_cents: i64,
    pub rate_bps: i64,
    pub tier: String,
    pub status: AttributionStatus,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub created_at: i64,
}

/// Data required to create a new attribution
#[derive(Debug, Clone)]
pub struct CreateAttribution {
    pub partner_id: String,
    pub order_id: String,
    pub order_total_cents: i64,
    pub commission_cents: i64,
    pub rate_bps: i64,
    pub tier: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
}
