use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PartnerStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

/// One step of a partner's commission schedule.
///
/// Applies to orders whose total is at least `min_order_cents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionTier {
    pub label: String,
    pub min_order_cents: i64,
    /// Commission rate in basis points (800 = 8%)
    pub rate_bps: i64,
}

/// Affiliate partner. Read-only from the attribution core's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    /// Unique and immutable; identifies the partner in links and checkout fields.
    pub referral_code: String,
    pub status: PartnerStatus,
    /// Rate used when no tier matches the order total
    pub base_rate_bps: i64,
    pub tiers: Vec<CommissionTier>,
    pub created_at: i64,
}

impl Partner {
    pub fn is_approved(&self) -> bool {
        self.status == PartnerStatus::Approved
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePartner {
    pub name: String,
    pub referral_code: String,
    pub status: PartnerStatus,
    pub base_rate_bps: i64,
    #[serde(default)]
    pub tiers: Vec<CommissionTier>,
}
