use serde::{Deserialize, Serialize};

/// A storefront visit that arrived carrying a referral code.
///
/// `converted_at` and `order_id` are written together by a single update, so
/// a visit is either unconverted (both `None`) or converted (both `Some`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralVisit {
    pub id: String,
    pub referral_code: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl ReferralVisit {
    pub fn is_converted(&self) -> bool {
        self.converted_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordVisit {
    pub code: String,
}
