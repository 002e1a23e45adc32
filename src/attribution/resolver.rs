use crate::db::ReferralVisitRepository;
use crate::error::Result;
use crate::platform::OrderRecord;

use super::SECONDS_PER_DAY;

/// Where a resolved referral code came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralSource {
    /// Captured in the order's custom checkout field
    OrderField,
    /// Most recent unconverted visit in the attribution window
    Visit { visit_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReferral {
    pub code: String,
    pub source: ReferralSource,
}

/// Decides which referral code, if any, an order should be credited to.
///
/// Priority: the code embedded in the order wins outright. Otherwise the most
/// recent unconverted visit created within the window is used. That fallback
/// is global, not scoped to the customer, because nothing at webhook time
/// links a visit to a buyer. Treat it as an approximation.
pub struct ReferralResolver<'a, R: ReferralVisitRepository + ?Sized> {
    visits: &'a R,
    window_days: i64,
}

impl<'a, R: ReferralVisitRepository + ?Sized> ReferralResolver<'a, R> {
    pub fn new(visits: &'a R, window_days: i64) -> Self {
        Self {
            visits,
            window_days,
        }
    }

    /// Earliest `created_at` still inside the window (inclusive).
    pub fn window_start(&self, now: i64) -> i64 {
        now - self.window_days * SECONDS_PER_DAY
    }

    pub fn resolve(&self, order: &OrderRecord, now: i64) -> Result<Option<ResolvedReferral>> {
        if let Some(code) = order.embedded_referral_code() {
            return Ok(Some(ResolvedReferral {
                code: code.to_string(),
                source: ReferralSource::OrderField,
            }));
        }

        let visit = self.visits.latest_unconverted_visit(self.window_start(now))?;

        Ok(visit.map(|v| ResolvedReferral {
            code: v.referral_code,
            source: ReferralSource::Visit { visit_id: v.id },
        }))
    }
}
