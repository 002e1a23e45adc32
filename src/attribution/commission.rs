use serde::Serialize;

use crate::models::Partner;

/// Tier label used when an order total matches none of the partner's tiers.
pub const BASE_TIER_LABEL: &str = "base";

const BPS_DENOMINATOR: i64 = 10_000;

/// Commission computed for one order total under one partner's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionQuote {
    pub commission_cents: i64,
    pub rate_bps: i64,
    pub tier: String,
}

impl CommissionQuote {
    /// Apply the partner's schedule to `total_cents`.
    ///
    /// The tier with the highest `min_order_cents` not exceeding the total wins.
    /// Without a match the base rate applies.
    pub fn for_partner(partner: &Partner, total_cents: i64) -> Self {
        let tier = partner
            .tiers
            .iter()
            .filter(|t| t.min_order_cents <= total_cents)
            .max_by_key(|t| t.min_order_cents);

        let (rate_bps, label) = match tier {
            Some(t) => (t.rate_bps, t.label.clone()),
            None => (partner.base_rate_bps, BASE_TIER_LABEL.to_string()),
        };

        Self {
            commission_cents: apply_rate(total_cents, rate_bps),
            rate_bps,
            tier: label,
        }
    }

    /// Rate as a percentage, e.g. 8.0 for 800 bps.
    pub fn rate_percent(&self) -> f64 {
        self.rate_bps as f64 / 100.0
    }

    pub fn commission_amount(&self) -> f64 {
        self.commission_cents as f64 / 100.0
    }
}

/// `total * bps / 10000`, rounded half-up to the cent.
fn apply_rate(total_cents: i64, rate_bps: i64) -> i64 {
    if total_cents <= 0 || rate_bps <= 0 {
        return 0;
    }
    let scaled = total_cents as i128 * rate_bps as i128;
    let half = (BPS_DENOMINATOR / 2) as i128;
    ((scaled + half) / BPS_DENOMINATOR as i128) as i64
}
