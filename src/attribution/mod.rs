//! Referral resolution and commission attribution.

mod commission;
mod engine;
mod resolver;

pub use commission::{BASE_TIER_LABEL, CommissionQuote};
pub use engine::{AttributeOutcome, AttributionEngine};
pub use resolver::{ReferralResolver, ReferralSource, ResolvedReferral};

pub const SECONDS_PER_DAY: i64 = 86400;
