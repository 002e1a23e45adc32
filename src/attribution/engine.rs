use crate::db::{AttributionRepository, ReferralVisitRepository};
use crate::error::Result;
use crate::models::{CreateAttribution, Partner, PartnerAttribution};

use super::commission::CommissionQuote;
use super::resolver::{ReferralSource, ResolvedReferral};

#[derive(Debug)]
pub enum AttributeOutcome {
    /// A new PENDING attribution was written
    Created {
        attribution: PartnerAttribution,
        quote: CommissionQuote,
    },
    /// The order already has an active attribution; nothing was written
    AlreadyAttributed,
}

/// Creates and cancels commission attributions, keyed on platform order id.
///
/// Both operations are idempotent per order so at-least-once webhook delivery
/// and racing retries converge on one active row.
pub struct AttributionEngine<'a, S: AttributionRepository + ReferralVisitRepository + ?Sized> {
    store: &'a S,
}

impl<'a, S: AttributionRepository + ReferralVisitRepository + ?Sized> AttributionEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record a PENDING attribution for `order_id` with the partner's current schedule.
    ///
    /// A second call for an order that already has an active attribution is a
    /// no-op. The existence check short-circuits the common duplicate; the
    /// store's unique index catches the concurrent one.
    pub fn attribute(
        &self,
        partner: &Partner,
        order_id: &str,
        order_total_cents: i64,
        customer_email: &str,
        customer_name: Option<&str>,
    ) -> Result<AttributeOutcome> {
        if self.store.active_attribution_for_order(order_id)?.is_some() {
            return Ok(AttributeOutcome::AlreadyAttributed);
        }

        let quote = CommissionQuote::for_partner(partner, order_total_cents);

        let input = CreateAttribution {
            partner_id: partner.id.clone(),
            order_id: order_id.to_string(),
            order_total_cents,
            commission_cents: quote.commission_cents,
            rate_bps: quote.rate_bps,
            tier: quote.tier.clone(),
            customer_email: customer_email.to_string(),
            customer_name: customer_name.map(String::from),
        };

        match self.store.create_attribution(&input)? {
            Some(attribution) => Ok(AttributeOutcome::Created { attribution, quote }),
            None => {
                tracing::info!(
                    "Concurrent attribution detected for order {}, keeping existing row",
                    order_id
                );
                Ok(AttributeOutcome::AlreadyAttributed)
            }
        }
    }

    /// Cancel every attribution for the order that has not been paid out.
    /// PAID rows are left alone; a late cancellation never reverses a payout.
    pub fn cancel_for_order(&self, order_id: &str) -> Result<usize> {
        self.store.cancel_attributions_for_order(order_id)
    }

    /// Mark the visit behind a successful attribution as converted.
    ///
    /// Bookkeeping only: the attribution row is authoritative, so failures are
    /// logged and swallowed. Returns whether a visit was marked.
    pub fn record_conversion(
        &self,
        referral: &ResolvedReferral,
        order_id: &str,
        window_start: i64,
        now: i64,
    ) -> bool {
        let visit_id = match &referral.source {
            ReferralSource::Visit { visit_id } => Some(visit_id.clone()),
            ReferralSource::OrderField => {
                match self
                    .store
                    .latest_unconverted_visit_for_code(&referral.code, window_start)
                {
                    Ok(visit) => visit.map(|v| v.id),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to look up visit for code {} (order {}): {}",
                            referral.code,
                            order_id,
                            e
                        );
                        None
                    }
                }
            }
        };

        let Some(visit_id) = visit_id else {
            return false;
        };

        match self.store.mark_visit_converted(&visit_id, order_id, now) {
            Ok(marked) => {
                if !marked {
                    tracing::debug!("Visit {} was already converted", visit_id);
                }
                marked
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to mark visit {} converted for order {}: {}",
                    visit_id,
                    order_id,
                    e
                );
                false
            }
        }
    }
}
