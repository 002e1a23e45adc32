//! Order webhook orchestration.
//!
//! verify -> parse -> scope filter -> fetch order -> cancel | create | ignore.
//! Creation runs only for `order.created`; cancellation runs for any order
//! event whose fetched status is terminal-negative, because platforms often
//! deliver cancellations and refunds as plain status updates.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures::FutureExt;

use crate::attribution::{AttributeOutcome, AttributionEngine, ReferralResolver};
use crate::db::{AppState, AttributionRepository, PartnerRepository, Store, UserRepository};
use crate::error::{AppError, Result};
use crate::platform::{OrderRecord, SIGNATURE_HEADER, WebhookEnvelope, verify_webhook_signature};

use super::response::{WebhookAction, WebhookReply};

/// Axum handler for platform order webhooks.
pub async fn handle_order_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = match headers.get(SIGNATURE_HEADER) {
        Some(value) => match value.to_str() {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!("Invalid UTF-8 in webhook signature header: {}", e);
                return WebhookReply::failure(StatusCode::BAD_REQUEST, "invalid_signature_header");
            }
        },
        None => None,
    };

    // Reject before parsing anything or touching the platform/store
    if !verify_webhook_signature(&body, signature, state.webhook.secret.as_deref()) {
        tracing::warn!(
            "Rejected order webhook: {} signature",
            if signature.is_some() { "invalid" } else { "missing" }
        );
        return WebhookReply::unauthorized();
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to parse order webhook: {}", e);
            return WebhookReply::failure(StatusCode::BAD_REQUEST, "invalid_payload");
        }
    };

    if !envelope.is_order_scope() {
        tracing::debug!("Ignoring webhook with scope {}", envelope.scope);
        return WebhookReply::action(WebhookAction::Ignored);
    }

    let Some(order_id) = envelope.order_id() else {
        return WebhookReply::failure(StatusCode::BAD_REQUEST, "missing_order_id");
    };

    let processing =
        AssertUnwindSafe(process_order_event(&state, &envelope, order_id)).catch_unwind();

    match tokio::time::timeout(state.webhook.deadline, processing).await {
        Ok(Ok(Ok(reply))) => reply,
        Ok(Ok(Err(e))) => {
            tracing::error!(
                "Order webhook {} for {} failed: {}",
                envelope.scope,
                order_id,
                e
            );
            WebhookReply::internal_error()
        }
        Ok(Err(_panic)) => {
            tracing::error!("Order webhook {} for {} panicked", envelope.scope, order_id);
            WebhookReply::internal_error()
        }
        Err(_) => {
            tracing::error!(
                "Order webhook {} for {} exceeded {:?} deadline",
                envelope.scope,
                order_id,
                state.webhook.deadline
            );
            WebhookReply::failure(StatusCode::INTERNAL_SERVER_ERROR, "timeout")
        }
    }
}

/// Everything after verification. Store errors bubble up as `Err` and become a
/// retryable 500 at the boundary.
///
/// Store access is blocking, so it runs on the blocking pool where the
/// request deadline can abandon it.
async fn process_order_event(
    state: &AppState,
    envelope: &WebhookEnvelope,
    order_id: &str,
) -> Result<WebhookReply> {
    let Some(order) = state.orders.fetch_order(order_id).await else {
        return Ok(WebhookReply::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "order_unavailable",
        ));
    };

    let store = Arc::clone(&state.store);
    let event = OrderEvent {
        order_id: order_id.to_string(),
        is_created: envelope.is_order_created(),
        window_days: state.webhook.attribution_window_days,
    };

    tokio::task::spawn_blocking(move || apply_order_event(store.as_ref(), &order, &event))
        .await
        .map_err(|e| AppError::Internal(format!("order processing task failed: {}", e)))?
}

struct OrderEvent {
    order_id: String,
    is_created: bool,
    window_days: i64,
}

/// Cancel, create or ignore, given the fetched order.
fn apply_order_event(store: &dyn Store, order: &OrderRecord, event: &OrderEvent) -> Result<WebhookReply> {
    let order_id = event.order_id.as_str();
    let engine = AttributionEngine::new(store);

    if order.is_terminal_negative() {
        let cancelled = engine.cancel_for_order(order_id)?;
        tracing::info!(
            "Order {} is {}: cancelled {} attribution(s)",
            order_id,
            order.effective_status().unwrap_or("terminal"),
            cancelled
        );
        return Ok(WebhookReply::action(WebhookAction::Cancelled));
    }

    if !event.is_created {
        tracing::debug!(
            "Ignoring update for order {} (status {:?})",
            order_id,
            order.effective_status()
        );
        return Ok(WebhookReply::action(WebhookAction::Ignored));
    }

    let Some(email) = order.billing_email() else {
        tracing::debug!("Skipping order {}: no usable billing email", order_id);
        return Ok(WebhookReply::action(WebhookAction::Skipped));
    };

    let total_cents = order.total_cents();
    if total_cents <= 0 {
        tracing::debug!("Skipping order {}: non-positive total {}", order_id, total_cents);
        return Ok(WebhookReply::action(WebhookAction::Skipped));
    }

    if store.active_attribution_for_order(order_id)?.is_some() {
        tracing::info!("Order {} already attributed, ignoring duplicate delivery", order_id);
        return Ok(WebhookReply::action(WebhookAction::AlreadyAttributed));
    }

    let now = chrono::Utc::now().timestamp();
    let resolver = ReferralResolver::new(store, event.window_days);

    let Some(referral) = resolver.resolve(order, now)? else {
        tracing::debug!("No referral for order {}", order_id);
        return Ok(WebhookReply::action(WebhookAction::NoReferral));
    };

    let partner = match store.partner_by_code(&referral.code)? {
        Some(p) if p.is_approved() => p,
        Some(p) => {
            tracing::info!(
                "Referral code {} on order {} belongs to partner {} with status {}",
                referral.code,
                order_id,
                p.id,
                p.status.as_ref()
            );
            return Ok(WebhookReply::action(WebhookAction::InvalidPartner));
        }
        None => {
            tracing::info!("Referral code {} on order {} matches no partner", referral.code, order_id);
            return Ok(WebhookReply::action(WebhookAction::InvalidPartner));
        }
    };

    match engine.attribute(&partner, order_id, total_cents, email, order.customer_name())? {
        AttributeOutcome::Created { attribution, quote } => {
            engine.record_conversion(&referral, order_id, resolver.window_start(now), now);

            let known_customer = store.user_exists(email).unwrap_or_else(|e| {
                tracing::warn!("Customer lookup failed for order {}: {}", order_id, e);
                false
            });

            tracing::info!(
                "Attributed order {} to partner {} ({}): commission={} cents, rate={} bps, tier={}, source={:?}, known_customer={}",
                order_id,
                partner.id,
                referral.code,
                attribution.commission_cents,
                attribution.rate_bps,
                attribution.tier,
                referral.source,
                known_customer
            );

            Ok(WebhookReply::attributed(&quote))
        }
        AttributeOutcome::AlreadyAttributed => {
            Ok(WebhookReply::action(WebhookAction::AlreadyAttributed))
        }
    }
}
