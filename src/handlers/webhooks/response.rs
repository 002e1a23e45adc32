use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::attribution::CommissionQuote;

/// Machine-readable outcome of a processed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookAction {
    /// Not an order event, or an order update that needs no work
    Ignored,
    /// Order is cancelled/refunded/declined; unpaid attributions were cancelled
    Cancelled,
    /// Order has no billing email or a non-positive total
    Skipped,
    NoReferral,
    /// Referral code points at a missing or non-approved partner
    InvalidPartner,
    /// Order already has an active attribution; nothing new was written
    AlreadyAttributed,
    Attributed,
}

/// JSON body returned to the webhook sender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<WebhookAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Commission in store currency (major units)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    /// Commission rate as a percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

#[derive(Debug)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub body: WebhookResponse,
}

impl WebhookReply {
    /// 200 with `ok: true` and the given action.
    pub fn action(action: WebhookAction) -> Self {
        Self {
            status: StatusCode::OK,
            body: WebhookResponse {
                ok: true,
                action: Some(action),
                ..Default::default()
            },
        }
    }

    pub fn attributed(quote: &CommissionQuote) -> Self {
        Self {
            status: StatusCode::OK,
            body: WebhookResponse {
                ok: true,
                action: Some(WebhookAction::Attributed),
                commission: Some(quote.commission_amount()),
                rate: Some(quote.rate_percent()),
                tier: Some(quote.tier.clone()),
                ..Default::default()
            },
        }
    }

    pub fn failure(status: StatusCode, error: &str) -> Self {
        Self {
            status,
            body: WebhookResponse {
                ok: false,
                error: Some(error.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::failure(StatusCode::UNAUTHORIZED, "invalid_signature")
    }

    pub fn internal_error() -> Self {
        Self::failure(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
