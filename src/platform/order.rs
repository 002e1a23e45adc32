use serde::{Deserialize, Deserializer};

use crate::models::validate_email_format;

/// Scope of the one event that may create an attribution.
pub const ORDER_CREATED_SCOPE: &str = "order.created";

/// Custom checkout field that carries a referral code.
pub const REFERRAL_CODE_FIELD: &str = "referral_code";

/// Order statuses after which a commission must not stand.
const TERMINAL_NEGATIVE_STATUSES: &[&str] = &["cancelled", "canceled", "refunded", "declined"];

/// Accept identifiers sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Like `string_or_number`, but tolerates an absent or null id.
fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Inbound webhook body. Carries only an identifier and a change descriptor.
///
/// Only `scope` is required: events for other resources may carry a `data`
/// object without an order id and must still parse.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    pub scope: String,
    #[serde(default)]
    pub data: WebhookEnvelopeData,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelopeData {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
}

impl WebhookEnvelope {
    pub fn is_order_scope(&self) -> bool {
        self.scope == "order" || self.scope.starts_with("order.")
    }

    pub fn is_order_created(&self) -> bool {
        self.scope == ORDER_CREATED_SCOPE
    }

    /// Trimmed order id, `None` when absent or blank.
    pub fn order_id(&self) -> Option<&str> {
        self.data
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPerson {
    #[serde(default)]
    pub name: Option<String>,
}

/// Custom field attached to an order at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderExtraField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl OrderExtraField {
    fn is_named(&self, field: &str) -> bool {
        [&self.id, &self.name]
            .into_iter()
            .flatten()
            .any(|n| n.trim().eq_ignore_ascii_case(field))
    }
}

/// Authoritative order state as returned by the platform's order-detail API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Order total in the store currency (major units)
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Generic status some platforms send instead of `paymentStatus`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub billing_person: Option<BillingPerson>,
    #[serde(default)]
    pub order_extra_fields: Vec<OrderExtraField>,
}

impl OrderRecord {
    pub fn total_cents(&self) -> i64 {
        (self.total * 100.0).round() as i64
    }

    pub fn effective_status(&self) -> Option<&str> {
        self.payment_status
            .as_deref()
            .or(self.status.as_deref())
            .map(str::trim)
    }

    /// Cancelled, refunded or declined (case-insensitive).
    pub fn is_terminal_negative(&self) -> bool {
        self.effective_status().is_some_and(|status| {
            TERMINAL_NEGATIVE_STATUSES
                .iter()
                .any(|t| status.eq_ignore_ascii_case(t))
        })
    }

    /// Billing email, trimmed. `None` when absent, blank or malformed.
    pub fn billing_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| validate_email_format(e).is_ok())
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.billing_person
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Referral code captured at checkout, if the order carries a non-empty one.
    pub fn embedded_referral_code(&self) -> Option<&str> {
        self.order_extra_fields
            .iter()
            .filter(|f| f.is_named(REFERRAL_CODE_FIELD))
            .filter_map(|f| f.value.as_deref().map(str::trim))
            .find(|v| !v.is_empty())
    }
}
