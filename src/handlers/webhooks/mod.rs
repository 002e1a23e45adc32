pub mod orders;
pub mod response;

pub use orders::handle_order_webhook;
pub use response::{WebhookAction, WebhookReply, WebhookResponse};

use axum::{Router, routing::post};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/orders", post(handle_order_webhook))
}
