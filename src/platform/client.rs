use reqwest::{Client, StatusCode, Url};

use crate::config::PlatformConfig;
use crate::error::{AppError, Result};

use super::OrderRecord;

/// Order Fetcher: reads the authoritative order record from the platform.
///
/// Webhook payloads only carry an order id, so every delivery fetches fresh
/// state. Orders are never cached.
#[derive(Debug, Clone)]
pub struct OrderClient {
    client: Client,
    config: PlatformConfig,
}

impl OrderClient {
    pub fn new(config: &PlatformConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build platform HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Fetch an order by id.
    ///
    /// Returns `None` when credentials are missing, the request fails, or the
    /// platform answers with a non-success status. Callers treat `None` as a
    /// retryable upstream failure, never as "no order".
    pub async fn fetch_order(&self, order_id: &str) -> Option<OrderRecord> {
        match self.request_order(order_id).await {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::error!("Order fetch failed for {}: {}", order_id, e);
                None
            }
        }
    }

    async fn request_order(&self, order_id: &str) -> Result<OrderRecord> {
        let (Some(store_id), Some(token)) = (
            self.config.store_id.as_deref(),
            self.config.access_token.as_deref(),
        ) else {
            return Err(AppError::Config("platform store id or access token not configured".into()));
        };
        if !self.config.is_configured() {
            return Err(AppError::Config("platform store id or access token is empty".into()));
        }

        let url = self.order_url(store_id, order_id)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("order API request error: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("order {}", order_id)));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "order API returned {}: {}",
                status, error_text
            )));
        }

        response
            .json::<OrderRecord>()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to parse order response: {}", e)))
    }

    fn order_url(&self, store_id: &str, order_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| AppError::Config(format!("invalid platform API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("platform API base URL cannot be a base".into()))?
            .pop_if_empty()
            .push(store_id)
            .push("orders")
            .push(order_id);
        Ok(url)
    }
}
