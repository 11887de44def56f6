use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use merx_core::BoxError;
use merx_order::models::OrderStatus;
use merx_order::repository::OrderStatusSink;

/// HTTP adapter pushing order status into the order service. The
/// receiving endpoint is idempotent, so callers may re-send freely.
pub struct HttpOrderStatusSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderStatusSink {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl OrderStatusSink for HttpOrderStatusSink {
    async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
        self.client
            .post(format!("{}/v1/orders/{}/status", self.base_url, order_id))
            .json(&json!({ "status": status }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
