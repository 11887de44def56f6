use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use merx_core::payment::PaymentProvider;
use merx_core::BoxError;

/// REST adapter for the payment processor.
pub struct RestPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct CustomerResponse {
    customer_id: String,
}

#[derive(Deserialize)]
struct ProductResponse {
    product_id: String,
}

#[derive(Deserialize)]
struct PortalResponse {
    link: String,
}

impl RestPaymentProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl PaymentProvider for RestPaymentProvider {
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, BoxError> {
        let response = self
            .client
            .post(format!("{}/customers", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "email": email, "name": name }))
            .send()
            .await?
            .error_for_status()?
            .json::<CustomerResponse>()
            .await?;

        Ok(response.customer_id)
    }

    async fn create_one_time_product(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<String, BoxError> {
        let response = self
            .client
            .post(format!("{}/products", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "price": {
                    "type": "one_time_price",
                    "price": amount,
                    "currency": currency,
                    "discount": 0,
                    "purchasing_power_parity": true,
                },
                "tax_category": "saas",
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<ProductResponse>()
            .await?;

        Ok(response.product_id)
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BoxError> {
        let response = self
            .client
            .post(format!(
                "{}/customers/{}/customer-portal/session",
                self.base_url, customer_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<PortalResponse>()
            .await?;

        Ok(response.link)
    }
}
