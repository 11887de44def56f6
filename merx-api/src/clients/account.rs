use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use merx_core::account::{Account, AccountDirectory};
use merx_core::BoxError;

/// HTTP adapter for the account service.
pub struct HttpAccountDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAccountDirectory {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    async fn get_account(&self, id: i64) -> Result<Option<Account>, BoxError> {
        let response = self
            .client
            .get(format!("{}/v1/accounts/{}", self.base_url, id))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let account = response.error_for_status()?.json::<Account>().await?;
        Ok(Some(account))
    }
}
