use async_trait::async_trait;
use std::time::Duration;

use merx_core::catalog::{CatalogProduct, ProductCatalog};
use merx_core::BoxError;

/// HTTP adapter for the catalog service's batched product lookup.
pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogProduct>, BoxError> {
        let response = self
            .client
            .get(format!("{}/v1/products", self.base_url))
            .query(&[("ids", ids.join(","))])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Vec<CatalogProduct>>().await?)
    }
}
