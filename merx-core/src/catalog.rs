use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BoxError;

/// A product as priced by the catalog service at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
}

/// Batched lookup into the catalog service.
///
/// Ids with no catalog record are simply absent from the result; the call
/// itself only fails when the catalog is unreachable.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn products_by_ids(&self, ids: &[String]) -> Result<Vec<CatalogProduct>, BoxError>;
}
