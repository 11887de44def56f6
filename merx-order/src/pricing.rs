use std::sync::Arc;
use std::time::Duration;

use crate::models::{OrderedProduct, RequestedItem};
use crate::OrderError;
use merx_core::catalog::ProductCatalog;

/// Resolves requested items against the catalog in one batched lookup.
pub struct PriceResolver {
    catalog: Arc<dyn ProductCatalog>,
    deadline: Duration,
}

impl PriceResolver {
    pub fn new(catalog: Arc<dyn ProductCatalog>, deadline: Duration) -> Self {
        Self { catalog, deadline }
    }

    /// Combine catalog records with requested quantities.
    ///
    /// A zero quantity anywhere is a client error and fails the call
    /// before the catalog is contacted. Ids the catalog does not know
    /// are dropped from the result; a catalog failure or deadline
    /// expiry fails the whole call, since an order must never be
    /// created with unpriced items.
    pub async fn resolve(
        &self,
        items: &[RequestedItem],
    ) -> Result<Vec<OrderedProduct>, OrderError> {
        for item in items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity(item.product_id.clone()));
            }
        }

        let ids: Vec<String> = items.iter().map(|item| item.product_id.clone()).collect();

        let catalog_products = tokio::time::timeout(self.deadline, self.catalog.products_by_ids(&ids))
            .await
            .map_err(|_| OrderError::Upstream("catalog lookup timed out".to_string()))?
            .map_err(|e| OrderError::Upstream(format!("catalog lookup failed: {e}")))?;

        let mut products = Vec::with_capacity(catalog_products.len());
        for record in catalog_products {
            if let Some(requested) = items.iter().find(|item| item.product_id == record.id) {
                products.push(OrderedProduct {
                    product_id: record.id,
                    name: record.name,
                    description: record.description,
                    unit_price: record.unit_price,
                    quantity: requested.quantity,
                });
            }
        }

        Ok(products)
    }
}
