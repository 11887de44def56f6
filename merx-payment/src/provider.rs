use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use merx_core::payment::PaymentProvider;
use merx_core::BoxError;

/// Deterministic in-process provider for tests and local runs without
/// processor credentials.
#[derive(Default)]
pub struct MockPaymentProvider {
    customers: AtomicUsize,
    products: AtomicUsize,
}

impl MockPaymentProvider {
    pub fn customers_created(&self) -> usize {
        self.customers.load(Ordering::SeqCst)
    }

    pub fn products_created(&self) -> usize {
        self.products.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_customer(&self, _email: &str, _name: &str) -> Result<String, BoxError> {
        let n = self.customers.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("mock_cus_{n}"))
    }

    async fn create_one_time_product(
        &self,
        _amount: i64,
        _currency: &str,
    ) -> Result<String, BoxError> {
        let n = self.products.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("mock_prod_{n}"))
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BoxError> {
        Ok(format!("https://portal.example.com/session/{customer_id}"))
    }
}
