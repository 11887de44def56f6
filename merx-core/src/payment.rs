use async_trait::async_trait;

use crate::BoxError;

/// The slice of the payment processor's API this system consumes.
///
/// Amounts are integer minor units (cents) with an ISO currency code,
/// matching the processor's wire contract.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a billing customer; returns the processor-assigned id.
    async fn create_customer(&self, email: &str, name: &str) -> Result<String, BoxError>;

    /// Mint a single-use priced product for one checkout attempt;
    /// returns the processor-assigned product id.
    async fn create_one_time_product(&self, amount: i64, currency: &str)
        -> Result<String, BoxError>;

    /// Open a hosted customer-portal session; returns the portal URL.
    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BoxError>;
}
