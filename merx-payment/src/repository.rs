use async_trait::async_trait;

use crate::models::{Customer, Transaction, TransactionStatus};
use merx_core::BoxError;

/// Persistence for the account ↔ processor-customer mapping.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_account(&self, account_id: i64) -> Result<Option<Customer>, BoxError>;

    async fn save(&self, customer: &Customer) -> Result<(), BoxError>;
}

/// Persistence for checkout transactions, keyed by processor product id.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, transaction: &Transaction) -> Result<(), BoxError>;

    async fn find_by_product(&self, product_id: &str) -> Result<Option<Transaction>, BoxError>;

    /// Settle a still-pending transaction with its payment id and final
    /// status. Returns `false` when the row was not pending anymore, so
    /// the caller can distinguish a replay from a conflict by re-reading.
    async fn settle(
        &self,
        product_id: &str,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<bool, BoxError>;
}
