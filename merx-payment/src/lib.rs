pub mod checkout;
pub mod models;
pub mod provider;
pub mod registry;
pub mod repository;
pub mod webhook;

pub use checkout::{CheckoutRequest, CheckoutService};
pub use models::{Customer, Transaction, TransactionStatus};
pub use provider::MockPaymentProvider;
pub use registry::CustomerRegistry;
pub use repository::{CustomerRepository, TransactionRepository};
pub use webhook::{WebhookOutcome, WebhookReconciler};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider call failed: {0}")]
    Provider(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("No transaction for product {0}")]
    UnknownTransaction(String),

    #[error("Transaction {product_id} already settled as {current}, refusing {incoming}")]
    StatusConflict {
        product_id: String,
        current: String,
        incoming: String,
    },

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
