pub mod models;
pub mod orchestrator;
pub mod pricing;
pub mod repository;

pub use models::{NewOrder, Order, OrderStatus, OrderedProduct, RequestedItem, StatusChange};
pub use orchestrator::OrderOrchestrator;
pub use pricing::PriceResolver;
pub use repository::{OrderRepository, OrderStatusSink};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(String),

    #[error("Account {0} not found")]
    UnknownAccount(i64),

    #[error("No valid items in order")]
    NoValidItems,

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Upstream call failed: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
