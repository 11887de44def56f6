use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderStatus};
use merx_core::BoxError;

/// Persistence for orders and their line items.
///
/// `create_order` writes the header and every line item as one atomic
/// unit and returns the stored order with its assigned identity.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BoxError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, BoxError>;

    async fn orders_for_account(&self, account_id: i64) -> Result<Vec<Order>, BoxError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), BoxError>;
}

/// Push interface the payment service uses to report order status.
/// Idempotent: re-delivering the current status is a no-op on the
/// receiving side.
#[async_trait]
pub trait OrderStatusSink: Send + Sync {
    async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), BoxError>;
}
