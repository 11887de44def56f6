use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::OrderError;

/// Order status in the payment lifecycle.
///
/// `Created` is set when the order is persisted. `AwaitingPayment` is
/// pushed by the payment service once a checkout session exists. The
/// terminal states are pushed only by webhook reconciliation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    AwaitingPayment,
    Paid,
    PaymentFailed,
}

/// Outcome of applying a status push to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Updated(OrderStatus),
    /// The order already carries this status; re-delivery is a no-op.
    NoOp,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::PaymentFailed)
    }

    /// Validate a pushed status against the current one.
    ///
    /// Re-applying the current status is a no-op so the status push can
    /// be re-delivered safely. The `AwaitingPayment` push is best-effort,
    /// so a terminal status must also be reachable straight from
    /// `Created`. Replacing one terminal status with a different one is
    /// a conflict.
    pub fn apply(self, next: OrderStatus) -> Result<StatusChange, OrderError> {
        if self == next {
            return Ok(StatusChange::NoOp);
        }
        let allowed = match self {
            OrderStatus::Created => true,
            OrderStatus::AwaitingPayment => next.is_terminal(),
            OrderStatus::Paid | OrderStatus::PaymentFailed => false,
        };
        if allowed {
            Ok(StatusChange::Updated(next))
        } else {
            Err(OrderError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            "AWAITING_PAYMENT" => Ok(OrderStatus::AwaitingPayment),
            "PAID" => Ok(OrderStatus::Paid),
            "PAYMENT_FAILED" => Ok(OrderStatus::PaymentFailed),
            other => Err(OrderError::Storage(format!("unknown order status: {other}"))),
        }
    }
}

/// A line item requested by the client, before pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedItem {
    pub product_id: String,
    pub quantity: u32,
}

/// A priced line item, with catalog metadata denormalized at order time.
/// Later catalog price changes never touch a placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderedProduct {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderedProduct {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A persisted order. The id and creation timestamp are assigned by the
/// store on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub account_id: i64,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub products: Vec<OrderedProduct>,
}

/// An order ready for insertion, before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account_id: i64,
    pub total_price: Decimal,
    pub products: Vec<OrderedProduct>,
}

impl NewOrder {
    pub fn new(account_id: i64, products: Vec<OrderedProduct>) -> Self {
        let total_price = products.iter().map(OrderedProduct::line_total).sum();
        Self {
            account_id,
            total_price,
            products,
        }
    }
}
