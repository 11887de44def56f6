use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::PaymentError;

/// Lifecycle of one checkout attempt.
///
/// Transitions are monotonic: `Pending` settles into exactly one of the
/// terminal states and never leaves it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(PaymentError::Storage(format!(
                "unknown transaction status: {other}"
            ))),
        }
    }
}

/// Processor-side billing identity for one account. At most one row per
/// account id; creation is lazy, on the first checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub account_id: i64,
    pub customer_id: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(account_id: i64, customer_id: String) -> Self {
        Self {
            account_id,
            customer_id,
            created_at: Utc::now(),
        }
    }
}

/// One checkout attempt, keyed by the single-use product the processor
/// minted for it. The payment id arrives only with the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub product_id: String,
    pub order_id: Uuid,
    pub account_id: i64,
    pub customer_id: String,
    pub amount: i64,
    pub currency: String,
    pub payment_id: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn pending(
        product_id: String,
        order_id: Uuid,
        account_id: i64,
        customer_id: String,
        amount: i64,
        currency: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            product_id,
            order_id,
            account_id,
            customer_id,
            amount,
            currency,
            payment_id: None,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
