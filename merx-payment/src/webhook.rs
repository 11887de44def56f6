use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;

use crate::models::{Transaction, TransactionStatus};
use crate::repository::TransactionRepository;
use crate::PaymentError;
use merx_order::models::OrderStatus;
use merx_order::repository::OrderStatusSink;

type HmacSha256 = Hmac<Sha256>;

/// Header the processor carries its signature in.
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Raw webhook payload as the processor sends it. The product cart
/// carries exactly one entry, because every checkout session registers
/// exactly one single-use product.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub customer: WebhookCustomer,
    #[serde(default)]
    pub product_cart: Vec<CartEntry>,
    pub payment_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCustomer {
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CartEntry {
    pub product_id: String,
    #[serde(default)]
    pub quantity: u32,
}

/// What a structurally valid, verified webhook did.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// The pending transaction was settled with this delivery.
    Applied(Transaction),
    /// A re-delivery of an already-applied outcome; no state changed.
    AlreadyApplied(Transaction),
    /// An event type this system does not understand; accepted, ignored.
    Ignored(String),
}

/// Converges transactions (and through them, orders) onto the
/// processor's authoritative payment outcome.
pub struct WebhookReconciler {
    transactions: Arc<dyn TransactionRepository>,
    order_status: Arc<dyn OrderStatusSink>,
    secret: String,
}

impl WebhookReconciler {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        order_status: Arc<dyn OrderStatusSink>,
        secret: String,
    ) -> Self {
        Self {
            transactions,
            order_status,
            secret,
        }
    }

    /// Process one webhook delivery: verify, parse, settle, push.
    ///
    /// The transport arrives unauthenticated, so nothing is read from
    /// the payload before the signature over the raw body checks out.
    /// The order-status push happens outside the settlement write and is
    /// retried naturally by webhook re-delivery, so its failure is
    /// logged, not returned.
    pub async fn handle(
        &self,
        signature: &str,
        body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError> {
        if !self.verify_signature(signature, body) {
            return Err(PaymentError::InvalidSignature);
        }

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| PaymentError::MalformedPayload(e.to_string()))?;

        let status = match payload.event_type.as_str() {
            "payment.succeeded" => TransactionStatus::Success,
            "payment.failed" => TransactionStatus::Failed,
            other => {
                tracing::info!(event_type = other, "ignoring unhandled webhook event type");
                return Ok(WebhookOutcome::Ignored(other.to_string()));
            }
        };

        let product_id = payload
            .data
            .product_cart
            .first()
            .map(|entry| entry.product_id.clone())
            .ok_or_else(|| PaymentError::MalformedPayload("empty product cart".to_string()))?;

        let outcome = self
            .settle(&product_id, &payload.data.payment_id, status)
            .await?;

        let transaction = match &outcome {
            WebhookOutcome::Applied(t) | WebhookOutcome::AlreadyApplied(t) => t,
            WebhookOutcome::Ignored(_) => unreachable!("settle never ignores"),
        };
        let order_status = match status {
            TransactionStatus::Success => OrderStatus::Paid,
            TransactionStatus::Failed => OrderStatus::PaymentFailed,
            TransactionStatus::Pending => unreachable!("webhooks only carry terminal outcomes"),
        };

        if let Err(e) = self
            .order_status
            .update_status(transaction.order_id, order_status)
            .await
        {
            tracing::error!(
                order_id = %transaction.order_id,
                product_id = %transaction.product_id,
                "transaction settled but order status push failed: {e}"
            );
        }

        Ok(outcome)
    }

    /// HMAC-SHA256 over the raw body, hex-encoded, compared in constant
    /// time.
    fn verify_signature(&self, signature: &str, body: &[u8]) -> bool {
        let Ok(claimed) = hex::decode(signature.trim()) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any size");
        mac.update(body);
        mac.verify_slice(&claimed).is_ok()
    }

    /// Apply a terminal status to the pending transaction, idempotently.
    ///
    /// The settle write only touches a still-pending row; re-reading
    /// afterwards distinguishes a replay of the same outcome from a
    /// processor-side contradiction.
    async fn settle(
        &self,
        product_id: &str,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<WebhookOutcome, PaymentError> {
        let updated = self
            .transactions
            .settle(product_id, payment_id, status)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        let current = self
            .transactions
            .find_by_product(product_id)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        match current {
            None => Err(PaymentError::UnknownTransaction(product_id.to_string())),
            Some(transaction) if updated => {
                tracing::info!(
                    product_id,
                    payment_id,
                    status = status.as_str(),
                    "transaction settled"
                );
                Ok(WebhookOutcome::Applied(transaction))
            }
            Some(transaction) if transaction.status == status => {
                Ok(WebhookOutcome::AlreadyApplied(transaction))
            }
            Some(transaction) => Err(PaymentError::StatusConflict {
                product_id: product_id.to_string(),
                current: transaction.status.as_str().to_string(),
                incoming: status.as_str().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use merx_core::BoxError;
    use std::sync::Mutex;
    use uuid::Uuid;

    const SECRET: &str = "whsec_test_secret";

    fn sign(body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[derive(Default)]
    struct InMemoryTransactions {
        rows: Mutex<Vec<Transaction>>,
    }

    impl InMemoryTransactions {
        fn with_pending(product_id: &str, order_id: Uuid) -> Self {
            let repo = Self::default();
            repo.rows.lock().unwrap().push(Transaction::pending(
                product_id.to_string(),
                order_id,
                42,
                "c1".to_string(),
                2500,
                "USD".to_string(),
            ));
            repo
        }
    }

    #[async_trait]
    impl TransactionRepository for InMemoryTransactions {
        async fn insert(&self, transaction: &Transaction) -> Result<(), BoxError> {
            self.rows.lock().unwrap().push(transaction.clone());
            Ok(())
        }

        async fn find_by_product(&self, product_id: &str) -> Result<Option<Transaction>, BoxError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.product_id == product_id)
                .cloned())
        }

        async fn settle(
            &self,
            product_id: &str,
            payment_id: &str,
            status: TransactionStatus,
        ) -> Result<bool, BoxError> {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut() {
                if row.product_id == product_id && row.status == TransactionStatus::Pending {
                    row.payment_id = Some(payment_id.to_string());
                    row.status = status;
                    row.updated_at = chrono::Utc::now();
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        pushes: Mutex<Vec<(Uuid, OrderStatus)>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderStatusSink for RecordingSink {
        async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
            if self.fail {
                return Err("order service unreachable".into());
            }
            self.pushes.lock().unwrap().push((order_id, status));
            Ok(())
        }
    }

    fn reconciler(
        transactions: Arc<InMemoryTransactions>,
        sink: Arc<RecordingSink>,
    ) -> WebhookReconciler {
        WebhookReconciler::new(transactions, sink, SECRET.to_string())
    }

    fn succeeded_body(product_id: &str) -> Vec<u8> {
        format!(
            r#"{{"type":"payment.succeeded","data":{{"customer":{{"customer_id":"c1"}},"product_cart":[{{"product_id":"{product_id}","quantity":1}}],"payment_id":"pay1"}}}}"#
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn succeeded_webhook_settles_transaction_and_pushes_paid() {
        let order_id = Uuid::new_v4();
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", order_id));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions.clone(), sink.clone());

        let body = succeeded_body("pr1");
        let outcome = reconciler.handle(&sign(&body), &body).await.unwrap();

        let transaction = match outcome {
            WebhookOutcome::Applied(t) => t,
            other => panic!("expected Applied, got {other:?}"),
        };
        assert_eq!(transaction.status, TransactionStatus::Success);
        assert_eq!(transaction.payment_id.as_deref(), Some("pay1"));
        assert_eq!(
            sink.pushes.lock().unwrap().as_slice(),
            &[(order_id, OrderStatus::Paid)]
        );
    }

    #[tokio::test]
    async fn failed_webhook_pushes_payment_failed() {
        let order_id = Uuid::new_v4();
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", order_id));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions, sink.clone());

        let body = br#"{"type":"payment.failed","data":{"customer":{"customer_id":"c1"},"product_cart":[{"product_id":"pr1"}],"payment_id":"pay1"}}"#;
        let outcome = reconciler.handle(&sign(body), body).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Applied(t) if t.status == TransactionStatus::Failed));
        assert_eq!(
            sink.pushes.lock().unwrap().as_slice(),
            &[(order_id, OrderStatus::PaymentFailed)]
        );
    }

    #[tokio::test]
    async fn replay_is_a_noop_beyond_an_idempotent_repush() {
        let order_id = Uuid::new_v4();
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", order_id));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions.clone(), sink.clone());

        let body = succeeded_body("pr1");
        reconciler.handle(&sign(&body), &body).await.unwrap();
        let updated_at = transactions.rows.lock().unwrap()[0].updated_at;

        let outcome = reconciler.handle(&sign(&body), &body).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::AlreadyApplied(_)));
        // The row was not written a second time.
        assert_eq!(transactions.rows.lock().unwrap()[0].updated_at, updated_at);
        // The push is re-sent; the receiving side treats it as a no-op.
        assert_eq!(
            sink.pushes.lock().unwrap().as_slice(),
            &[(order_id, OrderStatus::Paid), (order_id, OrderStatus::Paid)]
        );
    }

    #[tokio::test]
    async fn invalid_signature_changes_nothing() {
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", Uuid::new_v4()));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions.clone(), sink.clone());

        let body = succeeded_body("pr1");
        let err = reconciler.handle("deadbeef", &body).await.unwrap_err();

        assert!(matches!(err, PaymentError::InvalidSignature));
        assert_eq!(
            transactions.rows.lock().unwrap()[0].status,
            TransactionStatus::Pending
        );
        assert!(sink.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signature_over_different_body_is_rejected() {
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", Uuid::new_v4()));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions, sink);

        let body = succeeded_body("pr1");
        let other = succeeded_body("pr2");
        let err = reconciler.handle(&sign(&other), &body).await.unwrap_err();

        assert!(matches!(err, PaymentError::InvalidSignature));
    }

    #[tokio::test]
    async fn unhandled_event_type_is_accepted_without_state_change() {
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", Uuid::new_v4()));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions.clone(), sink.clone());

        let body = br#"{"type":"payment.processing","data":{"customer":{"customer_id":"c1"},"product_cart":[{"product_id":"pr1"}],"payment_id":"pay1"}}"#;
        let outcome = reconciler.handle(&sign(body), body).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored(t) if t == "payment.processing"));
        assert_eq!(
            transactions.rows.lock().unwrap()[0].status,
            TransactionStatus::Pending
        );
        assert!(sink.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_surfaced() {
        let transactions = Arc::new(InMemoryTransactions::default());
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions, sink.clone());

        let body = succeeded_body("pr_missing");
        let err = reconciler.handle(&sign(&body), &body).await.unwrap_err();

        assert!(matches!(err, PaymentError::UnknownTransaction(id) if id == "pr_missing"));
        assert!(sink.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn conflicting_terminal_status_is_flagged_and_not_applied() {
        let order_id = Uuid::new_v4();
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", order_id));
        let sink = Arc::new(RecordingSink::default());
        let reconciler = reconciler(transactions.clone(), sink.clone());

        let body = succeeded_body("pr1");
        reconciler.handle(&sign(&body), &body).await.unwrap();

        let failed = br#"{"type":"payment.failed","data":{"customer":{"customer_id":"c1"},"product_cart":[{"product_id":"pr1"}],"payment_id":"pay2"}}"#;
        let err = reconciler.handle(&sign(failed), failed).await.unwrap_err();

        assert!(matches!(err, PaymentError::StatusConflict { .. }));
        let row = &transactions.rows.lock().unwrap()[0];
        assert_eq!(row.status, TransactionStatus::Success);
        assert_eq!(row.payment_id.as_deref(), Some("pay1"));
    }

    #[tokio::test]
    async fn status_push_failure_still_settles_the_transaction() {
        let transactions = Arc::new(InMemoryTransactions::with_pending("pr1", Uuid::new_v4()));
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let reconciler = reconciler(transactions.clone(), sink);

        let body = succeeded_body("pr1");
        let outcome = reconciler.handle(&sign(&body), &body).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Applied(_)));
        assert_eq!(
            transactions.rows.lock().unwrap()[0].status,
            TransactionStatus::Success
        );
    }
}
