use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use merx_api::{webhook_app, PaymentState};
use merx_core::BoxError;
use merx_order::models::OrderStatus;
use merx_order::repository::OrderStatusSink;
use merx_payment::checkout::CheckoutService;
use merx_payment::models::{Customer, Transaction, TransactionStatus};
use merx_payment::provider::MockPaymentProvider;
use merx_payment::registry::CustomerRegistry;
use merx_payment::repository::{CustomerRepository, TransactionRepository};
use merx_payment::webhook::{WebhookReconciler, SIGNATURE_HEADER};

const SECRET: &str = "whsec_integration";

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Default)]
struct InMemoryCustomers {
    rows: Mutex<Vec<Customer>>,
}

#[async_trait]
impl CustomerRepository for InMemoryCustomers {
    async fn find_by_account(&self, account_id: i64) -> Result<Option<Customer>, BoxError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.account_id == account_id)
            .cloned())
    }

    async fn save(&self, customer: &Customer) -> Result<(), BoxError> {
        self.rows.lock().unwrap().push(customer.clone());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryTransactions {
    rows: Mutex<Vec<Transaction>>,
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
}

#[async_trait]
impl OrderStatusSink for RecordingSink {
    async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), BoxError> {
        self.pushes.lock().unwrap().push((order_id, status));
        Ok(())
    }
}

fn app(
    transactions: Arc<InMemoryTransactions>,
    sink: Arc<RecordingSink>,
) -> axum::Router {
    let provider = Arc::new(MockPaymentProvider::default());
    let deadline = Duration::from_secs(3);
    let checkout = CheckoutService::new(
        CustomerRegistry::new(Arc::new(InMemoryCustomers::default()), provider.clone(), deadline),
        provider,
        transactions.clone(),
        sink.clone(),
        "https://checkout.example.com/buy".to_string(),
        deadline,
    );
    let reconciler = WebhookReconciler::new(transactions, sink, SECRET.to_string());

    webhook_app(PaymentState {
        checkout: Arc::new(checkout),
        reconciler: Arc::new(reconciler),
    })
}

fn seeded(product_id: &str, order_id: Uuid) -> Arc<InMemoryTransactions> {
    let transactions = Arc::new(InMemoryTransactions::default());
    transactions.rows.lock().unwrap().push(Transaction::pending(
        product_id.to_string(),
        order_id,
        42,
        "c1".to_string(),
        2500,
        "USD".to_string(),
    ));
    transactions
}

fn webhook_request(body: &[u8], signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/payment")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

fn succeeded_body(product_id: &str) -> Vec<u8> {
    format!(
        r#"{{"type":"payment.succeeded","data":{{"customer":{{"customer_id":"c1"}},"product_cart":[{{"product_id":"{product_id}"}}],"payment_id":"pay1"}}}}"#
    )
    .into_bytes()
}

#[tokio::test]
async fn valid_webhook_settles_transaction_and_pushes_paid() {
    let order_id = Uuid::new_v4();
    let transactions = seeded("pr1", order_id);
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions.clone(), sink.clone());

    let body = succeeded_body("pr1");
    let response = app.oneshot(webhook_request(&body, &sign(&body))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let row = transactions.rows.lock().unwrap()[0].clone();
    assert_eq!(row.status, TransactionStatus::Success);
    assert_eq!(row.payment_id.as_deref(), Some("pay1"));
    assert_eq!(
        sink.pushes.lock().unwrap().as_slice(),
        &[(order_id, OrderStatus::Paid)]
    );
}

#[tokio::test]
async fn replayed_webhook_changes_nothing_and_still_acks() {
    let order_id = Uuid::new_v4();
    let transactions = seeded("pr1", order_id);
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions.clone(), sink.clone());

    let body = succeeded_body("pr1");
    let first = app
        .clone()
        .oneshot(webhook_request(&body, &sign(&body)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let settled_at = transactions.rows.lock().unwrap()[0].updated_at;

    let second = app.oneshot(webhook_request(&body, &sign(&body))).await.unwrap();

    assert_eq!(second.status(), StatusCode::OK);
    let row = transactions.rows.lock().unwrap()[0].clone();
    assert_eq!(row.status, TransactionStatus::Success);
    assert_eq!(row.updated_at, settled_at);
    // The re-send of the terminal status is harmless: the order side
    // treats it as a no-op.
    assert!(sink
        .pushes
        .lock()
        .unwrap()
        .iter()
        .all(|push| *push == (order_id, OrderStatus::Paid)));
}

#[tokio::test]
async fn invalid_signature_is_rejected_with_400() {
    let transactions = seeded("pr1", Uuid::new_v4());
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions.clone(), sink.clone());

    let body = succeeded_body("pr1");
    let response = app.oneshot(webhook_request(&body, "deadbeef")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        transactions.rows.lock().unwrap()[0].status,
        TransactionStatus::Pending
    );
    assert!(sink.pushes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_rejected_with_400() {
    let transactions = Arc::new(InMemoryTransactions::default());
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions, sink);

    let body = b"{\"type\": \"payment.succeeded\"";
    let response = app.oneshot(webhook_request(body, &sign(body))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_post_method_is_rejected_with_405() {
    let transactions = Arc::new(InMemoryTransactions::default());
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions, sink);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/webhook/payment")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unhandled_event_type_is_acked_without_state_change() {
    let transactions = seeded("pr1", Uuid::new_v4());
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions.clone(), sink.clone());

    let body = br#"{"type":"refund.created","data":{"customer":{"customer_id":"c1"},"product_cart":[{"product_id":"pr1"}],"payment_id":"pay9"}}"#;
    let response = app.oneshot(webhook_request(body, &sign(body))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        transactions.rows.lock().unwrap()[0].status,
        TransactionStatus::Pending
    );
    assert!(sink.pushes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_transaction_is_acked_but_not_applied() {
    let transactions = Arc::new(InMemoryTransactions::default());
    let sink = Arc::new(RecordingSink::default());
    let app = app(transactions, sink.clone());

    let body = succeeded_body("pr_missing");
    let response = app.oneshot(webhook_request(&body, &sign(&body))).await.unwrap();

    // Acknowledged so the processor does not amplify its retries; the
    // mismatch itself is surfaced in logs.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.pushes.lock().unwrap().is_empty());
}
