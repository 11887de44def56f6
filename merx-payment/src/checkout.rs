use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::models::Transaction;
use crate::registry::CustomerRegistry;
use crate::repository::TransactionRepository;
use crate::PaymentError;
use merx_core::payment::PaymentProvider;
use merx_order::models::OrderStatus;
use merx_order::repository::OrderStatusSink;

/// Everything needed to open one checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: Uuid,
    pub account_id: i64,
    pub email: String,
    pub name: String,
    pub redirect_url: String,
    /// Amount in minor units, as the processor expects it.
    pub amount: i64,
    pub currency: String,
}

/// Builds hosted checkout sessions: one single-use processor product
/// plus one pending transaction per attempt.
pub struct CheckoutService {
    registry: CustomerRegistry,
    provider: Arc<dyn PaymentProvider>,
    transactions: Arc<dyn TransactionRepository>,
    order_status: Arc<dyn OrderStatusSink>,
    checkout_base_url: String,
    deadline: Duration,
}

impl CheckoutService {
    pub fn new(
        registry: CustomerRegistry,
        provider: Arc<dyn PaymentProvider>,
        transactions: Arc<dyn TransactionRepository>,
        order_status: Arc<dyn OrderStatusSink>,
        checkout_base_url: String,
        deadline: Duration,
    ) -> Self {
        Self {
            registry,
            provider,
            transactions,
            order_status,
            checkout_base_url,
            deadline,
        }
    }

    /// Open a checkout session and return the redirect URL.
    ///
    /// If persisting the transaction fails after the processor already
    /// minted the product, the error is surfaced and the caller retries
    /// the whole checkout; the orphaned processor product is an accepted
    /// bounded cost. A retry mints a fresh product, so there is never a
    /// transaction without its product or a webhook match ambiguity.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<String, PaymentError> {
        let customer = self
            .registry
            .find_or_create(request.account_id, &request.email, &request.name)
            .await?;

        let product_id = tokio::time::timeout(
            self.deadline,
            self.provider
                .create_one_time_product(request.amount, &request.currency),
        )
        .await
        .map_err(|_| PaymentError::Upstream("product creation timed out".to_string()))?
        .map_err(|e| PaymentError::Provider(e.to_string()))?;

        let checkout_url = format!(
            "{}/{}?quantity=1&email={}&disableEmail=true&fullName={}&disableFullName=true&redirect_url={}",
            self.checkout_base_url, product_id, request.email, request.name, request.redirect_url
        );

        let transaction = Transaction::pending(
            product_id,
            request.order_id,
            request.account_id,
            customer.customer_id,
            request.amount,
            request.currency,
        );
        self.transactions
            .insert(&transaction)
            .await
            .map_err(|e| PaymentError::Storage(e.to_string()))?;

        tracing::info!(
            order_id = %request.order_id,
            product_id = %transaction.product_id,
            "checkout session opened"
        );

        // The order's visible status lags until the webhook lands if this
        // push fails; the terminal push re-converges it.
        if let Err(e) = self
            .order_status
            .update_status(request.order_id, OrderStatus::AwaitingPayment)
            .await
        {
            tracing::warn!(order_id = %request.order_id, "failed to mark order awaiting payment: {e}");
        }

        Ok(checkout_url)
    }

    /// Open a billing-portal session for an account.
    pub async fn portal_url(
        &self,
        account_id: i64,
        email: &str,
        name: &str,
    ) -> Result<String, PaymentError> {
        let customer = self.registry.find_or_create(account_id, email, name).await?;

        tokio::time::timeout(
            self.deadline,
            self.provider.create_portal_session(&customer.customer_id),
        )
        .await
        .map_err(|_| PaymentError::Upstream("portal session timed out".to_string()))?
        .map_err(|e| PaymentError::Provider(e.to_string()))
    }
}
