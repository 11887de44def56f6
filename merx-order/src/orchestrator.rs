use std::sync::Arc;
use std::time::Duration;

use crate::models::{NewOrder, Order, RequestedItem};
use crate::pricing::PriceResolver;
use crate::repository::OrderRepository;
use crate::OrderError;
use merx_core::account::AccountDirectory;
use merx_core::events::{EventPublisher, InteractionEvent};

/// Topic the recommender consumes purchase interactions from.
pub const INTERACTION_TOPIC: &str = "interaction_events";

/// Upper bound for a single detached event publication. The event bus
/// client must never hold the task forever.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives order placement: account check, pricing, atomic persistence,
/// then detached best-effort purchase events.
pub struct OrderOrchestrator {
    accounts: Arc<dyn AccountDirectory>,
    resolver: PriceResolver,
    repository: Arc<dyn OrderRepository>,
    events: Arc<dyn EventPublisher>,
    deadline: Duration,
}

impl OrderOrchestrator {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        resolver: PriceResolver,
        repository: Arc<dyn OrderRepository>,
        events: Arc<dyn EventPublisher>,
        deadline: Duration,
    ) -> Self {
        Self {
            accounts,
            resolver,
            repository,
            events,
            deadline,
        }
    }

    /// Place an order for an account.
    ///
    /// Every step up to persistence is a hard dependency: a failure
    /// aborts the call with nothing written. The purchase events fired
    /// afterwards are best-effort and never block or roll back the
    /// order; the caller gets the order back as soon as the insert
    /// commits.
    pub async fn place_order(
        &self,
        account_id: i64,
        items: Vec<RequestedItem>,
    ) -> Result<Order, OrderError> {
        let account = tokio::time::timeout(self.deadline, self.accounts.get_account(account_id))
            .await
            .map_err(|_| OrderError::Upstream("account lookup timed out".to_string()))?
            .map_err(|e| OrderError::Upstream(format!("account lookup failed: {e}")))?;
        if account.is_none() {
            return Err(OrderError::UnknownAccount(account_id));
        }

        let products = self.resolver.resolve(&items).await?;
        if products.is_empty() {
            return Err(OrderError::NoValidItems);
        }

        let new_order = NewOrder::new(account_id, products);
        let order = self
            .repository
            .create_order(&new_order)
            .await
            .map_err(|e| OrderError::Storage(e.to_string()))?;

        tracing::info!(order_id = %order.id, account_id, total = %order.total_price, "order created");

        self.publish_purchases(&order);

        Ok(order)
    }

    /// Fire one purchase interaction per line item, detached from the
    /// request. Failures are logged and not retried; losing an event
    /// only degrades recommendations.
    fn publish_purchases(&self, order: &Order) {
        let publisher = self.events.clone();
        let account_id = order.account_id;
        let product_ids: Vec<String> = order
            .products
            .iter()
            .map(|p| p.product_id.clone())
            .collect();

        tokio::spawn(async move {
            for product_id in product_ids {
                let event = InteractionEvent::purchase(account_id, product_id.clone());
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!("failed to encode purchase event: {e}");
                        continue;
                    }
                };

                let key = account_id.to_string();
                let send = publisher.publish(INTERACTION_TOPIC, &key, &payload);
                match tokio::time::timeout(PUBLISH_TIMEOUT, send).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(product_id, "failed to publish purchase event: {e}");
                    }
                    Err(_) => {
                        tracing::warn!(product_id, "purchase event publication timed out");
                    }
                }
            }
        });
    }
}
