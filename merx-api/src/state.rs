use std::sync::Arc;

use merx_order::orchestrator::OrderOrchestrator;
use merx_order::repository::OrderRepository;
use merx_payment::checkout::CheckoutService;
use merx_payment::webhook::WebhookReconciler;

#[derive(Clone)]
pub struct OrderState {
    pub orchestrator: Arc<OrderOrchestrator>,
    pub orders: Arc<dyn OrderRepository>,
}

#[derive(Clone)]
pub struct PaymentState {
    pub checkout: Arc<CheckoutService>,
    pub reconciler: Arc<WebhookReconciler>,
}
