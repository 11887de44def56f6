use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod clients;
pub mod error;
pub mod orders;
pub mod payments;
pub mod state;
pub mod webhooks;

pub use state::{OrderState, PaymentState};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

/// Router for the order service.
pub fn order_app(state: OrderState) -> Router {
    Router::new()
        .merge(orders::routes())
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for the payment service's request/response API.
pub fn payment_app(state: PaymentState) -> Router {
    Router::new()
        .merge(payments::routes())
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for the webhook listener. Kept separate from the payment API
/// so the two can bind their own ports inside one process.
pub fn webhook_app(state: PaymentState) -> Router {
    Router::new()
        .merge(webhooks::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
