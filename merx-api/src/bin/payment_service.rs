use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use merx_api::clients::{HttpOrderStatusSink, RestPaymentProvider};
use merx_api::{payment_app, webhook_app, PaymentState};
use merx_core::payment::PaymentProvider;
use merx_payment::checkout::CheckoutService;
use merx_payment::provider::MockPaymentProvider;
use merx_payment::registry::CustomerRegistry;
use merx_payment::webhook::WebhookReconciler;
use merx_store::{Config, DbClient, PgCustomerRepository, PgTransactionRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payment_service=debug,merx_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!(
        "Starting payment service on port {} (webhooks on {})",
        config.server.payment_port,
        config.server.webhook_port
    );

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let deadline = Duration::from_secs(config.collaborators.request_timeout_secs);

    // Test mode runs without processor credentials against the
    // in-process provider.
    let provider: Arc<dyn PaymentProvider> = if config.processor.test_mode {
        Arc::new(MockPaymentProvider::default())
    } else {
        Arc::new(
            RestPaymentProvider::new(
                config.processor.api_url.clone(),
                config.processor.api_key.clone(),
                deadline,
            )
            .expect("Failed to build processor client"),
        )
    };

    let order_status = Arc::new(
        HttpOrderStatusSink::new(config.collaborators.order_url.clone(), deadline)
            .expect("Failed to build order client"),
    );

    let customers = Arc::new(PgCustomerRepository::new(db.pool.clone()));
    let transactions = Arc::new(PgTransactionRepository::new(db.pool.clone()));

    let checkout = CheckoutService::new(
        CustomerRegistry::new(customers, provider.clone(), deadline),
        provider,
        transactions.clone(),
        order_status.clone(),
        config.processor.checkout_url.clone(),
        deadline,
    );
    let reconciler = WebhookReconciler::new(
        transactions,
        order_status,
        config.processor.webhook_secret.clone(),
    );

    let state = PaymentState {
        checkout: Arc::new(checkout),
        reconciler: Arc::new(reconciler),
    };

    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.server.payment_port));
    let webhook_addr = SocketAddr::from(([0, 0, 0, 0], config.server.webhook_port));

    let api_listener = tokio::net::TcpListener::bind(api_addr).await.unwrap();
    let webhook_listener = tokio::net::TcpListener::bind(webhook_addr).await.unwrap();
    tracing::info!("Listening on {} and {}", api_addr, webhook_addr);

    // Both listeners live and die together; losing either one is fatal.
    tokio::try_join!(
        axum::serve(api_listener, payment_app(state.clone())).into_future(),
        axum::serve(webhook_listener, webhook_app(state)).into_future(),
    )
    .expect("server failed");
}
