use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use merx_api::clients::{HttpAccountDirectory, HttpProductCatalog};
use merx_api::{order_app, OrderState};
use merx_order::orchestrator::OrderOrchestrator;
use merx_order::pricing::PriceResolver;
use merx_store::{Config, DbClient, EventProducer, PgOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_service=debug,merx_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting order service on port {}", config.server.order_port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let kafka = EventProducer::new(&config.kafka.brokers).expect("Failed to create Kafka producer");

    let deadline = Duration::from_secs(config.collaborators.request_timeout_secs);
    let accounts = HttpAccountDirectory::new(config.collaborators.account_url.clone(), deadline)
        .expect("Failed to build account client");
    let catalog = HttpProductCatalog::new(config.collaborators.catalog_url.clone(), deadline)
        .expect("Failed to build catalog client");

    let orders = Arc::new(PgOrderRepository::new(db.pool.clone()));
    let orchestrator = OrderOrchestrator::new(
        Arc::new(accounts),
        PriceResolver::new(Arc::new(catalog), deadline),
        orders.clone(),
        Arc::new(kafka),
        deadline,
    );

    let state = OrderState {
        orchestrator: Arc::new(orchestrator),
        orders,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.order_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, order_app(state)).await.unwrap();
}
