//! Order service HTTP API with observability.
//!
//! Exposes the order saga over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::{Money, PartId};
use domain::{OrderRepository, Part};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    InMemoryInventoryClient, InMemoryPaymentClient, InventoryClient, OrderSaga, PaymentClient,
    SagaConfig,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use transport::Producer;
use uuid::Uuid;

pub use routes::orders::AppState;

/// The saga as wired into the HTTP layer, with every collaborator erased.
pub type DynOrderSaga = OrderSaga<
    Arc<dyn OrderRepository>,
    Arc<dyn InventoryClient>,
    Arc<dyn PaymentClient>,
    Arc<dyn Producer>,
>;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/orders", post(routes::orders::create))
        .route("/api/v1/orders/{order_uuid}", get(routes::orders::get))
        .route("/api/v1/orders/{order_uuid}/pay", post(routes::orders::pay))
        .route("/api/v1/orders/{order_uuid}/cancel", post(routes::orders::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Parts served by the in-process catalog, with fixed ids so clients can
/// order them.
pub fn demo_catalog() -> Vec<Part> {
    [
        (1, "Main engine", 500_000),
        (2, "Fuel tank", 120_000),
        (3, "Porthole", 15_000),
        (4, "Wing", 80_000),
    ]
    .into_iter()
    .map(|(n, name, cents)| {
        Part::new(PartId::from_uuid(Uuid::from_u128(n)), name, Money::from_cents(cents))
    })
    .collect()
}

/// Creates the application state from explicit collaborators.
pub fn create_state(
    repository: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryClient>,
    payment: Arc<dyn PaymentClient>,
    producer: Arc<dyn Producer>,
    config: SagaConfig,
) -> Arc<AppState> {
    Arc::new(AppState {
        saga: OrderSaga::with_config(repository, inventory, payment, producer, config),
    })
}

/// Creates the application state with the given storage and producer, and
/// in-process Inventory and Payment collaborators.
///
/// Payments are simulated: every charge is approved.
pub fn create_default_state(
    repository: Arc<dyn OrderRepository>,
    producer: Arc<dyn Producer>,
    config: SagaConfig,
) -> Arc<AppState> {
    tracing::warn!(
        parts = demo_catalog().len(),
        "using in-process demo catalog and simulated payments, every charge is approved"
    );
    let inventory: Arc<dyn InventoryClient> =
        Arc::new(InMemoryInventoryClient::with_parts(demo_catalog()));
    let payment: Arc<dyn PaymentClient> = Arc::new(InMemoryPaymentClient::new());

    create_state(repository, inventory, payment, producer, config)
}
