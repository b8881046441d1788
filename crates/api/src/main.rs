//! Order service entry point: HTTP API plus the assembled-event consumer.

use std::sync::Arc;

use api::config::Config;
use domain::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};
use saga::{OrderAssembledHandler, SagaConfig};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use transport::{
    CancellationToken, ConsumerGroup, KafkaConsumerSource, KafkaProducer, LoggingMiddleware,
    MetricsMiddleware, Producer, Supervisor, shutdown_signal,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn order_repository(
    config: &Config,
) -> Result<Arc<dyn OrderRepository>, Box<dyn std::error::Error>> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let repository = PostgresOrderRepository::new(pool);
            repository.run_migrations().await?;
            tracing::info!("using postgres order repository");
            Ok(Arc::new(repository))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, orders are kept in memory");
            Ok(Arc::new(InMemoryOrderRepository::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing
    init_tracing();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    let config = Config::from_env();
    tracing::info!(?config, "starting order service");

    // 3. Storage, producer and application state
    let repository = order_repository(&config).await?;
    let producer: Arc<dyn Producer> = Arc::new(KafkaProducer::new(
        &config.brokers,
        config.order_paid_topic.clone(),
    )?);
    let state = api::create_default_state(
        Arc::clone(&repository),
        producer,
        SagaConfig {
            call_timeout: config.call_timeout,
        },
    );
    let app = api::create_app(state, metrics_handle);

    // 4. Assembled-event consumer
    let source = KafkaConsumerSource::new(
        &config.brokers,
        &config.group_id,
        &[config.order_assembled_topic.as_str()],
    )?;
    let group = ConsumerGroup::new(config.group_id.clone(), source)
        .with_middleware(LoggingMiddleware::new(config.group_id.clone()))
        .with_middleware(MetricsMiddleware);
    let handler = Arc::new(OrderAssembledHandler::new(repository));

    // 5. Run HTTP server and consumer under one shutdown token
    let shutdown = CancellationToken::new();
    let mut supervisor = Supervisor::new(shutdown.clone());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "starting API server");
    supervisor.spawn("http", {
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    });
    supervisor.spawn(config.group_id.clone(), {
        let shutdown = shutdown.clone();
        async move { group.consume(shutdown, handler).await }
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    supervisor.wait().await?;
    tracing::info!("server shut down gracefully");
    Ok(())
}
