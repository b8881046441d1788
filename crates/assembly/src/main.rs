//! Assembly service entry point.

use std::sync::Arc;

use assembly::{AssemblyHandler, Config};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use transport::{
    CancellationToken, ConsumerGroup, KafkaConsumerSource, KafkaProducer, LoggingMiddleware,
    MetricsMiddleware, Supervisor, shutdown_signal,
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env();
    tracing::info!(?config, "starting assembly service");

    let producer = KafkaProducer::new(&config.brokers, config.order_assembled_topic.clone())?;
    let source = KafkaConsumerSource::new(
        &config.brokers,
        &config.group_id,
        &[config.order_paid_topic.as_str()],
    )?;

    let group = ConsumerGroup::new(config.group_id.clone(), source)
        .with_middleware(LoggingMiddleware::new(config.group_id.clone()))
        .with_middleware(MetricsMiddleware);
    let handler = Arc::new(AssemblyHandler::new(producer, config.build_time));

    let shutdown = CancellationToken::new();
    let mut supervisor = Supervisor::new(shutdown.clone());
    supervisor.spawn(config.group_id.clone(), {
        let shutdown = shutdown.clone();
        async move { group.consume(shutdown, handler).await }
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    supervisor.wait().await?;
    tracing::info!("assembly service shut down gracefully");
    Ok(())
}
