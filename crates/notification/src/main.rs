//! Notification service entry point.

use std::sync::Arc;

use notification::{
    Config, LogNotifier, Notifier, OrderAssembledNotificationHandler, OrderPaidNotificationHandler,
    TelegramNotifier,
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use transport::{
    CancellationToken, ConsumerGroup, KafkaConsumerSource, LoggingMiddleware, MetricsMiddleware,
    SharedHandler, Supervisor, shutdown_signal,
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

fn consumer_group(
    config: &Config,
    group_id: &str,
    topic: &str,
) -> Result<ConsumerGroup<KafkaConsumerSource>, transport::TransportError> {
    let source = KafkaConsumerSource::new(&config.brokers, group_id, &[topic])?;
    Ok(ConsumerGroup::new(group_id, source)
        .with_middleware(LoggingMiddleware::new(group_id))
        .with_middleware(MetricsMiddleware))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env();
    tracing::info!(?config, "starting notification service");

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => Arc::new(TelegramNotifier::new(telegram)),
        None => {
            tracing::warn!("telegram is not configured, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let paid_group = consumer_group(&config, &config.paid_group_id, &config.order_paid_topic)?;
    let paid_handler: SharedHandler =
        Arc::new(OrderPaidNotificationHandler::new(Arc::clone(&notifier)));
    let assembled_group = consumer_group(
        &config,
        &config.assembled_group_id,
        &config.order_assembled_topic,
    )?;
    let assembled_handler: SharedHandler =
        Arc::new(OrderAssembledNotificationHandler::new(notifier));

    let shutdown = CancellationToken::new();
    let mut supervisor = Supervisor::new(shutdown.clone());
    supervisor.spawn(config.paid_group_id.clone(), {
        let shutdown = shutdown.clone();
        async move { paid_group.consume(shutdown, paid_handler).await }
    });
    supervisor.spawn(config.assembled_group_id.clone(), {
        let shutdown = shutdown.clone();
        async move { assembled_group.consume(shutdown, assembled_handler).await }
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    supervisor.wait().await?;
    tracing::info!("notification service shut down gracefully");
    Ok(())
}
