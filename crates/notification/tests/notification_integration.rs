//! Notification consumers over the in-memory broker and the Telegram client
//! against a local Bot API stub.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{EventId, OrderId, TransactionId, UserId};
use events::{ORDER_ASSEMBLED_TOPIC, ORDER_PAID_TOPIC, OrderAssembledEvent, OrderPaidEvent};
use notification::{
    InMemoryNotifier, Notifier, NotifyError, OrderAssembledNotificationHandler,
    OrderPaidNotificationHandler, TelegramConfig, TelegramNotifier,
};
use transport::{CancellationToken, ConsumerGroup, InMemoryBroker, LoggingMiddleware, Producer};

#[derive(Clone, Default)]
struct BotApi {
    received: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

async fn send_message(
    State(api): State<BotApi>,
    Path(token): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    if token == "botbad-token" {
        return StatusCode::UNAUTHORIZED;
    }
    api.received.lock().unwrap().push((token, body));
    StatusCode::OK
}

async fn spawn_bot_api() -> (String, BotApi) {
    let api = BotApi::default();
    let app = Router::new()
        .route("/{token}/sendMessage", post(send_message))
        .with_state(api.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), api)
}

async fn wait_for_sent(notifier: &InMemoryNotifier, count: usize) {
    for _ in 0..200 {
        if notifier.sent().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("never sent {count} notifications");
}

mod telegram {
    use super::*;

    #[tokio::test]
    async fn posts_text_to_configured_chat() {
        let (url, api) = spawn_bot_api().await;
        let notifier = TelegramNotifier::with_api_url(
            &TelegramConfig {
                token: "123:abc".to_string(),
                chat_id: "42".to_string(),
            },
            &url,
        );

        notifier.send("Order paid").await.unwrap();

        let received = api.received.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "bot123:abc");
        assert_eq!(received[0].1["chat_id"], "42");
        assert_eq!(received[0].1["text"], "Order paid");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (url, api) = spawn_bot_api().await;
        let notifier = TelegramNotifier::with_api_url(
            &TelegramConfig {
                token: "bad-token".to_string(),
                chat_id: "42".to_string(),
            },
            &url,
        );

        let result = notifier.send("Order paid").await;

        assert!(matches!(result, Err(NotifyError::Rejected { status: 401, .. })));
        assert!(api.received.lock().unwrap().is_empty());
    }
}

mod consumers {
    use super::*;

    #[tokio::test]
    async fn paid_and_assembled_each_notify_once() {
        let broker = InMemoryBroker::new();
        let notifier = InMemoryNotifier::new();
        let shutdown = CancellationToken::new();

        let paid_group = ConsumerGroup::new(
            "notification-order-paid",
            broker.subscribe("notification-order-paid", &[ORDER_PAID_TOPIC]),
        )
        .with_middleware(LoggingMiddleware::new("notification-order-paid"));
        let assembled_group = ConsumerGroup::new(
            "notification-order-assembled",
            broker.subscribe("notification-order-assembled", &[ORDER_ASSEMBLED_TOPIC]),
        );

        let paid_task = tokio::spawn({
            let handler = Arc::new(OrderPaidNotificationHandler::new(notifier.clone()));
            let shutdown = shutdown.clone();
            async move { paid_group.consume(shutdown, handler).await.unwrap() }
        });
        let assembled_task = tokio::spawn({
            let handler = Arc::new(OrderAssembledNotificationHandler::new(notifier.clone()));
            let shutdown = shutdown.clone();
            async move { assembled_group.consume(shutdown, handler).await.unwrap() }
        });

        let order_id = OrderId::new();
        let user_id = UserId::new();
        let key = order_id.to_string();
        let paid = OrderPaidEvent {
            event_id: EventId::new(),
            order_id,
            user_id,
            payment_method: "SBP".to_string(),
            transaction_id: TransactionId::new(),
        };
        broker
            .producer(ORDER_PAID_TOPIC)
            .send(key.as_bytes(), &paid.encode())
            .await
            .unwrap();
        let assembled = OrderAssembledEvent {
            event_id: EventId::new(),
            order_id,
            user_id,
            build_time_sec: 10,
        };
        broker
            .producer(ORDER_ASSEMBLED_TOPIC)
            .send(key.as_bytes(), &assembled.encode())
            .await
            .unwrap();

        wait_for_sent(&notifier, 2).await;
        let sent = notifier.sent();
        assert_eq!(sent.iter().filter(|t| t.starts_with("Order paid")).count(), 1);
        assert_eq!(sent.iter().filter(|t| t.starts_with("Order assembled")).count(), 1);

        shutdown.cancel();
        paid_task.await.unwrap();
        assembled_task.await.unwrap();
    }
}
