//! Order endpoints backed by the order saga.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, PartId, UserId};
use domain::{Order, PaymentMethod};
use serde::{Deserialize, Serialize};

use crate::DynOrderSaga;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub saga: DynOrderSaga,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_uuid: String,
    pub part_uuids: Vec<String>,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    pub payment_method: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_uuid: String,
    /// Minor units (cents).
    pub total_price: i64,
}

#[derive(Serialize)]
pub struct PayOrderResponse {
    pub transaction_uuid: String,
}

#[derive(Serialize)]
pub struct OrderDto {
    pub order_uuid: String,
    pub user_uuid: String,
    pub part_uuids: Vec<String>,
    pub total_price: i64,
    pub transaction_uuid: Option<String>,
    pub payment_method: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            order_uuid: order.id().to_string(),
            user_uuid: order.user_id().to_string(),
            part_uuids: order.part_ids().iter().map(ToString::to_string).collect(),
            total_price: order.total_price().cents(),
            transaction_uuid: order.transaction_id().map(|tx| tx.to_string()),
            payment_method: order.payment_method().to_string(),
            status: order.status().to_string(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().map(|at| at.to_rfc3339()),
        }
    }
}

// -- Handlers --

/// POST /api/v1/orders: create an order priced from the part catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let user_id = parse_id::<UserId>(&req.user_uuid, "user uuid")?;
    let part_ids = req
        .part_uuids
        .iter()
        .map(|id| parse_id::<PartId>(id, "part uuid"))
        .collect::<Result<Vec<_>, _>>()?;

    let (order_id, total) = state.saga.create(user_id, part_ids).await?;

    Ok(Json(CreateOrderResponse {
        order_uuid: order_id.to_string(),
        total_price: total.cents(),
    }))
}

/// GET /api/v1/orders/{order_uuid}: load an order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(order_uuid): Path<String>,
) -> Result<Json<OrderDto>, ApiError> {
    let order_id = parse_id::<OrderId>(&order_uuid, "order uuid")?;
    let order = state.saga.get(order_id).await?;
    Ok(Json(OrderDto::from(&order)))
}

/// POST /api/v1/orders/{order_uuid}/pay: charge the order.
#[tracing::instrument(skip(state, req))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(order_uuid): Path<String>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<PayOrderResponse>, ApiError> {
    let order_id = parse_id::<OrderId>(&order_uuid, "order uuid")?;
    let method = PaymentMethod::from_str(&req.payment_method)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let transaction_id = state.saga.pay(order_id, method).await?;

    Ok(Json(PayOrderResponse {
        transaction_uuid: transaction_id.to_string(),
    }))
}

/// POST /api/v1/orders/{order_uuid}/cancel: cancel an unpaid order.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(order_uuid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_id::<OrderId>(&order_uuid, "order uuid")?;
    state.saga.cancel(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id<T: FromStr>(value: &str, what: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{what} validation error")))
}
