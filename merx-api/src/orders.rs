use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::OrderState;
use merx_order::models::{Order, OrderStatus, RequestedItem, StatusChange};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub account_id: i64,
    pub products: Vec<RequestedItem>,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub account_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub fn routes() -> Router<OrderState> {
    Router::new()
        .route("/v1/orders", post(place_order).get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/status", post(update_order_status))
}

/// POST /v1/orders
/// Place an order for the authenticated account.
async fn place_order(
    State(state): State<OrderState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state
        .orchestrator
        .place_order(request.account_id, request.products)
        .await
        .map_err(AppError::from_order)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /v1/orders/{id}
async fn get_order(
    State(state): State<OrderState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("order {order_id} not found")))?;

    Ok(Json(order))
}

/// GET /v1/orders?account_id=…
/// List an account's orders, newest first.
async fn list_orders(
    State(state): State<OrderState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .orders
        .orders_for_account(params.account_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(orders))
}

/// POST /v1/orders/{id}/status
/// Status push from the payment service. Idempotent: re-delivering the
/// current status is a no-op; contradicting a terminal status is a
/// conflict.
async fn update_order_status(
    State(state): State<OrderState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("order {order_id} not found")))?;

    match order.status.apply(request.status).map_err(AppError::from_order)? {
        StatusChange::Updated(status) => {
            state
                .orders
                .update_status(order_id, status)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            tracing::info!(order_id = %order_id, status = status.as_str(), "order status updated");
        }
        StatusChange::NoOp => {
            tracing::debug!(order_id = %order_id, "order already carries pushed status");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
