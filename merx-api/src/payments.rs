use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::PaymentState;
use merx_payment::checkout::CheckoutRequest;

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub order_id: Uuid,
    pub account_id: i64,
    pub email: String,
    pub name: String,
    pub redirect_url: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct PortalBody {
    pub account_id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

pub fn routes() -> Router<PaymentState> {
    Router::new()
        .route("/v1/checkout", post(checkout))
        .route("/v1/portal", post(portal))
}

/// POST /v1/checkout
/// Open a hosted checkout session for an order.
async fn checkout(
    State(state): State<PaymentState>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<RedirectResponse>, AppError> {
    let url = state
        .checkout
        .checkout(CheckoutRequest {
            order_id: body.order_id,
            account_id: body.account_id,
            email: body.email,
            name: body.name,
            redirect_url: body.redirect_url,
            amount: body.amount,
            currency: body.currency,
        })
        .await
        .map_err(AppError::from_payment)?;

    Ok(Json(RedirectResponse { url }))
}

/// POST /v1/portal
/// Open a billing-portal session for an account.
async fn portal(
    State(state): State<PaymentState>,
    Json(body): Json<PortalBody>,
) -> Result<Json<RedirectResponse>, AppError> {
    let url = state
        .checkout
        .portal_url(body.account_id, &body.email, &body.name)
        .await
        .map_err(AppError::from_payment)?;

    Ok(Json(RedirectResponse { url }))
}
