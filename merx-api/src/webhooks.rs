use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};

use crate::state::PaymentState;
use merx_payment::webhook::{WebhookOutcome, SIGNATURE_HEADER};
use merx_payment::PaymentError;

pub fn routes() -> Router<PaymentState> {
    Router::new().route("/webhook/payment", post(handle_payment_webhook))
}

/// POST /webhook/payment
/// Processor-initiated payment outcome callbacks.
///
/// Once the delivery is structurally valid and signature-verified, the
/// processor gets 200 no matter what happened internally: its retries
/// exist for transport failures, and a backend error must not turn into
/// a retry storm. Integrity violations are logged for the operator
/// instead.
async fn handle_payment_webhook(
    State(state): State<PaymentState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    match state.reconciler.handle(signature, &body).await {
        Ok(WebhookOutcome::Applied(transaction)) => {
            tracing::info!(
                order_id = %transaction.order_id,
                product_id = %transaction.product_id,
                status = transaction.status.as_str(),
                "webhook applied"
            );
            StatusCode::OK
        }
        Ok(WebhookOutcome::AlreadyApplied(transaction)) => {
            tracing::info!(
                product_id = %transaction.product_id,
                "webhook re-delivery, outcome already applied"
            );
            StatusCode::OK
        }
        Ok(WebhookOutcome::Ignored(_)) => StatusCode::OK,
        Err(PaymentError::InvalidSignature) => {
            tracing::warn!("webhook rejected: invalid signature");
            StatusCode::BAD_REQUEST
        }
        Err(PaymentError::MalformedPayload(reason)) => {
            tracing::warn!("webhook rejected: malformed payload: {reason}");
            StatusCode::BAD_REQUEST
        }
        Err(err) => {
            // Unknown transactions, terminal-status contradictions and
            // storage failures need an operator, not a processor retry.
            tracing::error!("webhook processing failed: {err}");
            StatusCode::OK
        }
    }
}
