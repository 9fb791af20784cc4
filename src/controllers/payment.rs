use axum::{
    extract::{RawQuery, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    error::{ApiResult, BookingError},
    middleware::AuthToken,
    models::BookingPayload,
    services::{
        payment::PaymentOrder,
        payment_result::PaymentResult,
        pricing::format_vnd,
        selection::SelectionLimits,
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payment", get(get_payment_page))
        .route("/payment/initiate", post(initiate_payment))
        .route("/payment/result", get(get_payment_result))
}

fn payload_from(state: &AppState, raw: Option<String>) -> Result<BookingPayload, BookingError> {
    let limits = SelectionLimits::from(&state.config.booking);
    BookingPayload::from_query(raw.as_deref().unwrap_or_default(), &limits).map_err(|e| {
        tracing::warn!("Payment page opened with unusable query: {}", e);
        BookingError::BookingNotFound
    })
}

/// GET /api/payment?eventId=..&tickets=..
async fn get_payment_page(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let payload = payload_from(&state, raw)?;
    let total_formatted = format_vnd(payload.total_amount);

    Ok(Json(json!({
        "success": true,
        "booking": payload,
        "total_formatted": total_formatted,
    })))
}

/// POST /api/payment/initiate?eventId=..&tickets=..
async fn initiate_payment(
    State(state): State<Arc<AppState>>,
    token: AuthToken,
    RawQuery(raw): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let payload = payload_from(&state, raw)?;
    let order = PaymentOrder::from_payload(&payload);

    let link = state.payments.initiate(&order, &token).await?;

    Ok(Json(json!({
        "success": true,
        "order_id": link.order_id,
        "checkout_url": link.checkout_url,
        "payment_link_id": link.payment_link_id,
    })))
}

/// GET /api/payment/result?code=00&status=PAID&orderCode=..
async fn get_payment_result(RawQuery(raw): RawQuery) -> Json<PaymentResult> {
    Json(PaymentResult::from_query(raw.as_deref().unwrap_or_default()))
}
