//! sessions.rs
//!
//! Страница бронирования: загрузка каталога, выбор билетов/мест, подтверждение.
//!
//! Каждая загрузка страницы открывает свою сессию выбора. Сессия живёт, пока
//! пользователь не ушёл со страницы (DELETE) или пока её не убрал фоновый sweeper.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiResult, BookingError},
    models::BookingPayload,
    services::{
        catalog::CatalogRequest,
        checkout::build_payload,
        selection::{SelectionLimits, SelectionState, ToggleOutcome},
        sessions::SessionView,
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/quantity", patch(set_quantity))
        .route("/sessions/{id}/seats/toggle", patch(toggle_seat))
        .route("/sessions/{id}/checkout", post(checkout))
}

// POST /api/sessions
async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CatalogRequest>,
) -> ApiResult<impl IntoResponse> {
    let catalog = state.catalog.fetch(&req).await?;
    let limits = SelectionLimits::from(&state.config.booking);
    let selection = SelectionState::new(catalog, req.showtime_id, limits)?;

    let view = state.sessions.open(req, selection);
    Ok((StatusCode::CREATED, Json(view)))
}

// GET /api/sessions/{id}
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    Ok(Json(state.sessions.view(id)?))
}

// DELETE /api/sessions/{id} - пользователь ушёл со страницы
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.close(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BookingError::SessionNotFound(id))
    }
}

// PATCH /api/sessions/{id}/quantity
#[derive(Debug, Deserialize, Validate)]
struct SetQuantityRequest {
    #[validate(range(min = 1, message = "ticket_type_id must be > 0"))]
    ticket_type_id: i64,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct SetQuantityResponse {
    quantity: u32,
    session: SessionView,
}

async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetQuantityRequest>,
) -> ApiResult<Json<SetQuantityResponse>> {
    req.validate()
        .map_err(|e| BookingError::Validation(e.to_string()))?;

    let (quantity, session) = state.sessions.update(id, |selection| {
        Ok(selection.set_quantity(req.ticket_type_id, req.quantity)?)
    })?;

    Ok(Json(SetQuantityResponse { quantity, session }))
}

// PATCH /api/sessions/{id}/seats/toggle
#[derive(Debug, Deserialize, Validate)]
struct ToggleSeatRequest {
    #[validate(range(min = 1, message = "seat_id must be > 0"))]
    seat_id: i64,
}

#[derive(Debug, Serialize)]
struct ToggleSeatResponse {
    outcome: ToggleOutcome,
    session: SessionView,
}

async fn toggle_seat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ToggleSeatRequest>,
) -> ApiResult<Json<ToggleSeatResponse>> {
    req.validate()
        .map_err(|e| BookingError::Validation(e.to_string()))?;

    let (outcome, session) = state
        .sessions
        .update(id, |selection| Ok(selection.toggle_seat(req.seat_id)?))?;

    Ok(Json(ToggleSeatResponse { outcome, session }))
}

// POST /api/sessions/{id}/checkout
#[derive(Debug, Serialize)]
struct CheckoutResponse {
    success: bool,
    payment_url: String,
    query: String,
    payload: BookingPayload,
}

async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CheckoutResponse>> {
    let session = state.sessions.snapshot(id)?;
    if session.state.selection.is_empty() {
        return Err(BookingError::EmptySelection);
    }

    // Каталог перечитывается: сеанс мог исчезнуть, пока пользователь выбирал.
    let fresh = state.catalog.fetch(&session.request).await?;
    let payload = build_payload(&fresh, &session.state, &state.display_offset)?;

    let encode_failed = |e: serde_urlencoded::ser::Error| {
        tracing::error!("Failed to encode booking payload: {:?}", e);
        BookingError::Validation("could not prepare the order".to_string())
    };
    let query = payload.to_query().map_err(encode_failed)?;
    let payment_url = payload
        .payment_url(&state.config.booking.payment_page_url)
        .map_err(encode_failed)?;

    tracing::info!("Session {} checked out, redirecting to payment page", id);
    Ok(Json(CheckoutResponse {
        success: true,
        payment_url,
        query,
        payload,
    }))
}
