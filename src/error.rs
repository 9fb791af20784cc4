//! error.rs
//!
//! Единая таксономия ошибок сценария бронирования и её отображение в HTTP-ответы.
//!
//! Ничего не повторяется автоматически: каждая ошибка завершает текущую попытку,
//! а повтор - это явное действие пользователя.
//! 1.  **Загрузка каталога** - блокирующий экран ошибки с перезагрузкой страницы.
//! 2.  **Валидация** (ничего не выбрано) - информационное уведомление, состояние не меняется.
//! 3.  **Устаревшие данные** (сеанс пропал из свежего каталога) - ошибка, выбор сохраняется.
//! 4.  **Бронирование/оплата** - ошибка с сообщением backend, выбор сохраняется.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::services::{checkout::CheckoutError, selection::SelectionError};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("failed to load tickets: {0}")]
    CatalogUnavailable(String),
    #[error("{0}")]
    Validation(String),
    #[error("please select at least one ticket or seat")]
    EmptySelection,
    #[error("the selected showtime is no longer available: {0}")]
    StaleCatalog(String),
    #[error("{0}")]
    Downstream(String),
    #[error("booking service is temporarily unavailable, please try again later")]
    CircuitOpen,
    #[error("booking session {0} not found")]
    SessionNotFound(Uuid),
    #[error("authorization required")]
    Unauthorized,
    #[error("booking not found")]
    BookingNotFound,
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl From<CheckoutError> for BookingError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptySelection => BookingError::EmptySelection,
            CheckoutError::StaleCatalog(reason) => BookingError::StaleCatalog(reason),
        }
    }
}

/// Как страница должна показать ошибку.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Notice {
    /// Короткое информационное уведомление.
    Info,
    /// Уведомление об ошибке.
    Error,
}

#[derive(Serialize)]
pub struct ApiError {
    success: bool,
    kind: Notice,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry: Option<&'static str>,
}

impl BookingError {
    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::CatalogUnavailable(_) => StatusCode::BAD_GATEWAY,
            BookingError::Validation(_) | BookingError::EmptySelection => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::StaleCatalog(_) => StatusCode::CONFLICT,
            BookingError::Downstream(_) => StatusCode::BAD_GATEWAY,
            BookingError::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::SessionNotFound(_) | BookingError::BookingNotFound => StatusCode::NOT_FOUND,
            BookingError::Unauthorized => StatusCode::UNAUTHORIZED,
            BookingError::Selection(SelectionError::UnknownTicketType(_)) => StatusCode::NOT_FOUND,
            BookingError::Selection(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            BookingError::Validation(_) | BookingError::EmptySelection => Notice::Info,
            _ => Notice::Error,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            BookingError::CatalogUnavailable(_) | BookingError::Downstream(_) | BookingError::CircuitOpen => {
                tracing::error!("booking flow failed: {}", self);
            }
            _ => tracing::warn!("booking request rejected: {}", self),
        }

        let retry = match self {
            BookingError::CatalogUnavailable(_) => Some("reload"),
            _ => None,
        };
        let body = ApiError {
            success: false,
            kind: self.notice(),
            message: self.to_string(),
            retry,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, BookingError>;
