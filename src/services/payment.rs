//! payment.rs
//!
//! Граница с оплатой: превращает готовый заказ в ссылку на страницу оплаты.
//!
//! Ключевые компоненты:
//! 1.  **CircuitBreaker**: "Автоматический выключатель" для вызовов backend-а.
//!     Пока backend считается упавшим, запросы сразу отклоняются. Повторов нет:
//!     каждая ошибка завершает попытку, повторяет пользователь.
//! 2.  **PaymentInitiator**: два последовательных вызова - создание бронирования,
//!     затем создание платёжной ссылки. Если первый вызов упал, второй не выполняется.
//!     На стороне клиента ничего не сохраняется до редиректа.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::{
    backend_client::{BackendClient, BackendError},
    config::CircuitBreakerConfig,
    error::BookingError,
    middleware::AuthToken,
    models::{BookingPayload, EventKind},
};

/// Состояния "Автоматического выключателя" (Circuit Breaker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// **Closed (Замкнуто)**: Нормальный режим работы. Запросы разрешены.
    Closed,
    /// **Open (Разомкнуто)**: Запросы временно запрещены после серии сбоев.
    Open,
    /// **HalfOpen (Полуоткрыто)**: После таймаута пропускается пробный запрос.
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    /// Счетчик последовательных сбоев.
    failure_count: u32,
    /// Момент последнего сбоя для расчета таймаута.
    last_failure: Option<Instant>,
}

/// Реализация паттерна "Автоматический выключатель" для контроля доступа к backend-у.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    /// Порог сбоев, после которого выключатель переходит в состояние Open.
    failure_threshold: u32,
    /// Длительность таймаута в состоянии Open, после которого происходит переход в HalfOpen.
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: timeout,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, Duration::from_secs(config.timeout_seconds))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Проверяет, можно ли выполнить следующий запрос.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let expired = inner
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.timeout_duration);
                if expired {
                    inner.state = CircuitState::HalfOpen;
                    info!("Circuit breaker transitioning to HalfOpen state");
                }
                expired
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.failure_threshold => {
                inner.state = CircuitState::Open;
                error!(
                    "Circuit breaker OPENED - {} failures reached threshold {}",
                    inner.failure_count, self.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                warn!("Circuit breaker test failed - returning to Open state");
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }
}

// --- Модели данных для API бронирования и оплаты ---

/// Заказ для создания бронирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PaymentOrder {
    General { showtime_id: i64, quantity: u32 },
    Seated { showtime_id: i64, seat_ids: Vec<i64> },
}

impl PaymentOrder {
    pub fn from_payload(payload: &BookingPayload) -> Self {
        match payload.event_kind {
            EventKind::General | EventKind::Zoned => PaymentOrder::General {
                showtime_id: payload.showtime_id,
                quantity: payload.total_quantity,
            },
            EventKind::Seated => PaymentOrder::Seated {
                showtime_id: payload.showtime_id,
                seat_ids: payload.items.iter().map(|i| i.id).collect(),
            },
        }
    }

    pub fn showtime_id(&self) -> i64 {
        match self {
            PaymentOrder::General { showtime_id, .. } | PaymentOrder::Seated { showtime_id, .. } => *showtime_id,
        }
    }
}

/// Ответ backend-а на создание бронирования.
#[derive(Debug, Deserialize)]
struct CreateBookingResponse {
    #[serde(alias = "orderId")]
    order_id: i64,
}

#[derive(Debug, Serialize)]
struct CreatePaymentLinkRequest {
    order_id: i64,
}

/// Ответ backend-а на создание платёжной ссылки.
#[derive(Debug, Deserialize)]
struct PaymentLinkResponse {
    #[serde(rename = "checkoutUrl")]
    checkout_url: String,
    #[serde(default, rename = "paymentLinkId")]
    payment_link_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLink {
    pub order_id: i64,
    pub checkout_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link_id: Option<String>,
}

/// Клиент бронирования и оплаты поверх backend API.
#[derive(Clone)]
pub struct PaymentInitiator {
    client: BackendClient,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl PaymentInitiator {
    pub fn new(client: BackendClient, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            client,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Пропускает вызов backend-а через Circuit Breaker.
    /// Сбоем считаются только сетевые ошибки и 5xx; 4xx - это ответ по существу.
    async fn guarded<T, F>(&self, operation: F) -> Result<T, BookingError>
    where
        F: std::future::Future<Output = Result<T, BackendError>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking backend request");
            return Err(BookingError::CircuitOpen);
        }

        match operation.await {
            Ok(value) => {
                self.circuit_breaker.record_success();
                Ok(value)
            }
            Err(e) => {
                error!("Backend request failed: {:?}", e);
                match &e {
                    BackendError::Status { status, .. } if *status < 500 => self.circuit_breaker.record_success(),
                    _ => self.circuit_breaker.record_failure(),
                }
                Err(BookingError::Downstream(e.user_message()))
            }
        }
    }

    /// Создаёт бронирование, затем платёжную ссылку, и возвращает URL для редиректа.
    pub async fn initiate(&self, order: &PaymentOrder, token: &AuthToken) -> Result<PaymentLink, BookingError> {
        info!("Creating booking for showtime {}", order.showtime_id());

        let booking: CreateBookingResponse = self
            .guarded(self.client.post_json("/bookings", order, Some(token.as_str())))
            .await?;

        info!("Booking created: order_id={}, requesting payment link", booking.order_id);

        let request = CreatePaymentLinkRequest { order_id: booking.order_id };
        let link: PaymentLinkResponse = self
            .guarded(
                self.client
                    .post_json("/payments/create-link", &request, Some(token.as_str())),
            )
            .await?;

        if link.checkout_url.trim().is_empty() {
            return Err(BookingError::Downstream("payment link was not returned".to_string()));
        }

        info!("Payment link created for order {}", booking.order_id);
        Ok(PaymentLink {
            order_id: booking.order_id,
            checkout_url: link.checkout_url,
            payment_link_id: link.payment_link_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::models::LineItem;

    fn initiator(url: String) -> PaymentInitiator {
        let client = BackendClient::new(&BackendConfig { base_url: url, timeout_seconds: None }).unwrap();
        PaymentInitiator::new(client, Arc::new(CircuitBreaker::new(2, Duration::from_secs(60))))
    }

    fn token() -> AuthToken {
        AuthToken::new("user-token")
    }

    #[test]
    fn breaker_opens_after_threshold() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.record_failure();
        assert!(breaker.can_execute());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn breaker_half_opens_after_timeout() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn order_body_matches_backend_contract() {
        let general = PaymentOrder::General { showtime_id: 11, quantity: 2 };
        assert_eq!(
            serde_json::to_value(&general).unwrap(),
            serde_json::json!({"showtime_id": 11, "quantity": 2})
        );
        let seated = PaymentOrder::Seated { showtime_id: 21, seat_ids: vec![100, 102] };
        assert_eq!(
            serde_json::to_value(&seated).unwrap(),
            serde_json::json!({"showtime_id": 21, "seat_ids": [100, 102]})
        );
    }

    #[test]
    fn seated_payload_becomes_seat_order() {
        let payload = BookingPayload {
            event_id: 8,
            event_name: "Symphony".into(),
            event_kind: EventKind::Seated,
            showtime_id: 21,
            showtime: None,
            location: None,
            address: None,
            items: vec![
                LineItem { id: 100, label: "Standard A1".into(), quantity: 1, unit_price: 150000.0 },
                LineItem { id: 102, label: "Standard B1".into(), quantity: 1, unit_price: 200000.0 },
            ],
            total_amount: 350000.0,
            total_quantity: 2,
        };
        assert_eq!(
            PaymentOrder::from_payload(&payload),
            PaymentOrder::Seated { showtime_id: 21, seat_ids: vec![100, 102] }
        );
    }

    #[tokio::test]
    async fn creates_booking_then_link() {
        let mut server = mockito::Server::new_async().await;
        let booking = server
            .mock("POST", "/bookings")
            .match_header("authorization", "Bearer user-token")
            .match_body(mockito::Matcher::Json(serde_json::json!({"showtime_id": 11, "quantity": 2})))
            .with_status(201)
            .with_body(r#"{"order_id": 555}"#)
            .create_async()
            .await;
        let link = server
            .mock("POST", "/payments/create-link")
            .match_body(mockito::Matcher::Json(serde_json::json!({"order_id": 555})))
            .with_status(200)
            .with_body(r#"{"checkoutUrl": "https://pay.example/555", "paymentLinkId": "pl_1"}"#)
            .create_async()
            .await;

        let order = PaymentOrder::General { showtime_id: 11, quantity: 2 };
        let result = initiator(server.url()).initiate(&order, &token()).await.unwrap();

        assert_eq!(result.order_id, 555);
        assert_eq!(result.checkout_url, "https://pay.example/555");
        booking.assert_async().await;
        link.assert_async().await;
    }

    #[tokio::test]
    async fn failed_booking_skips_payment_link() {
        let mut server = mockito::Server::new_async().await;
        let _booking = server
            .mock("POST", "/bookings")
            .with_status(409)
            .with_body(r#"{"message": "Not enough tickets left"}"#)
            .create_async()
            .await;
        let link = server
            .mock("POST", "/payments/create-link")
            .expect(0)
            .create_async()
            .await;

        let order = PaymentOrder::General { showtime_id: 11, quantity: 2 };
        let err = initiator(server.url()).initiate(&order, &token()).await.unwrap_err();

        match err {
            BookingError::Downstream(message) => assert_eq!(message, "Not enough tickets left"),
            other => panic!("unexpected error: {other:?}"),
        }
        link.assert_async().await;
    }

    #[tokio::test]
    async fn open_breaker_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let booking = server
            .mock("POST", "/bookings")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let initiator = initiator(server.url());
        let order = PaymentOrder::General { showtime_id: 11, quantity: 1 };
        for _ in 0..2 {
            assert!(matches!(
                initiator.initiate(&order, &token()).await,
                Err(BookingError::Downstream(_))
            ));
        }
        assert_eq!(initiator.circuit_state(), CircuitState::Open);
        assert!(matches!(
            initiator.initiate(&order, &token()).await,
            Err(BookingError::CircuitOpen)
        ));
        booking.assert_async().await;
    }
}
