pub mod backend_client;
pub mod config;
pub mod controllers;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use backend_client::BackendClient;
use services::{
    catalog::CatalogFetcher,
    payment::{CircuitBreaker, PaymentInitiator},
    sessions::SessionStore,
};

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub catalog: CatalogFetcher,
    pub sessions: SessionStore,
    pub payments: PaymentInitiator,
    /// Часовой пояс, в котором показываем время сеанса.
    pub display_offset: FixedOffset,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, reqwest::Error> {
        let client = BackendClient::new(&config.backend)?;
        let circuit_breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));

        let hours = config.booking.display_utc_offset_hours;
        let display_offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| {
            warn!("Display offset {}h is out of range, falling back to UTC", hours);
            Utc.fix()
        });

        Ok(Arc::new(Self {
            catalog: CatalogFetcher::new(client.clone()),
            payments: PaymentInitiator::new(client, circuit_breaker),
            sessions: SessionStore::new(Duration::from_secs(config.booking.session_ttl_seconds)),
            display_offset,
            config,
        }))
    }
}

/// Полный роутер сервиса. Вынесен из main, чтобы интеграционные тесты
/// поднимали ровно то же приложение.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Ticket Checkout API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
