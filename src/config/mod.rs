use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub booking: BookingConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// `json` включает структурированные логи, всё остальное - обычный fmt.
    pub log_format: String,
}

// Настройки внешнего REST API (события, билеты, места, бронирования, оплата)
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// None - таймаут не выставляется вообще.
    pub timeout_seconds: Option<u64>,
}

// Правила выбора билетов и передачи заказа на страницу оплаты
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub payment_page_url: String,
    pub max_tickets_per_type: u32,
    pub max_seats: usize,
    pub session_ttl_seconds: u64,
    pub display_utc_offset_hours: i32,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            payment_page_url: "http://localhost:3000/payment".to_string(),
            max_tickets_per_type: 10,
            max_seats: 10,
            session_ttl_seconds: 1800,
            display_utc_offset_hours: 7,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 60,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &'static str, default: &str, expected: &'static str) -> Result<T, ConfigError> {
    let value = var_or(key, default);
    value.parse().map_err(|_| ConfigError::Invalid { key, expected, value })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_seconds = match env::var("BACKEND_TIMEOUT_SECONDS") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "BACKEND_TIMEOUT_SECONDS",
                expected: "number of seconds",
                value: raw,
            })?),
            _ => None,
        };

        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8000", "port number")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "ticket_checkout=debug,tower_http=debug"),
                log_format: var_or("LOG_FORMAT", "pretty"),
            },
            backend: BackendConfig {
                base_url: var_or("BACKEND_API_URL", "http://localhost:8080/api")
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds,
            },
            booking: BookingConfig {
                payment_page_url: var_or("PAYMENT_PAGE_URL", "http://localhost:3000/payment"),
                max_tickets_per_type: parse_var("MAX_TICKETS_PER_TYPE", "10", "number")?,
                max_seats: parse_var("MAX_SEATS", "10", "number")?,
                session_ttl_seconds: parse_var("SESSION_TTL_SECONDS", "1800", "number of seconds")?,
                display_utc_offset_hours: parse_var("DISPLAY_UTC_OFFSET_HOURS", "7", "hour offset")?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse_var("CIRCUIT_BREAKER_FAILURE_THRESHOLD", "5", "number")?,
                timeout_seconds: parse_var("CIRCUIT_BREAKER_TIMEOUT_SECONDS", "60", "number of seconds")?,
            },
        })
    }

    /// Конфигурация для тестов и локального запуска против заданного backend.
    pub fn for_backend(base_url: impl Into<String>) -> Self {
        Config {
            app: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                rust_log: "ticket_checkout=debug".to_string(),
                log_format: "pretty".to_string(),
            },
            backend: BackendConfig {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                timeout_seconds: None,
            },
            booking: BookingConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reports_key_on_garbage() {
        env::set_var("TICKET_CHECKOUT_TEST_PORT", "not-a-port");
        let err = parse_var::<u16>("TICKET_CHECKOUT_TEST_PORT", "8000", "port number").unwrap_err();
        assert!(err.to_string().contains("TICKET_CHECKOUT_TEST_PORT"));
        env::remove_var("TICKET_CHECKOUT_TEST_PORT");
    }

    #[test]
    fn for_backend_strips_trailing_slash() {
        let config = Config::for_backend("http://backend.local/api/");
        assert_eq!(config.backend.base_url, "http://backend.local/api");
        assert_eq!(config.booking.max_seats, 10);
        assert_eq!(config.booking.max_tickets_per_type, 10);
    }
}
