use serde::{Deserialize, Serialize};
use tracing::warn;

/// Итог оплаты для страницы результата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Paid,
    Pending,
    Cancelled,
    Failed,
    /// Параметры отсутствуют или не читаются - страница показывает нейтральное сообщение.
    Unknown,
}

// Параметры, с которыми платёжный шлюз возвращает пользователя.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReturnParams {
    code: Option<String>,
    id: Option<String>,
    cancel: Option<String>,
    status: Option<String>,
    order_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub outcome: PaymentOutcome,
    pub order_code: Option<i64>,
    pub payment_id: Option<String>,
}

impl PaymentResult {
    pub fn from_query(raw: &str) -> PaymentResult {
        let params: ReturnParams = match serde_urlencoded::from_str(raw.trim_start_matches('?')) {
            Ok(params) => params,
            Err(e) => {
                warn!("Unreadable payment return query: {}", e);
                ReturnParams::default()
            }
        };

        let cancelled = params.cancel.as_deref().is_some_and(|c| c.eq_ignore_ascii_case("true"));
        let status = params.status.as_deref().unwrap_or_default().to_ascii_uppercase();

        let outcome = match (params.code.as_deref(), status.as_str()) {
            _ if cancelled || status == "CANCELLED" => PaymentOutcome::Cancelled,
            (Some("00"), "PAID") => PaymentOutcome::Paid,
            (Some("00"), "PENDING" | "PROCESSING") => PaymentOutcome::Pending,
            (Some(code), _) if code != "00" => PaymentOutcome::Failed,
            _ => PaymentOutcome::Unknown,
        };

        PaymentResult {
            outcome,
            order_code: params.order_code.and_then(|c| c.trim().parse().ok()),
            payment_id: params.id.filter(|id| !id.is_empty()),
        }
    }
}
