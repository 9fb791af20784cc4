use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::EventKind;

/// Строка заказа: тип билета (quantity >= 1) или конкретное место (quantity = 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: i64,
    pub label: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Неизменяемое описание заказа, которое уходит на страницу оплаты.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub event_id: i64,
    pub event_name: String,
    pub event_kind: EventKind,
    pub showtime_id: i64,
    pub showtime: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub items: Vec<LineItem>,
    pub total_amount: f64,
    pub total_quantity: u32,
}
