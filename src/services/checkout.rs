//! checkout.rs
//!
//! Сборка заказа в момент подтверждения выбора и его передача на страницу оплаты.
//!
//! Передача сделана без состояния: заказ целиком уезжает в query string,
//! строки заказа - JSON внутри percent-encoding. Страница оплаты разбирает
//! его обратно через `BookingPayload::from_query`, и любой битый или
//! отсутствующий параметр означает "бронирование не найдено".

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    models::{BookingPayload, Catalog, EventKind, LineItem},
    services::{
        pricing::parse_price,
        selection::{Selection, SelectionLimits, SelectionState},
    },
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("nothing selected")]
    EmptySelection,
    #[error("{0}")]
    StaleCatalog(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("booking not found: {0}")]
    NotFound(String),
}

fn not_found(reason: impl Into<String>) -> PayloadError {
    PayloadError::NotFound(reason.into())
}

/// Подпись билета без имени типа: время начала сеанса.
pub fn time_of_day_label(start: &DateTime<FixedOffset>, offset: &FixedOffset) -> String {
    format!("Suất {}", start.with_timezone(offset).format("%H:%M"))
}

/// Собирает заказ по свежезагруженному каталогу и текущему выбору.
/// Выбор при этом не трогается, так что при ошибке пользователь может повторить.
pub fn build_payload(
    fresh: &Catalog,
    state: &SelectionState,
    display_offset: &FixedOffset,
) -> Result<BookingPayload, CheckoutError> {
    if state.selection.is_empty() {
        return Err(CheckoutError::EmptySelection);
    }
    if fresh.kind() != state.catalog.kind() {
        return Err(CheckoutError::StaleCatalog(format!(
            "event type changed from {} to {}",
            state.catalog.kind(),
            fresh.kind()
        )));
    }

    let showtime_id = state.showtime_id;
    let stale = |what: String| {
        warn!("Checkout for showtime {} hit stale catalog: {}", showtime_id, what);
        CheckoutError::StaleCatalog(what)
    };

    let (showtime, items) = match (fresh, &state.selection) {
        (Catalog::General(c) | Catalog::Zoned(c), Selection::Quantities(quantities)) => {
            let entry = c
                .showtime(showtime_id)
                .ok_or_else(|| stale(format!("showtime {} not found", showtime_id)))?;

            let mut items = Vec::new();
            for (&ticket_type_id, &quantity) in quantities.iter().filter(|(_, q)| **q > 0) {
                let ticket_type = entry
                    .ticket_type(ticket_type_id)
                    .ok_or_else(|| stale(format!("ticket type {} not found", ticket_type_id)))?;
                let label = match ticket_type.display_name() {
                    Some(name) => name.to_string(),
                    None => time_of_day_label(&entry.showtime.start_time, display_offset),
                };
                items.push(LineItem {
                    id: ticket_type_id,
                    label,
                    quantity,
                    unit_price: parse_price(&ticket_type.price),
                });
            }
            (&entry.showtime, items)
        }
        (Catalog::Seated(c), Selection::Seats(selected)) => {
            if c.showtime.id != showtime_id {
                return Err(stale(format!("showtime {} not found", showtime_id)));
            }
            let mut items = Vec::with_capacity(selected.len());
            for &seat_id in selected {
                let seat = c
                    .seat(seat_id)
                    .ok_or_else(|| stale(format!("seat {} not found", seat_id)))?;
                items.push(LineItem {
                    id: seat.id,
                    label: format!("{} {}", seat.seat_type.name, seat.position()),
                    quantity: 1,
                    unit_price: parse_price(&seat.price),
                });
            }
            (&c.showtime, items)
        }
        _ => return Err(stale("selection does not match catalog".to_string())),
    };

    let total_quantity: u32 = items.iter().map(|i| i.quantity).sum();
    let total_amount: f64 = items.iter().map(LineItem::subtotal).sum();
    let event = fresh.event();

    info!(
        "Built booking payload: event={}, showtime={}, items={}, quantity={}",
        event.id,
        showtime_id,
        items.len(),
        total_quantity
    );

    Ok(BookingPayload {
        event_id: event.id,
        event_name: event.name.clone(),
        event_kind: fresh.kind(),
        showtime_id,
        showtime: Some(showtime.start_time),
        location: showtime.location.as_ref().map(|l| l.name.clone()),
        address: showtime.location.as_ref().and_then(|l| l.address.clone()),
        items,
        total_amount,
        total_quantity,
    })
}

/// Плоское представление заказа в query string страницы оплаты.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showtime_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quantity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, PayloadError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| not_found(format!("missing {}", name)))
}

fn parse_field<T: std::str::FromStr>(value: &Option<String>, name: &str) -> Result<T, PayloadError> {
    required(value, name)?
        .parse()
        .map_err(|_| not_found(format!("malformed {}", name)))
}

impl BookingPayload {
    pub fn to_query(&self) -> Result<String, serde_urlencoded::ser::Error> {
        let items = serde_json::to_string(&self.items)
            .map_err(|e| serde_urlencoded::ser::Error::Custom(e.to_string().into()))?;
        let (tickets, seats) = match self.event_kind {
            EventKind::General | EventKind::Zoned => (Some(items), None),
            EventKind::Seated => (None, Some(items)),
        };

        let query = PaymentPageQuery {
            event_id: Some(self.event_id.to_string()),
            event_name: Some(self.event_name.clone()),
            event_type: Some(self.event_kind.to_string()),
            showtime_id: Some(self.showtime_id.to_string()),
            showtime: self.showtime.map(|s| s.to_rfc3339()),
            location: self.location.clone(),
            address: self.address.clone(),
            total_amount: Some(self.total_amount.to_string()),
            total_quantity: Some(self.total_quantity.to_string()),
            tickets,
            seats,
        };
        serde_urlencoded::to_string(&query)
    }

    /// Ссылка на страницу оплаты с заказом в query string.
    pub fn payment_url(&self, payment_page_url: &str) -> Result<String, serde_urlencoded::ser::Error> {
        Ok(format!("{}?{}", payment_page_url, self.to_query()?))
    }

    /// Разбирает заказ со страницы оплаты. Query приходит от клиента, поэтому
    /// правила выбора проверяются заново.
    pub fn from_query(raw: &str, limits: &SelectionLimits) -> Result<BookingPayload, PayloadError> {
        let query: PaymentPageQuery = serde_urlencoded::from_str(raw.trim_start_matches('?'))
            .map_err(|e| not_found(format!("unreadable query: {}", e)))?;
        query.into_payload(limits)
    }
}

/// Проверяет строки заказа и возвращает их суммарное количество.
fn check_items(kind: EventKind, items: &[LineItem], limits: &SelectionLimits) -> Result<u32, PayloadError> {
    if items.is_empty() || items.iter().any(|i| i.quantity == 0) {
        return Err(not_found("empty order"));
    }

    let mut ids = BTreeSet::new();
    if !items.iter().all(|i| ids.insert(i.id)) {
        return Err(not_found("duplicate line items"));
    }

    match kind {
        EventKind::Seated => {
            if items.iter().any(|i| i.quantity != 1) {
                return Err(not_found("seat quantity must be 1"));
            }
            if items.len() > limits.max_seats {
                return Err(not_found("too many seats"));
            }
        }
        EventKind::General | EventKind::Zoned => {
            if items.iter().any(|i| i.quantity > limits.max_per_type) {
                return Err(not_found("too many tickets of one type"));
            }
        }
    }

    items
        .iter()
        .try_fold(0u32, |total, i| total.checked_add(i.quantity))
        .ok_or_else(|| not_found("totalQuantity overflow"))
}

impl PaymentPageQuery {
    fn into_payload(self, limits: &SelectionLimits) -> Result<BookingPayload, PayloadError> {
        let event_id: i64 = parse_field(&self.event_id, "eventId")?;
        let showtime_id: i64 = parse_field(&self.showtime_id, "showtimeId")?;
        if event_id <= 0 || showtime_id <= 0 {
            return Err(not_found("ids must be positive"));
        }
        let event_kind: EventKind = parse_field(&self.event_type, "eventType")?;
        let total_amount: f64 = parse_field(&self.total_amount, "totalAmount")?;
        let total_quantity: u32 = parse_field(&self.total_quantity, "totalQuantity")?;

        let (raw_items, name) = match event_kind {
            EventKind::General | EventKind::Zoned => (&self.tickets, "tickets"),
            EventKind::Seated => (&self.seats, "seats"),
        };
        let items: Vec<LineItem> = serde_json::from_str(required(raw_items, name)?)
            .map_err(|_| not_found(format!("malformed {}", name)))?;

        if check_items(event_kind, &items, limits)? != total_quantity {
            return Err(not_found("totalQuantity does not match line items"));
        }
        let expected_amount: f64 = items.iter().map(LineItem::subtotal).sum();
        if !total_amount.is_finite() || (expected_amount - total_amount).abs() >= 1.0 {
            return Err(not_found("totalAmount does not match line items"));
        }

        let showtime = match self.showtime.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw).map_err(|_| not_found("malformed showtime"))?,
            ),
            None => None,
        };

        Ok(BookingPayload {
            event_id,
            event_name: required(&self.event_name, "eventName")?.to_string(),
            event_kind,
            showtime_id,
            showtime,
            location: self.location.filter(|s| !s.is_empty()),
            address: self.address.filter(|s| !s.is_empty()),
            items,
            total_amount,
            total_quantity,
        })
    }
}
