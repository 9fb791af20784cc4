//! Каталог билетов/мест одного события в одной из трёх форм.
//!
//! Форма задаётся явным тегом `event_type`, а не угадывается по содержимому
//! ответа. Все потребители разбирают варианты через `match`.

use serde::{Deserialize, Serialize};

use super::{EventKind, EventSummary, Seat, Showtime, ShowtimeTickets, TicketType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketCatalog {
    pub event: EventSummary,
    #[serde(default)]
    pub showtimes: Vec<ShowtimeTickets>,
}

impl TicketCatalog {
    pub fn showtime(&self, showtime_id: i64) -> Option<&ShowtimeTickets> {
        self.showtimes.iter().find(|s| s.showtime.id == showtime_id)
    }

    /// Ближайший по времени сеанс.
    pub fn earliest_showtime(&self) -> Option<&ShowtimeTickets> {
        self.showtimes.iter().min_by_key(|s| s.showtime.start_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatCatalog {
    pub event: EventSummary,
    pub showtime: Showtime,
    #[serde(default)]
    pub seats: Vec<Seat>,
}

impl SeatCatalog {
    pub fn seat(&self, seat_id: i64) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum Catalog {
    General(TicketCatalog),
    Zoned(TicketCatalog),
    Seated(SeatCatalog),
}

impl Catalog {
    pub fn kind(&self) -> EventKind {
        match self {
            Catalog::General(_) => EventKind::General,
            Catalog::Zoned(_) => EventKind::Zoned,
            Catalog::Seated(_) => EventKind::Seated,
        }
    }

    pub fn event(&self) -> &EventSummary {
        match self {
            Catalog::General(c) | Catalog::Zoned(c) => &c.event,
            Catalog::Seated(c) => &c.event,
        }
    }

    /// Типы билетов выбранного сеанса; для seated-каталога всегда пусто.
    pub fn ticket_types(&self, showtime_id: i64) -> &[TicketType] {
        match self {
            Catalog::General(c) | Catalog::Zoned(c) => c
                .showtime(showtime_id)
                .map(|s| s.ticket_types.as_slice())
                .unwrap_or(&[]),
            Catalog::Seated(_) => &[],
        }
    }

    pub fn has_showtime(&self, showtime_id: i64) -> bool {
        match self {
            Catalog::General(c) | Catalog::Zoned(c) => c.showtime(showtime_id).is_some(),
            Catalog::Seated(c) => c.showtime.id == showtime_id,
        }
    }
}
