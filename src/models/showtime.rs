use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::TicketType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub start_time: DateTime<FixedOffset>,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Сеанс вместе с типами билетов (general / zoned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowtimeTickets {
    #[serde(flatten)]
    pub showtime: Showtime,
    #[serde(default)]
    pub ticket_types: Vec<TicketType>,
}

impl ShowtimeTickets {
    pub fn ticket_type(&self, id: i64) -> Option<&TicketType> {
        self.ticket_types.iter().find(|t| t.id == id)
    }
}
