use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Booked,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatType {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    #[serde(alias = "row_label")]
    pub row: String,
    pub number: i32,
    pub seat_type: SeatType,
    /// Цена приходит строкой-десятичным числом, например "150000.00".
    pub price: String,
    pub status: SeatStatus,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    /// "A12" - ряд и номер места.
    pub fn position(&self) -> String {
        format!("{}{}", self.row, self.number)
    }
}
