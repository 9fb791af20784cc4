//! Общие тестовые каталоги.

use chrono::DateTime;

use crate::models::{
    Catalog, EventSummary, Location, Seat, SeatCatalog, SeatStatus, SeatType, Showtime, ShowtimeTickets,
    TicketCatalog, TicketType,
};

fn ticket(id: i64, name: Option<&str>, price: &str, quantity: Option<i64>) -> TicketType {
    TicketType {
        id,
        name: name.map(str::to_string),
        price: price.to_string(),
        quantity,
    }
}

pub fn showtime(id: i64, start: &str) -> Showtime {
    Showtime {
        id,
        start_time: DateTime::parse_from_rfc3339(start).unwrap(),
        location: Some(Location {
            name: "Hall A".to_string(),
            address: Some("1 Main St".to_string()),
        }),
    }
}

/// Сеанс 11: тип 1 (без имени, 100000, остаток 5) и тип 2 (50000, остаток 0).
/// Сеанс 12 (позже): тип 3.
pub fn general_catalog() -> Catalog {
    Catalog::General(TicketCatalog {
        event: EventSummary { id: 5, name: "Rock Night".to_string() },
        showtimes: vec![
            ShowtimeTickets {
                showtime: showtime(12, "2026-11-03T19:30:00+07:00"),
                ticket_types: vec![ticket(3, Some("Late"), "80000", Some(50))],
            },
            ShowtimeTickets {
                showtime: showtime(11, "2026-11-02T19:30:00+07:00"),
                ticket_types: vec![
                    ticket(1, None, "100000", Some(5)),
                    ticket(2, Some("Balcony"), "50000", Some(0)),
                ],
            },
        ],
    })
}

fn seat(id: i64, row: &str, number: i32, price: &str, status: SeatStatus) -> Seat {
    Seat {
        id,
        row: row.to_string(),
        number,
        seat_type: SeatType { code: "STD".to_string(), name: "Standard".to_string() },
        price: price.to_string(),
        status,
    }
}

/// Место 100 свободно (150000), 101 занято, 102 свободно (200000), 103 отключено,
/// 104..=120 свободны.
pub fn seated_catalog() -> Catalog {
    let mut seats = vec![
        seat(100, "A", 1, "150000", SeatStatus::Available),
        seat(101, "A", 2, "150000", SeatStatus::Booked),
        seat(102, "B", 1, "200000", SeatStatus::Available),
        seat(103, "B", 2, "200000", SeatStatus::Disabled),
    ];
    seats.extend((104..=120).map(|id| seat(id, "C", (id - 103) as i32, "90000", SeatStatus::Available)));

    Catalog::Seated(SeatCatalog {
        event: EventSummary { id: 8, name: "Symphony".to_string() },
        showtime: showtime(21, "2026-12-01T20:00:00+07:00"),
        seats,
    })
}
