pub mod booking;
pub mod catalog;
pub mod event;
pub mod seat;
pub mod showtime;
pub mod ticket_type;

pub use booking::{BookingPayload, LineItem};
pub use catalog::{Catalog, SeatCatalog, TicketCatalog};
pub use event::{EventKind, EventSummary};
pub use seat::{Seat, SeatStatus, SeatType};
pub use showtime::{Location, Showtime, ShowtimeTickets};
pub use ticket_type::TicketType;
