//! selection.rs
//!
//! Состояние выбора пользователя поверх загруженного каталога.
//!
//! Для general/zoned хранится количество по каждому типу билета выбранного сеанса,
//! для seated - множество выбранных мест. Итоговая сумма здесь не хранится,
//! она всегда пересчитывается из (каталог, выбор), см. `pricing`.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::{
    config::BookingConfig,
    models::{Catalog, EventKind},
    services::pricing::Totals,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLimits {
    pub max_per_type: u32,
    pub max_seats: usize,
}

impl Default for SelectionLimits {
    fn default() -> Self {
        Self {
            max_per_type: 10,
            max_seats: 10,
        }
    }
}

impl From<&BookingConfig> for SelectionLimits {
    fn from(config: &BookingConfig) -> Self {
        Self {
            max_per_type: config.max_tickets_per_type,
            max_seats: config.max_seats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// ticket_type_id -> выбранное количество (general / zoned).
    Quantities(BTreeMap<i64, u32>),
    /// id выбранных мест (seated).
    Seats(BTreeSet<i64>),
}

impl Selection {
    pub fn total_quantity(&self) -> u32 {
        match self {
            Selection::Quantities(q) => q.values().sum(),
            Selection::Seats(s) => s.len() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_quantity() == 0
    }

    pub fn quantity(&self, ticket_type_id: i64) -> u32 {
        match self {
            Selection::Quantities(q) => q.get(&ticket_type_id).copied().unwrap_or(0),
            Selection::Seats(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("ticket type {0} is not part of this showtime")]
    UnknownTicketType(i64),
    #[error("showtime {0:?} is not part of this catalog")]
    ShowtimeNotFound(Option<i64>),
    #[error("{operation} is not supported for {kind} events")]
    WrongEventKind { operation: &'static str, kind: EventKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    Unavailable,
    LimitReached,
    UnknownSeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    Unchanged(UnchangedReason),
}

/// Каталог одного сеанса вместе с текущим выбором.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionState {
    pub catalog: Catalog,
    pub showtime_id: i64,
    pub selection: Selection,
    #[serde(skip)]
    limits: SelectionLimits,
}

impl SelectionState {
    /// Пустой выбор сразу после загрузки каталога: каждому типу билета сеанса
    /// проставлен ноль, чтобы все строки отрисовывались детерминированно.
    pub fn new(catalog: Catalog, showtime_id: Option<i64>, limits: SelectionLimits) -> Result<Self, SelectionError> {
        let (showtime_id, selection) = match &catalog {
            Catalog::General(c) | Catalog::Zoned(c) => {
                let showtime = match showtime_id {
                    Some(id) => c.showtime(id),
                    None => c.earliest_showtime(),
                }
                .ok_or(SelectionError::ShowtimeNotFound(showtime_id))?;

                let quantities = showtime
                    .ticket_types
                    .iter()
                    .map(|t| (t.id, 0))
                    .collect();
                (showtime.showtime.id, Selection::Quantities(quantities))
            }
            Catalog::Seated(c) => {
                if showtime_id.is_some_and(|id| id != c.showtime.id) {
                    return Err(SelectionError::ShowtimeNotFound(showtime_id));
                }
                (c.showtime.id, Selection::Seats(BTreeSet::new()))
            }
        };

        Ok(Self {
            catalog,
            showtime_id,
            selection,
            limits,
        })
    }

    pub fn limits(&self) -> SelectionLimits {
        self.limits
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.catalog, self.showtime_id, &self.selection)
    }

    /// Максимум, который можно выбрать для типа билета: min(остаток, лимит).
    pub fn quantity_cap(&self, ticket_type_id: i64) -> Option<u32> {
        self.catalog
            .ticket_types(self.showtime_id)
            .iter()
            .find(|t| t.id == ticket_type_id)
            .map(|t| t.remaining().min(self.limits.max_per_type))
    }

    /// Перезаписывает количество для одного типа, зажимая в [0, cap].
    /// Остальные типы не затрагиваются.
    pub fn set_quantity(&mut self, ticket_type_id: i64, value: i64) -> Result<u32, SelectionError> {
        let kind = self.catalog.kind();
        let cap = self
            .quantity_cap(ticket_type_id)
            .ok_or(SelectionError::UnknownTicketType(ticket_type_id))?;

        let Selection::Quantities(quantities) = &mut self.selection else {
            return Err(SelectionError::WrongEventKind { operation: "setQuantity", kind });
        };

        let clamped = value.clamp(0, i64::from(cap)) as u32;
        if i64::from(clamped) != value {
            debug!(
                "Quantity for ticket type {} clamped from {} to {}",
                ticket_type_id, value, clamped
            );
        }
        quantities.insert(ticket_type_id, clamped);
        Ok(clamped)
    }

    /// Снимает место, если оно выбрано; иначе добавляет его, если место свободно
    /// и лимит мест ещё не достигнут.
    pub fn toggle_seat(&mut self, seat_id: i64) -> Result<ToggleOutcome, SelectionError> {
        let kind = self.catalog.kind();
        let (Catalog::Seated(catalog), Selection::Seats(selected)) = (&self.catalog, &mut self.selection) else {
            return Err(SelectionError::WrongEventKind { operation: "toggleSeat", kind });
        };

        if selected.remove(&seat_id) {
            return Ok(ToggleOutcome::Deselected);
        }

        let outcome = match catalog.seat(seat_id) {
            None => ToggleOutcome::Unchanged(UnchangedReason::UnknownSeat),
            Some(seat) if !seat.is_available() => ToggleOutcome::Unchanged(UnchangedReason::Unavailable),
            Some(_) if selected.len() >= self.limits.max_seats => ToggleOutcome::Unchanged(UnchangedReason::LimitReached),
            Some(_) => {
                selected.insert(seat_id);
                ToggleOutcome::Selected
            }
        };

        if let ToggleOutcome::Unchanged(reason) = outcome {
            warn!("Seat {} toggle ignored: {:?}", seat_id, reason);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{general_catalog, seated_catalog};
    use proptest::prelude::*;

    fn general_state() -> SelectionState {
        SelectionState::new(general_catalog(), Some(11), SelectionLimits::default()).unwrap()
    }

    fn seated_state() -> SelectionState {
        SelectionState::new(seated_catalog(), None, SelectionLimits::default()).unwrap()
    }

    #[test]
    fn starts_with_zero_for_every_ticket_type() {
        let state = general_state();
        assert_eq!(
            state.selection,
            Selection::Quantities(BTreeMap::from([(1, 0), (2, 0)]))
        );
        assert!(state.selection.is_empty());
    }

    #[test]
    fn defaults_to_earliest_showtime() {
        let state = SelectionState::new(general_catalog(), None, SelectionLimits::default()).unwrap();
        assert_eq!(state.showtime_id, 11);
    }

    #[test]
    fn unknown_showtime_is_rejected() {
        let err = SelectionState::new(general_catalog(), Some(99), SelectionLimits::default()).unwrap_err();
        assert_eq!(err, SelectionError::ShowtimeNotFound(Some(99)));
    }

    #[test]
    fn quantity_is_clamped_to_remaining() {
        let mut state = general_state();
        assert_eq!(state.set_quantity(1, 2).unwrap(), 2);
        assert_eq!(state.set_quantity(1, 8).unwrap(), 5);
        assert_eq!(state.set_quantity(1, -3).unwrap(), 0);
    }

    #[test]
    fn plentiful_type_is_capped_at_ten() {
        let mut state = SelectionState::new(general_catalog(), Some(12), SelectionLimits::default()).unwrap();
        assert_eq!(state.quantity_cap(3), Some(10));
        assert_eq!(state.set_quantity(3, 40).unwrap(), 10);
        assert_eq!(state.set_quantity(3, 7).unwrap(), 7);
    }

    #[test]
    fn sold_out_type_cannot_get_positive_quantity() {
        let mut state = general_state();
        assert_eq!(state.set_quantity(2, 4).unwrap(), 0);
        assert_eq!(state.selection.quantity(2), 0);
    }

    #[test]
    fn set_quantity_leaves_other_types_alone() {
        let mut state = general_state();
        state.set_quantity(1, 3).unwrap();
        state.set_quantity(2, 1).unwrap();
        assert_eq!(state.selection.quantity(1), 3);
    }

    #[test]
    fn unknown_ticket_type_is_an_error() {
        let mut state = general_state();
        let before = state.selection.clone();
        assert_eq!(state.set_quantity(77, 1), Err(SelectionError::UnknownTicketType(77)));
        assert_eq!(state.selection, before);
    }

    #[test]
    fn toggling_seats_on_general_event_fails() {
        let mut state = general_state();
        assert!(matches!(
            state.toggle_seat(1),
            Err(SelectionError::WrongEventKind { kind: EventKind::General, .. })
        ));
    }

    #[test]
    fn booked_seat_toggle_is_a_noop() {
        let mut state = seated_state();
        assert_eq!(state.toggle_seat(100).unwrap(), ToggleOutcome::Selected);
        let before = state.selection.clone();
        assert_eq!(
            state.toggle_seat(101).unwrap(),
            ToggleOutcome::Unchanged(UnchangedReason::Unavailable)
        );
        assert_eq!(state.selection, before);
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut state = seated_state();
        state.toggle_seat(100).unwrap();
        assert_eq!(state.toggle_seat(100).unwrap(), ToggleOutcome::Deselected);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn seat_limit_is_enforced() {
        let limits = SelectionLimits { max_per_type: 10, max_seats: 1 };
        let mut state = SelectionState::new(seated_catalog(), None, limits).unwrap();
        state.toggle_seat(100).unwrap();
        assert_eq!(
            state.toggle_seat(102).unwrap(),
            ToggleOutcome::Unchanged(UnchangedReason::LimitReached)
        );
    }

    proptest! {
        #[test]
        fn quantities_never_exceed_cap(ops in prop::collection::vec((1i64..=2, -20i64..40), 0..40)) {
            let mut state = general_state();
            for (id, value) in ops {
                let set = state.set_quantity(id, value).unwrap();
                let cap = state.quantity_cap(id).unwrap();
                prop_assert!(set <= cap);
                prop_assert!(cap <= 10);
            }
        }

        #[test]
        fn plentiful_type_clamps_to_limit(ops in prop::collection::vec(-20i64..80, 0..40)) {
            let mut state = SelectionState::new(general_catalog(), Some(12), SelectionLimits::default()).unwrap();
            for value in ops {
                let set = state.set_quantity(3, value).unwrap();
                prop_assert_eq!(i64::from(set), value.clamp(0, 10));
            }
        }

        #[test]
        fn seats_stay_within_limit_and_available(ops in prop::collection::vec(90i64..130, 0..80)) {
            let mut state = SelectionState::new(seated_catalog(), None, SelectionLimits::default()).unwrap();
            for seat_id in ops {
                state.toggle_seat(seat_id).unwrap();
                let Selection::Seats(selected) = &state.selection else { unreachable!() };
                prop_assert!(selected.len() <= 10);
                let Catalog::Seated(catalog) = &state.catalog else { unreachable!() };
                for id in selected {
                    prop_assert!(catalog.seat(*id).map(|s| s.is_available()).unwrap_or(false));
                }
            }
        }
    }
}
