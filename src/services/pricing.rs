use serde::Serialize;
use tracing::warn;

use crate::{models::Catalog, services::selection::Selection};

/// Итоги выбора. Всегда выводятся из (каталог, выбор), отдельно не хранятся.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub amount: f64,
    pub quantity: u32,
}

impl Totals {
    pub const ZERO: Totals = Totals { amount: 0.0, quantity: 0 };

    pub fn compute(catalog: &Catalog, showtime_id: i64, selection: &Selection) -> Totals {
        match (catalog, selection) {
            (Catalog::General(_) | Catalog::Zoned(_), Selection::Quantities(quantities)) => {
                let types = catalog.ticket_types(showtime_id);
                quantities
                    .iter()
                    .filter(|(_, qty)| **qty > 0)
                    .filter_map(|(id, qty)| types.iter().find(|t| t.id == *id).map(|t| (t, *qty)))
                    .fold(Totals::ZERO, |acc, (ticket_type, qty)| Totals {
                        amount: acc.amount + parse_price(&ticket_type.price) * f64::from(qty),
                        quantity: acc.quantity + qty,
                    })
            }
            (Catalog::Seated(seats), Selection::Seats(selected)) => selected
                .iter()
                .filter_map(|id| seats.seat(*id))
                .fold(Totals::ZERO, |acc, seat| Totals {
                    amount: acc.amount + parse_price(&seat.price),
                    quantity: acc.quantity + 1,
                }),
            // Выбор не той формы, что каталог, - считать нечего.
            _ => Totals::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Сумма в валюте или None, если ничего не выбрано
    /// (тогда страница показывает подсказку, а не "0 ₫").
    pub fn display(&self) -> Option<String> {
        (!self.is_empty()).then(|| format_vnd(self.amount))
    }
}

/// Цены приходят десятичными строками ("150000.00"). Нечитаемая цена считается нулём.
pub fn parse_price(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warn!("Unparsable price {:?}, treating as 0", raw);
            0.0
        }
    }
}

/// Формат vi-VN: разделитель тысяч - точка, без дробной части (у VND нет копеек).
pub fn format_vnd(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0 { "-" } else { "" };
    format!("{}{} ₫", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        selection::{SelectionLimits, SelectionState},
        test_support::{general_catalog, seated_catalog},
    };
    use proptest::prelude::*;

    #[test]
    fn formats_like_vi_vn() {
        assert_eq!(format_vnd(0.0), "0 ₫");
        assert_eq!(format_vnd(950.0), "950 ₫");
        assert_eq!(format_vnd(200000.0), "200.000 ₫");
        assert_eq!(format_vnd(1234567.4), "1.234.567 ₫");
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse_price("100000"), 100000.0);
        assert_eq!(parse_price(" 150000.00 "), 150000.0);
        assert_eq!(parse_price("n/a"), 0.0);
    }

    #[test]
    fn general_scenario_two_tickets() {
        let mut state = SelectionState::new(general_catalog(), Some(11), SelectionLimits::default()).unwrap();
        state.set_quantity(1, 2).unwrap();
        state.set_quantity(2, 3).unwrap();

        let totals = state.totals();
        assert_eq!(totals, Totals { amount: 200000.0, quantity: 2 });
        assert_eq!(totals.display().as_deref(), Some("200.000 ₫"));
    }

    #[test]
    fn seated_scenario() {
        let mut state = SelectionState::new(seated_catalog(), None, SelectionLimits::default()).unwrap();
        state.toggle_seat(100).unwrap();
        state.toggle_seat(101).unwrap();
        assert_eq!(state.totals(), Totals { amount: 150000.0, quantity: 1 });
    }

    #[test]
    fn nothing_selected_has_no_display() {
        let state = SelectionState::new(general_catalog(), None, SelectionLimits::default()).unwrap();
        assert_eq!(state.totals(), Totals::ZERO);
        assert_eq!(state.totals().display(), None);
    }

    proptest! {
        #[test]
        fn total_matches_sum_of_line_subtotals(q1 in 0i64..12, q3 in 0i64..12) {
            let mut state = SelectionState::new(general_catalog(), Some(11), SelectionLimits::default()).unwrap();
            let a = state.set_quantity(1, q1).unwrap();
            let expected = 100000.0 * f64::from(a);
            prop_assert_eq!(state.totals().amount, expected);
            prop_assert_eq!(state.totals().quantity, a);

            // no-op на чужом сеансе и повторный пересчёт не меняют результат
            let before = state.totals();
            let _ = state.set_quantity(3, q3);
            prop_assert_eq!(state.totals(), before);
            prop_assert_eq!(state.totals(), before);
        }
    }
}
