use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i64,
    #[serde(default, alias = "type_name")]
    pub name: Option<String>,
    pub price: String,
    /// Снимок остатка на момент загрузки, локально не уменьшается.
    #[serde(default, alias = "remaining_quantity")]
    pub quantity: Option<i64>,
}

impl TicketType {
    // Отсутствующий остаток считаем нулём - тип показывается как недоступный.
    pub fn remaining(&self) -> u32 {
        self.quantity
            .unwrap_or(0)
            .clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn is_available(&self) -> bool {
        self.remaining() > 0
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
