use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Модель продажи билетов на событие.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Обычные типы билетов без привязки к месту.
    General,
    /// Ценовые зоны (именованные типы билетов), без фиксированных мест.
    Zoned,
    /// Каждое место адресуется отдельно, со своим статусом и ценой.
    Seated,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::General => "general",
            EventKind::Zoned => "zoned",
            EventKind::Seated => "seated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(EventKind::General),
            "zoned" => Ok(EventKind::Zoned),
            "seated" => Ok(EventKind::Seated),
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    #[serde(alias = "title")]
    pub name: String,
}
