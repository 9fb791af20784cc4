use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::BookingError,
    models::{Catalog, EventKind},
    services::{
        catalog::CatalogRequest,
        pricing::{parse_price, Totals},
        selection::{Selection, SelectionState},
    },
};

/// Выбор одной загрузки страницы бронирования. Нигде не сохраняется.
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub id: Uuid,
    pub request: CatalogRequest,
    pub state: SelectionState,
    pub created_at: DateTime<Utc>,
    touched_at: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub amount: f64,
    pub quantity: u32,
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<&'static str>,
}

impl From<Totals> for TotalsView {
    fn from(totals: Totals) -> Self {
        let formatted = totals.display();
        Self {
            amount: totals.amount,
            quantity: totals.quantity,
            prompt: formatted.is_none().then_some("Please select your tickets"),
            formatted,
        }
    }
}

/// Строка типа билета для страницы: сколько можно выбрать и выбрано сейчас.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketTypeView {
    pub id: i64,
    pub name: Option<String>,
    pub unit_price: f64,
    pub available: bool,
    pub cap: u32,
    pub quantity: u32,
}

fn ticket_type_views(state: &SelectionState) -> Vec<TicketTypeView> {
    state
        .catalog
        .ticket_types(state.showtime_id)
        .iter()
        .map(|t| {
            let cap = state.quantity_cap(t.id).unwrap_or(0);
            TicketTypeView {
                id: t.id,
                name: t.display_name().map(str::to_string),
                unit_price: parse_price(&t.price),
                available: cap > 0,
                cap,
                quantity: state.selection.quantity(t.id),
            }
        })
        .collect()
}

/// То, что видит страница: каталог, выбор и пересчитанные итоги.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub event_type: EventKind,
    pub showtime_id: i64,
    pub catalog: Catalog,
    pub selection: Selection,
    /// Пусто для seated: там доступность у каждого места в каталоге.
    pub ticket_types: Vec<TicketTypeView>,
    pub totals: TotalsView,
    pub max_tickets_per_type: u32,
    pub max_seats: usize,
}

impl From<&BookingSession> for SessionView {
    fn from(session: &BookingSession) -> Self {
        let limits = session.state.limits();
        Self {
            session_id: session.id,
            event_type: session.state.catalog.kind(),
            showtime_id: session.state.showtime_id,
            catalog: session.state.catalog.clone(),
            selection: session.state.selection.clone(),
            ticket_types: ticket_type_views(&session.state),
            totals: session.state.totals().into(),
            max_tickets_per_type: limits.max_per_type,
            max_seats: limits.max_seats,
        }
    }
}

/// Хранилище сессий в памяти. Все изменения выбора идут под одной блокировкой,
/// поэтому две мутации одной сессии не перемежаются.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, BookingSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn open(&self, request: CatalogRequest, state: SelectionState) -> SessionView {
        let session = BookingSession {
            id: Uuid::new_v4(),
            request,
            state,
            created_at: Utc::now(),
            touched_at: Instant::now(),
        };
        let view = SessionView::from(&session);

        info!(
            "Opened booking session {} for event {} ({})",
            session.id, session.request.event_id, view.event_type
        );
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id, session);
        view
    }

    /// Копия сессии (например, чтобы собрать заказ без удержания блокировки).
    pub fn snapshot(&self, id: Uuid) -> Result<BookingSession, BookingError> {
        let mut sessions = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get_mut(&id).ok_or(BookingError::SessionNotFound(id))?;
        session.touched_at = Instant::now();
        Ok(session.clone())
    }

    pub fn view(&self, id: Uuid) -> Result<SessionView, BookingError> {
        self.snapshot(id).map(|s| SessionView::from(&s))
    }

    /// Применяет изменение к выбору сессии и возвращает результат вместе с новым видом.
    pub fn update<R, F>(&self, id: Uuid, mutate: F) -> Result<(R, SessionView), BookingError>
    where
        F: FnOnce(&mut SelectionState) -> Result<R, BookingError>,
    {
        let mut sessions = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get_mut(&id).ok_or(BookingError::SessionNotFound(id))?;
        session.touched_at = Instant::now();

        let result = mutate(&mut session.state)?;
        Ok((result, SessionView::from(&*session)))
    }

    pub fn close(&self, id: Uuid) -> bool {
        let removed = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            info!("Closed booking session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Удаляет сессии, к которым не обращались дольше TTL.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, s| s.touched_at.elapsed() < self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("🧹 Dropped {} idle booking sessions", removed);
        } else {
            debug!("No idle booking sessions to drop");
        }
        removed
    }

    /// Фоновая очистка: запускается из main и живёт всё время работы сервиса.
    pub async fn run_sweeper(self, every: Duration) {
        loop {
            tokio::time::sleep(every).await;
            self.sweep_expired();
        }
    }
}
