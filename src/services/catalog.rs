use serde::Deserialize;
use tracing::{error, info};
use validator::Validate;

use crate::{
    backend_client::BackendClient,
    error::BookingError,
    models::{Catalog, EventKind, SeatCatalog, TicketCatalog},
};

/// Что нужно загрузить: событие, его тип и (для seated) сеанс.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CatalogRequest {
    #[validate(range(min = 1, message = "event_id must be > 0"))]
    pub event_id: i64,
    pub event_type: EventKind,
    #[validate(range(min = 1, message = "showtime_id must be > 0"))]
    pub showtime_id: Option<i64>,
}

/// Загружает каталог билетов/мест. Без кеша: каждый вызов идёт в backend.
#[derive(Clone)]
pub struct CatalogFetcher {
    client: BackendClient,
}

impl CatalogFetcher {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, request: &CatalogRequest) -> Result<Catalog, BookingError> {
        request
            .validate()
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        let catalog = match request.event_type {
            EventKind::General => {
                let path = format!("/ticket-types/event/{}", request.event_id);
                Catalog::General(self.load::<TicketCatalog>(&path).await?)
            }
            EventKind::Zoned => {
                let path = format!("/ticket-types/zoned/event/{}", request.event_id);
                Catalog::Zoned(self.load::<TicketCatalog>(&path).await?)
            }
            EventKind::Seated => {
                let showtime_id = request.showtime_id.ok_or_else(|| {
                    BookingError::Validation("showtime_id is required for seated events".to_string())
                })?;
                let path = format!("/seats/showtime/{}", showtime_id);
                Catalog::Seated(self.load::<SeatCatalog>(&path).await?)
            }
        };

        info!(
            "Loaded {} catalog for event {}",
            catalog.kind(),
            request.event_id
        );
        Ok(catalog)
    }

    async fn load<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BookingError> {
        self.client.get_json::<T>(path).await.map_err(|e| {
            error!("Catalog request {} failed: {:?}", path, e);
            BookingError::CatalogUnavailable(e.to_string())
        })
    }
}
