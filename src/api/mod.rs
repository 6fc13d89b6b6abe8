pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{
    clock::Clock,
    db::{Gateway, MemoryTable},
    store::{Et0PredictionStore, StationReadingStore, Store},
};

/// Both stores, shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub stations: StationReadingStore,
    pub et0: Et0PredictionStore,
}

impl AppState {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            stations: Store::new(Gateway::Postgres(pool.clone())),
            et0: Store::new(Gateway::Postgres(pool)),
        }
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            stations: Store::with_clock(Gateway::Memory(MemoryTable::new()), Arc::clone(&clock)),
            et0: Store::with_clock(Gateway::Memory(MemoryTable::new()), clock),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/weather-stations",
            get(handlers::list_station_readings).post(handlers::create_station_reading),
        )
        .route(
            "/et0",
            get(handlers::list_et0_predictions).post(handlers::create_et0_prediction),
        )
        // Paths used by the deployed station uploader and dashboard
        .route("/addWeatherStationData", post(handlers::create_station_reading))
        .route("/getAllWeatherStations", get(handlers::list_station_readings))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
