use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::OpenApi;

use super::{
    dto::{Et0PredictionDto, NewEt0PredictionDto, NewStationReadingDto, StationReadingDto},
    errors::AppError,
    AppState,
};
use crate::{db::Record, store::Store};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// `?date=` for an exact match, `?minDate=&maxDate=` for an inclusive range,
/// nothing for every record.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeQueryParams {
    pub date: Option<DateTime<Utc>>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    All,
    At(DateTime<Utc>),
    Between(DateTime<Utc>, DateTime<Utc>),
}

impl TryFrom<TimeQueryParams> for Lookup {
    type Error = AppError;

    fn try_from(p: TimeQueryParams) -> Result<Self, AppError> {
        match (p.date, p.min_date, p.max_date) {
            (None, None, None) => Ok(Self::All),
            (Some(date), None, None) => Ok(Self::At(date)),
            (None, Some(min), Some(max)) => Ok(Self::Between(min, max)),
            _ => Err(AppError::bad_request(
                "use either `date`, or both `minDate` and `maxDate`",
            )),
        }
    }
}

async fn lookup<T: Record>(store: &Store<T>, params: TimeQueryParams) -> Result<Vec<T>, AppError> {
    let rows = match Lookup::try_from(params)? {
        Lookup::All => store.list_all().await?,
        Lookup::At(t) => store.find_by_timestamp(t).await?,
        Lookup::Between(min, max) => store.find_by_timestamp_range(min, max).await?,
    };
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Weather station readings
// ---------------------------------------------------------------------------

/// Record a new station reading. A missing `timestamp` defaults to now (UTC);
/// a submitted `id` is ignored.
#[utoipa::path(
    post,
    path = "/weather-stations",
    request_body = NewStationReadingDto,
    responses(
        (status = 201, description = "Reading recorded", body = StationReadingDto),
        (status = 400, description = "Malformed body"),
        (status = 422, description = "Missing or mistyped fields"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "weather-stations"
)]
pub async fn create_station_reading(
    State(state): State<AppState>,
    Json(body): Json<NewStationReadingDto>,
) -> Result<(StatusCode, Json<StationReadingDto>), AppError> {
    let reading = state.stations.record(body.into()).await?;
    info!(id = reading.id, timestamp = %reading.timestamp, "Station reading recorded");
    Ok((StatusCode::CREATED, Json(reading.into())))
}

/// List station readings, optionally filtered by exact date or inclusive
/// date range. Results are in insertion order.
#[utoipa::path(
    get,
    path = "/weather-stations",
    params(
        ("date"    = Option<DateTime<Utc>>, Query, description = "Exact timestamp (RFC3339)"),
        ("minDate" = Option<DateTime<Utc>>, Query, description = "Range start, inclusive (RFC3339)"),
        ("maxDate" = Option<DateTime<Utc>>, Query, description = "Range end, inclusive (RFC3339)"),
    ),
    responses(
        (status = 200, description = "Station readings", body = Vec<StationReadingDto>),
        (status = 400, description = "Invalid parameter combination"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "weather-stations"
)]
pub async fn list_station_readings(
    State(state): State<AppState>,
    Query(params): Query<TimeQueryParams>,
) -> Result<Json<Vec<StationReadingDto>>, AppError> {
    let rows = lookup(&state.stations, params).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// ET0 predictions
// ---------------------------------------------------------------------------

/// Record a new ET0 prediction. Same timestamp and id rules as station readings.
#[utoipa::path(
    post,
    path = "/et0",
    request_body = NewEt0PredictionDto,
    responses(
        (status = 201, description = "Prediction recorded", body = Et0PredictionDto),
        (status = 400, description = "Malformed body"),
        (status = 422, description = "Missing or mistyped fields"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "et0"
)]
pub async fn create_et0_prediction(
    State(state): State<AppState>,
    Json(body): Json<NewEt0PredictionDto>,
) -> Result<(StatusCode, Json<Et0PredictionDto>), AppError> {
    let prediction = state.et0.record(body.into()).await?;
    info!(id = prediction.id, timestamp = %prediction.timestamp, "ET0 prediction recorded");
    Ok((StatusCode::CREATED, Json(prediction.into())))
}

#[utoipa::path(
    get,
    path = "/et0",
    params(
        ("date"    = Option<DateTime<Utc>>, Query, description = "Exact timestamp (RFC3339)"),
        ("minDate" = Option<DateTime<Utc>>, Query, description = "Range start, inclusive (RFC3339)"),
        ("maxDate" = Option<DateTime<Utc>>, Query, description = "Range end, inclusive (RFC3339)"),
    ),
    responses(
        (status = 200, description = "ET0 predictions", body = Vec<Et0PredictionDto>),
        (status = 400, description = "Invalid parameter combination"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "et0"
)]
pub async fn list_et0_predictions(
    State(state): State<AppState>,
    Query(params): Query<TimeQueryParams>,
) -> Result<Json<Vec<Et0PredictionDto>>, AppError> {
    let rows = lookup(&state.et0, params).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        create_station_reading,
        list_station_readings,
        create_et0_prediction,
        list_et0_predictions,
        health,
    ),
    components(schemas(
        StationReadingDto,
        NewStationReadingDto,
        Et0PredictionDto,
        NewEt0PredictionDto,
    )),
    tags(
        (name = "weather-stations", description = "Station telemetry"),
        (name = "et0",              description = "Evapotranspiration predictions"),
        (name = "system",           description = "System endpoints"),
    ),
    info(
        title = "Weather Station API",
        version = "0.1.0",
        description = "Append-only store for weather station readings and ET0 predictions"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
