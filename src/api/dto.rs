use chrono::{DateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::{Et0Measurements, Et0Prediction, StationMeasurements, StationReading},
    store::Submission,
};

// ---------------------------------------------------------------------------
// Station readings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationReadingDto {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// Relative humidity, percent
    pub humidity_avg: i32,
    pub humidity_min: i32,
    pub humidity_max: i32,
    /// Degrees Celsius
    pub temperature_avg: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    /// W/m², null when the station has no radiation sensor
    pub solar_radiation_min: Option<f64>,
    pub solar_radiation_max: Option<f64>,
    pub solar_radiation_avg: Option<f64>,
}

/// Request body for `POST /weather-stations`.
///
/// The field names used by the station uploader (`hum_moy`, `temp_moy`,
/// `solar_radiation_moy`, ...) are accepted as aliases.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStationReadingDto {
    /// Ignored. Every submission creates a new record.
    pub id: Option<i64>,
    /// RFC3339. Defaults to the server's current UTC time.
    #[serde(alias = "date")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "hum_moy", deserialize_with = "whole_number")]
    pub humidity_avg: i32,
    #[serde(alias = "hum_min", deserialize_with = "whole_number")]
    pub humidity_min: i32,
    #[serde(alias = "hum_max", deserialize_with = "whole_number")]
    pub humidity_max: i32,
    #[serde(alias = "temp_moy")]
    pub temperature_avg: f32,
    #[serde(alias = "temp_min")]
    pub temperature_min: f32,
    #[serde(alias = "temp_max")]
    pub temperature_max: f32,
    #[serde(alias = "solar_radiation_min")]
    pub solar_radiation_min: Option<f64>,
    #[serde(alias = "solar_radiation_max")]
    pub solar_radiation_max: Option<f64>,
    #[serde(alias = "solar_radiation_moy")]
    pub solar_radiation_avg: Option<f64>,
}

impl From<StationReading> for StationReadingDto {
    fn from(r: StationReading) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            humidity_avg: r.humidity_avg,
            humidity_min: r.humidity_min,
            humidity_max: r.humidity_max,
            temperature_avg: r.temperature_avg,
            temperature_min: r.temperature_min,
            temperature_max: r.temperature_max,
            solar_radiation_min: r.solar_radiation_min,
            solar_radiation_max: r.solar_radiation_max,
            solar_radiation_avg: r.solar_radiation_avg,
        }
    }
}

impl From<NewStationReadingDto> for Submission<StationMeasurements> {
    fn from(d: NewStationReadingDto) -> Self {
        Self {
            id: d.id,
            timestamp: d.timestamp,
            measurements: StationMeasurements {
                humidity_avg: d.humidity_avg,
                humidity_min: d.humidity_min,
                humidity_max: d.humidity_max,
                temperature_avg: d.temperature_avg,
                temperature_min: d.temperature_min,
                temperature_max: d.temperature_max,
                solar_radiation_min: d.solar_radiation_min,
                solar_radiation_max: d.solar_radiation_max,
                solar_radiation_avg: d.solar_radiation_avg,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ET0 predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Et0PredictionDto {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub avg_temp: f32,
    pub avg_humidity: i32,
    pub avg_solar_radiation: f32,
    /// mm/day
    #[serde(rename = "predictedET0")]
    pub predicted_et0: f32,
}

/// Request body for `POST /et0`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEt0PredictionDto {
    /// Ignored. Every submission creates a new record.
    pub id: Option<i64>,
    /// RFC3339. Defaults to the server's current UTC time.
    #[serde(alias = "date")]
    pub timestamp: Option<DateTime<Utc>>,
    pub avg_temp: f32,
    #[serde(deserialize_with = "whole_number")]
    pub avg_humidity: i32,
    pub avg_solar_radiation: f32,
    #[serde(rename = "predictedET0", alias = "predictedEt0")]
    pub predicted_et0: f32,
}

impl From<Et0Prediction> for Et0PredictionDto {
    fn from(p: Et0Prediction) -> Self {
        Self {
            id: p.id,
            timestamp: p.timestamp,
            avg_temp: p.avg_temp,
            avg_humidity: p.avg_humidity,
            avg_solar_radiation: p.avg_solar_radiation,
            predicted_et0: p.predicted_et0,
        }
    }
}

impl From<NewEt0PredictionDto> for Submission<Et0Measurements> {
    fn from(d: NewEt0PredictionDto) -> Self {
        Self {
            id: d.id,
            timestamp: d.timestamp,
            measurements: Et0Measurements {
                avg_temp: d.avg_temp,
                avg_humidity: d.avg_humidity,
                avg_solar_radiation: d.avg_solar_radiation,
                predicted_et0: d.predicted_et0,
            },
        }
    }
}

/// Accepts any JSON number for an integer field, dropping the fraction.
///
/// Station uploaders send humidity as a float (`64.0`, sometimes `64.3`).
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let v = f64::deserialize(deserializer)?;
    if !v.is_finite() || v < f64::from(i32::MIN) || v > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!("{v} is not a valid whole number")));
    }
    Ok(v.trunc() as i32)
}
