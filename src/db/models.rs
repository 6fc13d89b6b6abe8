use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{PgQuery, Record};

// ---------------------------------------------------------------------------
// Station readings
// ---------------------------------------------------------------------------

/// One station report without its identity and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationMeasurements {
    /// Relative humidity, percent
    pub humidity_avg: i32,
    pub humidity_min: i32,
    pub humidity_max: i32,
    /// Degrees Celsius
    pub temperature_avg: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    /// W/m², absent when the station has no pyranometer
    pub solar_radiation_min: Option<f64>,
    pub solar_radiation_max: Option<f64>,
    pub solar_radiation_avg: Option<f64>,
}

/// Row of the `weather_station` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct StationReading {
    pub id: i64,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub humidity_avg: i32,
    pub humidity_min: i32,
    pub humidity_max: i32,
    pub temperature_avg: f32,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub solar_radiation_min: Option<f64>,
    pub solar_radiation_max: Option<f64>,
    pub solar_radiation_avg: Option<f64>,
}

impl Record for StationReading {
    type Measurements = StationMeasurements;

    const TABLE: &'static str = "weather_station";
    const COLUMNS: &'static str = "id, recorded_at, \
        humidity_avg, humidity_min, humidity_max, \
        temperature_avg, temperature_min, temperature_max, \
        solar_radiation_min, solar_radiation_max, solar_radiation_avg";
    const INSERT: &'static str = r#"
        INSERT INTO weather_station
            (recorded_at,
             humidity_avg, humidity_min, humidity_max,
             temperature_avg, temperature_min, temperature_max,
             solar_radiation_min, solar_radiation_max, solar_radiation_avg)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, recorded_at,
                  humidity_avg, humidity_min, humidity_max,
                  temperature_avg, temperature_min, temperature_max,
                  solar_radiation_min, solar_radiation_max, solar_radiation_avg
        "#;

    fn id(&self) -> i64 {
        self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn assemble(id: i64, timestamp: DateTime<Utc>, m: StationMeasurements) -> Self {
        Self {
            id,
            timestamp,
            humidity_avg: m.humidity_avg,
            humidity_min: m.humidity_min,
            humidity_max: m.humidity_max,
            temperature_avg: m.temperature_avg,
            temperature_min: m.temperature_min,
            temperature_max: m.temperature_max,
            solar_radiation_min: m.solar_radiation_min,
            solar_radiation_max: m.solar_radiation_max,
            solar_radiation_avg: m.solar_radiation_avg,
        }
    }

    fn bind_measurements<'q>(m: &StationMeasurements, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(m.humidity_avg)
            .bind(m.humidity_min)
            .bind(m.humidity_max)
            .bind(m.temperature_avg)
            .bind(m.temperature_min)
            .bind(m.temperature_max)
            .bind(m.solar_radiation_min)
            .bind(m.solar_radiation_max)
            .bind(m.solar_radiation_avg)
    }
}

// ---------------------------------------------------------------------------
// ET0 predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Et0Measurements {
    /// Degrees Celsius
    pub avg_temp: f32,
    /// Percent
    pub avg_humidity: i32,
    /// W/m²
    pub avg_solar_radiation: f32,
    /// Reference evapotranspiration, mm/day
    pub predicted_et0: f32,
}

/// Row of the `et0` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Et0Prediction {
    pub id: i64,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub avg_temp: f32,
    pub avg_humidity: i32,
    pub avg_solar_radiation: f32,
    pub predicted_et0: f32,
}

impl Record for Et0Prediction {
    type Measurements = Et0Measurements;

    const TABLE: &'static str = "et0";
    const COLUMNS: &'static str =
        "id, recorded_at, avg_temp, avg_humidity, avg_solar_radiation, predicted_et0";
    const INSERT: &'static str = r#"
        INSERT INTO et0
            (recorded_at, avg_temp, avg_humidity, avg_solar_radiation, predicted_et0)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, recorded_at, avg_temp, avg_humidity, avg_solar_radiation, predicted_et0
        "#;

    fn id(&self) -> i64 {
        self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn assemble(id: i64, timestamp: DateTime<Utc>, m: Et0Measurements) -> Self {
        Self {
            id,
            timestamp,
            avg_temp: m.avg_temp,
            avg_humidity: m.avg_humidity,
            avg_solar_radiation: m.avg_solar_radiation,
            predicted_et0: m.predicted_et0,
        }
    }

    fn bind_measurements<'q>(m: &Et0Measurements, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(m.avg_temp)
            .bind(m.avg_humidity)
            .bind(m.avg_solar_radiation)
            .bind(m.predicted_et0)
    }
}
