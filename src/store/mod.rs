mod service;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::models::{Et0Prediction, StationReading};

pub use service::Store;

pub type StationReadingStore = Store<StationReading>;
pub type Et0PredictionStore = Store<Et0Prediction>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence gateway could not complete the insert or query.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),
}

/// Input to [`Store::record`].
///
/// `id` is accepted for wire compatibility but never used: every submission
/// becomes a new row.
#[derive(Debug, Clone)]
pub struct Submission<M> {
    pub id: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub measurements: M,
}

impl<M> Submission<M> {
    pub fn new(measurements: M) -> Self {
        Self {
            id: None,
            timestamp: None,
            measurements,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
