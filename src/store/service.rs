use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{StoreError, Submission};
use crate::{
    clock::{ceil_to_storage_precision, to_storage_precision, Clock, SystemClock},
    db::{Gateway, Record},
};

/// Append-only store for one record type.
///
/// Exposes exactly four operations: `record`, `list_all`,
/// `find_by_timestamp` and `find_by_timestamp_range`. There is no update or
/// delete path.
pub struct Store<T> {
    gateway: Gateway<T>,
    clock: Arc<dyn Clock>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T: Record> Store<T> {
    pub fn new(gateway: Gateway<T>) -> Self {
        Self::with_clock(gateway, Arc::new(SystemClock))
    }

    pub fn with_clock(gateway: Gateway<T>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    /// Persists `submission` as a brand-new row.
    ///
    /// A missing timestamp defaults to the clock's current UTC time. Any
    /// submitted `id` is discarded so this never overwrites an existing row.
    pub async fn record(&self, submission: Submission<T::Measurements>) -> Result<T, StoreError> {
        let Submission {
            id,
            timestamp,
            measurements,
        } = submission;

        if let Some(id) = id {
            debug!(table = T::TABLE, submitted_id = id, "Ignoring submitted id");
        }

        let timestamp = to_storage_precision(timestamp.unwrap_or_else(|| self.clock.now()));
        let record = self.gateway.insert(timestamp, measurements).await?;

        debug!(table = T::TABLE, id = record.id(), timestamp = %timestamp, "Record persisted");
        Ok(record)
    }

    /// Every record, in insertion order.
    pub async fn list_all(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.gateway.scan().await?)
    }

    /// Records whose timestamp equals `timestamp` exactly.
    pub async fn find_by_timestamp(&self, timestamp: DateTime<Utc>) -> Result<Vec<T>, StoreError> {
        Ok(self.gateway.find_at(to_storage_precision(timestamp)).await?)
    }

    /// Records with `min <= timestamp <= max`. Empty when `min > max`.
    pub async fn find_by_timestamp_range(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<Vec<T>, StoreError> {
        if min > max {
            debug!(table = T::TABLE, %min, %max, "Inverted range; nothing to match");
            return Ok(Vec::new());
        }
        // Stored values are whole microseconds
        let (min, max) = (ceil_to_storage_precision(min), to_storage_precision(max));
        if min > max {
            debug!(table = T::TABLE, %min, %max, "Range holds no whole microsecond");
            return Ok(Vec::new());
        }
        Ok(self.gateway.find_between(min, max).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Timelike};
    use sqlx::PgPool;

    use super::*;
    use crate::{
        clock::FixedClock,
        db::{
            models::{Et0Measurements, Et0Prediction, StationMeasurements, StationReading},
            MemoryTable,
        },
    };

    fn station(humidity_avg: i32) -> StationMeasurements {
        StationMeasurements {
            humidity_avg,
            humidity_min: humidity_avg - 10,
            humidity_max: humidity_avg + 10,
            temperature_avg: 20.5,
            temperature_min: 15.0,
            temperature_max: 26.0,
            solar_radiation_min: Some(0.0),
            solar_radiation_max: Some(780.0),
            solar_radiation_avg: None,
        }
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, hour, 0, 0).unwrap()
    }

    fn memory_store() -> Store<StationReading> {
        Store::with_clock(
            Gateway::Memory(MemoryTable::new()),
            Arc::new(FixedClock(t(12))),
        )
    }

    // -----------------------------------------------------------------------
    // record
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn record_defaults_timestamp_from_clock() {
        let store = memory_store();
        let r = store.record(Submission::new(station(50))).await.unwrap();
        assert_eq!(r.timestamp, t(12));
    }

    #[tokio::test]
    async fn record_with_system_clock_lands_inside_the_call_window() {
        let store = Store::<StationReading>::new(Gateway::Memory(MemoryTable::new()));

        let before = to_storage_precision(Utc::now());
        let r = store.record(Submission::new(station(50))).await.unwrap();
        let after = Utc::now();

        assert!(before <= r.timestamp && r.timestamp <= after);
    }

    #[tokio::test]
    async fn record_keeps_submitted_timestamp() {
        let store = memory_store();
        let r = store.record(Submission::new(station(50)).at(t(3))).await.unwrap();
        assert_eq!(r.timestamp, t(3));
    }

    #[tokio::test]
    async fn record_truncates_to_microseconds() {
        let store = memory_store();
        let fine = t(3).with_nanosecond(987_654_321).unwrap();

        let r = store.record(Submission::new(station(50)).at(fine)).await.unwrap();
        assert_eq!(r.timestamp.nanosecond(), 987_654_000);

        // The truncated and the original value both find it again
        assert_eq!(store.find_by_timestamp(r.timestamp).await.unwrap().len(), 1);
        assert_eq!(store.find_by_timestamp(fine).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_discards_submitted_id() {
        let store = memory_store();
        store.record(Submission::new(station(40))).await.unwrap();

        let mut submission = Submission::new(station(41));
        submission.id = Some(1);
        let r = store.record(submission).await.unwrap();

        assert_ne!(r.id, 1);
        // Row 1 is untouched
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].humidity_avg, 40);
    }

    #[tokio::test]
    async fn identical_submissions_produce_distinct_rows() {
        let store = memory_store();
        let mut submission = Submission::new(station(55)).at(t(6));
        submission.id = Some(42);

        let a = store.record(submission.clone()).await.unwrap();
        let b = store.record(submission).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn record_stores_out_of_range_values_as_is() {
        let store = memory_store();
        let mut m = station(50);
        m.humidity_max = 180;
        m.temperature_min = -300.0;

        let r = store.record(Submission::new(m)).await.unwrap();
        assert_eq!(r.humidity_max, 180);
        assert_eq!(r.temperature_min, -300.0);
    }

    // -----------------------------------------------------------------------
    // queries
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn find_by_timestamp_returns_just_recorded_row() {
        let store = memory_store();
        let r = store.record(Submission::new(station(63))).await.unwrap();

        let hits = store.find_by_timestamp(r.timestamp).await.unwrap();
        assert!(hits.contains(&r));
    }

    #[tokio::test]
    async fn find_by_timestamp_empty_when_nothing_matches() {
        let store = memory_store();
        store.record(Submission::new(station(63)).at(t(1))).await.unwrap();

        let hits = store.find_by_timestamp(t(1) + Duration::microseconds(1)).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_empty() {
        let store = memory_store();
        store.record(Submission::new(station(50)).at(t(5))).await.unwrap();

        let hits = store.find_by_timestamp_range(t(9), t(1)).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn inverted_range_within_one_microsecond_is_empty() {
        let store = memory_store();
        store.record(Submission::new(station(50)).at(t(5))).await.unwrap();

        let min = t(5) + Duration::nanoseconds(900);
        let max = t(5) + Duration::nanoseconds(100);
        assert!(store.find_by_timestamp_range(min, max).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_lower_bound_excludes_earlier_rows_in_same_microsecond() {
        let store = memory_store();
        store.record(Submission::new(station(10)).at(t(5))).await.unwrap();
        store
            .record(Submission::new(station(20)).at(t(5) + Duration::microseconds(1)))
            .await
            .unwrap();

        // Both bounds sit after the first row, inside its microsecond
        let hits = store
            .find_by_timestamp_range(t(5) + Duration::nanoseconds(100), t(6))
            .await
            .unwrap();
        let humidity: Vec<i32> = hits.iter().map(|r| r.humidity_avg).collect();
        assert_eq!(humidity, vec![20]);

        let none = store
            .find_by_timestamp_range(
                t(5) + Duration::nanoseconds(100),
                t(5) + Duration::nanoseconds(900),
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn range_is_inclusive_on_both_ends() {
        let store = memory_store();
        store.record(Submission::new(station(10)).at(t(1))).await.unwrap();
        store.record(Submission::new(station(20)).at(t(2))).await.unwrap();
        store.record(Submission::new(station(30)).at(t(3))).await.unwrap();
        store.record(Submission::new(station(40)).at(t(4))).await.unwrap();

        let hits = store.find_by_timestamp_range(t(2), t(3)).await.unwrap();
        let humidity: Vec<i32> = hits.iter().map(|r| r.humidity_avg).collect();
        assert_eq!(humidity, vec![20, 30]);
    }

    #[tokio::test]
    async fn degenerate_range_matches_single_instant() {
        let store = memory_store();
        store.record(Submission::new(station(10)).at(t(1))).await.unwrap();
        store.record(Submission::new(station(20)).at(t(2))).await.unwrap();

        let hits = store.find_by_timestamp_range(t(2), t(2)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].humidity_avg, 20);
    }

    #[tokio::test]
    async fn three_reading_scenario() {
        let store = memory_store();
        store.record(Submission::new(station(31)).at(t(1))).await.unwrap();
        store.record(Submission::new(station(52)).at(t(2))).await.unwrap();
        store.record(Submission::new(station(73)).at(t(3))).await.unwrap();

        let mut all: Vec<i32> = store
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.humidity_avg)
            .collect();
        all.sort();
        assert_eq!(all, vec![31, 52, 73]);

        let mut first_two: Vec<i32> = store
            .find_by_timestamp_range(t(1), t(2))
            .await
            .unwrap()
            .iter()
            .map(|r| r.humidity_avg)
            .collect();
        first_two.sort();
        assert_eq!(first_two, vec![31, 52]);

        let third = store.find_by_timestamp(t(3)).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].humidity_avg, 73);
        assert_eq!(third[0].humidity_min, 63);
        assert_eq!(third[0].humidity_max, 83);
    }

    #[tokio::test]
    async fn et0_store_follows_the_same_contract() {
        let store = Store::<Et0Prediction>::with_clock(
            Gateway::Memory(MemoryTable::new()),
            Arc::new(FixedClock(t(0))),
        );
        let m = Et0Measurements {
            avg_temp: 23.5,
            avg_humidity: 58,
            avg_solar_radiation: 290.0,
            predicted_et0: 4.1,
        };

        let mut submission = Submission::new(m);
        submission.id = Some(7);
        let a = store.record(submission.clone()).await.unwrap();
        let b = store.record(submission.at(t(2))).await.unwrap();

        assert_eq!(a.timestamp, t(0));
        assert_ne!(a.id, b.id);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
        assert_eq!(store.find_by_timestamp(t(2)).await.unwrap(), vec![b.clone()]);
        assert_eq!(store.find_by_timestamp_range(t(0), t(2)).await.unwrap(), vec![a, b]);
        assert!(store.find_by_timestamp_range(t(2), t(0)).await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Postgres gateway (needs DATABASE_URL)
    // -----------------------------------------------------------------------

    fn pg_store(pool: PgPool) -> Store<StationReading> {
        Store::with_clock(Gateway::Postgres(pool), Arc::new(FixedClock(t(12))))
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres instance via DATABASE_URL"]
    async fn pg_record_assigns_fresh_ids_and_defaults_timestamp(pool: PgPool) {
        let store = pg_store(pool);
        let mut submission = Submission::new(station(50));
        submission.id = Some(1000);

        let a = store.record(submission.clone()).await.unwrap();
        let b = store.record(submission).await.unwrap();

        assert_ne!(a.id, 1000);
        assert_ne!(a.id, b.id);
        assert_eq!(a.timestamp, t(12));
        assert_eq!(a.solar_radiation_avg, None);
        assert_eq!(a.solar_radiation_max, Some(780.0));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres instance via DATABASE_URL"]
    async fn pg_fine_grained_timestamp_round_trips(pool: PgPool) {
        let store = pg_store(pool);
        let fine = t(4).with_nanosecond(123_456_789).unwrap();

        let r = store.record(Submission::new(station(50)).at(fine)).await.unwrap();
        let hits = store.find_by_timestamp(r.timestamp).await.unwrap();

        assert_eq!(hits, vec![r]);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres instance via DATABASE_URL"]
    async fn pg_three_reading_scenario(pool: PgPool) {
        let store = pg_store(pool);
        store.record(Submission::new(station(31)).at(t(1))).await.unwrap();
        store.record(Submission::new(station(52)).at(t(2))).await.unwrap();
        store.record(Submission::new(station(73)).at(t(3))).await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 3);

        let first_two = store.find_by_timestamp_range(t(1), t(2)).await.unwrap();
        assert_eq!(first_two.len(), 2);
        assert!(first_two.iter().all(|r| r.humidity_avg != 73));

        let third = store.find_by_timestamp(t(3)).await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].humidity_avg, 73);

        assert!(store.find_by_timestamp_range(t(3), t(1)).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres instance via DATABASE_URL"]
    async fn pg_et0_round_trip(pool: PgPool) {
        let store = Store::<Et0Prediction>::new(Gateway::Postgres(pool));
        let m = Et0Measurements {
            avg_temp: 23.5,
            avg_humidity: 58,
            avg_solar_radiation: 290.0,
            predicted_et0: 4.25,
        };

        let p = store.record(Submission::new(m).at(t(0))).await.unwrap();
        assert_eq!(store.find_by_timestamp_range(t(0), t(0)).await.unwrap(), vec![p]);
    }
}
