pub mod memory;
pub mod models;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
    FromRow, PgPool, Postgres,
};

pub use memory::MemoryTable;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Schema binding for an append-only, timestamped table.
///
/// Every table has a `BIGSERIAL id` and a `recorded_at TIMESTAMPTZ` column;
/// the remaining columns are the record's measurements.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    /// Everything except identity and time.
    type Measurements: Clone + Send + Sync + 'static;

    const TABLE: &'static str;
    /// Select list, in `FromRow` order.
    const COLUMNS: &'static str;
    /// `$1` is `recorded_at`, measurements follow in `bind_measurements` order.
    const INSERT: &'static str;

    fn id(&self) -> i64;
    fn timestamp(&self) -> DateTime<Utc>;
    fn assemble(id: i64, timestamp: DateTime<Utc>, measurements: Self::Measurements) -> Self;
    fn bind_measurements<'q>(measurements: &Self::Measurements, query: PgQuery<'q>) -> PgQuery<'q>;
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Storage backend for a single record table.
///
/// Only insert and read paths exist; rows are never updated or deleted.
pub enum Gateway<T> {
    Postgres(PgPool),
    Memory(MemoryTable<T>),
}

impl<T> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Postgres(pool) => Self::Postgres(pool.clone()),
            Self::Memory(table) => Self::Memory(table.clone()),
        }
    }
}

impl<T: Record> Gateway<T> {
    /// Appends one row and returns it with its freshly assigned `id`.
    pub async fn insert(
        &self,
        timestamp: DateTime<Utc>,
        measurements: T::Measurements,
    ) -> Result<T, sqlx::Error> {
        match self {
            Self::Postgres(pool) => {
                let query = sqlx::query(T::INSERT).bind(timestamp);
                let row = T::bind_measurements(&measurements, query)
                    .fetch_one(pool)
                    .await?;
                T::from_row(&row)
            }
            Self::Memory(table) => Ok(table.insert(timestamp, measurements).await),
        }
    }

    /// Every row, in insertion order.
    pub async fn scan(&self) -> Result<Vec<T>, sqlx::Error> {
        match self {
            Self::Postgres(pool) => {
                let sql = format!("SELECT {} FROM {} ORDER BY id", T::COLUMNS, T::TABLE);
                let rows = sqlx::query(&sql).fetch_all(pool).await?;
                decode_rows(&rows)
            }
            Self::Memory(table) => Ok(table.all().await),
        }
    }

    pub async fn find_at(&self, timestamp: DateTime<Utc>) -> Result<Vec<T>, sqlx::Error> {
        match self {
            Self::Postgres(pool) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE recorded_at = $1 ORDER BY id",
                    T::COLUMNS,
                    T::TABLE
                );
                let rows = sqlx::query(&sql).bind(timestamp).fetch_all(pool).await?;
                decode_rows(&rows)
            }
            Self::Memory(table) => Ok(table.matching(|t| t == timestamp).await),
        }
    }

    /// Rows with `min <= recorded_at <= max`.
    pub async fn find_between(
        &self,
        min: DateTime<Utc>,
        max: DateTime<Utc>,
    ) -> Result<Vec<T>, sqlx::Error> {
        match self {
            Self::Postgres(pool) => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE recorded_at BETWEEN $1 AND $2 ORDER BY id",
                    T::COLUMNS,
                    T::TABLE
                );
                let rows = sqlx::query(&sql)
                    .bind(min)
                    .bind(max)
                    .fetch_all(pool)
                    .await?;
                decode_rows(&rows)
            }
            Self::Memory(table) => Ok(table.matching(|t| min <= t && t <= max).await),
        }
    }
}

fn decode_rows<T: Record>(rows: &[PgRow]) -> Result<Vec<T>, sqlx::Error> {
    rows.iter().map(T::from_row).collect()
}
