use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Source of "now" for timestamp defaulting.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, always UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Drop sub-microsecond digits.
///
/// `TIMESTAMPTZ` keeps microseconds, so anything finer would make the value
/// handed back by an insert differ from what a later equality lookup sees.
pub fn to_storage_precision(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(6)
}

/// Smallest whole-microsecond instant at or after `t`.
///
/// Used for lower range bounds: a stored value is `>= t` exactly when it is
/// `>=` this.
pub fn ceil_to_storage_precision(t: DateTime<Utc>) -> DateTime<Utc> {
    let floor = to_storage_precision(t);
    if floor == t {
        t
    } else {
        floor + Duration::microseconds(1)
    }
}
