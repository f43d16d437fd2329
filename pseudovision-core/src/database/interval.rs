//! Conversion between `chrono::Duration` and Postgres' native `interval`
//! type. Our durations never carry a months/days component, so the
//! conversion is exact in both directions for the ranges this system
//! deals in (time-of-day offsets, block lengths, media runtimes).

use chrono::Duration;
use sqlx::postgres::types::PgInterval;

pub fn to_pg_interval(d: Duration) -> PgInterval {
    PgInterval {
        months: 0,
        days: 0,
        microseconds: d.num_microseconds().unwrap_or(i64::MAX),
    }
}

pub fn from_pg_interval(pg: PgInterval) -> Duration {
    Duration::days(pg.days as i64)
        + Duration::microseconds(pg.microseconds)
        + Duration::days(30 * pg.months as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_plain_duration() {
        let original = Duration::minutes(90);
        let pg = to_pg_interval(original);
        assert_eq!(from_pg_interval(pg), original);
    }
}
