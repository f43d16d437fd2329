//! Wall-clock source, duration arithmetic, minute-boundary rounding, and
//! timezone-aware local time-of-day computation.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;

/// The system wall clock. A trait so tests can substitute a fixed instant
/// without reaching for a mocking framework — the same pattern the
/// teacher uses for its scan-clock abstractions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Next fire time for a fixed-anchor slot.
///
/// `after` is the instant to compute relative to; `time_of_day` is a
/// duration-from-local-midnight offset; `zone` is the schedule's
/// configured IANA zone. DST transitions are deliberately unhandled at
/// fine grain: the day is always treated as exactly 86,400 seconds.
pub fn next_fixed_fire_time(
    after: DateTime<Utc>,
    time_of_day: Duration,
    zone: Tz,
) -> DateTime<Utc> {
    let local = after.with_timezone(&zone);
    let midnight = zone.with_ymd_and_hms(local.year(), local.month(), local.day(), 0, 0, 0);
    // A midnight that falls in a DST gap/overlap has no single local
    // instant; fall back to whichever local reading is available rather
    // than panic.
    let local_midnight = midnight
        .single()
        .or_else(|| midnight.earliest())
        .or_else(|| midnight.latest())
        .unwrap_or_else(|| after.with_timezone(&zone));

    let candidate = local_midnight.with_timezone(&Utc) + time_of_day;

    if candidate > after {
        candidate
    } else {
        candidate + Duration::hours(24)
    }
}

/// The next instant that is a multiple of `minutes` minutes, measured in
/// UTC epoch seconds, that is `>= from`.
pub fn next_minute_boundary(from: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    if minutes <= 0 {
        return from;
    }
    let period_secs = minutes * 60;
    let epoch = from.timestamp();
    let remainder = epoch.rem_euclid(period_secs);
    if remainder == 0 {
        from
    } else {
        from + Duration::seconds(period_secs - remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_anchor_future_today() {
        let after = Utc.with_ymd_and_hms(2026, 7, 28, 3, 0, 0).unwrap();
        let fire = next_fixed_fire_time(after, Duration::hours(6), Tz::UTC);
        assert_eq!(fire, Utc.with_ymd_and_hms(2026, 7, 28, 6, 0, 0).unwrap());
    }

    #[test]
    fn fixed_anchor_already_passed_rolls_to_tomorrow() {
        let after = Utc.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap();
        let fire = next_fixed_fire_time(after, Duration::hours(6), Tz::UTC);
        assert_eq!(fire, Utc.with_ymd_and_hms(2026, 7, 29, 6, 0, 0).unwrap());
    }

    #[test]
    fn minute_boundary_rounds_up() {
        let from = Utc.with_ymd_and_hms(2026, 7, 28, 3, 7, 0).unwrap();
        let next = next_minute_boundary(from, 30);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 28, 3, 30, 0).unwrap());
    }

    #[test]
    fn minute_boundary_exact_is_noop() {
        let from = Utc.with_ymd_and_hms(2026, 7, 28, 3, 30, 0).unwrap();
        assert_eq!(next_minute_boundary(from, 30), from);
    }
}
