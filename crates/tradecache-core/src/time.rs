//! Time helpers.

use std::time::Duration;
use time::OffsetDateTime;

/// Current UTC timestamp.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Elapsed wall-clock time since `since`, saturating to zero if the clock
/// moved backwards.
pub fn elapsed_since(since: OffsetDateTime) -> Duration {
    let delta = now_utc() - since;
    if delta.is_negative() {
        Duration::ZERO
    } else {
        Duration::new(
            delta.whole_seconds() as u64,
            delta.subsec_nanoseconds() as u32,
        )
    }
}

/// Whether `ttl` has elapsed since `since`.
pub fn is_older_than(since: OffsetDateTime, ttl: Duration) -> bool {
    elapsed_since(since) > ttl
}
