//! Timing primitives.
//!
//! `stdTimeMillis` is wall-clock time for timestamps; `stdTimeNanos`
//! uses a monotonic clock anchored at first use and should be preferred
//! for measuring durations.

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn clock_base() -> Instant {
    static BASE: OnceLock<Instant> = OnceLock::new();
    *BASE.get_or_init(Instant::now)
}

/// Sleep for `millis` milliseconds. Non-positive values return at once.
#[unsafe(no_mangle)]
pub extern "C" fn stdSleep(millis: i32) {
    if millis > 0 {
        std::thread::sleep(Duration::from_millis(millis as u64));
    }
}

/// Wall-clock milliseconds since the Unix epoch.
#[unsafe(no_mangle)]
pub extern "C" fn stdTimeMillis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Monotonic nanoseconds since first use. Saturates at `i64::MAX`.
#[unsafe(no_mangle)]
pub extern "C" fn stdTimeNanos() -> i64 {
    clock_base().elapsed().as_nanos().try_into().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanos_is_monotonic() {
        let a = stdTimeNanos();
        let b = stdTimeNanos();
        assert!(b >= a);
    }

    #[test]
    fn test_millis_is_recent() {
        // Sanity bound: after 2020, before 2100.
        let now = stdTimeMillis();
        assert!(now > 1_577_836_800_000);
        assert!(now < 4_102_444_800_000);
    }

    #[test]
    fn test_sleep_handles_nonpositive() {
        stdSleep(0);
        stdSleep(-5);
    }

    #[test]
    fn test_sleep_actually_waits() {
        let before = stdTimeNanos();
        stdSleep(10);
        let elapsed = stdTimeNanos() - before;
        assert!(elapsed >= 5_000_000, "slept only {}ns", elapsed);
    }
}
