//! Monotonic clock helpers
//!
//! Timestamps are microseconds from a free-running 32-bit counter that
//! wraps roughly every 71 minutes. All differences go through
//! [`ticks_diff_us`] so a wrap between two samples still yields the
//! correct interval, as long as the interval itself stays under one
//! wrap period. The maximum-run guard (10 minutes by default) keeps
//! every interval the session computes well inside that bound.

/// Wraparound-safe difference between two microsecond timestamps
///
/// `earlier` must be the older sample; the result is the elapsed time
/// modulo the counter period.
pub fn ticks_diff_us(now_us: u32, earlier_us: u32) -> u32 {
    now_us.wrapping_sub(earlier_us)
}

/// Convert microseconds to whole milliseconds
pub fn ms_from_us(us: u32) -> u32 {
    us / 1_000
}

/// Elapsed whole milliseconds between two timestamps
pub fn elapsed_ms(start_us: u32, end_us: u32) -> u32 {
    ms_from_us(ticks_diff_us(end_us, start_us))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_simple() {
        assert_eq!(ticks_diff_us(1_500, 1_000), 500);
        assert_eq!(ticks_diff_us(1_000, 1_000), 0);
    }

    #[test]
    fn test_diff_across_wrap() {
        let before_wrap = u32::MAX - 100;
        let after_wrap = 400u32;
        assert_eq!(ticks_diff_us(after_wrap, before_wrap), 501);
    }

    #[test]
    fn test_elapsed_ms() {
        assert_eq!(elapsed_ms(0, 505_000), 505);
        assert_eq!(elapsed_ms(0, 999), 0);
        assert_eq!(elapsed_ms(u32::MAX - 499_999, 5_000), 505);
    }
}
