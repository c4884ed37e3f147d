//! Delays between scraper retries.

use rand::Rng;
use std::time::Duration;

/// Wait before re-sending after failed attempt `attempt` (1-based):
/// `base_ms * 2^(attempt - 1)`, capped at `max_ms`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let Some(exponent) = attempt.checked_sub(1) else {
        return Duration::ZERO;
    };

    let delay = 1u64
        .checked_shl(exponent)
        .and_then(|factor| base_ms.checked_mul(factor))
        .map_or(max_ms, |d| d.min(max_ms));

    let jitter = match delay / 10 {
        0 => 0,
        spread => rand::thread_rng().gen_range(0..=spread),
    };
    Duration::from_millis(delay.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(attempt: u32, base_ms: u64, max_ms: u64) -> u128 {
        calculate_backoff(attempt, base_ms, max_ms).as_millis()
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        assert_eq!(millis(0, 500, 8000), 0);
        assert!((500..=550).contains(&millis(1, 500, 8000)));
        assert!((1000..=1100).contains(&millis(2, 500, 8000)));
        assert!((4000..=4400).contains(&millis(4, 500, 8000)));
        assert!((8000..=8800).contains(&millis(9, 500, 8000)));
    }

    #[test]
    fn test_small_delays_have_no_jitter() {
        assert_eq!(millis(1, 5, 100), 5);
    }

    #[test]
    fn test_huge_attempts_hit_the_cap() {
        assert!((5000..=5500).contains(&millis(200, u64::MAX / 2, 5000)));
        assert!((5000..=5500).contains(&millis(64, 1, 5000)));
    }
}
