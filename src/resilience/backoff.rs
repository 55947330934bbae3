//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before the next broker connect attempt.
///
/// `attempt` is the number of attempts already failed. The delay doubles per
/// attempt from `base_ms`, is capped at `max_ms`, and gets up to 10% jitter on top.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let first = calculate_backoff(1, 200, 5_000);
        assert!(first >= Duration::from_millis(200) && first < Duration::from_millis(220));

        let third = calculate_backoff(3, 200, 5_000);
        assert!(third >= Duration::from_millis(800));

        let capped = calculate_backoff(30, 200, 5_000);
        assert!(capped >= Duration::from_millis(5_000));
        assert!(capped < Duration::from_millis(5_500));
    }

    #[test]
    fn test_no_delay_before_first_attempt() {
        assert_eq!(calculate_backoff(0, 200, 5_000), Duration::ZERO);
        assert_eq!(calculate_backoff(4, 0, 5_000), Duration::ZERO);
    }
}
