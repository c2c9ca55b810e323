use chrono::{DateTime, Utc};

use crate::tracker::{PriceSample, RouteStats};
use crate::utils::math::{mean, round_half_away};
use crate::utils::time::window_start;

/// Length of the short averaging window in days.
pub const SHORT_WINDOW_DAYS: i64 = 7;
/// Length of the long averaging window in days.
pub const LONG_WINDOW_DAYS: i64 = 30;

/// Rolling-window aggregates over a route's sample series.
///
/// Pure function of the samples and an explicit reference instant, so the
/// same inputs always produce the same stats regardless of wall-clock time.
/// Averages are rounded half away from zero; extrema are exact. Windows
/// with no priced sample yield `None`, never 0 or NaN.
pub fn compute_stats(samples: &[PriceSample], now: DateTime<Utc>) -> RouteStats {
    if samples.is_empty() {
        return RouteStats::default();
    }

    let prices_since = |cutoff: DateTime<Utc>| -> Vec<f64> {
        samples
            .iter()
            .filter(|s| s.check_timestamp >= cutoff)
            .filter_map(|s| s.best_price)
            .filter(|p| p.is_finite())
            .collect()
    };

    let last_7 = prices_since(window_start(now, SHORT_WINDOW_DAYS));
    let last_30 = prices_since(window_start(now, LONG_WINDOW_DAYS));

    RouteStats {
        avg_7day: mean(&last_7).map(round_half_away),
        avg_30day: mean(&last_30).map(round_half_away),
        min_30day: last_30.iter().copied().reduce(f64::min),
        max_30day: last_30.iter().copied().reduce(f64::max),
        last_check: samples.iter().map(|s| s.check_timestamp).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 7, 0, 0).unwrap()
    }

    fn sample(price: f64, days_ago: i64) -> PriceSample {
        PriceSample {
            check_timestamp: now() - Duration::days(days_ago),
            observed_prices: Vec::new(),
            best_price: Some(price),
            best_travel_date: None,
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn empty_series_yields_defaults() {
        let stats = compute_stats(&[], now());
        assert_eq!(stats, RouteStats::default());
    }

    #[test]
    fn windows_partition_by_age() {
        // One sample inside the 7-day window, one only inside the 30-day one.
        let samples = vec![sample(200.0, 20), sample(100.0, 2)];
        let stats = compute_stats(&samples, now());
        assert_eq!(stats.avg_7day, Some(100));
        assert_eq!(stats.avg_30day, Some(150));
        assert_eq!(stats.min_30day, Some(100.0));
        assert_eq!(stats.max_30day, Some(200.0));
        assert_eq!(stats.last_check, Some(now() - Duration::days(2)));
    }

    #[test]
    fn samples_outside_30_days_are_ignored_for_extrema() {
        let samples = vec![sample(10.0, 45), sample(120.0, 1)];
        let stats = compute_stats(&samples, now());
        assert_eq!(stats.min_30day, Some(120.0));
        assert_eq!(stats.max_30day, Some(120.0));
        // The stale sample still counts as history for last_check ordering.
        assert_eq!(stats.last_check, Some(now() - Duration::days(1)));
    }

    #[test]
    fn unpriced_samples_do_not_poison_averages() {
        let mut unpriced = sample(0.0, 1);
        unpriced.best_price = None;
        let stats = compute_stats(&[unpriced], now());
        assert_eq!(stats.avg_7day, None);
        assert_eq!(stats.min_30day, None);
        assert!(stats.last_check.is_some());
    }

    #[test]
    fn averages_round_half_away_from_zero() {
        let samples = vec![sample(100.0, 1), sample(101.0, 2)];
        let stats = compute_stats(&samples, now());
        assert_eq!(stats.avg_7day, Some(101));
    }
}
