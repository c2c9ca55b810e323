use serde::{Deserialize, Serialize};

use crate::tracker::RouteStats;
use crate::utils::math::round_half_away;

/// Why a price was (or was not) classified as a deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealReason {
    None,
    ThirtyDayLow,
    SignificantDrop,
    InsufficientData,
}

impl DealReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealReason::None => "none",
            DealReason::ThirtyDayLow => "thirty_day_low",
            DealReason::SignificantDrop => "significant_drop",
            DealReason::InsufficientData => "insufficient_data",
        }
    }
}

/// Ephemeral classification of one observed price against current stats.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAssessment {
    pub is_deal: bool,
    pub reason: DealReason,
    /// Signed percent drop from the 7-day average, rounded; positive means
    /// the current price is below the average.
    pub percentage_drop: Option<i64>,
    pub is_lowest_in_30_days: bool,
}

impl DealAssessment {
    fn insufficient_data() -> Self {
        Self {
            is_deal: false,
            reason: DealReason::InsufficientData,
            percentage_drop: None,
            is_lowest_in_30_days: false,
        }
    }
}

/// Classify `current_price` relative to `stats` and a drop threshold.
///
/// A 30-day low is always a deal regardless of the threshold: it is an
/// absolute floor signal, while the percentage-drop path is the tunable
/// sensitivity. Missing price or stats yields the `insufficient_data`
/// outcome rather than an error.
pub fn assess_deal(
    current_price: Option<f64>,
    stats: Option<&RouteStats>,
    threshold_percent: i64,
) -> DealAssessment {
    let (price, stats) = match (current_price, stats) {
        (Some(p), Some(s)) if p.is_finite() => (p, s),
        _ => return DealAssessment::insufficient_data(),
    };

    let is_lowest_in_30_days = stats.min_30day.map_or(false, |min| price <= min);

    // A zero average cannot produce a meaningful drop percentage.
    let percentage_drop = stats
        .avg_7day
        .filter(|avg| *avg != 0)
        .map(|avg| round_half_away((avg as f64 - price) / avg as f64 * 100.0));

    let dropped_enough = percentage_drop.map_or(false, |drop| drop >= threshold_percent);
    let is_deal = is_lowest_in_30_days || dropped_enough;

    let reason = if is_lowest_in_30_days {
        DealReason::ThirtyDayLow
    } else if dropped_enough {
        DealReason::SignificantDrop
    } else {
        DealReason::None
    };

    DealAssessment {
        is_deal,
        reason,
        percentage_drop,
        is_lowest_in_30_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(avg_7day: Option<i64>, min_30day: Option<f64>) -> RouteStats {
        RouteStats {
            avg_7day,
            avg_30day: avg_7day,
            min_30day,
            max_30day: min_30day,
            last_check: None,
        }
    }

    #[test]
    fn missing_inputs_are_insufficient_data() {
        let a = assess_deal(None, Some(&stats(Some(100), Some(90.0))), 15);
        assert!(!a.is_deal);
        assert_eq!(a.reason, DealReason::InsufficientData);
        assert_eq!(a.percentage_drop, None);

        let b = assess_deal(Some(100.0), None, 15);
        assert_eq!(b.reason, DealReason::InsufficientData);
    }

    #[test]
    fn thirty_day_low_wins_over_any_threshold() {
        let s = stats(Some(200), Some(110.0));
        let a = assess_deal(Some(110.0), Some(&s), 100);
        assert!(a.is_deal);
        assert_eq!(a.reason, DealReason::ThirtyDayLow);
        assert!(a.is_lowest_in_30_days);
    }

    #[test]
    fn significant_drop_fires_at_threshold() {
        let s = stats(Some(200), Some(100.0));
        let a = assess_deal(Some(170.0), Some(&s), 15);
        assert!(a.is_deal);
        assert_eq!(a.reason, DealReason::SignificantDrop);
        assert_eq!(a.percentage_drop, Some(15));
    }

    #[test]
    fn price_rise_is_not_a_deal() {
        let s = stats(Some(100), Some(90.0));
        let a = assess_deal(Some(150.0), Some(&s), 15);
        assert!(!a.is_deal);
        assert_eq!(a.reason, DealReason::None);
        assert_eq!(a.percentage_drop, Some(-50));
    }

    #[test]
    fn deal_is_monotonic_in_price() {
        let s = stats(Some(200), Some(100.0));
        let mut was_deal = false;
        // Walk the price down; once a deal, always a deal.
        for price in (0..=250).rev().map(|p| p as f64) {
            let a = assess_deal(Some(price), Some(&s), 15);
            if was_deal {
                assert!(a.is_deal, "deal-ness regressed at price {price}");
            }
            was_deal = a.is_deal;
        }
        assert!(was_deal);
    }

    #[test]
    fn zero_average_yields_no_percentage() {
        let s = stats(Some(0), None);
        let a = assess_deal(Some(50.0), Some(&s), 15);
        assert_eq!(a.percentage_drop, None);
        assert!(!a.is_deal);
    }
}
