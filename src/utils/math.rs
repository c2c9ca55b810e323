/// Arithmetic mean of a price series, `None` when the series is empty.
///
/// Empty input is a first-class outcome here, never 0 or NaN; callers
/// surface it as "no data" rather than a bogus average.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to the nearest integer, ties away from zero (`f64::round` semantics).
///
/// Applied uniformly to window averages, week-bucket averages and
/// percentage drops so displayed figures agree across components.
pub fn round_half_away(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn mean_basic() {
        assert_eq!(mean(&[100.0, 90.0]), Some(95.0));
    }

    #[test]
    fn rounding_ties_away_from_zero() {
        assert_eq!(round_half_away(94.5), 95);
        assert_eq!(round_half_away(-49.5), -50);
        assert_eq!(round_half_away(94.4), 94);
    }
}
