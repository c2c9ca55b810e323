use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tracker::{RouteHistory, DEFAULT_CURRENCY};
use crate::utils::math::{mean, round_half_away};
use crate::utils::time::week_key;

/// At most this many weeks are returned from a ranking.
pub const MAX_RANKED_WEEKS: usize = 5;

/// One ISO week's aggregated price observations.
///
/// `week_start`/`week_end` are the tightest observed span within the week,
/// not the calendar week boundaries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub avg_price: i64,
    pub best_price: f64,
    pub samples_in_bucket: usize,
}

/// Weeks ranked ascending by average price, cheapest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedWeeks {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub currency: String,
    pub weeks: Vec<WeekBucket>,
}

/// Saving of the cheapest shown week versus the most expensive shown week.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    pub amount: i64,
    pub percent: i64,
}

#[derive(Debug)]
struct BucketAccum {
    start: NaiveDate,
    end: NaiveDate,
    prices: Vec<f64>,
}

impl BucketAccum {
    fn new(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
            prices: Vec::new(),
        }
    }

    fn push(&mut self, date: NaiveDate, price: f64) {
        self.start = self.start.min(date);
        self.end = self.end.max(date);
        self.prices.push(price);
    }

    fn finish(self) -> Option<WeekBucket> {
        let avg = mean(&self.prices)?;
        let best = self.prices.iter().copied().reduce(f64::min)?;
        Some(WeekBucket {
            week_start: self.start,
            week_end: self.end,
            avg_price: round_half_away(avg),
            best_price: best,
            samples_in_bucket: self.prices.len(),
        })
    }
}

/// Rank the travel weeks of a route's history by average price.
///
/// Primary path: every offer across all checks that carries a concrete
/// travel date contributes the minimum price ever seen for that exact date
/// (a later cheaper sighting lowers the date's best, a pricier one never
/// raises it). When no offer anywhere carries a travel date, each check's
/// single best price is grouped instead, keyed by its best travel date or,
/// failing that, the calendar date of the check itself.
///
/// Buckets are ISO 8601 weeks (Thursday rule). The result holds at most
/// [`MAX_RANKED_WEEKS`] weeks sorted non-decreasing by average price; equal
/// averages keep week-key order, so the ranking is deterministic for any
/// input ordering.
pub fn analyze_best_windows(history: &RouteHistory) -> Option<RankedWeeks> {
    if history.samples.is_empty() {
        return None;
    }

    // Minimum price ever observed for each exact travel date.
    let mut best_per_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for sample in &history.samples {
        for offer in &sample.observed_prices {
            let Some(date) = offer.travel_date else {
                continue;
            };
            if !offer.price.is_finite() {
                continue;
            }
            best_per_date
                .entry(date)
                .and_modify(|best| *best = best.min(offer.price))
                .or_insert(offer.price);
        }
    }

    let observations: Vec<(NaiveDate, f64)> = if best_per_date.is_empty() {
        // Fallback: one observation per check.
        history
            .samples
            .iter()
            .filter_map(|sample| {
                let price = sample.best_price.filter(|p| p.is_finite())?;
                let date = sample
                    .best_travel_date
                    .unwrap_or_else(|| sample.check_timestamp.date_naive());
                Some((date, price))
            })
            .collect()
    } else {
        best_per_date.into_iter().collect()
    };

    if observations.is_empty() {
        return None;
    }

    let mut buckets: BTreeMap<(i32, u32), BucketAccum> = BTreeMap::new();
    for (date, price) in observations {
        buckets
            .entry(week_key(date))
            .or_insert_with(|| BucketAccum::new(date))
            .push(date, price);
    }

    let mut weeks: Vec<WeekBucket> = buckets
        .into_values()
        .filter_map(BucketAccum::finish)
        .collect();
    weeks.sort_by_key(|w| w.avg_price);
    weeks.truncate(MAX_RANKED_WEEKS);

    let currency = history
        .samples
        .iter()
        .rev()
        .find(|s| !s.currency.is_empty())
        .map(|s| s.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Some(RankedWeeks {
        route_id: history.route_id.clone(),
        origin: history.origin.clone(),
        destination: history.destination.clone(),
        currency,
        weeks,
    })
}

/// Saving of the cheapest week shown versus the most expensive week shown,
/// as an absolute amount and a percent of the expensive week's average.
/// Meaningless (None) with fewer than two weeks or a non-positive spread.
pub fn savings_summary(weeks: &[WeekBucket]) -> Option<Savings> {
    if weeks.len() < 2 {
        return None;
    }
    let cheapest = weeks.first()?;
    let most_expensive = weeks.last()?;
    let amount = most_expensive.avg_price - cheapest.avg_price;
    if amount <= 0 || most_expensive.avg_price == 0 {
        return None;
    }
    let percent = round_half_away(amount as f64 / most_expensive.avg_price as f64 * 100.0);
    Some(Savings { amount, percent })
}
