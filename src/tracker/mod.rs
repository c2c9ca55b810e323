use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod deal;
pub mod stats;
pub mod windows;

pub use deal::{assess_deal, DealAssessment, DealReason};
pub use stats::compute_stats;
pub use windows::{analyze_best_windows, savings_summary, RankedWeeks, Savings, WeekBucket};

/// Samples older than this (relative to the append time) are dropped from a
/// route's history on every append.
pub const RETENTION_DAYS: i64 = 90;

/// Default trailing window for history queries.
pub const DEFAULT_QUERY_DAYS: i64 = 30;

/// Currency assumed when a scrape result does not carry one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Input the core refuses before touching any state.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("route id must not be empty")]
    EmptyRouteId,
    #[error("price must be finite and non-negative, got {0}")]
    BadPrice(f64),
}

/// Canonical route id: origin and destination codes uppercased, stripped to
/// at most three A-Z characters each, joined with a dash (e.g. "WAW-CDG").
pub fn route_id(origin: &str, destination: &str) -> String {
    fn code(s: &str) -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .take(3)
            .collect()
    }
    format!("{}-{}", code(origin), code(destination))
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_date_range() -> String {
    "flexible".to_string()
}

/// One flight offer observed during a price check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Concrete travel date, when the source exposed one per offer.
    #[serde(default)]
    pub travel_date: Option<NaiveDate>,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub duration: Option<String>,
}

/// The result of one price check for one route at one point in time.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    pub check_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub observed_prices: Vec<FlightOffer>,
    pub best_price: Option<f64>,
    pub best_travel_date: Option<NaiveDate>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl PriceSample {
    /// Build a sample from a scrape result, deriving the best price, its
    /// travel date and the currency from the cheapest offer.
    pub fn from_offers(check_timestamp: DateTime<Utc>, offers: Vec<FlightOffer>) -> Self {
        let best = offers
            .iter()
            .filter(|o| o.price.is_finite())
            .min_by(|a, b| a.price.total_cmp(&b.price));

        let (best_price, best_travel_date, currency) = match best {
            Some(offer) => (
                Some(offer.price),
                offer.travel_date,
                offer.currency.clone(),
            ),
            None => (None, None, default_currency()),
        };

        Self {
            check_timestamp,
            observed_prices: offers,
            best_price,
            best_travel_date,
            currency,
        }
    }

    /// Defensive check run before a sample enters the store.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if let Some(price) = self.best_price {
            if !price.is_finite() || price < 0.0 {
                return Err(InvalidInput::BadPrice(price));
            }
        }
        for offer in &self.observed_prices {
            if !offer.price.is_finite() || offer.price < 0.0 {
                return Err(InvalidInput::BadPrice(offer.price));
            }
        }
        Ok(())
    }
}

/// Derived rolling-window aggregates for a route. Recomputed on every
/// append, never mutated independently of the samples it was derived from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub avg_7day: Option<i64>,
    pub avg_30day: Option<i64>,
    pub min_30day: Option<f64>,
    pub max_30day: Option<f64>,
    pub last_check: Option<DateTime<Utc>>,
}

/// Persisted per-route record: identity, the pruned sample series and the
/// stats snapshot as of the last append.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHistory {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    /// Free-text description of the travel-date flexibility the route was
    /// configured with (e.g. "flexible", "March 2026").
    #[serde(default = "default_date_range")]
    pub date_range: String,
    #[serde(default)]
    pub samples: Vec<PriceSample>,
    #[serde(default)]
    pub stats: RouteStats,
}

impl RouteHistory {
    /// Empty history for a route that has never been checked.
    pub fn empty(route_id: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            origin: String::new(),
            destination: String::new(),
            date_range: default_date_range(),
            samples: Vec::new(),
            stats: RouteStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn route_id_canonicalizes_codes() {
        assert_eq!(route_id("waw", "CDG"), "WAW-CDG");
        assert_eq!(route_id("JFK1", "lhr-x"), "JFK-LHR");
    }

    #[test]
    fn from_offers_picks_cheapest() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let offers = vec![
            FlightOffer {
                price: 150.0,
                currency: "EUR".to_string(),
                travel_date: None,
                airline: Some("Lufthansa".to_string()),
                stops: 0,
                duration: None,
            },
            FlightOffer {
                price: 99.0,
                currency: "EUR".to_string(),
                travel_date: NaiveDate::from_ymd_opt(2026, 3, 10),
                airline: Some("Ryanair".to_string()),
                stops: 0,
                duration: None,
            },
        ];
        let sample = PriceSample::from_offers(ts, offers);
        assert_eq!(sample.best_price, Some(99.0));
        assert_eq!(sample.best_travel_date, NaiveDate::from_ymd_opt(2026, 3, 10));
        assert_eq!(sample.currency, "EUR");
    }

    #[test]
    fn from_offers_with_no_offers_has_no_best_price() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let sample = PriceSample::from_offers(ts, Vec::new());
        assert_eq!(sample.best_price, None);
        assert_eq!(sample.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn validate_rejects_negative_price() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let mut sample = PriceSample::from_offers(ts, Vec::new());
        sample.best_price = Some(-10.0);
        assert_eq!(sample.validate(), Err(InvalidInput::BadPrice(-10.0)));
    }

    #[test]
    fn persisted_field_names_match_record_layout() {
        let stats = RouteStats {
            avg_7day: Some(120),
            ..RouteStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("avg7day").is_some());
        assert!(json.get("min30day").is_some());
        assert!(json.get("lastCheck").is_some());
    }
}
