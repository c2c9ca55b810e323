//! Tool-layer orchestration invoked by the host runtime.
//!
//! Each operation runs to completion for one route and returns plain
//! structured data; rendering user-facing text is the formatter
//! collaborator's job, scraping and scheduling happen outside.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::monitor::{MonitorRegistry, MonitorRequest, MonitorUpdate, RouteMonitor};
use crate::monitoring::metrics::METRICS;
use crate::storage::HistoryStore;
use crate::tracker::{
    analyze_best_windows, assess_deal, route_id, savings_summary, DealAssessment, FlightOffer,
    PriceSample, RankedWeeks, RouteHistory, RouteStats, Savings,
};
use crate::types::MonitorDefaults;

pub struct ToolContext {
    pub history: HistoryStore,
    pub monitors: MonitorRegistry,
    pub defaults: MonitorDefaults,
}

/// Output of the scraper collaborator for one route check.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScrapeResult {
    #[serde(default)]
    pub flights: Vec<FlightOffer>,
}

/// Structured outcome of one price check, handed to the formatter.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub sample: PriceSample,
    pub stats: RouteStats,
    pub deal: DealAssessment,
    pub monitored: bool,
}

/// Ranked weeks plus the headline saving, for "when is cheapest" replies.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestTravelTimes {
    #[serde(flatten)]
    pub analysis: RankedWeeks,
    pub savings: Option<Savings>,
}

/// One monitored route joined with its current stats snapshot.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    #[serde(flatten)]
    pub monitor: RouteMonitor,
    pub stats: Option<RouteStats>,
}

/// Record a scrape result for a route and assess whether it is a deal.
///
/// An empty scrape appends nothing and yields `None`; the caller reports
/// "no flights found" without touching the history. The deal threshold is
/// the route monitor's when one exists, the configured default otherwise.
pub async fn check_price(
    ctx: &ToolContext,
    origin: &str,
    destination: &str,
    scrape: ScrapeResult,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<CheckOutcome>> {
    let route_id = route_id(origin, destination);

    if scrape.flights.is_empty() {
        info!(target: "tools", route = %route_id, "scrape returned no offers, nothing recorded");
        return Ok(None);
    }

    let sample = PriceSample::from_offers(now, scrape.flights);

    let monitor = ctx.monitors.find(&route_id).await?;
    let threshold = monitor
        .as_ref()
        .map(|m| m.threshold_percent)
        .unwrap_or(ctx.defaults.price_drop_threshold_pct);
    let date_range = monitor
        .as_ref()
        .map(|m| m.date_range.clone())
        .unwrap_or_else(|| "flexible".to_string());

    let history = ctx
        .history
        .append(&route_id, origin, destination, &date_range, sample.clone(), now)
        .await
        .with_context(|| format!("failed to record price check for {route_id}"))?;

    let deal = assess_deal(sample.best_price, Some(&history.stats), threshold);

    METRICS.record_check(&route_id);
    if deal.is_deal {
        METRICS.record_deal(&route_id, deal.reason.as_str());
    }

    let monitored = monitor.is_some();
    if monitored {
        ctx.monitors.mark_checked(&route_id, now).await?;
    }

    Ok(Some(CheckOutcome {
        route_id,
        origin: history.origin.clone(),
        destination: history.destination.clone(),
        sample,
        stats: history.stats,
        deal,
        monitored,
    }))
}

/// Route history windowed to the trailing `days` days (default 30).
/// `None` when the route has never recorded a sample.
pub async fn price_history(
    ctx: &ToolContext,
    route: &str,
    days: Option<i64>,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<RouteHistory>> {
    let history = ctx.history.query(route, days, now).await?;
    Ok(history)
}

/// Rank the cheapest travel weeks for a route from its recorded history.
pub async fn best_travel_times(
    ctx: &ToolContext,
    route: &str,
) -> anyhow::Result<Option<BestTravelTimes>> {
    let history = ctx.history.load(route).await?;
    let Some(analysis) = analyze_best_windows(&history) else {
        return Ok(None);
    };
    METRICS.record_analysis(route);
    let savings = savings_summary(&analysis.weeks);
    Ok(Some(BestTravelTimes { analysis, savings }))
}

/// Configure (or reconfigure) monitoring for a route.
pub async fn setup_monitoring(
    ctx: &ToolContext,
    origin: &str,
    destination: &str,
    request: MonitorRequest,
    now: DateTime<Utc>,
) -> anyhow::Result<RouteMonitor> {
    let route_id = route_id(origin, destination);
    let monitor = ctx
        .monitors
        .setup(&route_id, origin, destination, request, &ctx.defaults, now)
        .await?;
    Ok(monitor)
}

/// All configured monitors.
pub async fn list_monitoring(ctx: &ToolContext) -> anyhow::Result<Vec<RouteMonitor>> {
    Ok(ctx.monitors.list().await?)
}

/// Adjust an existing monitor; `None` when the route is not monitored.
pub async fn update_monitoring(
    ctx: &ToolContext,
    route: &str,
    update: MonitorUpdate,
) -> anyhow::Result<Option<RouteMonitor>> {
    Ok(ctx.monitors.update(route, update).await?)
}

/// Stop monitoring one route and erase its price history.
///
/// Returns whether a monitor existed; the history of a route that was
/// never monitored is left untouched.
pub async fn disable_route(ctx: &ToolContext, route: &str) -> anyhow::Result<bool> {
    let existed = ctx.monitors.remove(route).await?;
    if existed {
        ctx.history.erase(route).await?;
    }
    Ok(existed)
}

/// Stop all monitoring and erase every monitored route's history.
/// Returns the number of routes that were being monitored.
pub async fn stop_all(ctx: &ToolContext) -> anyhow::Result<usize> {
    let route_ids = ctx.monitors.clear().await?;
    for route in &route_ids {
        ctx.history.erase(route).await?;
    }
    Ok(route_ids.len())
}

/// Every monitor joined with its route's current stats snapshot.
pub async fn monitoring_status(ctx: &ToolContext) -> anyhow::Result<Vec<MonitorStatus>> {
    let monitors = ctx.monitors.list().await?;
    let mut statuses = Vec::with_capacity(monitors.len());
    for monitor in monitors {
        let history = ctx.history.load(&monitor.route_id).await?;
        let stats = if history.samples.is_empty() {
            None
        } else {
            Some(history.stats)
        };
        statuses.push(MonitorStatus { monitor, stats });
    }
    Ok(statuses)
}
