use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use farewatch::{
    monitor::{daily_schedule, MonitorRequest, MonitorUpdate},
    monitoring,
    storage::{self, HistoryStore},
    tools::{self, ScrapeResult, ToolContext},
    types::AppConfig,
};

#[derive(Parser, Debug)]
#[command(name = "farewatch")]
#[command(about = "Flight price monitoring: history, deal detection, best travel weeks", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a scrape result for a route and assess deal-ness
    Check {
        origin: String,
        destination: String,
        /// Path to a JSON scrape result ({"flights": [...]})
        #[arg(long)]
        offers: String,
    },
    /// Show a route's price history over a trailing window
    History {
        route_id: String,
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Rank the cheapest travel weeks for a route
    BestTimes { route_id: String },
    /// Configure monitoring for a route
    Setup {
        origin: String,
        destination: String,
        #[arg(long)]
        date_range: Option<String>,
        /// Daily check hour (UTC, 0-23)
        #[arg(long)]
        hour: Option<u32>,
        /// Daily check minute (0-59)
        #[arg(long, default_value_t = 0, requires = "hour")]
        minute: u32,
        #[arg(long)]
        timezone: Option<String>,
        /// Percent drop that triggers a deal alert
        #[arg(long)]
        threshold: Option<i64>,
    },
    /// List monitored routes
    List,
    /// Update an existing monitor
    Update {
        route_id: String,
        #[arg(long)]
        date_range: Option<String>,
        #[arg(long)]
        hour: Option<u32>,
        #[arg(long, default_value_t = 0, requires = "hour")]
        minute: u32,
        #[arg(long)]
        timezone: Option<String>,
        #[arg(long)]
        threshold: Option<i64>,
    },
    /// Stop monitoring one route and erase its history
    Disable { route_id: String },
    /// Stop all monitoring and erase all history
    StopAll,
    /// Show all monitors with their current stats
    Status,
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schedule_arg(hour: Option<u32>, minute: u32) -> anyhow::Result<Option<String>> {
    match hour {
        Some(h) => {
            let schedule = daily_schedule(h, minute)
                .with_context(|| format!("invalid check time {h}:{minute:02}"))?;
            Ok(Some(schedule))
        }
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "farewatch=debug,info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    tracing::debug!(target: "farewatch", config = %cli.config, "loading config");

    let settings = AppConfig::from_file(&cli.config)?;
    monitoring::logger::log_startup(&settings);

    let store = storage::create_store(&settings.storage).await?;
    let ctx = ToolContext {
        history: HistoryStore::new(store.clone()),
        monitors: farewatch::monitor::MonitorRegistry::new(store),
        defaults: settings.defaults.clone(),
    };

    let now = Utc::now();

    match cli.command {
        Commands::Check {
            origin,
            destination,
            offers,
        } => {
            let raw = tokio::fs::read_to_string(&offers)
                .await
                .with_context(|| format!("failed to read scrape result at {offers}"))?;
            let scrape: ScrapeResult = serde_json::from_str(&raw)
                .with_context(|| format!("malformed scrape result at {offers}"))?;
            match tools::check_price(&ctx, &origin, &destination, scrape, now).await? {
                Some(outcome) => print_json(&outcome)?,
                None => println!("{{\"noFlights\":true}}"),
            }
        }
        Commands::History { route_id, days } => {
            match tools::price_history(&ctx, &route_id, Some(days), now).await? {
                Some(history) => print_json(&history)?,
                None => println!("{{\"noHistory\":true}}"),
            }
        }
        Commands::BestTimes { route_id } => {
            match tools::best_travel_times(&ctx, &route_id).await? {
                Some(best) => print_json(&best)?,
                None => println!("{{\"noHistory\":true}}"),
            }
        }
        Commands::Setup {
            origin,
            destination,
            date_range,
            hour,
            minute,
            timezone,
            threshold,
        } => {
            let request = MonitorRequest {
                date_range,
                schedule: schedule_arg(hour, minute)?,
                timezone,
                threshold_percent: threshold,
            };
            let monitor = tools::setup_monitoring(&ctx, &origin, &destination, request, now).await?;
            print_json(&monitor)?;
        }
        Commands::List => {
            let monitors = tools::list_monitoring(&ctx).await?;
            print_json(&monitors)?;
        }
        Commands::Update {
            route_id,
            date_range,
            hour,
            minute,
            timezone,
            threshold,
        } => {
            let update = MonitorUpdate {
                date_range,
                schedule: schedule_arg(hour, minute)?,
                timezone,
                threshold_percent: threshold,
            };
            match tools::update_monitoring(&ctx, &route_id, update).await? {
                Some(monitor) => print_json(&monitor)?,
                None => println!("{{\"notMonitored\":true}}"),
            }
        }
        Commands::Disable { route_id } => {
            let existed = tools::disable_route(&ctx, &route_id).await?;
            print_json(&serde_json::json!({ "routeId": route_id, "removed": existed }))?;
        }
        Commands::StopAll => {
            let stopped = tools::stop_all(&ctx).await?;
            print_json(&serde_json::json!({ "routesStopped": stopped }))?;
        }
        Commands::Status => {
            let statuses = tools::monitoring_status(&ctx).await?;
            print_json(&statuses)?;
        }
    }

    monitoring::metrics::log_metrics_snapshot(&monitoring::metrics::METRICS.snapshot());

    Ok(())
}
