//! TripForge - deterministic travel-itinerary planning pipeline.
//!
//! The main entry point: parses an intent off the command line, runs it
//! through the full orchestration pipeline, and prints the resulting
//! itinerary (or the blocking violations that prevented one).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tripforge_agents::{Driver, InMemoryEventSink, InMemoryRunStore, ToolRegistry};
use tripforge_core::{Intent, Preferences, Settings, SystemClock};
use tripforge_tools::{ExecutorSettings, InMemoryResultCache, ToolExecutor};

/// Command line interface for TripForge.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Destination city, e.g. "Paris".
    #[arg(long, default_value = "Paris")]
    city: String,

    /// Trip start date, YYYY-MM-DD.
    #[arg(long)]
    start: String,

    /// Trip end date, YYYY-MM-DD.
    #[arg(long)]
    end: String,

    /// Total budget in whole currency units (converted to cents).
    #[arg(long, default_value_t = 2000)]
    budget: i64,

    /// Departure airport code, e.g. "JFK".
    #[arg(long, default_value = "JFK")]
    airport: String,

    /// Require every activity to be kid-friendly.
    #[arg(long)]
    kid_friendly: bool,

    /// Avoid overnight flights.
    #[arg(long)]
    avoid_overnight: bool,

    /// Optional TOML settings file; falls back to compiled-in defaults
    /// overlaid with TRIPFORGE_* environment variables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Maps a destination city to the timezone its slot times should be
/// localized in; falls back to UTC for cities this workspace has no
/// fixture coverage for.
fn tz_for_city(city: &str) -> chrono_tz::Tz {
    match city {
        "Tokyo" => chrono_tz::Asia::Tokyo,
        "London" => chrono_tz::Europe::London,
        "Paris" => chrono_tz::Europe::Paris,
        _ => chrono_tz::UTC,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&settings.log_level)
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(city = %args.city, config = ?settings.config_path, "starting tripforge run");

    let tz = tz_for_city(&args.city);
    let intent = Intent {
        city: args.city,
        window_start: args.start.parse().context("invalid --start date")?,
        window_end: args.end.parse().context("invalid --end date")?,
        tz,
        budget_cents: args.budget * 100,
        airports: vec![args.airport],
        preferences: Preferences {
            kid_friendly: args.kid_friendly,
            avoid_overnight: args.avoid_overnight,
            ..Preferences::default()
        },
    };

    let clock: Arc<dyn tripforge_core::Clock> = Arc::new(SystemClock);
    let cache = Arc::new(InMemoryResultCache::new(clock.clone()));
    let metrics = Arc::new(tripforge_core::InMemoryMetrics::new());
    let tool_executor = ToolExecutor::new(
        ExecutorSettings {
            soft_timeout: std::time::Duration::from_secs_f64(settings.soft_timeout_s),
            hard_timeout: std::time::Duration::from_secs_f64(settings.hard_timeout_s),
            retry_jitter_min_ms: settings.retry_jitter_min_ms,
            retry_jitter_max_ms: settings.retry_jitter_max_ms,
            breaker_failure_threshold: settings.breaker_failure_threshold,
            breaker_cooldown_seconds: settings.breaker_cooldown_seconds,
            eval_rng_seed: settings.eval_rng_seed,
        },
        clock.clone(),
        cache,
        metrics,
    );

    let driver = Driver {
        event_sink: Arc::new(InMemoryEventSink::new()),
        run_store: Arc::new(InMemoryRunStore::new()),
        tool_executor,
        tool_registry: ToolRegistry::fixtures(clock),
    };

    let outcome = driver.run("cli", "local-user", intent, 1).await;

    match outcome {
        Ok(result) => {
            if let Some(itinerary) = &result.itinerary {
                println!("{}", serde_json::to_string_pretty(itinerary)?);
            }
            if !result.state.violations.is_empty() {
                info!(count = result.state.violations.len(), "remaining advisory violations");
                for violation in &result.state.violations {
                    println!("note: {} ({})", violation.reason, violation.node_ref);
                }
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("tripforge run failed: {err}");
            std::process::exit(1);
        }
    }
}
