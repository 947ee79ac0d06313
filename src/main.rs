//! CLI entry point for citysense.
//!
//! Provides subcommands for browsing live readings, querying detection
//! history by day and hour, inspecting city zone profiles, reading the
//! Pathway live-data service and talking to the smart city copilot.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use citysense::analyzers::types::{DateFilter, DateRange};
use citysense::config::Settings;
use citysense::context::AppContext;
use citysense::infra::groq::{ChatMessage, MODELS};
use citysense::output::{append_records, gzip_file, print_json, print_pretty};
use citysense::services::location_service::LocationService;
use citysense::services::memory::MemoryStore;
use citysense::services::prompt::system_prompt;
use citysense::services::zones::{CityZone, ZoneProfile};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "citysense")]
#[command(about = "Query city sensor detections and chat with the city copilot", long_about = None)]
struct Cli {
    /// Read detections from an exported database JSON file instead of the
    /// realtime database
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<String>,

    /// Maximum number of most-recent detections fetched per query
    #[arg(long, global = true)]
    fetch_limit: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List monitored locations
    Locations,
    /// Show the latest reading for a location
    Latest {
        location: String,
    },
    /// Follow live readings for a location
    Watch {
        location: String,

        /// Stop after this many updates (0 = until Ctrl-C)
        #[arg(short = 'n', long, default_value_t = 0)]
        updates: usize,
    },
    /// Show the span of history available for a location
    Range {
        location: String,
    },
    /// Per-day statistics over a date range
    Daily {
        location: String,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        /// Only keep detections from this hour of day (0-23)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,

        /// CSV file to append the day rows to
        #[arg(long)]
        csv: Option<String>,

        /// Also write a gzip-compressed copy of the CSV file
        #[arg(long, default_value_t = false, requires = "csv")]
        gzip: bool,
    },
    /// Hour-by-hour statistics for one day
    Hourly {
        location: String,

        #[arg(long)]
        date: NaiveDate,
    },
    /// Peak and quiet hours over a date range
    Summary {
        location: String,

        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,
    },
    /// Compare per-day statistics of two date ranges
    Compare {
        location: String,

        #[arg(long)]
        start1: NaiveDate,

        #[arg(long)]
        end1: NaiveDate,

        #[arg(long)]
        start2: NaiveDate,

        #[arg(long)]
        end2: NaiveDate,
    },
    /// Show the reference profile of a city zone
    Zone {
        #[arg(default_value = "Madhya Marg")]
        name: String,
    },
    /// Ask the city copilot a question (interactive when no message is given)
    Chat {
        /// Zone whose figures are given to the copilot
        #[arg(short, long, default_value = "Madhya Marg")]
        zone: String,

        /// Chat model id (see `models`)
        #[arg(short, long)]
        model: Option<String>,

        /// Print the reply as it is generated
        #[arg(long, default_value_t = false)]
        stream: bool,

        message: Vec<String>,
    },
    /// List available chat models
    Models,
    /// Query the Pathway live-data service
    Pathway {
        #[command(subcommand)]
        view: PathwayView,
    },
}

#[derive(Subcommand)]
enum PathwayView {
    /// Check whether the service is reachable
    Health,
    /// Fused dashboard figures for one location
    Dashboard {
        #[arg(default_value = "Madhya Marg")]
        location: String,

        /// Keep polling, every SECS seconds or the configured interval
        #[arg(long, value_name = "SECS")]
        poll: Option<Option<u64>>,

        /// Stop polling after this many dashboards (0 = until Ctrl-C)
        #[arg(short = 'n', long, default_value_t = 0, requires = "poll")]
        updates: usize,
    },
    /// Dashboards of every tracked location
    Stream {
        location: Option<String>,
    },
    /// Pipeline analytics and stream history lengths
    Analytics,
    /// Connection status of each upstream data source
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/citysense.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("citysense.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(limit) = cli.fetch_limit {
        settings.fetch_limit = limit;
    }
    if let Commands::Chat {
        model: Some(model), ..
    } = &cli.command
    {
        settings.groq_model = model.clone();
    }

    let ctx = match &cli.snapshot {
        Some(path) => {
            let store = MemoryStore::load(path)?;
            info!(snapshot = %path, "Using database snapshot");
            AppContext::with_store(settings, Arc::new(store))?
        }
        None => AppContext::new(settings)?,
    };

    match cli.command {
        Commands::Locations => {
            let names = ctx.locations().available_locations().await;
            let listing: Vec<_> = names
                .iter()
                .map(|name| match LocationService::config(name) {
                    Some(info) => json!({
                        "name": name,
                        "description": info.description,
                        "stream_id": info.stream_id,
                        "coords": info.coords,
                    }),
                    None => json!({ "name": name }),
                })
                .collect();
            print_json(&listing)?;
        }
        Commands::Latest { location } => match ctx.locations().latest(&location).await {
            Some(reading) => {
                info!(
                    location = %location,
                    status = %LocationService::traffic_status(reading.cars),
                    "Latest reading"
                );
                print_json(&reading)?;
            }
            None => warn!(location = %location, "No reading available"),
        },
        Commands::Watch { location, updates } => watch(&ctx, &location, updates).await?,
        Commands::Range { location } => match ctx.load_range(&location).await {
            Some(range) => print_json(&range)?,
            None => warn!(location = %location, "Selection changed before the range loaded"),
        },
        Commands::Daily {
            location,
            start,
            end,
            hour,
            csv,
            gzip,
        } => {
            let mut filter = DateFilter::new(&location, start, end);
            if let Some(hour) = hour {
                filter = filter.with_hour(hour);
            }
            let days = ctx.date_filter().aggregated_by_day(&filter).await;
            info!(location = %location, days = days.len(), "Daily aggregation complete");
            print_json(&days)?;

            if let Some(path) = csv {
                append_records(&path, &days)?;
                if gzip {
                    gzip_file(&path)?;
                }
            }
        }
        Commands::Hourly { location, date } => {
            let hours = ctx.date_filter().aggregated_by_hour(&location, date).await;
            print_json(&hours)?;
        }
        Commands::Summary {
            location,
            start,
            end,
            hour,
        } => {
            let mut filter = DateFilter::new(&location, start, end);
            if let Some(hour) = hour {
                filter = filter.with_hour(hour);
            }
            let summary = ctx.date_filter().summary_stats(&filter).await;
            print_json(&summary)?;
        }
        Commands::Compare {
            location,
            start1,
            end1,
            start2,
            end2,
        } => {
            let comparison = ctx
                .date_filter()
                .comparison(
                    &location,
                    DateRange {
                        start: start1,
                        end: end1,
                    },
                    DateRange {
                        start: start2,
                        end: end2,
                    },
                )
                .await;
            print_json(&comparison)?;
        }
        Commands::Zone { name } => {
            let zone = CityZone::resolve(&name);
            let profile = zone.profile();
            print_pretty(&profile);
            print_json(&json!({
                "zone": profile.name,
                "traffic_status": profile.traffic_status,
                "coords": profile.coords,
                "insights": profile.insights(),
                "aqi": ZoneProfile::labelled(&profile.aqi),
                "crowd": ZoneProfile::labelled(&profile.crowd),
                "noise": ZoneProfile::labelled(&profile.noise),
                "response_times": profile.response_times,
                "incidents": profile.incidents,
            }))?;
        }
        Commands::Chat {
            zone,
            stream,
            message,
            ..
        } => chat(&ctx, CityZone::resolve(&zone), stream, message.join(" ")).await?,
        Commands::Models => {
            for model in MODELS {
                println!(
                    "{:<32} {:<26} {:<8} {}",
                    model.id, model.name, model.developer, model.description
                );
            }
        }
        Commands::Pathway { view } => pathway(&ctx, view).await?,
    }

    Ok(())
}

/// Prints live readings until `limit` updates arrived (0 = no limit), the
/// feed ends or Ctrl-C is pressed.
#[tracing::instrument(skip(ctx))]
async fn watch(ctx: &AppContext, location: &str, limit: usize) -> Result<()> {
    let mut subscription = ctx.locations().subscribe(location).await;
    let mut received = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            update = subscription.next() => match update {
                Some(Some(reading)) => {
                    info!(
                        cars = reading.cars,
                        people = reading.people,
                        status = %LocationService::traffic_status(reading.cars),
                        "Reading"
                    );
                    print_json(&reading)?;
                }
                Some(None) => warn!("No reading available"),
                None => {
                    info!("Live feed ended");
                    break;
                }
            }
        }

        received += 1;
        if limit > 0 && received >= limit {
            break;
        }
    }

    subscription.unsubscribe();
    Ok(())
}

#[tracing::instrument(skip_all)]
async fn pathway(ctx: &AppContext, view: PathwayView) -> Result<()> {
    let client = ctx.pathway();
    match view {
        PathwayView::Health => {
            let up = client.health().await;
            print_json(&json!({ "connected": up }))?;
        }
        PathwayView::Dashboard {
            location,
            poll: None,
            ..
        } => print_json(&client.dashboard(&location).await?)?,
        PathwayView::Dashboard {
            location,
            poll: Some(secs),
            updates,
        } => {
            let every = match secs {
                Some(0) => bail!("--poll needs at least 1 second"),
                Some(secs) => Duration::from_secs(secs),
                None => ctx.settings().pathway_poll_interval,
            };
            info!(location = %location, every = ?every, "Polling dashboard");
            let mut dashboards = client.poll_dashboard(&location, every);
            let mut received = 0usize;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted");
                        break;
                    }
                    dashboard = dashboards.recv() => match dashboard {
                        Some(dashboard) => print_json(&dashboard)?,
                        None => break,
                    }
                }
                received += 1;
                if updates > 0 && received >= updates {
                    break;
                }
            }
        }
        PathwayView::Stream { location } => {
            let stream = client.unified_stream(location.as_deref()).await?;
            info!(
                locations = stream.data.len(),
                status = %stream.pipeline_status,
                "Unified stream"
            );
            print_json(&stream)?;
        }
        PathwayView::Analytics => print_json(&client.analytics().await?)?,
        PathwayView::Sources => print_json(&client.data_sources().await?)?,
    }
    Ok(())
}

/// One-shot question when `message` is non-empty, otherwise a prompt loop
/// over stdin that keeps the conversation history.
#[tracing::instrument(skip(ctx, message))]
async fn chat(ctx: &AppContext, zone: CityZone, stream: bool, message: String) -> Result<()> {
    let client = ctx.chat()?;
    let mut history = vec![ChatMessage::system(system_prompt(zone))];

    if !message.trim().is_empty() {
        history.push(ChatMessage::user(message));
        let reply = ask(client, &history, stream).await?;
        if !stream {
            println!("{reply}");
        }
        return Ok(());
    }

    info!(model = %client.model(), "Chat started, empty line or Ctrl-D to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        history.push(ChatMessage::user(line));
        match ask(client, &history, stream).await {
            Ok(reply) => {
                if !stream {
                    println!("{reply}");
                }
                history.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                // keep the session alive; the failed question is dropped
                warn!(error = %e, "Chat request failed");
                history.pop();
            }
        }
    }

    Ok(())
}

async fn ask(
    client: &citysense::infra::groq::ChatClient,
    history: &[ChatMessage],
    stream: bool,
) -> Result<String> {
    if !stream {
        return client.complete(history).await;
    }

    let reply = client
        .stream(history, |delta| {
            print!("{delta}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    if reply.is_empty() {
        bail!("chat stream ended without content");
    }
    Ok(reply)
}
