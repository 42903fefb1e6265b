use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meta_dashboard::api::state::AppState;
use meta_dashboard::calculate::compare::compare_periods;
use meta_dashboard::calculate::profile::matchup_profile;
use meta_dashboard::calculate::simulate::{default_field, project_field, FieldComposition};
use meta_dashboard::config::AppConfig;

#[derive(Parser)]
#[command(name = "meta-dashboard")]
#[command(about = "Metagame analytics over archetype matchup data")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// List configured periods and whether their data files are present
    Periods,

    /// Print a period's snapshot
    Snapshot {
        /// Period key, e.g. "6_months"
        #[arg(long)]
        period: String,
    },

    /// Print an archetype's matchup profile
    Profile {
        #[arg(long)]
        period: String,

        #[arg(long)]
        archetype: String,
    },

    /// Project expected win rates against a field
    Simulate {
        #[arg(long)]
        period: String,

        /// Field entry as NAME=PERCENT; repeatable. Defaults to the most played decks.
        #[arg(long = "field", value_name = "NAME=PCT")]
        field: Vec<String>,
    },

    /// Compare win rates across periods
    Trends {
        /// Minimum games across all periods (defaults to the configured value)
        #[arg(long)]
        min_games: Option<u32>,

        /// Period keys to compare; every available period when omitted
        #[arg(long = "period")]
        periods: Vec<String>,
    },
}

fn parse_field_entry(entry: &str) -> Result<(String, f64)> {
    let Some((name, percent)) = entry.rsplit_once('=') else {
        bail!("Field entry {:?} is not NAME=PERCENT", entry);
    };
    let percent: f64 = percent
        .trim()
        .parse()
        .with_context(|| format!("Invalid percentage in {:?}", entry))?;
    Ok((name.trim().to_string(), percent))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Loading {}", cli.config.display()))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.json_logs
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    tracing::info!("Starting meta-dashboard v{}", env!("CARGO_PKG_VERSION"));

    let loader = config.loader();

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::from_config(&config)?;
            let app = meta_dashboard::api::build_router(state);
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.server.host.clone()),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Periods => {
            let discovered = loader.storage().discover_period_keys();
            for key in &discovered {
                if loader.definition(key).is_err() {
                    tracing::warn!("Data files for unconfigured period {}", key);
                }
            }
            print_json(&loader.availability())?;
        }
        Commands::Snapshot { period } => {
            let snapshot = loader.load_period(&period)?;
            print_json(&snapshot)?;
        }
        Commands::Profile { period, archetype } => {
            let snapshot = loader.load_period(&period)?;
            let settings = config.analytics.profile_settings();
            let Some(profile) = matchup_profile(&snapshot, &archetype, &settings) else {
                bail!("Archetype {} not found in period {}", archetype, period);
            };
            print_json(&profile)?;
        }
        Commands::Simulate { period, field } => {
            let snapshot = loader.load_period(&period)?;
            let field = if field.is_empty() {
                default_field(&snapshot.records)
            } else {
                let entries = field
                    .iter()
                    .map(|entry| parse_field_entry(entry))
                    .collect::<Result<Vec<_>>>()?;
                FieldComposition::from_percentages(entries)?
            };

            if field.over_allocated() {
                tracing::warn!(
                    "Field assigns {:.1}%; shares are normalized",
                    field.assigned_percent()
                );
            }

            print_json(&project_field(&snapshot.matrix, &snapshot.archetypes, &field))?;
        }
        Commands::Trends { min_games, periods } => {
            let keys: Vec<String> = if periods.is_empty() {
                loader
                    .available_periods()
                    .into_iter()
                    .map(|p| p.key.clone())
                    .collect()
            } else {
                periods
            };
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

            let comparison = compare_periods(&loader, &keys)?;
            let min_games = min_games.unwrap_or(config.analytics.trend_min_games);
            print_json(&comparison.with_min_games(min_games))?;
        }
    }

    Ok(())
}
