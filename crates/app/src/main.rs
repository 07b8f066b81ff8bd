mod error;
mod page;
mod routes;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use fyyur_config::Config;
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::OffsetTime;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("FYYUR_GIT_HASH");

fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH})")
}

// --- CLI definition ---

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
#[command(name = "fyyur")]
#[command(about = "Venue, artist and show listings")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FYYUR_GIT_HASH"), ")"))]
struct Cli {
    /// Log level (overrides config)
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,

    /// Display log timestamps in UTC (default: local time)
    #[arg(long, global = true)]
    utc: bool,

    /// Database URL (overrides config)
    #[arg(long, global = true)]
    db_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List venues grouped by city and state
    ListVenues,
    /// List artists
    ListArtists,
    /// List all shows with their venue and artist
    ListShows,
}

impl Cli {
    /// Layer 4: CLI args on top of the loaded config.
    fn merge_into(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log_level = level.to_string();
        }
        if self.utc {
            config.utc = true;
        }
        if let Some(url) = &self.db_url {
            config.db_url = url.clone();
        }
        if let Commands::Serve { port: Some(port) } = self.command {
            config.port = port;
        }
    }
}

// --- Logging ---

fn init_logging(config: &Config) {
    let filter = EnvFilter::new(&config.log_level);

    if config.utc {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(OffsetTime::new(
                time::UtcOffset::UTC,
                time::macros::format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                ),
            ))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_timer(LocalTimer)
            .init();
    }
}

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

// --- Server ---

async fn run_server(config: &Config, pool: SqlitePool) -> anyhow::Result<()> {
    info!("Fyyur v{}", version_string());

    let app = routes::router(pool, &config.static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Listings ---

async fn print_venues(pool: &SqlitePool) -> anyhow::Result<()> {
    let areas = fyyur_db::list_venue_areas(pool, &fyyur_models::now_timestamp()).await?;
    if areas.is_empty() {
        println!("No venues listed.");
        return Ok(());
    }
    let mut total = 0;
    for area in &areas {
        println!("{}, {}", area.city, area.state);
        for v in &area.venues {
            println!("  {:<6} {:<40} {} upcoming", v.id, v.name, v.num_upcoming_shows);
        }
        total += area.venues.len();
    }
    println!("\n{total} venue(s) in {} area(s)", areas.len());
    Ok(())
}

async fn print_artists(pool: &SqlitePool) -> anyhow::Result<()> {
    let artists = fyyur_db::list_artists(pool).await?;
    if artists.is_empty() {
        println!("No artists listed.");
        return Ok(());
    }
    println!("{:<6} {}", "ID", "Name");
    println!("{}", "-".repeat(50));
    for a in &artists {
        println!("{:<6} {}", a.id, a.name);
    }
    println!("\n{} artist(s) total", artists.len());
    Ok(())
}

async fn print_shows(pool: &SqlitePool) -> anyhow::Result<()> {
    let shows = fyyur_db::list_shows(pool).await?;
    if shows.is_empty() {
        println!("No shows listed.");
        return Ok(());
    }
    println!("{:<20} {:<30} {}", "Start", "Venue", "Artist");
    println!("{}", "-".repeat(80));
    for s in &shows {
        println!("{:<20} {:<30} {}", s.start_time, s.venue_name, s.artist_name);
    }
    println!("\n{} show(s) total", shows.len());
    Ok(())
}

// --- Main ---

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load();
    cli.merge_into(&mut config);
    init_logging(&config);

    let pool = fyyur_db::connect(&config.db_url).await?;
    fyyur_db::migrate(&pool).await?;

    match cli.command {
        Commands::Serve { .. } => run_server(&config, pool).await?,
        Commands::ListVenues => print_venues(&pool).await?,
        Commands::ListArtists => print_artists(&pool).await?,
        Commands::ListShows => print_shows(&pool).await?,
    }

    Ok(())
}
