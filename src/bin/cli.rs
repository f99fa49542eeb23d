//! Guild Points CLI
//!
//! Offline inspection and maintenance for a points database: show
//! leaderboards, look up or grant points, and evict stale entries.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use guild_points::{BotConfig, PointsLedger, PointsStore};
use guild_points::utils::{current_timestamp_ms, MS_PER_DAY};

#[derive(Parser)]
#[command(name = "guild-points-cli")]
#[command(about = "Guild Points ledger maintenance")]
#[command(version)]
struct Cli {
    /// Points database directory
    #[arg(short, long, env = "GUILD_POINTS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a guild's leaderboard
    Top {
        /// Guild ID
        guild: String,

        /// Number of entries to show
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Show one user's entry
    Get {
        /// Guild ID
        guild: String,
        /// User ID
        user: String,
    },

    /// Grant (or deduct, with a negative amount) points
    Give {
        /// Guild ID
        guild: String,
        /// User ID
        user: String,
        /// Signed amount
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },

    /// Evict entries not seen within the staleness threshold.
    /// Membership cannot be checked offline, so only recency applies here.
    Cleanup {
        /// Guild ID
        guild: String,

        /// Override the staleness threshold in days
        #[arg(long)]
        stale_days: Option<u64>,
    },

    /// Show database statistics
    Stats,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("guild_points=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };

    let store = match cli.data_dir.or_else(|| config.data_dir.clone()) {
        Some(dir) => PointsStore::open(dir)?,
        None => PointsStore::new()?,
    };
    let ledger = PointsLedger::new(store);

    match cli.command {
        Commands::Top { guild, count } => {
            let n = count.unwrap_or(config.leaderboard_size);
            let top = ledger.top_n(&guild, n)?;
            if top.is_empty() {
                println!("No entries for guild {guild}");
            }
            for (rank, entry) in top.iter().enumerate() {
                println!("{:>3}. {} - {} points", rank + 1, entry.user_id, entry.points);
            }
        }
        Commands::Get { guild, user } => {
            let entry = ledger.get(&guild, &user)?;
            let last_seen = Utc
                .timestamp_millis_opt(entry.last_seen as i64)
                .single()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| entry.last_seen.to_string());
            println!(
                "{} in {}: {} points (last seen {})",
                entry.user_id, entry.guild_id, entry.points, last_seen
            );
        }
        Commands::Give { guild, user, amount } => {
            ledger.ensure_exists(&guild, &user, current_timestamp_ms())?;
            let total = ledger.add_delta(&guild, &user, amount)?;
            println!("{user} now has {total} points");
        }
        Commands::Cleanup { guild, stale_days } => {
            let stale_after_ms = stale_days
                .map(|d| d * MS_PER_DAY)
                .unwrap_or_else(|| config.stale_after_ms());
            let removed =
                ledger.cleanup(&guild, current_timestamp_ms(), stale_after_ms, |_| true)?;
            println!("Removed {removed} old users' points.");
        }
        Commands::Stats => {
            let (bytes_on_disk, records) = ledger.size_info();
            println!("Total entries: {}", ledger.entry_count()?);
            println!("Database: {records} records, {bytes_on_disk} bytes on disk");
        }
    }

    ledger.flush()?;
    Ok(())
}
