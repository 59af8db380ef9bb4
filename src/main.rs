//! # Craftfolio Feed CLI (`cfeed`)
//!
//! The `cfeed` binary manages the portfolio database, runs feed queries from
//! the terminal, and starts the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! cfeed --config ./config/cfeed.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cfeed init` | Create the SQLite database and run schema migrations |
//! | `cfeed import <file>` | Upsert portfolio documents from a JSON array |
//! | `cfeed feed` | Print the ranked feed for a set of filters |
//! | `cfeed stats` | Summarize what is in the database |
//! | `cfeed serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! cfeed init
//! cfeed import ./data/portfolios.json --dry-run
//! cfeed feed --tech go --tech rust --skill backend --sort leetcodeRating
//! cfeed feed --rating 1500 --explain --json
//! cfeed serve
//! ```

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;

use craftfolio_feed::{config, feed, import, logging, migrate, server, stats};
use craftfolio_feed_core::criteria::{FeedCriteria, SortKey};

/// Craftfolio Feed: a ranked discovery feed over developer portfolios.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cfeed.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cfeed",
    about = "Craftfolio Feed — ranked discovery feed over developer portfolios",
    version,
    long_about = "Craftfolio Feed filters visible portfolios by technology, skill, \
    experience and competitive-programming rating, scores them, and serves ranked \
    previews through a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Import portfolios from a JSON file.
    ///
    /// The file holds an array of portfolio documents. Records are matched
    /// by username; unchanged records are skipped.
    Import {
        /// Path to the JSON file.
        path: PathBuf,

        /// Validate and count without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the ranked feed.
    Feed {
        /// Technology filter (repeatable).
        #[arg(long = "tech")]
        techs: Vec<String>,

        /// Skill filter (repeatable).
        #[arg(long = "skill")]
        skills: Vec<String>,

        /// Exact years of experience.
        #[arg(long, value_parser = parse_finite)]
        experience: Option<f64>,

        /// Lower edge of a 100-point rating band.
        #[arg(long, value_parser = parse_finite)]
        rating: Option<f64>,

        /// Sort key: yearsOfExperience, leetcodeRating, matchingProjectFactor, score.
        /// Unknown values sort by score.
        #[arg(long)]
        sort: Option<String>,

        /// Print at most this many entries.
        #[arg(long)]
        limit: Option<usize>,

        /// Include match counts for each entry.
        #[arg(long)]
        explain: bool,

        /// Print the feed as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show database statistics.
    Stats,

    /// Start the HTTP API server.
    Serve,
}

fn parse_finite(raw: &str) -> Result<f64, String> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{}' is not a number", raw)),
    }
}

/// Trimmed, non-empty filter tags; matches query-string handling.
fn filter_tags(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path, dry_run } => {
            import::run_import(&cfg, &path, dry_run).await?;
        }
        Commands::Feed {
            techs,
            skills,
            experience,
            rating,
            sort,
            limit,
            explain,
            json,
        } => {
            let criteria = FeedCriteria {
                tech_filters: filter_tags(techs),
                skill_filters: filter_tags(skills),
                exp_filter: experience,
                rating_filter: rating,
                sort_key: SortKey::from_param(sort.as_deref()),
                explain,
            };
            feed::run_feed(&cfg, &criteria, limit, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
