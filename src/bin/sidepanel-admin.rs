use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sidepanel::config::{Config, DatabaseBackend};
use sidepanel::logging;
use sidepanel::metrics::{self, DEFAULT_VISIT_LIMIT};
use sidepanel::models::{CreateVisitRequest, VisitTime};
use sidepanel::storage::{PostgresStorage, SqliteStorage, Storage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sidepanel-admin")]
#[command(about = "History sidepanel metrics management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the visits table and indexes
    Init,
    /// Show the latest metrics and visit count for a URL
    Metrics {
        url: String,
        /// Display offset in hours (defaults to the local timezone)
        #[arg(long, allow_hyphen_values = true)]
        tz_offset: Option<f64>,
    },
    /// List recorded visits for a URL, most recent first
    Visits {
        url: String,
        #[arg(long, default_value_t = DEFAULT_VISIT_LIMIT)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, allow_hyphen_values = true)]
        tz_offset: Option<f64>,
    },
    /// Record a visit by hand
    Record {
        url: String,
        #[arg(long)]
        links: i64,
        #[arg(long)]
        words: i64,
        #[arg(long)]
        images: i64,
        /// ISO-8601 visit time (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    logging::init(&config.log_level);

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => Arc::new(
            SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
        DatabaseBackend::Postgres => Arc::new(
            PostgresStorage::new(&config.database.url, config.database.max_connections).await?,
        ),
    };

    // Ensure database is initialized
    storage.init().await?;

    match cli.command {
        Commands::Init => {
            println!("✓ Database schema is ready");
        }
        Commands::Metrics { url, tz_offset } => {
            match metrics::get_latest_metrics(storage.as_ref(), &url, tz_offset).await? {
                Some(summary) => {
                    println!("URL:          {}", summary.url);
                    println!("Visits:       {}", summary.visit_count);
                    println!("Last visited: {}", summary.last_visited);
                    println!("Links:        {}", summary.link_count);
                    println!("Words:        {}", summary.word_count);
                    println!("Images:       {}", summary.image_count);
                }
                None => println!("No visits recorded for URL: {}", url),
            }
        }
        Commands::Visits {
            url,
            limit,
            offset,
            tz_offset,
        } => {
            let visits =
                metrics::list_visits(storage.as_ref(), &url, limit, offset, tz_offset).await?;
            if visits.is_empty() {
                println!("No visits recorded for URL: {}", url);
            } else {
                println!(
                    "{:<8} {:<32} {:>8} {:>8} {:>8}",
                    "ID", "Visited", "Links", "Words", "Images"
                );
                println!("{}", "-".repeat(68));
                for visit in visits {
                    println!(
                        "{:<8} {:<32} {:>8} {:>8} {:>8}",
                        visit.id,
                        visit.datetime_visited,
                        visit.link_count,
                        visit.word_count,
                        visit.image_count
                    );
                }
            }
        }
        Commands::Record {
            url,
            links,
            words,
            images,
            at,
        } => {
            let visit = metrics::create_visit(
                storage.as_ref(),
                CreateVisitRequest {
                    url,
                    link_count: links,
                    word_count: words,
                    image_count: images,
                    datetime_visited: at.map(VisitTime::Text),
                    timezone_offset: None,
                },
            )
            .await
            .context("Failed to record visit")?;
            println!(
                "✓ Recorded visit {} for '{}' at {}",
                visit.id, visit.url, visit.datetime_visited
            );
        }
    }

    Ok(())
}
