use std::error::Error;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use centime::{initialize_db, rollup};

/// Rebuilds the rollup tables from the live transaction ledger.
///
/// Safe to re-run any number of times: the rebuilt buckets are a pure
/// function of the current live transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Rebuild only this user's rollups instead of every user's.
    #[arg(long)]
    user_id: Option<i64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    match args.user_id {
        Some(user_id) => {
            let replayed = rollup::refresh_one(user_id, &conn)?;
            tracing::info!("rebuilt rollups for user {user_id} from {replayed} live transactions");
        }
        None => {
            let report = rollup::refresh_all(&conn)?;
            tracing::info!(
                "rebuilt rollups for {} users ({} failed)",
                report.rebuilt,
                report.failures.len()
            );

            if !report.failures.is_empty() {
                for (user_id, reason) in &report.failures {
                    tracing::error!("user {user_id}: {reason}");
                }
                exit(1);
            }
        }
    }

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
