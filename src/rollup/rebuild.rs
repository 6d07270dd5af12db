//! Full recomputation of rollups from the live ledger.
//!
//! The incremental engine keeps buckets correct under normal operation;
//! rebuilding exists for repair, backfill, and the demo/seed workflow. A
//! rebuild is idempotent: it always produces the same bucket rows as a
//! function of the current live transactions, no matter how often it runs.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, database_id::UserId, ledger, rollup::bucket, rollup::engine, user};

/// Delete every bucket row belonging to `user_id` and replay the user's
/// live transactions through the aggregation engine.
///
/// Runs in a single SQLite transaction, so a crash mid-rebuild leaves
/// either the old rollups or the fully rebuilt ones, never a partial mix.
/// Returns the number of live transactions replayed.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAccountCurrency] if a live transaction's account cannot be resolved,
/// - [Error::BucketWriteConflict] if a bucket write stayed contended past the retry budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn rebuild_user(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    let unit = connection.unchecked_transaction()?;

    for table in &bucket::ALL_BUCKET_TABLES {
        unit.execute(
            &format!("DELETE FROM {} WHERE user_id = ?1", table.name),
            [user_id],
        )?;
    }

    let entries = ledger::live_entries_for_user(user_id, &unit)?;
    for entry in &entries {
        engine::apply(entry, &unit)?;
    }

    unit.commit()?;

    Ok(entries.len())
}

/// Rebuild the rollups of a single user.
///
/// # Errors
/// This function will return a:
/// - [Error::RefreshMissingUser] if `user_id` does not refer to a valid user,
/// - or any error from [rebuild_user].
pub fn refresh_one(user_id: UserId, connection: &Connection) -> Result<usize, Error> {
    if !user::user_exists(user_id, connection)? {
        return Err(Error::RefreshMissingUser(user_id));
    }

    rebuild_user(user_id, connection)
}

/// The outcome of a batch refresh run.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    /// How many users had their rollups rebuilt.
    pub rebuilt: u32,
    /// Users whose rebuild failed, with the error text.
    pub failures: Vec<(UserId, String)>,
}

/// Rebuild the rollups of every user in the database.
///
/// A failed rebuild is recorded and skipped rather than aborting the batch;
/// per-user rebuilds are still atomic, so a recorded failure leaves that
/// user's previous rollups intact.
///
/// # Errors
/// This function will return an [Error::SqlError] if the user list cannot
/// be read.
pub fn refresh_all(connection: &Connection) -> Result<RefreshReport, Error> {
    let users = user::get_all_users(connection)?;
    let total = users.len();
    let mut report = RefreshReport::default();

    for user in users {
        match rebuild_user(user.id, connection) {
            Ok(replayed) => {
                tracing::info!(
                    "rebuilt rollups for user {} from {replayed} live transactions ({}/{total})",
                    user.id,
                    report.rebuilt + 1
                );
                report.rebuilt += 1;
            }
            Err(error) => {
                tracing::warn!("skipping user {}: {error}", user.id);
                report.failures.push((user.id, error.to_string()));
            }
        }
    }

    Ok(report)
}
