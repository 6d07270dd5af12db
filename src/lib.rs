//! Centime keeps pre-computed spending rollups consistent with a ledger of
//! financial transactions.
//!
//! Every ledger mutation (create, update, soft delete, restore, force
//! delete) is translated into signed delta writes against bucket tables
//! sliced by user, account, category, merchant, and currency at daily,
//! monthly, and yearly granularity. The [dashboard] module assembles report
//! views from those buckets; the [rollup::rebuild] service recomputes them
//! from scratch for repair and backfill.

#![warn(missing_docs)]

pub mod account;
pub mod category;
pub mod dashboard;
mod database_id;
pub mod db;
pub mod ledger;
pub mod merchant;
mod money;
mod retry;
pub mod rollup;
#[cfg(test)]
mod test_utils;
pub mod user;

pub use database_id::{AccountId, CategoryId, DatabaseId, MerchantId, TransactionId, UserId};
pub use db::initialize as initialize_db;
pub use money::{Currency, Money};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A money string could not be parsed as an amount with at most two
    /// decimal places.
    #[error("could not parse \"{0}\" as a monetary amount")]
    InvalidAmount(String),

    /// A currency code was not three ASCII letters.
    #[error("\"{0}\" is not a valid three-letter currency code")]
    InvalidCurrency(String),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A transaction's account currency could not be resolved.
    ///
    /// Aggregation cannot pick a bucket without a currency, so this aborts
    /// the enclosing ledger mutation rather than defaulting to a guessed
    /// currency.
    #[error("could not resolve a currency for account {0}")]
    MissingAccountCurrency(AccountId),

    /// A bucket write kept losing the database lock and exhausted its retry
    /// budget. The enclosing ledger mutation is rolled back.
    #[error("bucket write still contended after {0} attempts")]
    BucketWriteConflict(u32),

    /// A ledger write referenced a user, account, category, or merchant
    /// that is not in the database.
    #[error("a referenced user, account, category, or merchant is not in the database")]
    InvalidReference,

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// Tried to update a transaction that does not exist.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or was already
    /// deleted.
    #[error("tried to delete a transaction that is not live in the database")]
    DeleteMissingTransaction,

    /// Tried to restore a transaction that does not exist or is not
    /// soft-deleted.
    #[error("tried to restore a transaction that is not soft-deleted")]
    RestoreMissingTransaction,

    /// Tried to refresh rollups for a user that does not exist.
    #[error("tried to refresh rollups for user {0}, who is not in the database")]
    RefreshMissingUser(UserId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
