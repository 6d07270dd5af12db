//! Creates and configures the application's database schema.

use rusqlite::Connection;

use crate::{Error, account, category, ledger, merchant, rollup, user};

/// Create every application table that does not already exist.
///
/// Foreign key enforcement is switched on first (it is per-connection and a
/// no-op inside a transaction), then the schema is created inside a single
/// exclusive transaction so a crash mid-setup leaves no partial schema.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let setup =
        rusqlite::Transaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    user::create_user_table(&setup)?;
    account::create_account_table(&setup)?;
    category::create_category_table(&setup)?;
    merchant::create_merchant_table(&setup)?;
    ledger::create_transaction_table(&setup)?;
    rollup::create_rollup_tables(&setup)?;

    setup.commit()?;

    Ok(())
}
