//! Defines the account model and database queries.
//!
//! Accounts are the source of a transaction's currency: every ledger row
//! belongs to an account, and the rollup buckets it lands in are keyed by
//! that account's currency at the time of the mutation.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::{AccountId, UserId},
    money::Currency,
};

/// A bank account or credit card that transactions are recorded against.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The user who owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// The currency the account is denominated in.
    pub currency: Currency,
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                currency TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(user_id, name)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new account in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateAccountName] if the user already has an account called `name`,
/// - [Error::InvalidReference] if `user_id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    user_id: UserId,
    name: &str,
    currency: Currency,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .execute(
            "INSERT INTO account (user_id, name, currency) VALUES (?1, ?2, ?3);",
            (user_id, name, &currency),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(name.to_string()),
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidReference,
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        user_id,
        name: name.to_string(),
        currency,
    })
}

/// Retrieve an account from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, user_id, name, currency FROM account WHERE id = :id;")?
        .query_row(&[(":id", &id)], map_account_row)
        .map_err(|error| error.into())
}

/// Resolve the currency of the account with `id`.
///
/// Aggregation cannot pick a bucket without a currency, so an unresolvable
/// account is an error rather than a default.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAccountCurrency] if `id` does not refer to a valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account_currency(id: AccountId, connection: &Connection) -> Result<Currency, Error> {
    connection
        .prepare("SELECT currency FROM account WHERE id = :id;")?
        .query_row(&[(":id", &id)], |row| row.get(0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingAccountCurrency(id),
            error => error.into(),
        })
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;
    let currency = row.get(3)?;

    Ok(Account {
        id,
        user_id,
        name,
        currency,
    })
}
