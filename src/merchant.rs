//! Defines the merchant model and database queries.
//!
//! Merchants are where money was spent. They arrive from upstream as plain
//! free-text names, so unlike categories they carry no validated name type.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    database_id::{MerchantId, UserId},
};

/// A merchant that expenses are tracked against.
#[derive(Debug, Clone, PartialEq)]
pub struct Merchant {
    /// The ID of the merchant.
    pub id: MerchantId,
    /// The user who owns the merchant record.
    pub user_id: UserId,
    /// The display name of the merchant.
    pub name: String,
}

/// Create the merchant table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_merchant_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS merchant (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_merchant_user ON merchant(user_id);",
    )?;

    Ok(())
}

/// Create a merchant and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidReference] if `user_id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_merchant(
    user_id: UserId,
    name: &str,
    connection: &Connection,
) -> Result<Merchant, Error> {
    connection
        .execute(
            "INSERT INTO merchant (user_id, name) VALUES (?1, ?2);",
            (user_id, name),
        )
        .map_err(|error| match error {
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

    Ok(Merchant {
        id,
        user_id,
        name: name.to_string(),
    })
}

/// Retrieve a single merchant by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid merchant,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_merchant(id: MerchantId, connection: &Connection) -> Result<Merchant, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM merchant WHERE id = :id;")?
        .query_row(&[(":id", &id)], map_merchant_row)
        .map_err(|error| error.into())
}

fn map_merchant_row(row: &Row) -> Result<Merchant, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;

    Ok(Merchant { id, user_id, name })
}
