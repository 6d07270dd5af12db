//! Defines the user model and database queries.

use rusqlite::{Connection, Row};

use crate::{Error, database_id::UserId};

/// Someone whose ledger and rollups live in this database.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The email address the user signs in with.
    pub email: String,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if the email is already
/// taken or there is some other SQL error.
pub fn create_user(email: &str, connection: &Connection) -> Result<User, Error> {
    connection.execute("INSERT INTO user (email) VALUES (?1);", (email,))?;

    let id = connection.last_insert_rowid();

    Ok(User {
        id,
        email: email.to_string(),
    })
}

/// Retrieve a user from the database by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user(id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email FROM user WHERE id = :id;")?
        .query_row(&[(":id", &id)], map_user_row)
        .map_err(|error| error.into())
}

/// Check whether a user with `id` exists.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn user_exists(id: UserId, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Retrieve all users ordered by ID.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_all_users(connection: &Connection) -> Result<Vec<User>, Error> {
    connection
        .prepare("SELECT id, email FROM user ORDER BY id ASC;")?
        .query_map([], map_user_row)?
        .map(|maybe_user| maybe_user.map_err(|error| error.into()))
        .collect()
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let id = row.get(0)?;
    let email = row.get(1)?;

    Ok(User { id, email })
}
