//! Ledger mutations and queries.
//!
//! Every mutation here is one unit of work: the row change and its rollup
//! side effect run in the same SQLite transaction. If a bucket delta fails,
//! the whole mutation rolls back rather than leaving rollups stale; readers
//! of the aggregate tables see either the pre-mutation or the post-mutation
//! state, never an intermediate.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error, account,
    database_id::{TransactionId, UserId},
    ledger::domain::{Transaction, TransactionDraft, TransactionUpdate, map_transaction_row},
    money::Currency,
    rollup::engine::{self, EntrySnapshot},
};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, category_id, merchant_id, amount, date, description, deleted_at";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            category_id INTEGER,
            merchant_id INTEGER,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            deleted_at TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(merchant_id) REFERENCES merchant(id) ON UPDATE CASCADE ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);

        CREATE INDEX IF NOT EXISTS idx_transaction_live
            ON \"transaction\"(user_id) WHERE deleted_at IS NULL;",
    )?;

    Ok(())
}

/// Create a new transaction and roll its amount into every affected bucket.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAccountCurrency] if the draft's account cannot be resolved,
/// - [Error::InvalidReference] if the user, category, or merchant does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    draft: TransactionDraft,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let unit = connection.unchecked_transaction()?;

    // Resolved up front: without a currency there is no bucket to pick, so
    // the mutation must abort before the row is written.
    let currency = account::get_account_currency(draft.account_id, &unit)?;

    let transaction = unit
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, account_id, category_id, merchant_id, amount, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                draft.user_id,
                draft.account_id,
                draft.category_id,
                draft.merchant_id,
                draft.amount,
                draft.date,
                &draft.description,
            ),
            map_transaction_row,
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

    engine::apply(&EntrySnapshot::of(&transaction, currency), &unit)?;

    unit.commit()?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// Soft-deleted transactions are returned too; check
/// [Transaction::is_live].
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Update a transaction and move its bucket contributions accordingly.
///
/// If neither the amount nor the date changed, no bucket is touched; in
/// particular, reassigning the account, category, or merchant alone does not
/// move money between buckets. Otherwise the old snapshot is reverted and
/// the new one applied, all inside this mutation's transaction.
///
/// Updating a soft-deleted transaction changes the row but never the
/// buckets; the new values take effect on restore.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a valid transaction,
/// - [Error::MissingAccountCurrency] if an involved account cannot be resolved,
/// - [Error::InvalidReference] if the new category, merchant, or account does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let unit = connection.unchecked_transaction()?;

    let old = get_transaction(id, &unit).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingTransaction,
        error => error,
    })?;

    unit.execute(
        "UPDATE \"transaction\"
         SET account_id = ?1, category_id = ?2, merchant_id = ?3,
             amount = ?4, date = ?5, description = ?6
         WHERE id = ?7",
        (
            update.account_id,
            update.category_id,
            update.merchant_id,
            update.amount,
            update.date,
            &update.description,
            id,
        ),
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

    let new = get_transaction(id, &unit)?;

    if old.is_live() {
        let old_snapshot = snapshot(&old, &unit)?;
        let new_snapshot = snapshot(&new, &unit)?;
        engine::on_update(&new_snapshot, &old_snapshot, &unit)?;
    }

    unit.commit()?;

    Ok(new)
}

/// Soft-delete a transaction and remove its contribution from the buckets.
///
/// The row is kept with a deletion timestamp so it can be restored later.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a live transaction,
/// - [Error::MissingAccountCurrency] if the transaction's account cannot be resolved,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn soft_delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let unit = connection.unchecked_transaction()?;

    let transaction = get_transaction(id, &unit).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingTransaction,
        error => error,
    })?;

    if !transaction.is_live() {
        return Err(Error::DeleteMissingTransaction);
    }

    let deleted_at = OffsetDateTime::now_utc();
    unit.execute(
        "UPDATE \"transaction\" SET deleted_at = ?1 WHERE id = ?2",
        (deleted_at, id),
    )?;

    engine::on_delete(&snapshot(&transaction, &unit)?, &unit)?;

    unit.commit()?;

    Ok(Transaction {
        deleted_at: Some(deleted_at),
        ..transaction
    })
}

/// Restore a soft-deleted transaction and roll it back into the buckets.
///
/// # Errors
/// This function will return a:
/// - [Error::RestoreMissingTransaction] if `id` does not refer to a soft-deleted transaction,
/// - [Error::MissingAccountCurrency] if the transaction's account cannot be resolved,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn restore_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let unit = connection.unchecked_transaction()?;

    let transaction = get_transaction(id, &unit).map_err(|error| match error {
        Error::NotFound => Error::RestoreMissingTransaction,
        error => error,
    })?;

    if transaction.is_live() {
        return Err(Error::RestoreMissingTransaction);
    }

    unit.execute(
        "UPDATE \"transaction\" SET deleted_at = NULL WHERE id = ?1",
        [id],
    )?;

    let restored = Transaction {
        deleted_at: None,
        ..transaction
    };
    engine::apply(&snapshot(&restored, &unit)?, &unit)?;

    unit.commit()?;

    Ok(restored)
}

/// Permanently delete a transaction, reverting its contribution first if it
/// was live.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a valid transaction,
/// - [Error::MissingAccountCurrency] if a live transaction's account cannot be resolved,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn force_delete_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let unit = connection.unchecked_transaction()?;

    let transaction = get_transaction(id, &unit).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingTransaction,
        error => error,
    })?;

    if transaction.is_live() {
        engine::on_force_delete(&snapshot(&transaction, &unit)?, &unit)?;
    }

    unit.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    unit.commit()?;

    Ok(())
}

/// Stream every live transaction for `user_id` as engine snapshots, with
/// each account's currency already resolved.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingAccountCurrency] if a live transaction's account no longer exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn live_entries_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<EntrySnapshot>, Error> {
    let mut statement = connection.prepare(
        "SELECT t.user_id, t.account_id, t.category_id, t.merchant_id,
                t.amount, t.date, a.currency
         FROM \"transaction\" t
         LEFT JOIN account a ON a.id = t.account_id
         WHERE t.user_id = :user_id AND t.deleted_at IS NULL
         ORDER BY t.id ASC",
    )?;
    let mut rows = statement.query(&[(":user_id", &user_id)])?;

    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let account_id = row.get(1)?;
        let currency: Option<Currency> = row.get(6)?;
        let currency = currency.ok_or(Error::MissingAccountCurrency(account_id))?;

        entries.push(EntrySnapshot {
            user_id: row.get(0)?,
            account_id,
            category_id: row.get(2)?,
            merchant_id: row.get(3)?,
            amount: row.get(4)?,
            currency,
            date: row.get(5)?,
        });
    }

    Ok(entries)
}

fn snapshot(transaction: &Transaction, connection: &Connection) -> Result<EntrySnapshot, Error> {
    let currency = account::get_account_currency(transaction.account_id, connection)?;

    Ok(EntrySnapshot::of(transaction, currency))
}
