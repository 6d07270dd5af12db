//! The durable storage primitive for bucket rows.
//!
//! Every bucket write goes through [upsert_increment]: a single
//! `INSERT ... ON CONFLICT DO UPDATE` statement that either creates the row
//! with the delta as its initial value or adds the delta to the existing
//! totals. The statement is atomic in SQLite, so concurrent writers hitting
//! the same key cannot lose updates; there is no read-modify-write at the
//! application layer.

use rusqlite::{Connection, params_from_iter, types::Value};

use crate::{Error, money::Money, retry, rollup::bucket::BucketTable};

/// Atomically add `deltas` to the bucket identified by `key_values`,
/// creating the row first when it does not exist.
///
/// `key_values` must match `table.key_columns` and `deltas` must match
/// `table.value_columns` in length and order. Transient lock contention is
/// absorbed by a bounded retry.
///
/// # Errors
/// This function will return a:
/// - [Error::BucketWriteConflict] if the write stayed contended past the retry budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_increment(
    table: &BucketTable,
    key_values: &[Value],
    deltas: &[Money],
    connection: &Connection,
) -> Result<(), Error> {
    debug_assert_eq!(key_values.len(), table.key_columns.len());
    debug_assert_eq!(deltas.len(), table.value_columns.len());

    let sql = upsert_sql(table);
    let mut parameters = key_values.to_vec();
    parameters.extend(deltas.iter().map(|delta| Value::Integer(delta.cents())));

    retry::with_write_retries(|| {
        connection
            .execute(&sql, params_from_iter(parameters.iter()))
            .map(|_| ())
    })
}

/// Read one bucket's accumulator values, or `None` if the bucket was never
/// created.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn read_bucket(
    table: &BucketTable,
    key_values: &[Value],
    connection: &Connection,
) -> Result<Option<Vec<Money>>, Error> {
    debug_assert_eq!(key_values.len(), table.key_columns.len());

    let filter = table
        .key_columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(" AND ");

    let sql = format!(
        "SELECT {} FROM {} WHERE {filter}",
        table.value_columns.join(", "),
        table.name
    );

    let result = connection
        .prepare(&sql)?
        .query_row(params_from_iter(key_values.iter()), |row| {
            (0..table.value_columns.len())
                .map(|index| row.get(index))
                .collect::<Result<Vec<Money>, rusqlite::Error>>()
        });

    match result {
        Ok(values) => Ok(Some(values)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn upsert_sql(table: &BucketTable) -> String {
    let columns: Vec<&str> = table
        .key_columns
        .iter()
        .chain(table.value_columns)
        .copied()
        .collect();
    let placeholders = (1..=columns.len())
        .map(|position| format!("?{position}"))
        .collect::<Vec<_>>()
        .join(", ");
    let assignments = table
        .value_columns
        .iter()
        .map(|column| format!("{column} = {column} + excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})
         ON CONFLICT({}) DO UPDATE SET {assignments}",
        table.name,
        columns.join(", "),
        table.key_columns.join(", ")
    )
}
