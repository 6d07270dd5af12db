#![allow(missing_docs)]

//! Shared fixtures and assertion helpers for database tests.

use rusqlite::{Connection, types::Value};

use crate::{
    account::{Account, create_account},
    category::{Category, CategoryName, create_category},
    merchant::{Merchant, create_merchant},
    money::{Currency, Money},
    rollup::bucket::{ALL_BUCKET_TABLES, BucketTable},
    rollup::store::read_bucket,
    user::{User, create_user},
};

/// A user with a spread of accounts, categories, and merchants.
pub(crate) struct Fixture {
    pub user: User,
    pub checking: Account,
    pub savings: Account,
    pub wallet: Account,
    pub travel_card: Account,
    pub groceries: Category,
    pub salary: Category,
    pub grocer: Merchant,
}

/// Seed one user with USD accounts, an EUR account, two categories, and a
/// merchant.
pub(crate) fn seed_dimensions(connection: &Connection) -> Fixture {
    let user = create_user("test@example.com", connection).unwrap();
    let usd = Currency::new_unchecked("USD");

    Fixture {
        checking: create_account(user.id, "Checking", usd.clone(), connection).unwrap(),
        savings: create_account(user.id, "Savings", usd.clone(), connection).unwrap(),
        wallet: create_account(user.id, "Wallet", usd, connection).unwrap(),
        travel_card: create_account(
            user.id,
            "Travel Card",
            Currency::new_unchecked("EUR"),
            connection,
        )
        .unwrap(),
        groceries: create_category(user.id, CategoryName::new_unchecked("Groceries"), connection)
            .unwrap(),
        salary: create_category(user.id, CategoryName::new_unchecked("Salary"), connection)
            .unwrap(),
        grocer: create_merchant(user.id, "Corner Grocer", connection).unwrap(),
        user,
    }
}

/// Shorthand for parsing a money literal in tests.
pub(crate) fn money(text: &str) -> Money {
    text.parse().unwrap()
}

/// Parse a pipe-separated bucket key such as `"1|2024-03-15|USD"` into SQL
/// values: digit-only segments become integers, everything else text.
pub(crate) fn bucket_key(key: &str) -> Vec<Value> {
    key.split('|')
        .map(|segment| match segment.parse::<i64>() {
            Ok(integer) => Value::Integer(integer),
            Err(_) => Value::Text(segment.to_string()),
        })
        .collect()
}

/// Read a bucket's accumulator values, panicking if the bucket was never
/// created.
pub(crate) fn bucket_totals(table: &BucketTable, key: &str, connection: &Connection) -> Vec<Money> {
    read_bucket(table, &bucket_key(key), connection)
        .unwrap()
        .unwrap_or_else(|| panic!("bucket {key} does not exist in {}", table.name))
}

/// Dump every bucket table as (table name, ordered key+value rows).
///
/// Row IDs are excluded so that dumps from different write orders or
/// rebuild runs compare equal when the bucket contents are the same.
pub(crate) fn dump_buckets(connection: &Connection) -> Vec<(String, Vec<Vec<Value>>)> {
    ALL_BUCKET_TABLES
        .iter()
        .map(|table| {
            let columns: Vec<&str> = table
                .key_columns
                .iter()
                .chain(table.value_columns)
                .copied()
                .collect();
            let sql = format!(
                "SELECT {} FROM {} ORDER BY {}",
                columns.join(", "),
                table.name,
                table.key_columns.join(", ")
            );

            let rows = connection
                .prepare(&sql)
                .unwrap()
                .query_map([], |row| {
                    (0..columns.len())
                        .map(|index| row.get(index))
                        .collect::<Result<Vec<Value>, rusqlite::Error>>()
                })
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();

            (table.name.to_string(), rows)
        })
        .collect()
}
