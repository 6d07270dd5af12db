//! The rollup bucket tables.
//!
//! Four dimension families (overall, account, category, merchant) at three
//! granularities (daily, monthly, yearly) give twelve tables. Each row is
//! one bucket: a unique dimension/period/currency key plus running cent
//! totals. Buckets are created lazily on first write and never deleted,
//! even when their totals decay back to zero.

use rusqlite::Connection;
use time::Date;

/// How finely a bucket slices time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per calendar day.
    Daily,
    /// One bucket per (year, month).
    Monthly,
    /// One bucket per year.
    Yearly,
}

impl Granularity {
    /// Every granularity, in daily/monthly/yearly order.
    pub const ALL: [Granularity; 3] = [Granularity::Daily, Granularity::Monthly, Granularity::Yearly];
}

/// A static description of one bucket table: its name, the columns forming
/// its unique key, and its accumulator columns.
///
/// All SQL identifiers used by the rollup store come from these `'static`
/// descriptors; only values are ever bound as parameters.
#[derive(Debug, Clone, Copy)]
pub struct BucketTable {
    /// The SQL table name.
    pub name: &'static str,
    /// The columns forming the table's unique key, in order.
    pub key_columns: &'static [&'static str],
    /// The accumulator columns, in order.
    pub value_columns: &'static [&'static str],
}

const INCOME_EXPENSE: &[&str] = &["income", "expense"];
const AMOUNT: &[&str] = &["amount"];

/// Overall daily rollups keyed by (user, date, currency).
pub const OVERALL_DAILY: BucketTable = BucketTable {
    name: "overall_daily",
    key_columns: &["user_id", "date", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Overall monthly rollups keyed by (user, year, month, currency).
pub const OVERALL_MONTHLY: BucketTable = BucketTable {
    name: "overall_monthly",
    key_columns: &["user_id", "year", "month", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Overall yearly rollups keyed by (user, year, currency).
pub const OVERALL_YEARLY: BucketTable = BucketTable {
    name: "overall_yearly",
    key_columns: &["user_id", "year", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Per-account daily rollups.
pub const ACCOUNT_DAILY: BucketTable = BucketTable {
    name: "account_daily",
    key_columns: &["user_id", "account_id", "date", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Per-account monthly rollups.
pub const ACCOUNT_MONTHLY: BucketTable = BucketTable {
    name: "account_monthly",
    key_columns: &["user_id", "account_id", "year", "month", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Per-account yearly rollups.
pub const ACCOUNT_YEARLY: BucketTable = BucketTable {
    name: "account_yearly",
    key_columns: &["user_id", "account_id", "year", "currency"],
    value_columns: INCOME_EXPENSE,
};

/// Per-category daily rollups. Categories accumulate a single magnitude
/// total rather than an income/expense split.
pub const CATEGORY_DAILY: BucketTable = BucketTable {
    name: "category_daily",
    key_columns: &["user_id", "category_id", "date", "currency"],
    value_columns: AMOUNT,
};

/// Per-category monthly rollups.
pub const CATEGORY_MONTHLY: BucketTable = BucketTable {
    name: "category_monthly",
    key_columns: &["user_id", "category_id", "year", "month", "currency"],
    value_columns: AMOUNT,
};

/// Per-category yearly rollups.
pub const CATEGORY_YEARLY: BucketTable = BucketTable {
    name: "category_yearly",
    key_columns: &["user_id", "category_id", "year", "currency"],
    value_columns: AMOUNT,
};

/// Per-merchant daily rollups. Merchant totals are expense magnitudes only.
pub const MERCHANT_DAILY: BucketTable = BucketTable {
    name: "merchant_daily",
    key_columns: &["user_id", "merchant_id", "date", "currency"],
    value_columns: AMOUNT,
};

/// Per-merchant monthly rollups.
pub const MERCHANT_MONTHLY: BucketTable = BucketTable {
    name: "merchant_monthly",
    key_columns: &["user_id", "merchant_id", "year", "month", "currency"],
    value_columns: AMOUNT,
};

/// Per-merchant yearly rollups.
pub const MERCHANT_YEARLY: BucketTable = BucketTable {
    name: "merchant_yearly",
    key_columns: &["user_id", "merchant_id", "year", "currency"],
    value_columns: AMOUNT,
};

/// Every bucket table, in schema order.
pub const ALL_BUCKET_TABLES: [BucketTable; 12] = [
    OVERALL_DAILY,
    OVERALL_MONTHLY,
    OVERALL_YEARLY,
    ACCOUNT_DAILY,
    ACCOUNT_MONTHLY,
    ACCOUNT_YEARLY,
    CATEGORY_DAILY,
    CATEGORY_MONTHLY,
    CATEGORY_YEARLY,
    MERCHANT_DAILY,
    MERCHANT_MONTHLY,
    MERCHANT_YEARLY,
];

/// The overall bucket table at `granularity`.
pub const fn overall(granularity: Granularity) -> &'static BucketTable {
    match granularity {
        Granularity::Daily => &OVERALL_DAILY,
        Granularity::Monthly => &OVERALL_MONTHLY,
        Granularity::Yearly => &OVERALL_YEARLY,
    }
}

/// The per-account bucket table at `granularity`.
pub const fn account(granularity: Granularity) -> &'static BucketTable {
    match granularity {
        Granularity::Daily => &ACCOUNT_DAILY,
        Granularity::Monthly => &ACCOUNT_MONTHLY,
        Granularity::Yearly => &ACCOUNT_YEARLY,
    }
}

/// The per-category bucket table at `granularity`.
pub const fn category(granularity: Granularity) -> &'static BucketTable {
    match granularity {
        Granularity::Daily => &CATEGORY_DAILY,
        Granularity::Monthly => &CATEGORY_MONTHLY,
        Granularity::Yearly => &CATEGORY_YEARLY,
    }
}

/// The per-merchant bucket table at `granularity`.
pub const fn merchant(granularity: Granularity) -> &'static BucketTable {
    match granularity {
        Granularity::Daily => &MERCHANT_DAILY,
        Granularity::Monthly => &MERCHANT_MONTHLY,
        Granularity::Yearly => &MERCHANT_YEARLY,
    }
}

/// The stored form of a bucket's daily period key.
///
/// Bucket dates are written and queried as this exact text so that the
/// engine and the query facade can never disagree on the encoding.
pub fn date_key(date: Date) -> String {
    date.to_string()
}

/// The (year, month) key for a date's monthly bucket.
pub fn month_key(date: Date) -> (i64, i64) {
    (i64::from(date.year()), i64::from(u8::from(date.month())))
}

/// The year key for a date's yearly bucket.
pub fn year_key(date: Date) -> i64 {
    i64::from(date.year())
}

/// Create every rollup bucket table that does not already exist.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn create_rollup_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS overall_daily (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, date, currency)
        );

        CREATE TABLE IF NOT EXISTS overall_monthly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, year, month, currency)
        );

        CREATE TABLE IF NOT EXISTS overall_yearly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, year, currency)
        );

        CREATE TABLE IF NOT EXISTS account_daily (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, account_id, date, currency)
        );

        CREATE TABLE IF NOT EXISTS account_monthly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, account_id, year, month, currency)
        );

        CREATE TABLE IF NOT EXISTS account_yearly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            currency TEXT NOT NULL,
            income INTEGER NOT NULL DEFAULT 0,
            expense INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, account_id, year, currency)
        );

        CREATE TABLE IF NOT EXISTS category_daily (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, category_id, date, currency)
        );

        CREATE TABLE IF NOT EXISTS category_monthly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, category_id, year, month, currency)
        );

        CREATE TABLE IF NOT EXISTS category_yearly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, category_id, year, currency)
        );

        CREATE TABLE IF NOT EXISTS merchant_daily (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            merchant_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, merchant_id, date, currency)
        );

        CREATE TABLE IF NOT EXISTS merchant_monthly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            merchant_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, merchant_id, year, month, currency)
        );

        CREATE TABLE IF NOT EXISTS merchant_yearly (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            merchant_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            currency TEXT NOT NULL,
            amount INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, merchant_id, year, currency)
        );",
    )?;

    Ok(())
}
