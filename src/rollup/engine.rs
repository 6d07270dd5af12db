//! The incremental aggregation engine.
//!
//! Translates one ledger mutation into signed delta writes against every
//! affected bucket, without rescanning the ledger. A single apply touches up
//! to twelve rows: four dimension families at three granularities each.
//!
//! The engine opens no transactions of its own. Callers own the
//! transactional boundary: ledger mutations run the engine inside the same
//! SQLite transaction as the row change, so a failed delta rolls the whole
//! mutation back instead of leaving buckets stale.

use rusqlite::{Connection, types::Value};
use time::Date;

use crate::{
    Error,
    database_id::{AccountId, CategoryId, DatabaseId, MerchantId, UserId},
    ledger::Transaction,
    money::{Currency, Money},
    rollup::{
        bucket::{self, Granularity},
        store,
    },
};

/// The engine's view of one ledger row at a point in time.
///
/// Snapshots are taken by the ledger layer before and after a mutation, with
/// the currency already resolved from the account, so the engine never has
/// to consult the ledger itself.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    /// The user the transaction belongs to.
    pub user_id: UserId,
    /// The account the transaction was recorded against.
    pub account_id: AccountId,
    /// The category assigned to the transaction, if any.
    pub category_id: Option<CategoryId>,
    /// The merchant assigned to the transaction, if any.
    pub merchant_id: Option<MerchantId>,
    /// The signed transaction amount.
    pub amount: Money,
    /// The currency of the transaction's account.
    pub currency: Currency,
    /// The calendar day the transaction happened on.
    pub date: Date,
}

impl EntrySnapshot {
    /// Snapshot `transaction` with its account `currency` resolved.
    pub fn of(transaction: &Transaction, currency: Currency) -> Self {
        Self {
            user_id: transaction.user_id,
            account_id: transaction.account_id,
            category_id: transaction.category_id,
            merchant_id: transaction.merchant_id,
            amount: transaction.amount,
            currency,
            date: transaction.date,
        }
    }
}

/// The material difference between two snapshots of the same transaction.
///
/// Only `amount` and `date` move money between buckets: reassigning the
/// account, category, or merchant of a transaction leaves every bucket
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialChange {
    /// Neither amount nor date changed; no bucket is affected.
    NoMaterialChange,
    /// Amount or date changed; the transaction may now belong to entirely
    /// different daily/monthly/yearly buckets.
    AmountOrDateChanged,
}

impl MaterialChange {
    /// Classify the change from `old` to `new`.
    pub fn of(new: &EntrySnapshot, old: &EntrySnapshot) -> Self {
        if new.amount == old.amount && new.date == old.date {
            MaterialChange::NoMaterialChange
        } else {
            MaterialChange::AmountOrDateChanged
        }
    }
}

/// Add `entry`'s contribution to every bucket it belongs to.
///
/// Called on creation and on restore of a soft-deleted transaction. Buckets
/// are created on demand with a zero baseline.
///
/// # Errors
/// This function will return a:
/// - [Error::BucketWriteConflict] if a bucket write stayed contended past the retry budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply(entry: &EntrySnapshot, connection: &Connection) -> Result<(), Error> {
    apply_signed(entry, 1, connection)
}

/// Remove `entry`'s contribution from every bucket it belongs to.
///
/// The exact inverse of [apply]: the same buckets receive the negated
/// deltas, so an apply/revert pair returns every touched bucket to its
/// previous value.
///
/// # Errors
/// See [apply].
pub fn revert(entry: &EntrySnapshot, connection: &Connection) -> Result<(), Error> {
    apply_signed(entry, -1, connection)
}

/// React to an update of a live transaction.
///
/// A [MaterialChange::NoMaterialChange] update is a no-op. Otherwise the old
/// snapshot is reverted and the new one applied in full, because a changed
/// date may move the transaction into entirely different period buckets.
/// Callers must run this inside the mutation's transaction so readers never
/// observe the reverted-but-not-reapplied intermediate state.
///
/// # Errors
/// See [apply].
pub fn on_update(
    new: &EntrySnapshot,
    old: &EntrySnapshot,
    connection: &Connection,
) -> Result<(), Error> {
    match MaterialChange::of(new, old) {
        MaterialChange::NoMaterialChange => Ok(()),
        MaterialChange::AmountOrDateChanged => {
            revert(old, connection)?;
            apply(new, connection)
        }
    }
}

/// React to a soft deletion: the transaction no longer counts.
///
/// # Errors
/// See [apply].
pub fn on_delete(entry: &EntrySnapshot, connection: &Connection) -> Result<(), Error> {
    revert(entry, connection)
}

/// React to a hard deletion of a live transaction.
///
/// # Errors
/// See [apply].
pub fn on_force_delete(entry: &EntrySnapshot, connection: &Connection) -> Result<(), Error> {
    revert(entry, connection)
}

fn apply_signed(entry: &EntrySnapshot, sign: i64, connection: &Connection) -> Result<(), Error> {
    let magnitude = Money::from_cents(entry.amount.magnitude().cents() * sign);
    let (income, expense) = if entry.amount.is_income() {
        (magnitude, Money::ZERO)
    } else {
        (Money::ZERO, magnitude)
    };

    for granularity in Granularity::ALL {
        store::upsert_increment(
            bucket::overall(granularity),
            &bucket_key(entry, None, granularity),
            &[income, expense],
            connection,
        )?;

        store::upsert_increment(
            bucket::account(granularity),
            &bucket_key(entry, Some(entry.account_id), granularity),
            &[income, expense],
            connection,
        )?;

        if let Some(category_id) = entry.category_id {
            store::upsert_increment(
                bucket::category(granularity),
                &bucket_key(entry, Some(category_id), granularity),
                &[magnitude],
                connection,
            )?;
        }

        // Merchant rollups are expense-oriented: income is not tracked.
        if let Some(merchant_id) = entry.merchant_id
            && !entry.amount.is_income()
        {
            store::upsert_increment(
                bucket::merchant(granularity),
                &bucket_key(entry, Some(merchant_id), granularity),
                &[magnitude],
                connection,
            )?;
        }
    }

    Ok(())
}

/// Assemble the unique key for one bucket write: user, optional dimension
/// ID, period columns, currency.
fn bucket_key(
    entry: &EntrySnapshot,
    dimension_id: Option<DatabaseId>,
    granularity: Granularity,
) -> Vec<Value> {
    let mut key = vec![Value::Integer(entry.user_id)];

    if let Some(id) = dimension_id {
        key.push(Value::Integer(id));
    }

    match granularity {
        Granularity::Daily => key.push(Value::Text(bucket::date_key(entry.date))),
        Granularity::Monthly => {
            let (year, month) = bucket::month_key(entry.date);
            key.push(Value::Integer(year));
            key.push(Value::Integer(month));
        }
        Granularity::Yearly => key.push(Value::Integer(bucket::year_key(entry.date))),
    }

    key.push(Value::Text(entry.currency.as_ref().to_string()));
    key
}
