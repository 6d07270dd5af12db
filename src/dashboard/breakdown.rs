//! Ranked spending breakdowns by account and category.

use rusqlite::{Connection, params};
use serde::Serialize;
use time::{Date, Duration};

use crate::{
    Error,
    database_id::UserId,
    money::{Currency, Money},
    rollup::bucket,
};

/// The time span a breakdown sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownWindow {
    /// The last `n` days up to and including today.
    TrailingDays(u16),
    /// From the first of the current month up to and including today.
    MonthToDate,
}

impl BreakdownWindow {
    fn start(self, today: Date) -> Date {
        match self {
            BreakdownWindow::TrailingDays(days) => {
                today - Duration::days(i64::from(days.max(1)) - 1)
            }
            BreakdownWindow::MonthToDate => today.replace_day(1).unwrap(),
        }
    }
}

/// One ranked row of a dashboard breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    /// Display name of the account or category.
    pub name: String,
    /// Summed magnitude over the window.
    pub amount: Money,
    /// Share of the window total across all rows, in percent.
    pub share: f64,
}

/// The top `limit` accounts by expense over `window`, with each account's
/// share of the window's total expenses.
///
/// Shares are computed against the total across all accounts before the
/// list is truncated to `limit`. Missing buckets contribute zero; a window
/// with no activity yields an empty list.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn account_breakdown(
    user_id: UserId,
    currency: &Currency,
    window: BreakdownWindow,
    today: Date,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<BreakdownRow>, Error> {
    ranked_rows(
        "SELECT a.name, COALESCE(SUM(b.expense), 0) AS total
         FROM account_daily b
         INNER JOIN account a ON a.id = b.account_id
         WHERE b.user_id = ?1 AND b.currency = ?2 AND b.date BETWEEN ?3 AND ?4
         GROUP BY b.account_id, a.name
         ORDER BY total DESC, a.name ASC",
        user_id,
        currency,
        window,
        today,
        limit,
        connection,
    )
}

/// The top `limit` categories by rolled-up magnitude over `window`.
///
/// Same contract as [account_breakdown], ranking by the category buckets'
/// magnitude accumulator.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn category_breakdown(
    user_id: UserId,
    currency: &Currency,
    window: BreakdownWindow,
    today: Date,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<BreakdownRow>, Error> {
    ranked_rows(
        "SELECT c.name, COALESCE(SUM(b.amount), 0) AS total
         FROM category_daily b
         INNER JOIN category c ON c.id = b.category_id
         WHERE b.user_id = ?1 AND b.currency = ?2 AND b.date BETWEEN ?3 AND ?4
         GROUP BY b.category_id, c.name
         ORDER BY total DESC, c.name ASC",
        user_id,
        currency,
        window,
        today,
        limit,
        connection,
    )
}

fn ranked_rows(
    sql: &str,
    user_id: UserId,
    currency: &Currency,
    window: BreakdownWindow,
    today: Date,
    limit: usize,
    connection: &Connection,
) -> Result<Vec<BreakdownRow>, Error> {
    let start = window.start(today);

    let totals: Vec<(String, Money)> = connection
        .prepare(sql)?
        .query_map(
            params![
                user_id,
                currency,
                bucket::date_key(start),
                bucket::date_key(today)
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .collect::<Result<_, _>>()?;

    let window_total: i64 = totals.iter().map(|(_, amount)| amount.cents()).sum();

    Ok(totals
        .into_iter()
        .take(limit)
        .map(|(name, amount)| BreakdownRow {
            name,
            amount,
            share: if window_total > 0 {
                amount.cents() as f64 * 100.0 / window_total as f64
            } else {
                0.0
            },
        })
        .collect())
}
