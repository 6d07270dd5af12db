//! Current-period headline totals.

use std::collections::BTreeMap;

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    database_id::UserId,
    money::{Currency, Money},
    rollup::bucket,
};

/// Income and expense magnitudes for one period and currency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PeriodTotals {
    /// Summed income magnitudes.
    pub income: Money,
    /// Summed expense magnitudes.
    pub expense: Money,
}

/// Dashboard headline figures for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencySummary {
    /// The currency all three periods are denominated in.
    pub currency: Currency,
    /// Totals for `today`.
    pub today: PeriodTotals,
    /// Totals for the month containing `today`.
    pub this_month: PeriodTotals,
    /// Totals for the year containing `today`.
    pub this_year: PeriodTotals,
}

/// Assemble today's / this month's / this year's totals for every currency
/// the user has rollups in.
///
/// Missing buckets read as zero: a currency that only has activity earlier
/// in the year still gets a summary row, with zeroed day and month totals.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn current_period_summary(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<Vec<CurrencySummary>, Error> {
    let (year, month) = bucket::month_key(today);

    let daily: Vec<(Currency, PeriodTotals)> = connection
        .prepare(
            "SELECT currency, income, expense FROM overall_daily
             WHERE user_id = ?1 AND date = ?2",
        )?
        .query_map(params![user_id, bucket::date_key(today)], map_totals_row)?
        .collect::<Result<_, _>>()?;

    let monthly: Vec<(Currency, PeriodTotals)> = connection
        .prepare(
            "SELECT currency, income, expense FROM overall_monthly
             WHERE user_id = ?1 AND year = ?2 AND month = ?3",
        )?
        .query_map(params![user_id, year, month], map_totals_row)?
        .collect::<Result<_, _>>()?;

    let yearly: Vec<(Currency, PeriodTotals)> = connection
        .prepare(
            "SELECT currency, income, expense FROM overall_yearly
             WHERE user_id = ?1 AND year = ?2",
        )?
        .query_map(params![user_id, year], map_totals_row)?
        .collect::<Result<_, _>>()?;

    // BTreeMap keeps the output ordered by currency code.
    let mut summaries: BTreeMap<Currency, CurrencySummary> = BTreeMap::new();

    for (currency, totals) in daily {
        summary_for(&mut summaries, &currency).today = totals;
    }
    for (currency, totals) in monthly {
        summary_for(&mut summaries, &currency).this_month = totals;
    }
    for (currency, totals) in yearly {
        summary_for(&mut summaries, &currency).this_year = totals;
    }

    Ok(summaries.into_values().collect())
}

fn summary_for<'a>(
    summaries: &'a mut BTreeMap<Currency, CurrencySummary>,
    currency: &Currency,
) -> &'a mut CurrencySummary {
    summaries
        .entry(currency.clone())
        .or_insert_with(|| CurrencySummary {
            currency: currency.clone(),
            today: PeriodTotals::default(),
            this_month: PeriodTotals::default(),
            this_year: PeriodTotals::default(),
        })
}

fn map_totals_row(row: &Row) -> Result<(Currency, PeriodTotals), rusqlite::Error> {
    let currency = row.get(0)?;
    let income = row.get(1)?;
    let expense = row.get(2)?;

    Ok((currency, PeriodTotals { income, expense }))
}

#[cfg(test)]
mod summary_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        ledger::{self, Transaction},
        money::Currency,
        test_utils::{money, seed_dimensions},
    };

    use super::{PeriodTotals, current_period_summary};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn summary_is_empty_for_user_without_rollups() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);

        let summary =
            current_period_summary(fixture.user.id, date!(2024 - 03 - 15), &conn).unwrap();

        assert_eq!(summary, vec![]);
    }

    #[test]
    fn summary_collects_each_period_per_currency() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);

        // Today, earlier this month, earlier this year.
        for (amount, date) in [
            ("-45.00", date!(2024 - 03 - 15)),
            ("-30.00", date!(2024 - 03 - 02)),
            ("4200.00", date!(2024 - 01 - 31)),
        ] {
            ledger::create_transaction(
                Transaction::draft(fixture.user.id, fixture.checking.id, money(amount), date),
                &conn,
            )
            .unwrap();
        }
        // A different currency on the same day.
        ledger::create_transaction(
            Transaction::draft(
                fixture.user.id,
                fixture.travel_card.id,
                money("-12.50"),
                date!(2024 - 03 - 15),
            ),
            &conn,
        )
        .unwrap();

        let summary =
            current_period_summary(fixture.user.id, date!(2024 - 03 - 15), &conn).unwrap();

        assert_eq!(summary.len(), 2);

        let eur = &summary[0];
        assert_eq!(eur.currency, Currency::new_unchecked("EUR"));
        assert_eq!(eur.today.expense, money("12.50"));

        let usd = &summary[1];
        assert_eq!(usd.currency, Currency::new_unchecked("USD"));
        assert_eq!(
            usd.today,
            PeriodTotals {
                income: money("0.00"),
                expense: money("45.00")
            }
        );
        assert_eq!(
            usd.this_month,
            PeriodTotals {
                income: money("0.00"),
                expense: money("75.00")
            }
        );
        assert_eq!(
            usd.this_year,
            PeriodTotals {
                income: money("4200.00"),
                expense: money("75.00")
            }
        );
    }

    #[test]
    fn missing_periods_read_as_zero() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);

        // Activity in January only; the summary is taken in March.
        ledger::create_transaction(
            Transaction::draft(
                fixture.user.id,
                fixture.checking.id,
                money("4200.00"),
                date!(2024 - 01 - 31),
            ),
            &conn,
        )
        .unwrap();

        let summary =
            current_period_summary(fixture.user.id, date!(2024 - 03 - 15), &conn).unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].today, PeriodTotals::default());
        assert_eq!(summary[0].this_month, PeriodTotals::default());
        assert_eq!(summary[0].this_year.income, money("4200.00"));
    }
}
