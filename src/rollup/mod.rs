//! Incremental rollup aggregation.
//!
//! Keeps the pre-computed bucket tables consistent with the transaction
//! ledger as rows are created, updated, deleted, and restored. The engine
//! reacts to each mutation with signed delta writes; it holds no state of
//! its own beyond the bucket tables.

pub mod bucket;
pub mod engine;
pub mod rebuild;
pub mod store;

pub use bucket::create_rollup_tables;
pub use engine::{EntrySnapshot, MaterialChange};
pub use rebuild::{RefreshReport, rebuild_user, refresh_all, refresh_one};

/// Checks that every bucket value stays equal to the matching sum over the
/// live ledger rows as transactions are created, updated, and deleted.
#[cfg(test)]
mod sum_equivalence_tests {
    use rusqlite::{Connection, params};
    use time::{Date, macros::date};

    use crate::{
        db::initialize,
        ledger::{self, Transaction},
        money::Money,
        rollup::bucket::{ACCOUNT_DAILY, CATEGORY_DAILY, OVERALL_DAILY, OVERALL_MONTHLY, OVERALL_YEARLY},
        test_utils::{Fixture, bucket_key, money, seed_dimensions},
    };

    use super::store::read_bucket;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    /// Sum the live ledger rows between `from` and `to` (inclusive), split
    /// into (income, expense) magnitudes.
    fn ledger_totals(
        user_id: i64,
        currency: &str,
        from: Date,
        to: Date,
        connection: &Connection,
    ) -> (Money, Money) {
        connection
            .query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN t.amount >= 0 THEN t.amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN t.amount < 0 THEN -t.amount ELSE 0 END), 0)
                 FROM \"transaction\" t
                 INNER JOIN account a ON a.id = t.account_id
                 WHERE t.user_id = ?1 AND a.currency = ?2
                   AND t.date BETWEEN ?3 AND ?4
                   AND t.deleted_at IS NULL",
                params![user_id, currency, from, to],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap()
    }

    fn overall_bucket(
        table: &super::bucket::BucketTable,
        key: &str,
        connection: &Connection,
    ) -> (Money, Money) {
        match read_bucket(table, &bucket_key(key), connection).unwrap() {
            Some(values) => (values[0], values[1]),
            None => (Money::ZERO, Money::ZERO),
        }
    }

    fn seed_mixed_history(fixture: &Fixture, connection: &Connection) {
        let entries = [
            ("-45.00", fixture.checking.id, Some(fixture.groceries.id), date!(2024 - 03 - 15)),
            ("-9.99", fixture.savings.id, Some(fixture.groceries.id), date!(2024 - 03 - 15)),
            ("4200.00", fixture.checking.id, Some(fixture.salary.id), date!(2024 - 03 - 01)),
            ("-120.00", fixture.checking.id, None, date!(2024 - 02 - 29)),
            ("-33.10", fixture.travel_card.id, None, date!(2024 - 03 - 15)),
            ("0.00", fixture.checking.id, None, date!(2024 - 03 - 15)),
        ];

        for (amount, account_id, category_id, date) in entries {
            ledger::create_transaction(
                Transaction::draft(fixture.user.id, account_id, money(amount), date)
                    .category_id(category_id),
                connection,
            )
            .unwrap();
        }
    }

    #[test]
    fn buckets_match_ledger_sums_after_creates() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);
        seed_mixed_history(&fixture, &conn);

        let day = date!(2024 - 03 - 15);
        assert_eq!(
            overall_bucket(&OVERALL_DAILY, "1|2024-03-15|USD", &conn),
            ledger_totals(fixture.user.id, "USD", day, day, &conn)
        );
        assert_eq!(
            overall_bucket(&OVERALL_DAILY, "1|2024-03-15|EUR", &conn),
            ledger_totals(fixture.user.id, "EUR", day, day, &conn)
        );
        assert_eq!(
            overall_bucket(&OVERALL_MONTHLY, "1|2024|3|USD", &conn),
            ledger_totals(fixture.user.id, "USD", date!(2024 - 03 - 01), date!(2024 - 03 - 31), &conn)
        );
        assert_eq!(
            overall_bucket(&OVERALL_YEARLY, "1|2024|USD", &conn),
            ledger_totals(fixture.user.id, "USD", date!(2024 - 01 - 01), date!(2024 - 12 - 31), &conn)
        );
    }

    #[test]
    fn buckets_track_the_latest_field_values_after_updates_and_deletes() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);
        seed_mixed_history(&fixture, &conn);

        // Reshape the history: grow one amount, move one date, delete one.
        let grown = ledger::get_transaction(1, &conn).unwrap();
        ledger::update_transaction(grown.id, grown.to_update().amount(money("-60.00")), &conn)
            .unwrap();
        let moved = ledger::get_transaction(3, &conn).unwrap();
        ledger::update_transaction(moved.id, moved.to_update().date(date!(2024 - 04 - 01)), &conn)
            .unwrap();
        ledger::soft_delete_transaction(2, &conn).unwrap();

        for day in [date!(2024 - 03 - 01), date!(2024 - 03 - 15), date!(2024 - 04 - 01)] {
            for currency in ["USD", "EUR"] {
                assert_eq!(
                    overall_bucket(&OVERALL_DAILY, &format!("1|{day}|{currency}"), &conn),
                    ledger_totals(fixture.user.id, currency, day, day, &conn),
                    "overall_daily diverged from the ledger for {day} {currency}"
                );
            }
        }
        assert_eq!(
            overall_bucket(&OVERALL_MONTHLY, "1|2024|3|USD", &conn),
            ledger_totals(fixture.user.id, "USD", date!(2024 - 03 - 01), date!(2024 - 03 - 31), &conn)
        );
        assert_eq!(
            overall_bucket(&OVERALL_MONTHLY, "1|2024|4|USD", &conn),
            ledger_totals(fixture.user.id, "USD", date!(2024 - 04 - 01), date!(2024 - 04 - 30), &conn)
        );
    }

    #[test]
    fn account_buckets_match_per_account_ledger_sums() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);
        seed_mixed_history(&fixture, &conn);

        let day = date!(2024 - 03 - 15);
        let (income, expense) = conn
            .query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN amount >= 0 THEN amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN amount < 0 THEN -amount ELSE 0 END), 0)
                 FROM \"transaction\"
                 WHERE user_id = ?1 AND account_id = ?2 AND date = ?3 AND deleted_at IS NULL",
                params![fixture.user.id, fixture.checking.id, day],
                |row| Ok((row.get::<_, Money>(0)?, row.get::<_, Money>(1)?)),
            )
            .unwrap();

        assert_eq!(
            overall_bucket(
                &ACCOUNT_DAILY,
                &format!("1|{}|2024-03-15|USD", fixture.checking.id),
                &conn
            ),
            (income, expense)
        );
    }

    #[test]
    fn category_buckets_match_magnitude_sums() {
        let conn = get_test_connection();
        let fixture = seed_dimensions(&conn);
        seed_mixed_history(&fixture, &conn);

        let day = date!(2024 - 03 - 15);
        let magnitude: Money = conn
            .query_row(
                "SELECT COALESCE(SUM(ABS(amount)), 0)
                 FROM \"transaction\"
                 WHERE user_id = ?1 AND category_id = ?2 AND date = ?3 AND deleted_at IS NULL",
                params![fixture.user.id, fixture.groceries.id, day],
                |row| row.get(0),
            )
            .unwrap();

        let values = read_bucket(
            &CATEGORY_DAILY,
            &bucket_key(&format!("1|{}|2024-03-15|USD", fixture.groceries.id)),
            &conn,
        )
        .unwrap()
        .unwrap();

        assert_eq!(values, vec![magnitude]);
    }
}
