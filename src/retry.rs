//! Bounded retry for contended SQLite writes.

use std::{thread, time::Duration};

use crate::Error;

/// How many times a single bucket write may be attempted before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(10);

/// Run `write` up to [MAX_WRITE_ATTEMPTS] times, sleeping a little longer
/// after each transient failure.
///
/// Only `SQLITE_BUSY` and `SQLITE_LOCKED` count as transient. Any other
/// error is converted and returned immediately.
///
/// # Errors
/// Returns an [Error::BucketWriteConflict] carrying the attempt count if the
/// write is still losing the lock once the budget is exhausted.
pub fn with_write_retries<T>(
    mut write: impl FnMut() -> Result<T, rusqlite::Error>,
) -> Result<T, Error> {
    let mut attempt = 1;

    loop {
        match write() {
            Ok(value) => return Ok(value),
            Err(error) if is_transient(&error) => {
                if attempt >= MAX_WRITE_ATTEMPTS {
                    tracing::error!("write still contended after {attempt} attempts: {error}");
                    return Err(Error::BucketWriteConflict(attempt));
                }

                thread::sleep(RETRY_BASE_DELAY * attempt);
                attempt += 1;
            }
            Err(error) => return Err(error.into()),
        }
    }
}

fn is_transient(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::DatabaseBusy
                || failure.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

#[cfg(test)]
mod with_write_retries_tests {
    use crate::Error;

    use super::{MAX_WRITE_ATTEMPTS, with_write_retries};

    fn busy_error() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY), None)
    }

    #[test]
    fn returns_first_success() {
        let mut calls = 0;

        let result = with_write_retries(|| {
            calls += 1;
            Ok(42)
        });

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let mut calls = 0;

        let result = with_write_retries(|| {
            calls += 1;
            if calls < 3 { Err(busy_error()) } else { Ok(()) }
        });

        assert_eq!(result, Ok(()));
        assert_eq!(calls, 3);
    }

    #[test]
    fn surfaces_conflict_after_budget_exhausted() {
        let mut calls = 0;

        let result: Result<(), Error> = with_write_retries(|| {
            calls += 1;
            Err(busy_error())
        });

        assert_eq!(result, Err(Error::BucketWriteConflict(MAX_WRITE_ATTEMPTS)));
        assert_eq!(calls, MAX_WRITE_ATTEMPTS);
    }

    #[test]
    fn does_not_retry_permanent_errors() {
        let mut calls = 0;

        let result: Result<(), Error> = with_write_retries(|| {
            calls += 1;
            Err(rusqlite::Error::QueryReturnedNoRows)
        });

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(calls, 1);
    }
}
