//! Read-side assembly of report views from rollup snapshots.
//!
//! Everything here is read-only: views are composed entirely from the
//! bucket tables (joined against dimension names for presentation) and
//! never touch the ledger or mutate a bucket. Missing buckets read as
//! zero rather than erroring.

mod breakdown;
mod summary;

pub use breakdown::{BreakdownRow, BreakdownWindow, account_breakdown, category_breakdown};
pub use summary::{CurrencySummary, PeriodTotals, current_period_summary};
