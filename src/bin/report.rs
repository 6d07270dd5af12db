use std::error::Error;

use clap::Parser;
use rusqlite::Connection;
use serde::Serialize;
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

use centime::{
    dashboard::{BreakdownRow, BreakdownWindow, CurrencySummary},
    initialize_db,
};

/// Prints a user's dashboard report as JSON.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The user to report on.
    #[arg(long)]
    user_id: i64,

    /// The day to treat as "today", formatted as YYYY-MM-DD. Defaults to
    /// the current UTC date.
    #[arg(long)]
    date: Option<String>,

    /// How many rows to include in each breakdown.
    #[arg(long, default_value_t = 5)]
    limit: usize,
}

#[derive(Serialize)]
struct Report {
    user_id: i64,
    date: String,
    currencies: Vec<CurrencyReport>,
}

#[derive(Serialize)]
struct CurrencyReport {
    summary: CurrencySummary,
    top_accounts: Vec<BreakdownRow>,
    top_categories: Vec<BreakdownRow>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let today = match &args.date {
        Some(text) => Date::parse(text, &DATE_FORMAT)?,
        None => OffsetDateTime::now_utc().date(),
    };

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    let summaries = centime::dashboard::current_period_summary(args.user_id, today, &conn)?;

    let mut currencies = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let top_accounts = centime::dashboard::account_breakdown(
            args.user_id,
            &summary.currency,
            BreakdownWindow::TrailingDays(30),
            today,
            args.limit,
            &conn,
        )?;
        let top_categories = centime::dashboard::category_breakdown(
            args.user_id,
            &summary.currency,
            BreakdownWindow::TrailingDays(30),
            today,
            args.limit,
            &conn,
        )?;

        currencies.push(CurrencyReport {
            summary,
            top_accounts,
            top_categories,
        });
    }

    let report = Report {
        user_id: args.user_id,
        date: today.to_string(),
        currencies,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
