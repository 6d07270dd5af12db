use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month};

use centime::{
    Currency, Money, account, category, initialize_db,
    ledger::{self, Transaction},
    merchant, user,
};

/// A utility for creating a demo database for centime.
///
/// Seeds a user with accounts, categories, merchants, and several months of
/// transactions. Every transaction is routed through the ledger, so the
/// rollup tables come out populated exactly as they would in production.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user...");
    let demo_user = user::create_user("demo@example.com", &conn)?;

    let checking = account::create_account(
        demo_user.id,
        "Checking",
        Currency::new("USD")?,
        &conn,
    )?;
    let travel_card = account::create_account(
        demo_user.id,
        "Travel Card",
        Currency::new("EUR")?,
        &conn,
    )?;

    let groceries = category::create_category(
        demo_user.id,
        category::CategoryName::new("Groceries")?,
        &conn,
    )?;
    let rent =
        category::create_category(demo_user.id, category::CategoryName::new("Rent")?, &conn)?;
    let salary =
        category::create_category(demo_user.id, category::CategoryName::new("Salary")?, &conn)?;
    let eating_out = category::create_category(
        demo_user.id,
        category::CategoryName::new("Eating Out")?,
        &conn,
    )?;

    let grocer = merchant::create_merchant(demo_user.id, "Corner Grocer", &conn)?;
    let cafe = merchant::create_merchant(demo_user.id, "Cafe Luna", &conn)?;

    println!("Creating demo transactions...");
    let mut created = 0;

    for month in [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
    ] {
        let first = Date::from_calendar_date(2025, month, 1)?;

        ledger::create_transaction(
            Transaction::draft(demo_user.id, checking.id, parse("4200.00")?, first)
                .category_id(Some(salary.id))
                .description("Monthly salary"),
            &conn,
        )?;
        ledger::create_transaction(
            Transaction::draft(demo_user.id, checking.id, parse("-1500.00")?, first)
                .category_id(Some(rent.id))
                .description("Rent"),
            &conn,
        )?;
        created += 2;

        for day in [4, 11, 18, 25] {
            ledger::create_transaction(
                Transaction::draft(
                    demo_user.id,
                    checking.id,
                    parse("-85.40")?,
                    Date::from_calendar_date(2025, month, day)?,
                )
                .category_id(Some(groceries.id))
                .merchant_id(Some(grocer.id))
                .description("Weekly shop"),
                &conn,
            )?;
            created += 1;
        }

        ledger::create_transaction(
            Transaction::draft(
                demo_user.id,
                checking.id,
                parse("-18.50")?,
                Date::from_calendar_date(2025, month, 14)?,
            )
            .category_id(Some(eating_out.id))
            .merchant_id(Some(cafe.id))
            .description("Lunch"),
            &conn,
        )?;
        ledger::create_transaction(
            Transaction::draft(
                demo_user.id,
                travel_card.id,
                parse("-42.00")?,
                Date::from_calendar_date(2025, month, 20)?,
            )
            .description("Train tickets"),
            &conn,
        )?;
        created += 2;
    }

    println!("Created {created} transactions.");
    println!("Success!");

    Ok(())
}

fn parse(text: &str) -> Result<Money, centime::Error> {
    text.parse()
}
