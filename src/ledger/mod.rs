//! The authoritative transaction ledger.

mod db;
mod domain;

pub use db::{
    create_transaction, create_transaction_table, force_delete_transaction, get_transaction,
    live_entries_for_user, restore_transaction, soft_delete_transaction, update_transaction,
};
pub use domain::{Transaction, TransactionDraft, TransactionUpdate};
