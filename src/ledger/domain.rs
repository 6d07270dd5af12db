//! Core ledger data models.

use rusqlite::Row;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    database_id::{AccountId, CategoryId, MerchantId, TransactionId, UserId},
    money::Money,
};

/// An expense or income, i.e. an event where money was either spent or
/// earned.
///
/// To create a new `Transaction`, use [Transaction::draft].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user who owns the transaction.
    pub user_id: UserId,
    /// The account the transaction was recorded against. The account
    /// determines the transaction's currency.
    pub account_id: AccountId,
    /// The category the transaction belongs to, if any.
    pub category_id: Option<CategoryId>,
    /// The merchant the money went to, if any.
    pub merchant_id: Option<MerchantId>,
    /// The amount of money spent or earned. Zero or positive is income,
    /// negative is an expense.
    pub amount: Money,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction was soft-deleted, or `None` while it is live.
    pub deleted_at: Option<OffsetDateTime>,
}

impl Transaction {
    /// Start a draft for a new transaction.
    pub fn draft(
        user_id: UserId,
        account_id: AccountId,
        amount: Money,
        date: Date,
    ) -> TransactionDraft {
        TransactionDraft {
            user_id,
            account_id,
            category_id: None,
            merchant_id: None,
            amount,
            date,
            description: String::new(),
        }
    }

    /// Whether the transaction currently counts towards rollups.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// The transaction's current field values as a [TransactionUpdate],
    /// ready for selective modification.
    pub fn to_update(&self) -> TransactionUpdate {
        TransactionUpdate {
            account_id: self.account_id,
            category_id: self.category_id,
            merchant_id: self.merchant_id,
            amount: self.amount,
            date: self.date,
            description: self.description.clone(),
        }
    }
}

/// A builder for new [Transaction]s.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// The user who will own the transaction.
    pub user_id: UserId,
    /// The account the transaction is recorded against.
    pub account_id: AccountId,
    /// The category of the transaction, e.g. "Groceries", "Rent".
    pub category_id: Option<CategoryId>,
    /// The merchant the money went to.
    pub merchant_id: Option<MerchantId>,
    /// The signed amount.
    pub amount: Money,
    /// When the transaction happened.
    pub date: Date,
    /// A human-readable description.
    pub description: String,
}

impl TransactionDraft {
    /// Set the category for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the merchant for the transaction.
    pub fn merchant_id(mut self, merchant_id: Option<MerchantId>) -> Self {
        self.merchant_id = merchant_id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// The complete new field values for an update to an existing transaction.
///
/// Updates carry full new state rather than per-field patches so that the
/// aggregation engine can compare the before and after snapshots directly.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// The new account.
    pub account_id: AccountId,
    /// The new category, if any.
    pub category_id: Option<CategoryId>,
    /// The new merchant, if any.
    pub merchant_id: Option<MerchantId>,
    /// The new signed amount.
    pub amount: Money,
    /// The new transaction date.
    pub date: Date,
    /// The new description.
    pub description: String,
}

impl TransactionUpdate {
    /// Set a new amount.
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    /// Set a new date.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Set a new category.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set a new merchant.
    pub fn merchant_id(mut self, merchant_id: Option<MerchantId>) -> Self {
        self.merchant_id = merchant_id;
        self
    }

    /// Set a new account.
    pub fn account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }
}

/// Map a database row to a [Transaction].
pub(super) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let account_id = row.get(2)?;
    let category_id = row.get(3)?;
    let merchant_id = row.get(4)?;
    let amount = row.get(5)?;
    let date = row.get(6)?;
    let description = row.get(7)?;
    let deleted_at = row.get(8)?;

    Ok(Transaction {
        id,
        user_id,
        account_id,
        category_id,
        merchant_id,
        amount,
        date,
        description,
        deleted_at,
    })
}
