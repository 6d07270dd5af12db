//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Identifier for a user row.
pub type UserId = i64;

/// Identifier for an account row.
pub type AccountId = i64;

/// Identifier for a category row.
pub type CategoryId = i64;

/// Identifier for a merchant row.
pub type MerchantId = i64;

/// Identifier for a ledger transaction row.
pub type TransactionId = i64;
