use thiserror::Error;

use super::account::UserId;

pub type Result<T> = core::result::Result<T, BankingError>;

/// Possible errors while operating on accounts and balances.
/// We are dealing with money movements, so every failure is classified precisely.
/// Callers rely on the distinction between invalid input and transient lock
/// contention to decide whether a retry makes sense.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BankingError {
  #[error("User not found: {0}")]
  UserNotFound(UserId),

  #[error("Account not found: {0}")]
  AccountNotFound(String),

  #[error("User {0} does not own account {1}")]
  UserAccountMismatch(UserId, String),

  #[error("Account {0} is already unregistered")]
  AccountAlreadyUnregistered(String),

  #[error("Account {0} still holds a balance")]
  BalanceNotEmpty(String),

  #[error("User {0} already has the maximum number of accounts")]
  TooManyAccounts(UserId),

  #[error("Amount exceeds the account balance")]
  AmountExceedsBalance,

  #[error("Transaction not found: {0}")]
  TransactionNotFound(String),

  #[error("Transaction {0} does not belong to account {1}")]
  TransactionAccountMismatch(String, String),

  #[error("Partial cancel is not allowed")]
  CancelMustBeFull,

  #[error("Transactions older than one year cannot be cancelled")]
  TransactionTooOldToCancel,

  #[error("Invalid request")]
  InvalidRequest,

  #[error("Account {0} is currently in use")]
  LockAcquisition(String),

  #[error("Unexpected error: {0}")]
  Unexpected(String),
}
