use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The two kinds of balance movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionType {
  Use,
  Cancel,
}

/// Outcome of a balance movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionResult {
  Success,
  Failure,
}

/// An immutable audit record of one balance mutation attempt.
///
/// One record is appended per attempt, successful or not, and records are
/// never updated or deleted afterwards. The `amount` is always the amount
/// that was requested; `balance_snapshot` is the account balance at the
/// moment the record was written, so a failed attempt snapshots the
/// untouched balance while a successful one snapshots the new balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
  pub transaction_type: TransactionType,
  pub result: TransactionResult,
  pub account_number: String,
  pub amount: i64,
  pub balance_snapshot: i64,
  /// Globally unique, the only externally addressable key of a record.
  pub transaction_id: String,
  pub transacted_at: DateTime<Utc>,
}

/// Generates a fresh opaque transaction id.
pub fn new_transaction_id() -> String {
  Uuid::new_v4().simple().to_string()
}
