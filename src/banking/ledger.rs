use std::sync::Arc;

use chrono::{Months, Utc};

use crate::store::{AccountStore, TransactionStore, UserStore};

use super::account::{Account, AccountStatus, AccountUser, UserId};
use super::error::{BankingError, Result};
use super::transaction::{new_transaction_id, Transaction, TransactionResult, TransactionType};

/// Cancels are only accepted for transactions younger than this.
const CANCEL_CUTOFF_MONTHS: u32 = 12;

/// The transaction ledger: validates, applies and durably records every
/// balance mutation attempt.
///
/// Mutating operations assume the caller already holds the per-account lock
/// (see [`crate::lock::with_account_lock`]), which is what lets the
/// validate-mutate-persist sequence below be written as if it were
/// single-threaded. The failure-recording operations and
/// [`query_transaction`](Ledger::query_transaction) only ever append or
/// read, so they need no lock.
pub struct Ledger {
  users: Arc<dyn UserStore>,
  accounts: Arc<dyn AccountStore>,
  transactions: Arc<dyn TransactionStore>,
}

impl Ledger {
  pub fn new(
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    transactions: Arc<dyn TransactionStore>,
  ) -> Self {
    Self {
      users,
      accounts,
      transactions,
    }
  }

  /// Spend `amount` from the account and record the successful attempt.
  ///
  /// Validation failures surface as errors without writing a record; the
  /// caller decides whether to mark the attempt through
  /// [`save_failed_use_transaction`](Ledger::save_failed_use_transaction).
  pub async fn use_balance(
    &self,
    user_id: UserId,
    account_number: &str,
    amount: i64,
  ) -> Result<Transaction> {
    let user = self
      .users
      .find_by_id(user_id)
      .await?
      .ok_or(BankingError::UserNotFound(user_id))?;
    let mut account = self
      .accounts
      .find_by_account_number(account_number)
      .await?
      .ok_or_else(|| BankingError::AccountNotFound(account_number.to_string()))?;

    validate_use_balance(&user, &account, amount)?;

    account.debit(amount)?;
    self.accounts.save(account.clone()).await?;

    self
      .record(TransactionType::Use, TransactionResult::Success, &account, amount)
      .await
  }

  /// Record a use attempt that failed, without touching the balance.
  ///
  /// This is the entry point for the orchestrating side when an attempt
  /// failed for a reason the ledger did not observe itself, e.g. a
  /// downstream timeout, so the attempt still shows up in the audit trail.
  pub async fn save_failed_use_transaction(
    &self,
    account_number: &str,
    amount: i64,
  ) -> Result<Transaction> {
    let account = self
      .accounts
      .find_by_account_number(account_number)
      .await?
      .ok_or_else(|| BankingError::AccountNotFound(account_number.to_string()))?;

    self
      .record(TransactionType::Use, TransactionResult::Failure, &account, amount)
      .await
  }

  /// Fully reverse a previous use transaction and record the reversal.
  pub async fn cancel_balance(
    &self,
    transaction_id: &str,
    account_number: &str,
    amount: i64,
  ) -> Result<Transaction> {
    let original = self
      .transactions
      .find_by_transaction_id(transaction_id)
      .await?
      .ok_or_else(|| BankingError::TransactionNotFound(transaction_id.to_string()))?;
    let mut account = self
      .accounts
      .find_by_account_number(account_number)
      .await?
      .ok_or_else(|| BankingError::AccountNotFound(account_number.to_string()))?;

    validate_cancel_balance(&original, &account, amount)?;

    account.credit(amount)?;
    self.accounts.save(account.clone()).await?;

    self
      .record(TransactionType::Cancel, TransactionResult::Success, &account, amount)
      .await
  }

  /// Record a cancel attempt that failed, without touching the balance.
  pub async fn save_failed_cancel_transaction(
    &self,
    account_number: &str,
    amount: i64,
  ) -> Result<Transaction> {
    let account = self
      .accounts
      .find_by_account_number(account_number)
      .await?
      .ok_or_else(|| BankingError::AccountNotFound(account_number.to_string()))?;

    self
      .record(TransactionType::Cancel, TransactionResult::Failure, &account, amount)
      .await
  }

  /// Look up one transaction by its opaque id. Read-only, needs no lock.
  pub async fn query_transaction(&self, transaction_id: &str) -> Result<Transaction> {
    self
      .transactions
      .find_by_transaction_id(transaction_id)
      .await?
      .ok_or_else(|| BankingError::TransactionNotFound(transaction_id.to_string()))
  }

  /// Append the one audit record for this attempt. The snapshot is taken
  /// from the account as it is *now*: already mutated for successes,
  /// untouched for failures.
  async fn record(
    &self,
    transaction_type: TransactionType,
    result: TransactionResult,
    account: &Account,
    amount: i64,
  ) -> Result<Transaction> {
    let transaction = Transaction {
      transaction_type,
      result,
      account_number: account.account_number.clone(),
      amount,
      balance_snapshot: account.balance,
      transaction_id: new_transaction_id(),
      transacted_at: Utc::now(),
    };

    self.transactions.append(transaction.clone()).await?;
    Ok(transaction)
  }
}

fn validate_use_balance(user: &AccountUser, account: &Account, amount: i64) -> Result<()> {
  if user.id != account.user_id {
    Err(BankingError::UserAccountMismatch(
      user.id,
      account.account_number.clone(),
    ))
  } else if account.status != AccountStatus::InUse {
    Err(BankingError::AccountAlreadyUnregistered(
      account.account_number.clone(),
    ))
  } else if account.balance < amount {
    Err(BankingError::AmountExceedsBalance)
  } else {
    Ok(())
  }
}

fn validate_cancel_balance(original: &Transaction, account: &Account, amount: i64) -> Result<()> {
  if original.account_number != account.account_number {
    Err(BankingError::TransactionAccountMismatch(
      original.transaction_id.clone(),
      account.account_number.clone(),
    ))
  } else if original.amount != amount {
    Err(BankingError::CancelMustBeFull)
  } else if too_old_to_cancel(original) {
    Err(BankingError::TransactionTooOldToCancel)
  } else {
    Ok(())
  }
}

fn too_old_to_cancel(original: &Transaction) -> bool {
  match Utc::now().checked_sub_months(Months::new(CANCEL_CUTOFF_MONTHS)) {
    Some(cutoff) => original.transacted_at < cutoff,
    None => false,
  }
}
