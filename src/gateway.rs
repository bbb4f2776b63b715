//! Caller-facing operations of the service.
//!
//! Every balance-mutating operation goes through [`with_account_lock`] here;
//! nothing below this layer takes the lock itself, and no other code path may
//! call [`Ledger::use_balance`] or [`Ledger::cancel_balance`] directly.
//! When the ledger rejects an attempt, the rejection is recorded as a failed
//! transaction before the error is handed back, so rejected attempts show up
//! in the audit trail too.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::banking::{Ledger, Result, Transaction, UserId};
use crate::lock::{with_account_lock, AccountKey, AccountLock};

/// Request to spend balance from an account.
#[derive(Debug, Clone, Deserialize)]
pub struct UseBalanceRequest {
  pub user_id: UserId,
  pub account_number: String,
  pub amount: i64,
}

impl AccountKey for UseBalanceRequest {
  fn account_number(&self) -> &str {
    &self.account_number
  }
}

/// Request to fully reverse a previous use transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelBalanceRequest {
  pub transaction_id: String,
  pub account_number: String,
  pub amount: i64,
}

impl AccountKey for CancelBalanceRequest {
  fn account_number(&self) -> &str {
    &self.account_number
  }
}

/// The operations exposed to callers of the service.
pub struct TransactionGateway {
  ledger: Arc<Ledger>,
  lock: AccountLock,
}

impl TransactionGateway {
  pub fn new(ledger: Arc<Ledger>, lock: AccountLock) -> Self {
    Self { ledger, lock }
  }

  /// Spend balance from an account, serialized against every other mutation
  /// of the same account.
  pub async fn create_use_transaction(&self, request: UseBalanceRequest) -> Result<Transaction> {
    let ledger = &self.ledger;
    let request = &request;

    with_account_lock(&self.lock, request, || async move {
      match ledger
        .use_balance(request.user_id, &request.account_number, request.amount)
        .await
      {
        Ok(transaction) => Ok(transaction),
        Err(err) => {
          if let Err(record_err) = ledger
            .save_failed_use_transaction(&request.account_number, request.amount)
            .await
          {
            warn!(
              account_number = %request.account_number,
              error = %record_err,
              "could not record the failed use attempt"
            );
          }
          Err(err)
        }
      }
    })
    .await
  }

  /// Reverse a previous use transaction, serialized the same way.
  pub async fn create_cancel_transaction(
    &self,
    request: CancelBalanceRequest,
  ) -> Result<Transaction> {
    let ledger = &self.ledger;
    let request = &request;

    with_account_lock(&self.lock, request, || async move {
      match ledger
        .cancel_balance(
          &request.transaction_id,
          &request.account_number,
          request.amount,
        )
        .await
      {
        Ok(transaction) => Ok(transaction),
        Err(err) => {
          if let Err(record_err) = ledger
            .save_failed_cancel_transaction(&request.account_number, request.amount)
            .await
          {
            warn!(
              account_number = %request.account_number,
              error = %record_err,
              "could not record the failed cancel attempt"
            );
          }
          Err(err)
        }
      }
    })
    .await
  }

  /// Durably mark a use attempt that failed outside the ledger, e.g. a
  /// downstream rejection observed by the orchestrator. Append-only, so it
  /// runs without the account lock.
  pub async fn record_failed_use(&self, account_number: &str, amount: i64) -> Result<Transaction> {
    self
      .ledger
      .save_failed_use_transaction(account_number, amount)
      .await
  }

  /// The cancel-side counterpart of [`record_failed_use`](Self::record_failed_use).
  pub async fn record_failed_cancel(
    &self,
    account_number: &str,
    amount: i64,
  ) -> Result<Transaction> {
    self
      .ledger
      .save_failed_cancel_transaction(account_number, amount)
      .await
  }

  /// Read-only lookup by opaque transaction id.
  pub async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
    self.ledger.query_transaction(transaction_id).await
  }
}
