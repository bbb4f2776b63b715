use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{BankingError, Result};

/// Alias for a user ID
pub type UserId = u64;

/// A registered owner of accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUser {
  pub id: UserId,
  pub name: String,
}

/// Lifecycle status of an account. The only legal transition is
/// [`InUse`](AccountStatus::InUse) to [`Unregistered`](AccountStatus::Unregistered);
/// closed accounts are kept forever for audit, never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountStatus {
  InUse,
  Unregistered,
}

/// The state of one bank account: who owns it and how much money it holds.
///
/// The balance is an integer number of currency units and never goes below
/// zero. [`debit`](Account::debit) and [`credit`](Account::credit) are the
/// only ways to change it; all other fields are set by the account lifecycle
/// code, never by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
  pub user_id: UserId,
  pub account_number: String,
  pub status: AccountStatus,
  pub balance: i64,
  pub registered_at: DateTime<Utc>,
  pub unregistered_at: Option<DateTime<Utc>>,
}

impl Account {
  /// Take `amount` out of the balance.
  pub fn debit(&mut self, amount: i64) -> Result<()> {
    if amount <= 0 {
      Err(BankingError::InvalidRequest)
    } else if amount > self.balance {
      Err(BankingError::AmountExceedsBalance)
    } else {
      self.balance -= amount;
      Ok(())
    }
  }

  /// Put `amount` back into the balance, reversing an earlier debit.
  pub fn credit(&mut self, amount: i64) -> Result<()> {
    if amount <= 0 {
      Err(BankingError::InvalidRequest)
    } else {
      self.balance += amount;
      Ok(())
    }
  }
}

#[cfg(test)]
pub(crate) fn account_fixture(account_number: &str, balance: i64) -> Account {
  Account {
    user_id: 12,
    account_number: account_number.to_string(),
    status: AccountStatus::InUse,
    balance,
    registered_at: Utc::now(),
    unregistered_at: None,
  }
}
