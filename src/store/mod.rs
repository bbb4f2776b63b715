//! Ports to the durable stores behind the banking services.
//!
//! The traits in this module are the persistence boundary: services only ever
//! talk to [`UserStore`], [`AccountStore`] and [`TransactionStore`], so the
//! backing storage can be swapped without touching the domain logic. The
//! [`memory`] module contains in-memory implementations used by the demo
//! binary and the tests.
//!
//! Writes performed through these ports are assumed to be atomically visible
//! to subsequent reads within the same locked section; a durable adapter has
//! to provide that (e.g. one storage transaction per service call).

mod memory;

pub use memory::{InMemoryAccounts, InMemoryTransactions, InMemoryUsers};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::banking::{Account, AccountUser, Result, Transaction, UserId};

/// Interface to look up registered users.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
  async fn find_by_id(&self, user_id: UserId) -> Result<Option<AccountUser>>;
}

/// Interface to the durable account store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
  async fn find_by_account_number(&self, account_number: &str) -> Result<Option<Account>>;

  async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Account>>;

  async fn count_by_user(&self, user_id: UserId) -> Result<usize>;

  /// The highest account number assigned so far, if any account exists.
  async fn highest_account_number(&self) -> Result<Option<String>>;

  /// Persist the account state, inserting or replacing by account number.
  async fn save(&self, account: Account) -> Result<()>;
}

/// Interface to the append-only transaction store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
  /// Append one new record. Existing records are never touched; this is the
  /// audit-of-record.
  async fn append(&self, transaction: Transaction) -> Result<()>;

  async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Transaction>>;
}
