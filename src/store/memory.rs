use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::banking::{Account, AccountUser, Result, Transaction, UserId};

use super::{AccountStore, TransactionStore, UserStore};

/// In-memory implementation of [`UserStore`].
#[derive(Default)]
pub struct InMemoryUsers {
  users: Mutex<HashMap<UserId, AccountUser>>,
}

impl InMemoryUsers {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn add(&self, user: AccountUser) {
    self.users.lock().await.insert(user.id, user);
  }
}

#[async_trait]
impl UserStore for InMemoryUsers {
  async fn find_by_id(&self, user_id: UserId) -> Result<Option<AccountUser>> {
    Ok(self.users.lock().await.get(&user_id).cloned())
  }
}

/// In-memory implementation of [`AccountStore`], keyed by account number.
#[derive(Default)]
pub struct InMemoryAccounts {
  accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAccounts {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
  async fn find_by_account_number(&self, account_number: &str) -> Result<Option<Account>> {
    Ok(self.accounts.lock().await.get(account_number).cloned())
  }

  async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Account>> {
    let accounts = self.accounts.lock().await;
    let mut owned: Vec<Account> = accounts
      .values()
      .filter(|account| account.user_id == user_id)
      .cloned()
      .collect();
    owned.sort_by(|a, b| a.account_number.cmp(&b.account_number));
    Ok(owned)
  }

  async fn count_by_user(&self, user_id: UserId) -> Result<usize> {
    let accounts = self.accounts.lock().await;
    Ok(
      accounts
        .values()
        .filter(|account| account.user_id == user_id)
        .count(),
    )
  }

  async fn highest_account_number(&self) -> Result<Option<String>> {
    let accounts = self.accounts.lock().await;
    Ok(
      accounts
        .keys()
        .max_by_key(|number| number.parse::<u64>().unwrap_or(0))
        .cloned(),
    )
  }

  async fn save(&self, account: Account) -> Result<()> {
    self
      .accounts
      .lock()
      .await
      .insert(account.account_number.clone(), account);
    Ok(())
  }
}

/// In-memory implementation of [`TransactionStore`]. There is no update path:
/// records can only be appended and read back.
#[derive(Default)]
pub struct InMemoryTransactions {
  transactions: Mutex<Vec<Transaction>>,
}

impl InMemoryTransactions {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub async fn all(&self) -> Vec<Transaction> {
    self.transactions.lock().await.clone()
  }
}

#[async_trait]
impl TransactionStore for InMemoryTransactions {
  async fn append(&self, transaction: Transaction) -> Result<()> {
    self.transactions.lock().await.push(transaction);
    Ok(())
  }

  async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Transaction>> {
    let transactions = self.transactions.lock().await;
    Ok(
      transactions
        .iter()
        .find(|transaction| transaction.transaction_id == transaction_id)
        .cloned(),
    )
  }
}
