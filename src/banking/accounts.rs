use std::sync::Arc;

use chrono::Utc;

use crate::store::{AccountStore, UserStore};

use super::account::{Account, AccountStatus, AccountUser, UserId};
use super::error::{BankingError, Result};

const MAX_ACCOUNTS_PER_USER: usize = 10;

/// Account number handed out when no account exists yet.
const FIRST_ACCOUNT_NUMBER: &str = "1000000000";

/// Account lifecycle: opening, logical closure and lookup.
///
/// Closure never deletes anything; an account flips to
/// [`AccountStatus::Unregistered`] and stays around for audit. Balances are
/// not touched here, that is the ledger's job.
pub struct AccountService {
  users: Arc<dyn UserStore>,
  accounts: Arc<dyn AccountStore>,
}

impl AccountService {
  pub fn new(users: Arc<dyn UserStore>, accounts: Arc<dyn AccountStore>) -> Self {
    Self { users, accounts }
  }

  pub async fn create_account(&self, user_id: UserId, initial_balance: i64) -> Result<Account> {
    let user = self.find_user(user_id).await?;

    if initial_balance < 0 {
      return Err(BankingError::InvalidRequest);
    }
    if self.accounts.count_by_user(user.id).await? >= MAX_ACCOUNTS_PER_USER {
      return Err(BankingError::TooManyAccounts(user.id));
    }

    let account = Account {
      user_id: user.id,
      account_number: self.next_account_number().await?,
      status: AccountStatus::InUse,
      balance: initial_balance,
      registered_at: Utc::now(),
      unregistered_at: None,
    };
    self.accounts.save(account.clone()).await?;

    Ok(account)
  }

  pub async fn delete_account(&self, user_id: UserId, account_number: &str) -> Result<Account> {
    let user = self.find_user(user_id).await?;
    let mut account = self
      .accounts
      .find_by_account_number(account_number)
      .await?
      .ok_or_else(|| BankingError::AccountNotFound(account_number.to_string()))?;

    validate_delete_account(&user, &account)?;

    account.status = AccountStatus::Unregistered;
    account.unregistered_at = Some(Utc::now());
    self.accounts.save(account.clone()).await?;

    Ok(account)
  }

  pub async fn accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>> {
    let user = self.find_user(user_id).await?;
    self.accounts.find_by_user(user.id).await
  }

  async fn find_user(&self, user_id: UserId) -> Result<AccountUser> {
    self
      .users
      .find_by_id(user_id)
      .await?
      .ok_or(BankingError::UserNotFound(user_id))
  }

  /// Account numbers are sequential: the highest number assigned so far
  /// plus one, starting from a fixed seed.
  async fn next_account_number(&self) -> Result<String> {
    match self.accounts.highest_account_number().await? {
      Some(number) => {
        let numeric: u64 = number
          .parse()
          .map_err(|_| BankingError::Unexpected(format!("malformed account number: {}", number)))?;
        Ok((numeric + 1).to_string())
      }
      None => Ok(FIRST_ACCOUNT_NUMBER.to_string()),
    }
  }
}

fn validate_delete_account(user: &AccountUser, account: &Account) -> Result<()> {
  if user.id != account.user_id {
    Err(BankingError::UserAccountMismatch(
      user.id,
      account.account_number.clone(),
    ))
  } else if account.status == AccountStatus::Unregistered {
    Err(BankingError::AccountAlreadyUnregistered(
      account.account_number.clone(),
    ))
  } else if account.balance > 0 {
    Err(BankingError::BalanceNotEmpty(account.account_number.clone()))
  } else {
    Ok(())
  }
}

#[cfg(test)]
mod tests {

  use crate::banking::account_fixture;
  use crate::store::{MockAccountStore, MockUserStore};

  use super::*;

  fn user() -> AccountUser {
    AccountUser {
      id: 12,
      name: "pobi".to_string(),
    }
  }

  fn users_returning(found: Option<AccountUser>) -> MockUserStore {
    let mut users = MockUserStore::new();
    users
      .expect_find_by_id()
      .returning(move |_| Ok(found.clone()));
    users
  }

  fn service(users: MockUserStore, accounts: MockAccountStore) -> AccountService {
    AccountService::new(Arc::new(users), Arc::new(accounts))
  }

  #[tokio::test]
  async fn create_account_assigns_the_next_number() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts.expect_count_by_user().returning(|_| Ok(1));
    accounts
      .expect_highest_account_number()
      .returning(|| Ok(Some("1000000012".to_string())));
    accounts
      .expect_save()
      .withf(|account| {
        account.account_number == "1000000013"
          && account.status == AccountStatus::InUse
          && account.balance == 10000
          && account.unregistered_at.is_none()
      })
      .times(1)
      .returning(|_| Ok(()));

    let account = service(users, accounts)
      .create_account(12, 10000)
      .await
      .unwrap();

    assert_eq!(account.account_number, "1000000013");
    assert_eq!(account.user_id, 12);
  }

  #[tokio::test]
  async fn the_first_account_gets_the_seed_number() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts.expect_count_by_user().returning(|_| Ok(0));
    accounts
      .expect_highest_account_number()
      .returning(|| Ok(None));
    accounts.expect_save().times(1).returning(|_| Ok(()));

    let account = service(users, accounts).create_account(12, 0).await.unwrap();

    assert_eq!(account.account_number, "1000000000");
  }

  #[tokio::test]
  async fn create_account_user_not_found() {
    let users = users_returning(None);

    let result = service(users, MockAccountStore::new())
      .create_account(2000, 10000)
      .await;

    assert_eq!(result, Err(BankingError::UserNotFound(2000)));
  }

  #[tokio::test]
  async fn create_account_rejects_a_negative_initial_balance() {
    let users = users_returning(Some(user()));

    let result = service(users, MockAccountStore::new())
      .create_account(12, -1)
      .await;

    assert_eq!(result, Err(BankingError::InvalidRequest));
  }

  #[tokio::test]
  async fn create_account_caps_accounts_per_user() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts.expect_count_by_user().returning(|_| Ok(10));

    let result = service(users, accounts).create_account(12, 10000).await;

    assert_eq!(result, Err(BankingError::TooManyAccounts(12)));
  }

  #[tokio::test]
  async fn delete_account_unregisters() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts
      .expect_find_by_account_number()
      .returning(|_| Ok(Some(account_fixture("1000000012", 0))));
    accounts
      .expect_save()
      .withf(|account| {
        account.status == AccountStatus::Unregistered && account.unregistered_at.is_some()
      })
      .times(1)
      .returning(|_| Ok(()));

    let account = service(users, accounts)
      .delete_account(12, "1000000012")
      .await
      .unwrap();

    assert_eq!(account.status, AccountStatus::Unregistered);
    assert!(account.unregistered_at.is_some());
  }

  #[tokio::test]
  async fn delete_account_user_not_found() {
    let users = users_returning(None);

    let result = service(users, MockAccountStore::new())
      .delete_account(2000, "1000000012")
      .await;

    assert_eq!(result, Err(BankingError::UserNotFound(2000)));
  }

  #[tokio::test]
  async fn delete_account_account_not_found() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts
      .expect_find_by_account_number()
      .returning(|_| Ok(None));

    let result = service(users, accounts).delete_account(12, "1000000012").await;

    assert_eq!(
      result,
      Err(BankingError::AccountNotFound("1000000012".to_string()))
    );
  }

  #[tokio::test]
  async fn delete_account_owned_by_someone_else() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts.expect_find_by_account_number().returning(|_| {
      let mut account = account_fixture("1000000012", 0);
      account.user_id = 13;
      Ok(Some(account))
    });

    let result = service(users, accounts).delete_account(12, "1000000012").await;

    assert_eq!(
      result,
      Err(BankingError::UserAccountMismatch(
        12,
        "1000000012".to_string()
      ))
    );
  }

  #[tokio::test]
  async fn delete_account_already_unregistered() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts.expect_find_by_account_number().returning(|_| {
      let mut account = account_fixture("1000000012", 0);
      account.status = AccountStatus::Unregistered;
      Ok(Some(account))
    });

    let result = service(users, accounts).delete_account(12, "1000000012").await;

    assert_eq!(
      result,
      Err(BankingError::AccountAlreadyUnregistered(
        "1000000012".to_string()
      ))
    );
  }

  #[tokio::test]
  async fn delete_account_with_remaining_balance() {
    let users = users_returning(Some(user()));
    let mut accounts = MockAccountStore::new();
    accounts
      .expect_find_by_account_number()
      .returning(|_| Ok(Some(account_fixture("1000000012", 100))));

    let result = service(users, accounts).delete_account(12, "1000000012").await;

    assert_eq!(
      result,
      Err(BankingError::BalanceNotEmpty("1000000012".to_string()))
    );
  }

  #[tokio::test]
  async fn accounts_by_user_lists_owned_accounts() {
    let users = users_returning(Some(user()));
    let owned = vec![
      account_fixture("1000000012", 100),
      account_fixture("1000000013", 200),
    ];
    let expected = owned.clone();
    let mut accounts = MockAccountStore::new();
    accounts
      .expect_find_by_user()
      .returning(move |_| Ok(owned.clone()));

    let result = service(users, accounts).accounts_by_user(12).await;

    assert_eq!(result, Ok(expected));
  }
}
