//! Per-account mutual exclusion for balance mutations.
//!
//! Two concurrent uses of the same account must never both read the same
//! balance and both succeed, so every mutating operation runs inside
//! [`with_account_lock`]. The lock is per account number, not global:
//! operations on unrelated accounts proceed in parallel.
//!
//! The [`LockService`] trait is the boundary to the shared lock backend. In
//! production it has to be a service reachable by every process instance,
//! so that exclusion holds across processes and not only across tasks; the
//! [`InMemoryLockService`] honors the same contract within one process.

mod memory;

pub use memory::InMemoryLockService;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::warn;

use crate::banking::{BankingError, Result};

/// How long an acquisition attempt may wait for a busy lock before giving up.
const WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// How long an acquired lock is held at most. The lease keeps a crashed
/// holder from blocking its account forever.
const LEASE_TIMEOUT: Duration = Duration::from_secs(15);

const LOCK_KEY_PREFIX: &str = "ACLK:";

/// Interface to the shared lock backend.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LockService: Send + Sync {
  /// Try to acquire the named lock, waiting up to `wait` for it to become
  /// free. An acquired lock expires on its own after `lease` if it is never
  /// released. Returns whether the lock was acquired.
  async fn try_acquire(&self, key: &str, wait: Duration, lease: Duration) -> Result<bool>;

  /// Release the named lock. Releasing an absent or already expired lock
  /// must be a harmless no-op.
  async fn release(&self, key: &str) -> Result<()>;
}

/// Acquires and releases the per-account lock around balance mutations.
#[derive(Clone)]
pub struct AccountLock {
  service: Arc<dyn LockService>,
}

impl AccountLock {
  pub fn new(service: Arc<dyn LockService>) -> Self {
    Self { service }
  }

  pub async fn lock(&self, account_number: &str) -> Result<()> {
    let acquired = self
      .service
      .try_acquire(&lock_key(account_number), WAIT_TIMEOUT, LEASE_TIMEOUT)
      .await?;

    if acquired {
      Ok(())
    } else {
      Err(BankingError::LockAcquisition(account_number.to_string()))
    }
  }

  /// A failed release must never turn an already completed mutation into an
  /// error, so problems are only logged here.
  pub async fn unlock(&self, account_number: &str) {
    if let Err(err) = self.service.release(&lock_key(account_number)).await {
      warn!(account_number, error = %err, "failed to release account lock");
    }
  }
}

fn lock_key(account_number: &str) -> String {
  format!("{}{}", LOCK_KEY_PREFIX, account_number)
}

/// Extracts the account a request needs exclusive access to.
pub trait AccountKey {
  fn account_number(&self) -> &str;
}

/// Runs `operation` while holding the lock for the account identified by
/// `key`.
///
/// The lock is released on every exit path, and the operation's result is
/// passed through unchanged; the only error introduced here is
/// [`BankingError::LockAcquisition`] when the lock cannot be acquired in
/// time (in which case the operation never runs and nothing changed).
pub async fn with_account_lock<K, F, Fut, T>(lock: &AccountLock, key: &K, operation: F) -> Result<T>
where
  K: AccountKey,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let account_number = key.account_number();
  lock.lock(account_number).await?;
  let result = operation().await;
  lock.unlock(account_number).await;
  result
}

#[cfg(test)]
mod tests {

  use std::sync::atomic::{AtomicBool, Ordering};

  use super::*;

  struct TestRequest {
    account_number: String,
  }

  impl AccountKey for TestRequest {
    fn account_number(&self) -> &str {
      &self.account_number
    }
  }

  fn request() -> TestRequest {
    TestRequest {
      account_number: "1000000012".to_string(),
    }
  }

  fn acquirable_service() -> MockLockService {
    let mut service = MockLockService::new();
    service
      .expect_try_acquire()
      .withf(|key, _, _| key == "ACLK:1000000012")
      .times(1)
      .returning(|_, _, _| Ok(true));
    service
  }

  #[tokio::test]
  async fn passes_the_result_through_and_releases() {
    let mut service = acquirable_service();
    service
      .expect_release()
      .withf(|key| key == "ACLK:1000000012")
      .times(1)
      .returning(|_| Ok(()));
    let lock = AccountLock::new(Arc::new(service));

    let result = with_account_lock(&lock, &request(), || async { Ok(42) }).await;

    assert_eq!(result, Ok(42));
  }

  #[tokio::test]
  async fn releases_even_when_the_operation_fails() {
    let mut service = acquirable_service();
    service
      .expect_release()
      .withf(|key| key == "ACLK:1000000012")
      .times(1)
      .returning(|_| Ok(()));
    let lock = AccountLock::new(Arc::new(service));

    let result: Result<()> =
      with_account_lock(&lock, &request(), || async { Err(BankingError::InvalidRequest) }).await;

    assert_eq!(result, Err(BankingError::InvalidRequest));
  }

  #[tokio::test]
  async fn acquisition_timeout_skips_the_operation() {
    let mut service = MockLockService::new();
    service
      .expect_try_acquire()
      .times(1)
      .returning(|_, _, _| Ok(false));
    service.expect_release().times(0);
    let lock = AccountLock::new(Arc::new(service));
    let ran = AtomicBool::new(false);
    let ran_flag = &ran;

    let result = with_account_lock(&lock, &request(), || async move {
      ran_flag.store(true, Ordering::SeqCst);
      Ok(())
    })
    .await;

    assert_eq!(
      result,
      Err(BankingError::LockAcquisition("1000000012".to_string()))
    );
    assert!(!ran.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn release_failure_does_not_override_the_result() {
    let mut service = acquirable_service();
    service
      .expect_release()
      .times(1)
      .returning(|_| Err(BankingError::Unexpected("lease already gone".to_string())));
    let lock = AccountLock::new(Arc::new(service));

    let result = with_account_lock(&lock, &request(), || async { Ok("done") }).await;

    assert_eq!(result, Ok("done"));
  }

  #[tokio::test]
  async fn lock_service_failure_propagates() {
    let mut service = MockLockService::new();
    service
      .expect_try_acquire()
      .times(1)
      .returning(|_, _, _| Err(BankingError::Unexpected("backend down".to_string())));
    service.expect_release().times(0);
    let lock = AccountLock::new(Arc::new(service));

    let result: Result<()> = with_account_lock(&lock, &request(), || async { Ok(()) }).await;

    assert_eq!(
      result,
      Err(BankingError::Unexpected("backend down".to_string()))
    );
  }
}
