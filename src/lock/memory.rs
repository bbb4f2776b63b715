use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::banking::Result;

use super::LockService;

/// Granularity of the acquisition retry loop.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// A process-local [`LockService`].
///
/// It keeps the same contract a shared backend would: acquisition waits up to
/// the given timeout, an entry whose lease has run out counts as free, and
/// releasing an absent or expired lock is a no-op. Deployments running more
/// than one service process must swap this for a client of a shared lock
/// backend, so that every instance observes the same locks.
#[derive(Default)]
pub struct InMemoryLockService {
  held: Mutex<HashMap<String, Instant>>,
}

impl InMemoryLockService {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl LockService for InMemoryLockService {
  async fn try_acquire(&self, key: &str, wait: Duration, lease: Duration) -> Result<bool> {
    let deadline = Instant::now() + wait;

    loop {
      {
        let mut held = self.held.lock().await;
        let now = Instant::now();
        let free = match held.get(key) {
          Some(expires_at) => *expires_at <= now,
          None => true,
        };
        if free {
          held.insert(key.to_string(), now + lease);
          return Ok(true);
        }
      }

      if Instant::now() >= deadline {
        return Ok(false);
      }
      sleep(RETRY_INTERVAL).await;
    }
  }

  async fn release(&self, key: &str) -> Result<()> {
    self.held.lock().await.remove(key);
    Ok(())
  }
}
