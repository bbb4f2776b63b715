mod banking;
mod gateway;
mod lock;
mod store;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use banking::{AccountService, AccountUser, Ledger};
use gateway::{CancelBalanceRequest, TransactionGateway, UseBalanceRequest};
use lock::{AccountLock, InMemoryLockService};
use store::{InMemoryAccounts, InMemoryTransactions, InMemoryUsers};

/// Wires the service against the in-memory adapters and runs one
/// use/cancel/query round trip, printing the resulting receipts.
#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let users = Arc::new(InMemoryUsers::new());
  let user = AccountUser {
    id: 1,
    name: "pobi".to_string(),
  };
  info!(user = %user.name, "seeding user");
  users.add(user).await;
  let accounts = Arc::new(InMemoryAccounts::new());
  let transactions = Arc::new(InMemoryTransactions::new());

  let account_service = AccountService::new(users.clone(), accounts.clone());
  let ledger = Arc::new(Ledger::new(users, accounts, transactions));
  let gateway = TransactionGateway::new(
    ledger,
    AccountLock::new(Arc::new(InMemoryLockService::new())),
  );

  let account = account_service.create_account(1, 10_000).await?;
  info!(
    account_number = %account.account_number,
    balance = account.balance,
    "account opened"
  );

  let used = gateway
    .create_use_transaction(UseBalanceRequest {
      user_id: 1,
      account_number: account.account_number.clone(),
      amount: 1_000,
    })
    .await?;
  println!("{}", serde_json::to_string_pretty(&used)?);

  let cancelled = gateway
    .create_cancel_transaction(CancelBalanceRequest {
      transaction_id: used.transaction_id.clone(),
      account_number: account.account_number.clone(),
      amount: used.amount,
    })
    .await?;
  println!("{}", serde_json::to_string_pretty(&cancelled)?);

  let looked_up = gateway.get_transaction(&used.transaction_id).await?;
  info!(transaction_id = %looked_up.transaction_id, "audit lookup succeeded");

  // An orchestrator that saw a downstream failure can still leave a trace.
  let marked = gateway
    .record_failed_use(&account.account_number, 2_500)
    .await?;
  println!("{}", serde_json::to_string_pretty(&marked)?);
  gateway
    .record_failed_cancel(&account.account_number, 2_500)
    .await?;

  let spare = account_service.create_account(1, 0).await?;
  let owned = account_service.accounts_by_user(1).await?;
  info!(accounts = owned.len(), "accounts on file");
  let closed = account_service
    .delete_account(1, &spare.account_number)
    .await?;
  info!(account_number = %closed.account_number, "account unregistered");

  Ok(())
}
