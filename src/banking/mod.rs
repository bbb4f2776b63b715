//! Domain logic for accounts and the balance ledger.
//!
//! The [`Ledger`] validates, applies and records balance mutations against
//! the [`Account`] aggregate; the [`AccountService`] owns the account
//! lifecycle around it. Both talk to storage only through the ports in
//! [`crate::store`], and neither takes the per-account lock itself — that is
//! the job of the caller-facing layer in [`crate::gateway`].

mod account;
mod accounts;
mod error;
mod ledger;
mod transaction;

#[cfg(test)]
pub(crate) use account::account_fixture;

pub use account::{Account, AccountStatus, AccountUser, UserId};
pub use accounts::AccountService;
pub use error::{BankingError, Result};
pub use ledger::Ledger;
pub use transaction::{new_transaction_id, Transaction, TransactionResult, TransactionType};
