//! SyncStore trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, UserId};

use crate::error::SyncResult;
use crate::types::{Account, AccountSettings, NewAccount, NewLedgerOrder};

/// Raw ledger totals over settled orders, before presentation
///
/// `count == 0` must stay distinguishable from "zero turnover": the stats
/// layer reports the empty case explicitly instead of a misleading zero
/// average.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerTotals {
    pub count: u64,
    pub turnover: f64,
    pub total_reward: f64,
}

/// SyncStore trait - the interface for synchronizer storage
///
/// Allows different backends (in-memory, PostgreSQL) to be swapped without
/// changing the business logic.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Create a new account, assigning its id
    async fn create_account(&self, new: NewAccount) -> SyncResult<Account>;

    /// Get an account by id
    async fn get_account(&self, id: AccountId) -> SyncResult<Option<Account>>;

    /// List all accounts owned by a user
    async fn list_accounts(&self, user: UserId) -> SyncResult<Vec<Account>>;

    /// Count accounts owned by a user (used for default naming)
    async fn count_accounts(&self, user: UserId) -> SyncResult<u64>;

    /// Update an existing account
    async fn update_account(&self, account: &Account) -> SyncResult<()>;

    /// Delete an account, cascading to its settings, ledger rows and
    /// provider mapping
    async fn delete_account(&self, id: AccountId) -> SyncResult<()>;

    /// Get the settings row for an account
    async fn get_settings(&self, id: AccountId) -> SyncResult<Option<AccountSettings>>;

    /// Insert or replace the settings row for an account
    async fn upsert_settings(&self, settings: &AccountSettings) -> SyncResult<()>;

    /// Get the cached provider account id, if resolved before
    async fn get_provider_id(&self, id: AccountId) -> SyncResult<Option<String>>;

    /// Persist a resolved provider account id
    async fn put_provider_id(&self, id: AccountId, provider_id: &str) -> SyncResult<()>;

    /// Append a settled order to the ledger
    ///
    /// Upsert-or-ignore keyed by `(account_id, external_id)`: returns
    /// `false` when a row for that key already exists, leaving the
    /// existing row untouched.
    async fn record_settled_order(&self, order: NewLedgerOrder) -> SyncResult<bool>;

    /// Aggregate settled orders (paid/completed/done) across all accounts
    /// owned by a user, from `since` onwards
    async fn aggregate_settled(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> SyncResult<LedgerTotals>;
}
