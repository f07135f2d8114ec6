//! In-memory store implementation for testing and development

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AccountId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::error::{SyncError, SyncResult};
use crate::store::traits::{LedgerTotals, SyncStore};
use crate::types::{Account, AccountSettings, LedgerOrder, NewAccount, NewLedgerOrder};

/// In-memory synchronizer store
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    settings: RwLock<HashMap<AccountId, AccountSettings>>,
    provider_ids: RwLock<HashMap<AccountId, String>>,
    ledger: RwLock<HashMap<(AccountId, String), LedgerOrder>>,
    next_account_id: AtomicI64,
    next_order_id: AtomicI64,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            settings: RwLock::new(HashMap::new()),
            provider_ids: RwLock::new(HashMap::new()),
            ledger: RwLock::new(HashMap::new()),
            next_account_id: AtomicI64::new(1),
            next_order_id: AtomicI64::new(1),
        }
    }

    /// Ledger rows for one account, test/inspection helper
    pub fn ledger_rows(&self, account: AccountId) -> Vec<LedgerOrder> {
        let ledger = self.ledger.read().unwrap();
        let mut rows: Vec<LedgerOrder> = ledger
            .values()
            .filter(|o| o.account_id == account)
            .cloned()
            .collect();
        rows.sort_by_key(|o| o.id);
        rows
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn create_account(&self, new: NewAccount) -> SyncResult<Account> {
        let id = AccountId(self.next_account_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let account = Account {
            id,
            user_id: new.user_id,
            name: new.name,
            access_token: new.access_token,
            notify_chat_id: new.notify_chat_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.accounts.write().unwrap().insert(id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> SyncResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&id).cloned())
    }

    async fn list_accounts(&self, user: UserId) -> SyncResult<Vec<Account>> {
        let accounts = self.accounts.read().unwrap();
        let mut result: Vec<Account> = accounts
            .values()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.id);
        Ok(result)
    }

    async fn count_accounts(&self, user: UserId) -> SyncResult<u64> {
        let accounts = self.accounts.read().unwrap();
        Ok(accounts.values().filter(|a| a.user_id == user).count() as u64)
    }

    async fn update_account(&self, account: &Account) -> SyncResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&account.id) {
            accounts.insert(account.id, account.clone());
            Ok(())
        } else {
            Err(SyncError::AccountNotFound(account.id))
        }
    }

    async fn delete_account(&self, id: AccountId) -> SyncResult<()> {
        self.ledger
            .write()
            .unwrap()
            .retain(|(account_id, _), _| *account_id != id);
        self.settings.write().unwrap().remove(&id);
        self.provider_ids.write().unwrap().remove(&id);
        let removed = self.accounts.write().unwrap().remove(&id);
        if removed.is_none() {
            return Err(SyncError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn get_settings(&self, id: AccountId) -> SyncResult<Option<AccountSettings>> {
        Ok(self.settings.read().unwrap().get(&id).cloned())
    }

    async fn upsert_settings(&self, settings: &AccountSettings) -> SyncResult<()> {
        self.settings
            .write()
            .unwrap()
            .insert(settings.account_id, settings.clone());
        Ok(())
    }

    async fn get_provider_id(&self, id: AccountId) -> SyncResult<Option<String>> {
        Ok(self.provider_ids.read().unwrap().get(&id).cloned())
    }

    async fn put_provider_id(&self, id: AccountId, provider_id: &str) -> SyncResult<()> {
        self.provider_ids
            .write()
            .unwrap()
            .insert(id, provider_id.to_string());
        Ok(())
    }

    async fn record_settled_order(&self, order: NewLedgerOrder) -> SyncResult<bool> {
        let key = (order.account_id, order.external_id.clone());
        let mut ledger = self.ledger.write().unwrap();
        if ledger.contains_key(&key) {
            return Ok(false);
        }
        let row = LedgerOrder {
            id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            user_id: order.user_id,
            account_id: order.account_id,
            external_id: order.external_id,
            status: order.status,
            amount_fiat: order.amount_fiat,
            rate: order.rate,
            reward_amount: order.reward_amount,
            created_at: Utc::now(),
        };
        ledger.insert(key, row);
        Ok(true)
    }

    async fn aggregate_settled(
        &self,
        user: UserId,
        since: DateTime<Utc>,
    ) -> SyncResult<LedgerTotals> {
        let ledger = self.ledger.read().unwrap();
        let mut totals = LedgerTotals::default();
        for order in ledger.values() {
            if order.user_id == user && order.status.is_settled() && order.created_at >= since {
                totals.count += 1;
                totals.turnover += order.amount_fiat;
                totals.total_reward += order.reward_amount;
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderStatus;
    use chrono::Duration;

    fn new_account(user: i64) -> NewAccount {
        NewAccount {
            user_id: UserId(user),
            name: Some("Main".to_string()),
            access_token: Some("tok-0123456789".to_string()),
            notify_chat_id: Some(100),
        }
    }

    fn settled(user: i64, account: AccountId, ext: &str, amount: f64) -> NewLedgerOrder {
        NewLedgerOrder {
            user_id: UserId(user),
            account_id: account,
            external_id: ext.to_string(),
            status: OrderStatus::Paid,
            amount_fiat: amount,
            rate: 90.0,
            reward_amount: amount * 0.02,
        }
    }

    #[tokio::test]
    async fn test_create_and_count_accounts() {
        let store = MemoryStore::new();
        let a = store.create_account(new_account(1)).await.unwrap();
        let b = store.create_account(new_account(1)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.count_accounts(UserId(1)).await.unwrap(), 2);
        assert_eq!(store.count_accounts(UserId(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryStore::new();
        let account = store.create_account(new_account(1)).await.unwrap();
        store
            .upsert_settings(&AccountSettings::new(account.id))
            .await
            .unwrap();
        store.put_provider_id(account.id, "prov-9").await.unwrap();
        store
            .record_settled_order(settled(1, account.id, "abc", 1000.0))
            .await
            .unwrap();

        store.delete_account(account.id).await.unwrap();

        assert!(store.get_account(account.id).await.unwrap().is_none());
        assert!(store.get_settings(account.id).await.unwrap().is_none());
        assert!(store.get_provider_id(account.id).await.unwrap().is_none());
        assert!(store.ledger_rows(account.id).is_empty());
    }

    #[tokio::test]
    async fn test_record_settled_is_idempotent() {
        let store = MemoryStore::new();
        let account = store.create_account(new_account(1)).await.unwrap();

        let first = store
            .record_settled_order(settled(1, account.id, "abc", 1000.0))
            .await
            .unwrap();
        let second = store
            .record_settled_order(settled(1, account.id, "abc", 999.0))
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let rows = store.ledger_rows(account.id);
        assert_eq!(rows.len(), 1);
        // First write wins; duplicates never mutate the existing row.
        assert_eq!(rows[0].amount_fiat, 1000.0);
    }

    #[tokio::test]
    async fn test_aggregate_filters_user_status_and_window() {
        let store = MemoryStore::new();
        let account = store.create_account(new_account(1)).await.unwrap();
        store
            .record_settled_order(settled(1, account.id, "abc", 1000.0))
            .await
            .unwrap();
        store
            .record_settled_order(settled(1, account.id, "xyz", 2000.0))
            .await
            .unwrap();
        let mut cancelled = settled(1, account.id, "nope", 5000.0);
        cancelled.status = OrderStatus::Cancelled;
        store.record_settled_order(cancelled).await.unwrap();

        let since = Utc::now() - Duration::hours(24);
        let totals = store.aggregate_settled(UserId(1), since).await.unwrap();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.turnover, 3000.0);

        let other = store.aggregate_settled(UserId(2), since).await.unwrap();
        assert_eq!(other.count, 0);

        let future = store
            .aggregate_settled(UserId(1), Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(future.count, 0);
    }
}
