//! Provider account id resolution
//!
//! Maps local accounts to their provider-side ids. Resolved ids are
//! persisted and reused forever; failed lookups are never cached, so a
//! later call retries the provider.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clients::provider::ProviderClient;
use crate::store::SyncStore;
use crate::types::Account;

pub struct ProviderIdResolver {
    store: Arc<dyn SyncStore>,
    client: Arc<dyn ProviderClient>,
}

impl ProviderIdResolver {
    pub fn new(store: Arc<dyn SyncStore>, client: Arc<dyn ProviderClient>) -> Self {
        Self { store, client }
    }

    /// Resolve the provider-side id for an account.
    ///
    /// Returns `None` when the account carries no credential, the provider
    /// lookup fails, the provider reports no accounts, or the mapping
    /// cannot be persisted. `None` is never remembered.
    pub async fn resolve(&self, account: &Account) -> Option<String> {
        match self.store.get_provider_id(account.id).await {
            Ok(Some(id)) => return Some(id),
            Ok(None) => {}
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Provider id cache lookup failed");
            }
        }

        let token = match account.access_token.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => {
                debug!(account_id = %account.id, "Account has no credential, skipping resolution");
                return None;
            }
        };

        let accounts = match self.client.list_accounts(token).await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Provider account lookup failed");
                return None;
            }
        };

        let provider_id = match accounts.into_iter().next() {
            Some(a) => a.id,
            None => {
                warn!(account_id = %account.id, "Provider reported no accounts for credential");
                return None;
            }
        };

        if let Err(e) = self
            .store
            .put_provider_id(account.id, &provider_id)
            .await
        {
            warn!(account_id = %account.id, error = %e, "Failed to persist provider id mapping");
            return None;
        }

        debug!(account_id = %account.id, provider_id = %provider_id, "Resolved provider account id");
        Some(provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::provider::MockProviderClient;
    use crate::store::MemoryStore;
    use crate::types::NewAccount;
    use common::UserId;

    async fn seeded_account(store: &MemoryStore, token: Option<&str>) -> Account {
        store
            .create_account(NewAccount {
                user_id: UserId(1),
                name: Some("Test".to_string()),
                access_token: token.map(|t| t.to_string()),
                notify_chat_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cached_id_skips_provider() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(MockProviderClient::new(&["prov-9"]));
        let account = seeded_account(&store, Some("token-abcdef")).await;
        store.put_provider_id(account.id, "cached-1").await.unwrap();

        let resolver = ProviderIdResolver::new(store, client.clone());
        assert_eq!(resolver.resolve(&account).await.as_deref(), Some("cached-1"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_resolution_persists_first_id() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(MockProviderClient::new(&["prov-1", "prov-2"]));
        let account = seeded_account(&store, Some("token-abcdef")).await;

        let resolver = ProviderIdResolver::new(store.clone(), client);
        assert_eq!(resolver.resolve(&account).await.as_deref(), Some("prov-1"));
        assert_eq!(
            store.get_provider_id(account.id).await.unwrap().as_deref(),
            Some("prov-1")
        );
    }

    #[tokio::test]
    async fn test_no_credential_returns_none() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(MockProviderClient::new(&["prov-1"]));
        let account = seeded_account(&store, None).await;

        let resolver = ProviderIdResolver::new(store, client.clone());
        assert!(resolver.resolve(&account).await.is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let account = seeded_account(&store, Some("token-abcdef")).await;

        let failing = Arc::new(MockProviderClient::failing());
        let resolver = ProviderIdResolver::new(store.clone(), failing.clone());
        assert!(resolver.resolve(&account).await.is_none());
        assert_eq!(failing.call_count(), 1);
        assert!(store.get_provider_id(account.id).await.unwrap().is_none());

        // A working provider succeeds on the next attempt
        let working = Arc::new(MockProviderClient::new(&["prov-5"]));
        let resolver = ProviderIdResolver::new(store, working);
        assert_eq!(resolver.resolve(&account).await.as_deref(), Some("prov-5"));
    }
}
