//! Account lifecycle and configuration mirroring
//!
//! Every successful mutation ends with a best-effort reload push to the
//! engine so it sees the new configuration. The push never fails the
//! mutation itself: local state is authoritative, the engine converges.

use std::sync::Arc;

use common::{AccountId, UserId};
use tracing::{info, warn};

use crate::clients::engine::{DesiredState, EngineClient};
use crate::error::{SyncError, SyncResult};
use crate::resolver::ProviderIdResolver;
use crate::stats::{self, LedgerStats, StatsWindow};
use crate::store::SyncStore;
use crate::types::{normalize_bound, Account, AccountSettings, NewAccount};

/// Minimum plausible credential length after trimming
const MIN_TOKEN_LEN: usize = 10;

pub struct AccountManager {
    store: Arc<dyn SyncStore>,
    engine: Arc<dyn EngineClient>,
    resolver: Arc<ProviderIdResolver>,
}

impl AccountManager {
    pub fn new(
        store: Arc<dyn SyncStore>,
        engine: Arc<dyn EngineClient>,
        resolver: Arc<ProviderIdResolver>,
    ) -> Self {
        Self {
            store,
            engine,
            resolver,
        }
    }

    /// Link a new account from a raw credential
    ///
    /// The account starts active with auto-acceptance off; the name
    /// defaults to a positional one when not given.
    pub async fn create_account(
        &self,
        user: UserId,
        name: Option<String>,
        access_token: &str,
        notify_chat_id: Option<i64>,
    ) -> SyncResult<(Account, AccountSettings)> {
        let token = access_token.trim();
        if token.len() < MIN_TOKEN_LEN {
            return Err(SyncError::Validation(
                "access token is too short".to_string(),
            ));
        }

        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(n) => n,
            None => {
                let existing = self.store.count_accounts(user).await?;
                format!("Account #{}", existing + 1)
            }
        };

        let account = self
            .store
            .create_account(NewAccount {
                user_id: user,
                name: Some(name),
                access_token: Some(token.to_string()),
                notify_chat_id,
            })
            .await?;

        let settings = AccountSettings::new(account.id);
        self.store.upsert_settings(&settings).await?;

        info!(account_id = %account.id, user_id = %user, "Linked new account");

        self.mirror(&account, &settings).await;
        Ok((account, settings))
    }

    /// Fetch an account with its settings, enforcing ownership
    pub async fn get_account(
        &self,
        user: UserId,
        id: AccountId,
    ) -> SyncResult<(Account, AccountSettings)> {
        let account = self.owned_account(user, id).await?;
        let settings = self.settings_for(&account).await?;
        Ok((account, settings))
    }

    /// List all accounts owned by a user, each with its settings
    pub async fn list_accounts(
        &self,
        user: UserId,
    ) -> SyncResult<Vec<(Account, AccountSettings)>> {
        let accounts = self.store.list_accounts(user).await?;
        let mut out = Vec::with_capacity(accounts.len());
        for account in accounts {
            let settings = self.settings_for(&account).await?;
            out.push((account, settings));
        }
        Ok(out)
    }

    /// Set the fiat amount filter for an account
    ///
    /// Zero bounds mean "unset". When both bounds end up set, the range
    /// must be non-empty; on a violation the stored settings stay as they
    /// were.
    pub async fn set_filter(
        &self,
        user: UserId,
        id: AccountId,
        min_amount: Option<f64>,
        max_amount: Option<f64>,
    ) -> SyncResult<AccountSettings> {
        let account = self.owned_account(user, id).await?;
        let mut settings = self.settings_for(&account).await?;

        let min = normalize_bound(min_amount);
        let max = normalize_bound(max_amount);
        if min.is_some_and(|v| v < 0.0) || max.is_some_and(|v| v < 0.0) {
            return Err(SyncError::Validation(
                "filter bounds must not be negative".to_string(),
            ));
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if hi < lo {
                return Err(SyncError::Validation(
                    "max amount is below min amount".to_string(),
                ));
            }
        }

        settings.min_amount = min;
        settings.max_amount = max;
        self.store.upsert_settings(&settings).await?;

        self.mirror(&account, &settings).await;
        Ok(settings)
    }

    /// Flip the auto-acceptance flag, returning the new value
    pub async fn toggle_auto(&self, user: UserId, id: AccountId) -> SyncResult<bool> {
        let account = self.owned_account(user, id).await?;
        let mut settings = self.settings_for(&account).await?;

        settings.auto_mode = !settings.auto_mode;
        self.store.upsert_settings(&settings).await?;

        info!(account_id = %id, auto_mode = settings.auto_mode, "Toggled auto mode");

        self.mirror(&account, &settings).await;
        Ok(settings.auto_mode)
    }

    /// Flip the active flag, returning the new value
    pub async fn toggle_active(&self, user: UserId, id: AccountId) -> SyncResult<bool> {
        let mut account = self.owned_account(user, id).await?;
        let settings = self.settings_for(&account).await?;

        account.is_active = !account.is_active;
        self.store.update_account(&account).await?;

        info!(account_id = %id, is_active = account.is_active, "Toggled active flag");

        self.mirror(&account, &settings).await;
        Ok(account.is_active)
    }

    /// Unlink an account, cascading to settings, ledger and provider
    /// mapping, then tell the engine to drop it
    pub async fn delete_account(&self, user: UserId, id: AccountId) -> SyncResult<()> {
        let account = self.owned_account(user, id).await?;
        self.store.delete_account(account.id).await?;

        info!(account_id = %id, user_id = %user, "Deleted account");

        // Deactivation push: no credential, both flags off
        let mut desired = DesiredState::new(account.id);
        desired.auto_mode = Some(false);
        desired.is_active = Some(false);
        if !self.engine.reload_account(desired.into_request()).await {
            warn!(account_id = %id, "Engine did not acknowledge account removal");
        }
        Ok(())
    }

    /// Settlement statistics over the user's ledger for a window
    pub async fn stats(
        &self,
        user: UserId,
        window: StatsWindow,
    ) -> SyncResult<Option<LedgerStats>> {
        stats::aggregate(self.store.as_ref(), user, window).await
    }

    async fn owned_account(&self, user: UserId, id: AccountId) -> SyncResult<Account> {
        match self.store.get_account(id).await? {
            Some(account) if account.user_id == user => Ok(account),
            _ => Err(SyncError::AccountNotFound(id)),
        }
    }

    async fn settings_for(&self, account: &Account) -> SyncResult<AccountSettings> {
        Ok(self
            .store
            .get_settings(account.id)
            .await?
            .unwrap_or_else(|| AccountSettings::new(account.id)))
    }

    /// Push the full desired configuration for an account to the engine.
    /// Best effort only: a refused or unreachable engine is logged and
    /// the mutation stands.
    async fn mirror(&self, account: &Account, settings: &AccountSettings) {
        let provider_account_id = self.resolver.resolve(account).await;

        let desired = DesiredState {
            account_id: account.id,
            access_token: account.access_token.clone(),
            chat_id: account.notify_chat_id,
            min_amount: settings.min_amount,
            max_amount: settings.max_amount,
            auto_mode: Some(settings.auto_mode),
            is_active: Some(account.is_active),
            provider_account_id,
        };

        if !self.engine.reload_account(desired.into_request()).await {
            warn!(account_id = %account.id, "Engine did not acknowledge config reload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::engine::MockEngineClient;
    use crate::clients::provider::MockProviderClient;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn manager_with(
        engine: MockEngineClient,
        provider: MockProviderClient,
    ) -> (AccountManager, Arc<MemoryStore>, Arc<MockEngineClient>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(engine);
        let provider = Arc::new(provider);
        let resolver = Arc::new(ProviderIdResolver::new(store.clone(), provider));
        let manager = AccountManager::new(store.clone(), engine.clone(), resolver);
        (manager, store, engine)
    }

    fn default_manager() -> (AccountManager, Arc<MemoryStore>, Arc<MockEngineClient>) {
        manager_with(MockEngineClient::new(), MockProviderClient::new(&["prov-1"]))
    }

    #[tokio::test]
    async fn test_create_rejects_short_token() {
        let (manager, _, _) = default_manager();
        let err = manager
            .create_account(UserId(1), None, "  short  ", None)
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::Validation(_));
    }

    #[tokio::test]
    async fn test_create_assigns_positional_default_name() {
        let (manager, _, engine) = default_manager();
        let (first, settings) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();
        assert_eq!(first.name.as_deref(), Some("Account #1"));
        assert!(first.is_active);
        assert!(!settings.auto_mode);
        assert!(settings.notifications_enabled);

        let (second, _) = manager
            .create_account(UserId(1), None, "token-ghijkl", None)
            .await
            .unwrap();
        assert_eq!(second.name.as_deref(), Some("Account #2"));

        // Each creation pushed a reload with auto_mode off
        let reloads = engine.reload_requests();
        assert_eq!(reloads.len(), 2);
        assert!(!reloads[0].auto_mode);
        assert!(reloads[0].is_active);
        assert_eq!(reloads[0].provider_account_id.as_deref(), Some("prov-1"));
    }

    #[tokio::test]
    async fn test_create_survives_engine_refusal() {
        let (manager, _, _) = manager_with(
            MockEngineClient::new().with_reload_ok(false),
            MockProviderClient::failing(),
        );
        let result = manager
            .create_account(UserId(1), Some("Main".to_string()), "token-abcdef", None)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ownership_enforced() {
        let (manager, _, _) = default_manager();
        let (account, _) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();

        let err = manager.get_account(UserId(2), account.id).await.unwrap_err();
        assert_matches!(err, SyncError::AccountNotFound(_));
    }

    #[tokio::test]
    async fn test_set_filter_normalizes_and_validates() {
        let (manager, _, engine) = default_manager();
        let (account, _) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();

        // Zero means unset
        let settings = manager
            .set_filter(UserId(1), account.id, Some(0.0), Some(5000.0))
            .await
            .unwrap();
        assert_eq!(settings.min_amount, None);
        assert_eq!(settings.max_amount, Some(5000.0));

        // Inverted range is rejected and leaves settings untouched
        let err = manager
            .set_filter(UserId(1), account.id, Some(2000.0), Some(100.0))
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::Validation(_));
        let (_, unchanged) = manager.get_account(UserId(1), account.id).await.unwrap();
        assert_eq!(unchanged.max_amount, Some(5000.0));

        // Only the successful filter change was mirrored
        let last = engine.last_reload().unwrap();
        assert_eq!(last.max_amount, Some(5000.0));
        assert_eq!(last.min_amount, None);
    }

    #[tokio::test]
    async fn test_set_filter_rejects_negative_bounds() {
        let (manager, _, _) = default_manager();
        let (account, _) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();
        manager
            .set_filter(UserId(1), account.id, Some(500.0), None)
            .await
            .unwrap();

        for (min, max) in [(Some(-100.0), None), (None, Some(-1.0))] {
            let err = manager
                .set_filter(UserId(1), account.id, min, max)
                .await
                .unwrap_err();
            assert_matches!(err, SyncError::Validation(_));
        }
        let (_, unchanged) = manager.get_account(UserId(1), account.id).await.unwrap();
        assert_eq!(unchanged.min_amount, Some(500.0));
    }

    #[tokio::test]
    async fn test_toggles_flip_and_mirror() {
        let (manager, _, engine) = default_manager();
        let (account, _) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();

        assert!(manager.toggle_auto(UserId(1), account.id).await.unwrap());
        assert!(!manager.toggle_auto(UserId(1), account.id).await.unwrap());

        assert!(!manager.toggle_active(UserId(1), account.id).await.unwrap());
        let last = engine.last_reload().unwrap();
        assert!(!last.is_active);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_pushes_deactivation() {
        let (manager, store, engine) = default_manager();
        let (account, _) = manager
            .create_account(UserId(1), None, "token-abcdef", None)
            .await
            .unwrap();

        manager.delete_account(UserId(1), account.id).await.unwrap();
        assert!(store.get_account(account.id).await.unwrap().is_none());
        assert!(store.get_settings(account.id).await.unwrap().is_none());

        let last = engine.last_reload().unwrap();
        assert!(!last.is_active);
        assert!(!last.auto_mode);
        assert!(last.access_token.is_none());
    }
}
