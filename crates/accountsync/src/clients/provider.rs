//! Provider client - trait and implementations
//!
//! Only used to resolve the provider-side account id for a local account.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SyncResult;

/// One account record as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderAccount {
    pub id: String,
}

/// Client trait for the exchange provider
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// List the provider accounts reachable with the given credential
    async fn list_accounts(&self, access_token: &str) -> SyncResult<Vec<ProviderAccount>>;
}

// ==================== Mock Implementation ====================

/// Mock provider client for testing
pub struct MockProviderClient {
    accounts: Vec<ProviderAccount>,
    fail: bool,
    calls: std::sync::atomic::AtomicU64,
}

impl MockProviderClient {
    /// Create a mock returning the given provider account ids
    pub fn new(ids: &[&str]) -> Self {
        Self {
            accounts: ids
                .iter()
                .map(|id| ProviderAccount { id: id.to_string() })
                .collect(),
            fail: false,
            calls: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Create a mock that fails every call
    pub fn failing() -> Self {
        Self {
            accounts: Vec::new(),
            fail: true,
            calls: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// How many times the provider was called
    pub fn call_count(&self) -> u64 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn list_accounts(&self, _access_token: &str) -> SyncResult<Vec<ProviderAccount>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(crate::error::SyncError::ResolutionUnavailable(
                "mock provider failure".to_string(),
            ));
        }
        Ok(self.accounts.clone())
    }
}

// ==================== HTTP Implementation ====================

#[cfg(feature = "client")]
pub mod http {
    use async_trait::async_trait;
    use reqwest::Client;
    use serde::Deserialize;
    use std::time::Duration;

    use super::{ProviderAccount, ProviderClient};
    use crate::error::{SyncError, SyncResult};

    #[derive(Debug, Deserialize)]
    struct ListAccountsResponse {
        #[serde(default)]
        data: Vec<ProviderAccount>,
    }

    /// HTTP-based provider client
    ///
    /// The credential travels in a cookie header, matching the provider's
    /// internal API contract. The timeout is applied per request, so it
    /// holds even when the pooled client had to be built without builder
    /// options.
    pub struct HttpProviderClient {
        client: Client,
        base_url: String,
        timeout: Duration,
    }

    impl HttpProviderClient {
        pub fn new(base_url: &str, timeout: Duration) -> Self {
            let client = Client::builder().build().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Provider client builder failed, using defaults");
                Client::new()
            });
            Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout,
            }
        }

        pub fn from_config(config: &config::ProviderConfig) -> Self {
            Self::new(
                &config.base_url,
                Duration::from_millis(config.timeout_ms),
            )
        }
    }

    #[async_trait]
    impl ProviderClient for HttpProviderClient {
        async fn list_accounts(&self, access_token: &str) -> SyncResult<Vec<ProviderAccount>> {
            let url = format!("{}/internal/v1/p2c/accounts", self.base_url);

            let response = self
                .client
                .get(&url)
                .timeout(self.timeout)
                .header("Cookie", format!("access_token={}", access_token))
                .send()
                .await
                .map_err(|e| SyncError::ResolutionUnavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(SyncError::ResolutionUnavailable(format!(
                    "provider returned {}",
                    response.status()
                )));
            }

            let body: ListAccountsResponse = response
                .json()
                .await
                .map_err(|e| SyncError::ResolutionUnavailable(e.to_string()))?;

            Ok(body.data)
        }
    }
}
