//! Engine client - trait and implementations
//!
//! The engine watches for and fulfills orders; this side only mirrors the
//! desired account configuration to it and asks it to settle orders. All
//! calls report success as a plain bool: transport failures and non-2xx
//! responses are swallowed and come back as `false`, never as an error.

use async_trait::async_trait;
use common::{AccountId, ChatId};
use serde::{Deserialize, Serialize};

/// Desired account configuration as known by a mutation call site
///
/// Call sites that reload without fully reconstructing settings leave the
/// flags as `None`; the merge into [`ReloadRequest`] then assumes `true`,
/// because "acceptance was already on" is safer than silently disabling a
/// live account.
#[derive(Debug, Clone)]
pub struct DesiredState {
    pub account_id: AccountId,
    pub access_token: Option<String>,
    pub chat_id: Option<ChatId>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub auto_mode: Option<bool>,
    pub is_active: Option<bool>,
    pub provider_account_id: Option<String>,
}

impl DesiredState {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            access_token: None,
            chat_id: None,
            min_amount: None,
            max_amount: None,
            auto_mode: None,
            is_active: None,
            provider_account_id: None,
        }
    }

    /// Merge into the wire request, applying the default-true flag rule
    pub fn into_request(self) -> ReloadRequest {
        ReloadRequest {
            account_id: self.account_id.as_i64(),
            access_token: self.access_token,
            chat_id: self.chat_id,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            auto_mode: self.auto_mode.unwrap_or(true),
            is_active: self.is_active.unwrap_or(true),
            provider_account_id: self.provider_account_id,
        }
    }
}

/// Body of `POST /accounts/reload`
///
/// Unset optional fields are omitted rather than sent as nulls; the two
/// flags are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadRequest {
    pub account_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    pub auto_mode: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_account_id: Option<String>,
}

/// Client trait for the order-matching engine - protocol agnostic
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Push the current desired account configuration
    ///
    /// Fire-and-forget: callers must not fail their own operation when
    /// this returns `false`.
    async fn reload_account(&self, req: ReloadRequest) -> bool;

    /// Ask the engine to take an order for manual processing
    async fn take_order(&self, account_id: AccountId, order_external_id: &str) -> bool;

    /// Mark an order as paid on the engine side
    ///
    /// `false` must block the local ledger write; the engine is the
    /// source of truth for settlement.
    async fn complete_order(&self, account_id: AccountId, payment_id: &str) -> bool;

    /// Cancel an order on the engine side
    async fn cancel_order(&self, account_id: AccountId, payment_id: &str) -> bool;
}

// ==================== Mock Implementation ====================

/// Mock engine client for testing
pub struct MockEngineClient {
    reloads: std::sync::Mutex<Vec<ReloadRequest>>,
    taken: std::sync::Mutex<Vec<(AccountId, String)>>,
    completed: std::sync::Mutex<Vec<(AccountId, String)>>,
    cancelled: std::sync::Mutex<Vec<(AccountId, String)>>,
    reload_ok: bool,
    take_ok: bool,
    complete_ok: bool,
    cancel_ok: bool,
}

impl MockEngineClient {
    /// Create a mock that accepts everything
    pub fn new() -> Self {
        Self {
            reloads: std::sync::Mutex::new(Vec::new()),
            taken: std::sync::Mutex::new(Vec::new()),
            completed: std::sync::Mutex::new(Vec::new()),
            cancelled: std::sync::Mutex::new(Vec::new()),
            reload_ok: true,
            take_ok: true,
            complete_ok: true,
            cancel_ok: true,
        }
    }

    pub fn with_reload_ok(mut self, ok: bool) -> Self {
        self.reload_ok = ok;
        self
    }

    pub fn with_take_ok(mut self, ok: bool) -> Self {
        self.take_ok = ok;
        self
    }

    pub fn with_complete_ok(mut self, ok: bool) -> Self {
        self.complete_ok = ok;
        self
    }

    pub fn with_cancel_ok(mut self, ok: bool) -> Self {
        self.cancel_ok = ok;
        self
    }

    /// All reload requests seen so far
    pub fn reload_requests(&self) -> Vec<ReloadRequest> {
        self.reloads.lock().unwrap().clone()
    }

    /// The most recent reload request, if any
    pub fn last_reload(&self) -> Option<ReloadRequest> {
        self.reloads.lock().unwrap().last().cloned()
    }

    pub fn completed_orders(&self) -> Vec<(AccountId, String)> {
        self.completed.lock().unwrap().clone()
    }

    pub fn cancelled_orders(&self) -> Vec<(AccountId, String)> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn taken_orders(&self) -> Vec<(AccountId, String)> {
        self.taken.lock().unwrap().clone()
    }
}

impl Default for MockEngineClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineClient for MockEngineClient {
    async fn reload_account(&self, req: ReloadRequest) -> bool {
        tracing::debug!("Mock engine: reload account {}", req.account_id);
        self.reloads.lock().unwrap().push(req);
        self.reload_ok
    }

    async fn take_order(&self, account_id: AccountId, order_external_id: &str) -> bool {
        self.taken
            .lock()
            .unwrap()
            .push((account_id, order_external_id.to_string()));
        self.take_ok
    }

    async fn complete_order(&self, account_id: AccountId, payment_id: &str) -> bool {
        self.completed
            .lock()
            .unwrap()
            .push((account_id, payment_id.to_string()));
        self.complete_ok
    }

    async fn cancel_order(&self, account_id: AccountId, payment_id: &str) -> bool {
        self.cancelled
            .lock()
            .unwrap()
            .push((account_id, payment_id.to_string()));
        self.cancel_ok
    }
}

// ==================== HTTP Implementation ====================

#[cfg(feature = "client")]
pub mod http {
    use async_trait::async_trait;
    use common::AccountId;
    use reqwest::Client;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    use super::{EngineClient, ReloadRequest};

    fn default_ok() -> bool {
        true
    }

    /// Engine acknowledgement body; a missing `ok` counts as success
    #[derive(Debug, Deserialize)]
    struct EngineAck {
        #[serde(default = "default_ok")]
        ok: bool,
    }

    /// HTTP-based engine client with a fixed short timeout
    ///
    /// The timeout is applied per request, so it holds even when the
    /// pooled client had to be built without builder options.
    pub struct HttpEngineClient {
        client: Client,
        base_url: String,
        timeout: Duration,
    }

    impl HttpEngineClient {
        /// Create a new HTTP engine client
        ///
        /// An empty base URL is allowed; every call then reports failure
        /// without going to the network.
        pub fn new(base_url: &str, timeout: Duration) -> Self {
            let client = Client::builder().build().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Engine client builder failed, using defaults");
                Client::new()
            });
            Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout,
            }
        }

        pub fn from_config(config: &config::EngineConfig) -> Self {
            Self::new(
                &config.base_url,
                Duration::from_millis(config.timeout_ms),
            )
        }

        async fn post_ok<T: Serialize>(&self, path: &str, body: &T) -> bool {
            if self.base_url.is_empty() {
                tracing::debug!("Engine base URL not configured, skipping {}", path);
                return false;
            }
            let url = format!("{}{}", self.base_url, path);

            let request = self.client.post(&url).timeout(self.timeout).json(body);
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Engine call failed");
                    return false;
                }
            };

            if !response.status().is_success() {
                tracing::warn!(%url, status = %response.status(), "Engine returned error status");
                return false;
            }

            match response.json::<EngineAck>().await {
                Ok(ack) => ack.ok,
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Engine returned unreadable body");
                    false
                }
            }
        }
    }

    #[derive(Serialize)]
    struct TakeOrderBody<'a> {
        account_id: i64,
        order_external_id: &'a str,
    }

    #[derive(Serialize)]
    struct PaymentBody<'a> {
        account_id: i64,
        payment_id: &'a str,
    }

    #[async_trait]
    impl EngineClient for HttpEngineClient {
        async fn reload_account(&self, req: ReloadRequest) -> bool {
            self.post_ok("/accounts/reload", &req).await
        }

        async fn take_order(&self, account_id: AccountId, order_external_id: &str) -> bool {
            let body = TakeOrderBody {
                account_id: account_id.as_i64(),
                order_external_id,
            };
            self.post_ok("/orders/take", &body).await
        }

        async fn complete_order(&self, account_id: AccountId, payment_id: &str) -> bool {
            let body = PaymentBody {
                account_id: account_id.as_i64(),
                payment_id,
            };
            self.post_ok("/orders/complete", &body).await
        }

        async fn cancel_order(&self, account_id: AccountId, payment_id: &str) -> bool {
            let body = PaymentBody {
                account_id: account_id.as_i64(),
                payment_id,
            };
            self.post_ok("/orders/cancel", &body).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_flags_to_true() {
        let req = DesiredState::new(AccountId(3)).into_request();
        assert!(req.auto_mode);
        assert!(req.is_active);
        assert!(req.access_token.is_none());
    }

    #[test]
    fn test_merge_keeps_explicit_flags() {
        let mut state = DesiredState::new(AccountId(3));
        state.auto_mode = Some(false);
        state.is_active = Some(false);
        let req = state.into_request();
        assert!(!req.auto_mode);
        assert!(!req.is_active);
    }

    #[test]
    fn test_reload_request_omits_unset_fields() {
        let req = DesiredState::new(AccountId(3)).into_request();
        let json = serde_json::to_value(&req).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("account_id"), Some(&serde_json::json!(3)));
        assert_eq!(obj.get("auto_mode"), Some(&serde_json::json!(true)));
        assert_eq!(obj.get("is_active"), Some(&serde_json::json!(true)));
        assert!(!obj.contains_key("access_token"));
        assert!(!obj.contains_key("min_amount"));
        assert!(!obj.contains_key("provider_account_id"));
    }

    #[test]
    fn test_reload_request_carries_set_fields() {
        let mut state = DesiredState::new(AccountId(3));
        state.min_amount = Some(1000.0);
        state.provider_account_id = Some("prov-1".to_string());
        let json = serde_json::to_value(state.into_request()).unwrap();
        assert_eq!(json["min_amount"], serde_json::json!(1000.0));
        assert_eq!(json["provider_account_id"], serde_json::json!("prov-1"));
    }

    #[cfg(feature = "client")]
    #[tokio::test]
    async fn test_http_client_without_base_url_reports_failure() {
        use std::time::Duration;

        let client = http::HttpEngineClient::new("", Duration::from_millis(50));
        let req = DesiredState::new(AccountId(1)).into_request();
        assert!(!client.reload_account(req).await);
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let client = MockEngineClient::new().with_complete_ok(false);
        assert!(!client.complete_order(AccountId(1), "abc").await);
        assert!(client.cancel_order(AccountId(1), "abc").await);
        assert_eq!(client.completed_orders().len(), 1);
        assert_eq!(client.cancelled_orders().len(), 1);
    }
}
