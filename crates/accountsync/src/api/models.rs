//! API models for the synchronizer HTTP endpoints

use serde::{Deserialize, Serialize};

use crate::coordinator::SettlementStep;
use crate::stats::LedgerStats;
use crate::types::{Account, AccountSettings};

/// Request to link a new account
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub notify_chat_id: Option<i64>,
}

/// Account with its settings, as rendered to clients
///
/// The credential never leaves the service.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub user_id: i64,
    pub name: Option<String>,
    pub notify_chat_id: Option<i64>,
    pub is_active: bool,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub auto_mode: bool,
    pub notifications_enabled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<(Account, AccountSettings)> for AccountResponse {
    fn from((account, settings): (Account, AccountSettings)) -> Self {
        Self {
            id: account.id.as_i64(),
            user_id: account.user_id.as_i64(),
            name: account.name,
            notify_chat_id: account.notify_chat_id,
            is_active: account.is_active,
            min_amount: settings.min_amount,
            max_amount: settings.max_amount,
            auto_mode: settings.auto_mode,
            notifications_enabled: settings.notifications_enabled,
            created_at: account.created_at,
        }
    }
}

/// Request to set the fiat amount filter
#[derive(Debug, Serialize, Deserialize)]
pub struct SetFilterRequest {
    #[serde(default)]
    pub min_amount: Option<f64>,
    #[serde(default)]
    pub max_amount: Option<f64>,
}

/// Response after flipping a flag
#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub enabled: bool,
}

/// Request carrying one raw handshake payload
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub payload: String,
}

/// The next handshake step, with follow-up payloads pre-encoded
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepView {
    NeedsConfirmation { confirm: String, back: String },
    Committed { recorded: bool },
    Cancelled,
    Restored { original: String },
}

impl From<SettlementStep> for StepView {
    fn from(step: SettlementStep) -> Self {
        match step {
            SettlementStep::NeedsConfirmation { confirm, back } => Self::NeedsConfirmation {
                confirm: confirm.encode(),
                back: back.encode(),
            },
            SettlementStep::Committed { recorded } => Self::Committed { recorded },
            SettlementStep::Cancelled => Self::Cancelled,
            SettlementStep::Restored { original } => Self::Restored {
                original: original.encode(),
            },
        }
    }
}

/// Response to a handshake callback
#[derive(Debug, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub success: bool,
    #[serde(flatten)]
    pub step: StepView,
}

/// Request to take an order for manual processing
#[derive(Debug, Serialize, Deserialize)]
pub struct TakeOrderRequest {
    pub account_id: i64,
    pub external_id: String,
}

/// Query parameters for the stats endpoint
#[derive(Debug, Deserialize)]
pub struct StatsParams {
    #[serde(default)]
    pub window: Option<String>,
}

/// Settlement statistics response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub window: String,
    /// `true` when no orders settled in the window; `stats` is then absent
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LedgerStats>,
}

/// Generic success acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Error detail in API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Error response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
