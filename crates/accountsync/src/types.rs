//! Synchronizer domain types

use chrono::{DateTime, Utc};
use common::{AccountId, ChatId, UserId};
use serde::{Deserialize, Serialize};

/// Status of a ledger order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order noticed but not yet settled
    Pending,
    /// Order confirmed paid through the handshake
    Paid,
    /// Order completed on the provider side
    Completed,
    /// Order cancelled
    Cancelled,
    /// Legacy terminal status kept for older ledger rows
    Done,
}

impl OrderStatus {
    /// Statuses counted as settled by statistics
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Completed | Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Done => "done",
        }
    }

    /// Parse from the stored string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A linked exchange account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Local surrogate id
    pub id: AccountId,
    /// Owning user
    pub user_id: UserId,
    /// Display name, assigned a default on creation when not given
    pub name: Option<String>,
    /// Opaque provider credential; never rendered back to users
    pub access_token: Option<String>,
    /// Chat the engine notifies about new orders
    pub notify_chat_id: Option<ChatId>,
    /// Whether the account participates at all
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Human-facing name, falling back to the id
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("account {}", self.id))
    }
}

/// Per-account trading filters and flags (1:1 with [`Account`])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSettings {
    pub account_id: AccountId,
    /// Lower fiat bound; `None` = unbounded
    pub min_amount: Option<f64>,
    /// Upper fiat bound; `None` = unbounded
    pub max_amount: Option<f64>,
    /// Whether the engine may auto-accept matching orders
    pub auto_mode: bool,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl AccountSettings {
    /// Default settings for a freshly linked account
    ///
    /// Auto-accept starts off: acceptance begins only once the user turns
    /// it on explicitly.
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            min_amount: None,
            max_amount: None,
            auto_mode: false,
            notifications_enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// Normalize a fiat filter bound at the boundary
///
/// A bound of zero means "unset" and is never stored as zero.
pub fn normalize_bound(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// A settled order recorded in the append-only ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerOrder {
    pub id: i64,
    pub user_id: UserId,
    pub account_id: AccountId,
    /// Provider-side order id; natural idempotency key together with
    /// `account_id`
    pub external_id: String,
    pub status: OrderStatus,
    pub amount_fiat: f64,
    pub rate: f64,
    pub reward_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating an [`Account`]
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: UserId,
    pub name: Option<String>,
    pub access_token: Option<String>,
    pub notify_chat_id: Option<ChatId>,
}

/// Parameters for appending a [`LedgerOrder`]
#[derive(Debug, Clone)]
pub struct NewLedgerOrder {
    pub user_id: UserId,
    pub account_id: AccountId,
    pub external_id: String,
    pub status: OrderStatus,
    pub amount_fiat: f64,
    pub rate: f64,
    pub reward_amount: f64,
}
