//! Settlement statistics over the ledger

use chrono::{DateTime, Duration, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::SyncResult;
use crate::store::SyncStore;

/// Reporting window, anchored at "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsWindow {
    Day,
    Week,
    Month,
}

impl StatsWindow {
    /// Start of the window relative to `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => now - Duration::hours(24),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for StatsWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived statistics over settled orders in a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub count: u64,
    pub turnover: f64,
    pub avg_ticket: f64,
    pub total_reward: f64,
}

/// Aggregate a user's settled orders over a window.
///
/// Returns `None` when no orders settled in the window, so callers can
/// present the empty case instead of a zero average.
pub async fn aggregate(
    store: &dyn SyncStore,
    user: UserId,
    window: StatsWindow,
) -> SyncResult<Option<LedgerStats>> {
    let since = window.since(Utc::now());
    let totals = store.aggregate_settled(user, since).await?;
    if totals.count == 0 {
        return Ok(None);
    }
    Ok(Some(LedgerStats {
        count: totals.count,
        turnover: totals.turnover,
        avg_ticket: totals.turnover / totals.count as f64,
        total_reward: totals.total_reward,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{NewAccount, NewLedgerOrder, OrderStatus};
    use common::AccountId;

    async fn seed_order(store: &MemoryStore, account_id: AccountId, ext: &str, amount: f64) {
        store
            .record_settled_order(NewLedgerOrder {
                user_id: UserId(1),
                account_id,
                external_id: ext.to_string(),
                status: OrderStatus::Paid,
                amount_fiat: amount,
                rate: 90.0,
                reward_amount: amount * 0.02,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_window_is_none() {
        let store = MemoryStore::new();
        let stats = aggregate(&store, UserId(1), StatsWindow::Day).await.unwrap();
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn test_aggregate_computes_average() {
        let store = MemoryStore::new();
        let account = store
            .create_account(NewAccount {
                user_id: UserId(1),
                name: None,
                access_token: None,
                notify_chat_id: None,
            })
            .await
            .unwrap();
        seed_order(&store, account.id, "ord-1", 1000.0).await;
        seed_order(&store, account.id, "ord-2", 2000.0).await;

        let stats = aggregate(&store, UserId(1), StatsWindow::Week)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.turnover, 3000.0);
        assert_eq!(stats.avg_ticket, 1500.0);
        assert_eq!(stats.total_reward, 60.0);
    }

    #[test]
    fn test_window_parse() {
        assert_eq!(StatsWindow::parse("day"), Some(StatsWindow::Day));
        assert_eq!(StatsWindow::parse("week"), Some(StatsWindow::Week));
        assert_eq!(StatsWindow::parse("month"), Some(StatsWindow::Month));
        assert_eq!(StatsWindow::parse("year"), None);
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();
        assert_eq!(now - StatsWindow::Day.since(now), Duration::hours(24));
        assert_eq!(now - StatsWindow::Month.since(now), Duration::days(30));
    }
}
