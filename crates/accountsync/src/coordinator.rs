//! Two-step settlement handshake
//!
//! Turns decoded callback payloads into the next handshake step. The
//! engine confirms first; only then is the ledger written. A ledger
//! failure after engine confirmation is logged and reported, never
//! retried here, so the user's confirmation is not bounced back.

use std::sync::Arc;

use common::AccountId;
use tracing::{error, info};

use crate::clients::engine::EngineClient;
use crate::error::{SyncError, SyncResult};
use crate::payload::{CallbackPayload, SettlementTicket};
use crate::store::SyncStore;
use crate::types::{NewLedgerOrder, OrderStatus};

/// Outcome of processing one handshake step
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementStep {
    /// First press: ask again before doing anything irreversible
    NeedsConfirmation {
        confirm: CallbackPayload,
        back: CallbackPayload,
    },
    /// Payment confirmed by the engine
    ///
    /// `recorded` is `false` when the ledger row already existed or
    /// could not be written; the settlement itself stands either way.
    Committed { recorded: bool },
    /// Cancellation confirmed by the engine
    Cancelled,
    /// User backed out; re-present the original action
    Restored { original: CallbackPayload },
}

pub struct SettlementCoordinator {
    store: Arc<dyn SyncStore>,
    engine: Arc<dyn EngineClient>,
}

impl SettlementCoordinator {
    pub fn new(store: Arc<dyn SyncStore>, engine: Arc<dyn EngineClient>) -> Self {
        Self { store, engine }
    }

    /// Advance the handshake by one step
    pub async fn handle(&self, payload: CallbackPayload) -> SyncResult<SettlementStep> {
        match payload {
            CallbackPayload::Paid(ticket) => Ok(SettlementStep::NeedsConfirmation {
                confirm: CallbackPayload::PaidConfirm(ticket.clone()),
                back: CallbackPayload::PaidBack(ticket),
            }),
            CallbackPayload::Cancel {
                account_id,
                external_id,
            } => Ok(SettlementStep::NeedsConfirmation {
                confirm: CallbackPayload::CancelConfirm {
                    account_id,
                    external_id: external_id.clone(),
                },
                back: CallbackPayload::CancelBack(SettlementTicket {
                    account_id,
                    external_id,
                    amount: 0.0,
                    rate: 0.0,
                    fee: 0.0,
                }),
            }),
            CallbackPayload::PaidConfirm(ticket) => self.commit_payment(ticket).await,
            CallbackPayload::CancelConfirm {
                account_id,
                external_id,
            } => self.commit_cancel(account_id, &external_id).await,
            CallbackPayload::PaidBack(ticket) => Ok(SettlementStep::Restored {
                original: CallbackPayload::Paid(ticket),
            }),
            CallbackPayload::CancelBack(ticket) => Ok(SettlementStep::Restored {
                original: CallbackPayload::Paid(ticket),
            }),
        }
    }

    /// Ask the engine to take an order for manual processing
    pub async fn take_order(
        &self,
        account_id: AccountId,
        order_external_id: &str,
    ) -> SyncResult<()> {
        if !self.engine.take_order(account_id, order_external_id).await {
            return Err(SyncError::EngineUnavailable(format!(
                "engine refused to take order {}",
                order_external_id
            )));
        }
        info!(account_id = %account_id, external_id = order_external_id, "Order taken");
        Ok(())
    }

    async fn commit_payment(&self, ticket: SettlementTicket) -> SyncResult<SettlementStep> {
        if !self
            .engine
            .complete_order(ticket.account_id, &ticket.external_id)
            .await
        {
            return Err(SyncError::EngineUnavailable(format!(
                "engine refused to complete order {}",
                ticket.external_id
            )));
        }

        let account = self
            .store
            .get_account(ticket.account_id)
            .await?
            .ok_or(SyncError::AccountNotFound(ticket.account_id))?;

        let order = NewLedgerOrder {
            user_id: account.user_id,
            account_id: ticket.account_id,
            external_id: ticket.external_id.clone(),
            status: OrderStatus::Paid,
            amount_fiat: ticket.amount,
            rate: ticket.rate,
            reward_amount: ticket.fee,
        };

        // The engine already settled; a failed ledger write must not bounce
        // the confirmation back to the user
        let recorded = match self.store.record_settled_order(order).await {
            Ok(inserted) => inserted,
            Err(e) => {
                error!(
                    account_id = %ticket.account_id,
                    external_id = %ticket.external_id,
                    error = %e,
                    "Ledger write failed after engine confirmation"
                );
                false
            }
        };

        info!(
            account_id = %ticket.account_id,
            external_id = %ticket.external_id,
            recorded,
            "Payment settled"
        );
        Ok(SettlementStep::Committed { recorded })
    }

    async fn commit_cancel(
        &self,
        account_id: AccountId,
        external_id: &str,
    ) -> SyncResult<SettlementStep> {
        if !self.engine.cancel_order(account_id, external_id).await {
            return Err(SyncError::EngineUnavailable(format!(
                "engine refused to cancel order {}",
                external_id
            )));
        }
        info!(account_id = %account_id, external_id, "Order cancelled");
        Ok(SettlementStep::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::engine::MockEngineClient;
    use crate::store::MemoryStore;
    use crate::types::NewAccount;
    use assert_matches::assert_matches;
    use common::UserId;

    fn ticket(account_id: AccountId) -> SettlementTicket {
        SettlementTicket {
            account_id,
            external_id: "ord-1".to_string(),
            amount: 1500.0,
            rate: 92.5,
            fee: 30.0,
        }
    }

    async fn coordinator_with(
        engine: MockEngineClient,
    ) -> (SettlementCoordinator, Arc<MemoryStore>, Arc<MockEngineClient>, AccountId) {
        let store = Arc::new(MemoryStore::new());
        let account = store
            .create_account(NewAccount {
                user_id: UserId(7),
                name: None,
                access_token: None,
                notify_chat_id: None,
            })
            .await
            .unwrap();
        let engine = Arc::new(engine);
        let coordinator = SettlementCoordinator::new(store.clone(), engine.clone());
        (coordinator, store, engine, account.id)
    }

    #[tokio::test]
    async fn test_paid_asks_for_confirmation() {
        let (coordinator, _, engine, account_id) =
            coordinator_with(MockEngineClient::new()).await;

        let step = coordinator
            .handle(CallbackPayload::Paid(ticket(account_id)))
            .await
            .unwrap();
        assert_matches!(
            step,
            SettlementStep::NeedsConfirmation {
                confirm: CallbackPayload::PaidConfirm(_),
                back: CallbackPayload::PaidBack(_),
            }
        );
        // Nothing touched the engine yet
        assert!(engine.completed_orders().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_settles_and_records() {
        let (coordinator, store, engine, account_id) =
            coordinator_with(MockEngineClient::new()).await;

        let step = coordinator
            .handle(CallbackPayload::PaidConfirm(ticket(account_id)))
            .await
            .unwrap();
        assert_eq!(step, SettlementStep::Committed { recorded: true });
        assert_eq!(engine.completed_orders().len(), 1);

        let totals = store
            .aggregate_settled(UserId(7), chrono::Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.count, 1);
        assert_eq!(totals.turnover, 1500.0);
    }

    #[tokio::test]
    async fn test_double_confirm_records_once() {
        let (coordinator, store, _, account_id) =
            coordinator_with(MockEngineClient::new()).await;

        let first = coordinator
            .handle(CallbackPayload::PaidConfirm(ticket(account_id)))
            .await
            .unwrap();
        let second = coordinator
            .handle(CallbackPayload::PaidConfirm(ticket(account_id)))
            .await
            .unwrap();
        assert_eq!(first, SettlementStep::Committed { recorded: true });
        assert_eq!(second, SettlementStep::Committed { recorded: false });

        let totals = store
            .aggregate_settled(UserId(7), chrono::Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.count, 1);
    }

    #[tokio::test]
    async fn test_engine_refusal_blocks_ledger() {
        let (coordinator, store, _, account_id) =
            coordinator_with(MockEngineClient::new().with_complete_ok(false)).await;

        let err = coordinator
            .handle(CallbackPayload::PaidConfirm(ticket(account_id)))
            .await
            .unwrap_err();
        assert_matches!(err, SyncError::EngineUnavailable(_));

        let totals = store
            .aggregate_settled(UserId(7), chrono::Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(totals.count, 0);
    }

    #[tokio::test]
    async fn test_cancel_flow() {
        let (coordinator, _, engine, account_id) =
            coordinator_with(MockEngineClient::new()).await;

        let step = coordinator
            .handle(CallbackPayload::Cancel {
                account_id,
                external_id: "ord-1".to_string(),
            })
            .await
            .unwrap();
        let confirm = match step {
            SettlementStep::NeedsConfirmation { confirm, back } => {
                // The back payload rebuilds the notification with zeros
                assert_matches!(back, CallbackPayload::CancelBack(t) if t.amount == 0.0);
                confirm
            }
            other => panic!("unexpected step: {:?}", other),
        };

        let step = coordinator.handle(confirm).await.unwrap();
        assert_eq!(step, SettlementStep::Cancelled);
        assert_eq!(engine.cancelled_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_back_restores_original() {
        let (coordinator, _, _, account_id) =
            coordinator_with(MockEngineClient::new()).await;

        let step = coordinator
            .handle(CallbackPayload::PaidBack(ticket(account_id)))
            .await
            .unwrap();
        assert_matches!(
            step,
            SettlementStep::Restored {
                original: CallbackPayload::Paid(_)
            }
        );
    }

    #[tokio::test]
    async fn test_take_order_refusal() {
        let (coordinator, _, _, account_id) =
            coordinator_with(MockEngineClient::new().with_take_ok(false)).await;

        let err = coordinator.take_order(account_id, "ord-1").await.unwrap_err();
        assert_matches!(err, SyncError::EngineUnavailable(_));
    }
}
