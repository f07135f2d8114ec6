//! Callback payload wire codec
//!
//! The confirm/cancel handshake carries its entire state in a compact
//! colon-delimited string threaded through the chat front end:
//!
//! ```text
//! paid:<account_id>:<external_id>:<amount>:<rate>:<fee>
//! cancel:<account_id>:<external_id>
//! ```
//!
//! plus `_ok`/`_back` confirmation variants with the same positional
//! fields. Nothing is persisted between steps; losing the carrying
//! message forfeits the handshake.

use common::AccountId;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// The values threaded through a paid-order handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementTicket {
    pub account_id: AccountId,
    pub external_id: String,
    pub amount: f64,
    pub rate: f64,
    pub fee: f64,
}

/// One step of the settlement handshake, as carried on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackPayload {
    /// Initial "I paid" action from the order notification
    Paid(SettlementTicket),
    /// Yes on the paid confirmation prompt
    PaidConfirm(SettlementTicket),
    /// Back from the paid confirmation prompt
    PaidBack(SettlementTicket),
    /// Initial cancel action from the order notification
    Cancel {
        account_id: AccountId,
        external_id: String,
    },
    /// Yes on the cancel confirmation prompt
    CancelConfirm {
        account_id: AccountId,
        external_id: String,
    },
    /// Back from the cancel confirmation prompt
    ///
    /// Carries zero-filled amount/rate/fee: the cancel action never knew
    /// them, and the original notification is rebuilt with zeros.
    CancelBack(SettlementTicket),
}

impl CallbackPayload {
    /// Encode into the colon-delimited wire form
    pub fn encode(&self) -> String {
        match self {
            Self::Paid(t) => encode_ticket("paid", t),
            Self::PaidConfirm(t) => encode_ticket("paid_ok", t),
            Self::PaidBack(t) => encode_ticket("paid_back", t),
            Self::Cancel {
                account_id,
                external_id,
            } => format!("cancel:{}:{}", account_id, external_id),
            Self::CancelConfirm {
                account_id,
                external_id,
            } => format!("cancel_ok:{}:{}", account_id, external_id),
            Self::CancelBack(t) => encode_ticket("cancel_back", t),
        }
    }

    /// Decode from the colon-delimited wire form
    ///
    /// Rejects payloads with too few tokens or non-numeric numeric fields;
    /// never panics on garbage input.
    pub fn decode(raw: &str) -> SyncResult<Self> {
        let parts: Vec<&str> = raw.split(':').collect();
        let verb = parts.first().copied().unwrap_or_default();

        match verb {
            "paid" => Ok(Self::Paid(decode_ticket(&parts)?)),
            "paid_ok" => Ok(Self::PaidConfirm(decode_ticket(&parts)?)),
            "paid_back" => Ok(Self::PaidBack(decode_ticket(&parts)?)),
            "cancel_back" => Ok(Self::CancelBack(decode_ticket(&parts)?)),
            "cancel" => {
                let (account_id, external_id) = decode_order_ref(&parts)?;
                Ok(Self::Cancel {
                    account_id,
                    external_id,
                })
            }
            "cancel_ok" => {
                let (account_id, external_id) = decode_order_ref(&parts)?;
                Ok(Self::CancelConfirm {
                    account_id,
                    external_id,
                })
            }
            other => Err(SyncError::Validation(format!(
                "unknown callback verb: '{}'",
                other
            ))),
        }
    }
}

fn encode_ticket(verb: &str, t: &SettlementTicket) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}",
        verb, t.account_id, t.external_id, t.amount, t.rate, t.fee
    )
}

fn decode_ticket(parts: &[&str]) -> SyncResult<SettlementTicket> {
    if parts.len() < 6 {
        return Err(SyncError::Validation(format!(
            "payment payload needs 6 tokens, got {}",
            parts.len()
        )));
    }
    Ok(SettlementTicket {
        account_id: parse_account_id(parts[1])?,
        external_id: parts[2].to_string(),
        amount: parse_number(parts[3], "amount")?,
        rate: parse_number(parts[4], "rate")?,
        fee: parse_number(parts[5], "fee")?,
    })
}

fn decode_order_ref(parts: &[&str]) -> SyncResult<(AccountId, String)> {
    if parts.len() < 3 {
        return Err(SyncError::Validation(format!(
            "order payload needs 3 tokens, got {}",
            parts.len()
        )));
    }
    Ok((parse_account_id(parts[1])?, parts[2].to_string()))
}

fn parse_account_id(token: &str) -> SyncResult<AccountId> {
    token
        .parse::<AccountId>()
        .map_err(|_| SyncError::Validation(format!("bad account id token: '{}'", token)))
}

fn parse_number(token: &str, field: &str) -> SyncResult<f64> {
    token
        .parse::<f64>()
        .map_err(|_| SyncError::Validation(format!("bad {} token: '{}'", field, token)))
}
