use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

use crate::{
    common::error::MiddlemanError,
    transaction::{Transaction, TransactionStatus},
};

/// An action a party (or an administrator) takes against an existing Transaction.
#[derive(PartialEq, Eq, Clone, Debug, Display, IntoStaticStr)]
pub enum TradeAction {
    #[strum(serialize = "confirm")]
    Confirm,
    #[strum(serialize = "cancel")]
    Cancel { reason: Option<String> },
    /// Escrow to Completed. Only an administrator may complete a trade.
    #[strum(serialize = "complete")]
    Complete { is_admin: bool },
}

/// Protocol derived facts, emitted exactly once at the moment they become true.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize, Display, IntoStaticStr)]
pub enum TradeEvent {
    Created,
    BothConfirmed,
    Cancelled,
    Completed,
}

#[derive(Clone, Debug)]
pub struct Transition {
    /// The record as it should be persisted. Equal to the input if nothing was applied.
    pub transaction: Transaction,
    pub event: Option<TradeEvent>,
    /// False for accepted no-ops, such as a repeated confirm.
    pub applied: bool,
}

impl Transition {
    fn unchanged(transaction: &Transaction) -> Self {
        Self {
            transaction: transaction.to_owned(),
            event: None,
            applied: false,
        }
    }

    fn applied(transaction: Transaction, event: Option<TradeEvent>) -> Self {
        Self {
            transaction,
            event,
            applied: true,
        }
    }
}

/// Computes the next state of `transaction` when `actor` takes `action` at `now`.
///
/// Pure: nothing is persisted or sent from here. Rules are checked in order of
/// authorization, terminal state, then transition validity. Any error means the
/// transaction must be left exactly as it was.
pub fn apply(
    transaction: &Transaction,
    actor: &str,
    action: &TradeAction,
    now: SystemTime,
) -> Result<Transition, MiddlemanError> {
    authorize(transaction, actor, action)?;

    if transaction.is_terminal() {
        return Err(MiddlemanError::TerminalState {
            id: transaction.id.clone(),
            status: transaction.status,
        });
    }

    match action {
        TradeAction::Confirm => Ok(confirm(transaction, actor, now)),
        TradeAction::Cancel { reason } => Ok(cancel(transaction, actor, reason.as_deref(), now)),
        TradeAction::Complete { .. } => complete(transaction, action, now),
    }
}

fn authorize(
    transaction: &Transaction,
    actor: &str,
    action: &TradeAction,
) -> Result<(), MiddlemanError> {
    match action {
        TradeAction::Confirm | TradeAction::Cancel { .. } => {
            if !transaction.is_participant(actor) {
                return Err(MiddlemanError::NotAParticipant {
                    id: transaction.id.clone(),
                    party: actor.to_string(),
                });
            }
        }
        TradeAction::Complete { is_admin } => {
            if !is_admin {
                return Err(MiddlemanError::Unauthorized {
                    id: transaction.id.clone(),
                    party: actor.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn confirm(transaction: &Transaction, actor: &str, now: SystemTime) -> Transition {
    let mut next = transaction.to_owned();
    let mut newly_confirmed = false;

    if next.initiator == actor && !next.initiator_confirmed {
        next.initiator_confirmed = true;
        newly_confirmed = true;
    }
    if next.recipient == actor && !next.recipient_confirmed {
        next.recipient_confirmed = true;
        newly_confirmed = true;
    }

    if !newly_confirmed {
        return Transition::unchanged(transaction);
    }

    // Only the confirm that flips the second flag moves the trade into escrow
    let mut event = None;
    if next.status == TransactionStatus::Pending && next.both_confirmed() {
        next.status = TransactionStatus::Escrow;
        next.escrow_at = Some(now);
        event = Some(TradeEvent::BothConfirmed);
    }

    Transition::applied(next, event)
}

fn cancel(
    transaction: &Transaction,
    actor: &str,
    reason: Option<&str>,
    now: SystemTime,
) -> Transition {
    let mut next = transaction.to_owned();
    next.status = TransactionStatus::Cancelled;
    next.cancelled_by = Some(actor.to_string());
    next.cancelled_at = Some(now);
    next.cancel_reason = reason
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string);

    Transition::applied(next, Some(TradeEvent::Cancelled))
}

fn complete(
    transaction: &Transaction,
    action: &TradeAction,
    now: SystemTime,
) -> Result<Transition, MiddlemanError> {
    if transaction.status != TransactionStatus::Escrow {
        return Err(MiddlemanError::InvalidTransition {
            id: transaction.id.clone(),
            status: transaction.status,
            action: action.into(),
        });
    }

    let mut next = transaction.to_owned();
    next.status = TransactionStatus::Completed;
    next.completed_at = Some(now);

    Ok(Transition::applied(next, Some(TradeEvent::Completed)))
}
