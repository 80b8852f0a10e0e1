use crate::{
    common::types::{NotifyTarget, PartyId},
    protocol::TradeEvent,
    transaction::{TradeKind, Transaction},
};

pub const UNKNOWN_PARTY_NAME: &str = "Unknown User";

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Notification {
    pub target: NotifyTarget,
    pub content: String,
}

impl Notification {
    fn shared(content: String) -> Self {
        Self {
            target: NotifyTarget::SharedChannel,
            content,
        }
    }

    fn party(party: &PartyId, content: String) -> Self {
        Self {
            target: NotifyTarget::Party(party.to_owned()),
            content,
        }
    }
}

/// Display names of both parties, resolved before routing.
#[derive(Clone, Debug)]
pub struct PartyNames {
    pub initiator: String,
    pub recipient: String,
}

impl PartyNames {
    fn name_of<'a>(&'a self, transaction: &Transaction, party: &str) -> &'a str {
        if transaction.initiator == party {
            &self.initiator
        } else if transaction.recipient == party {
            &self.recipient
        } else {
            UNKNOWN_PARTY_NAME
        }
    }
}

/// Maps a protocol event on a transaction to the notifications it warrants. Holds no state
/// and sends nothing.
pub(crate) struct NotificationRouter;

impl NotificationRouter {
    pub(crate) fn route(
        event: TradeEvent,
        transaction: &Transaction,
        names: &PartyNames,
    ) -> Vec<Notification> {
        match event {
            TradeEvent::Created => Self::created(transaction, names),
            TradeEvent::BothConfirmed => Self::both_confirmed(transaction),
            TradeEvent::Cancelled => Self::cancelled(transaction, names),
            TradeEvent::Completed => Self::completed(transaction, names),
        }
    }

    fn created(transaction: &Transaction, names: &PartyNames) -> Vec<Notification> {
        let proposal = match &transaction.kind {
            TradeKind::Crypto { amount, currency } => format!(
                "{} wants to trade {} {} with {}",
                names.initiator, amount, currency, names.recipient
            ),
            TradeKind::InGameItems { game, items } => format!(
                "{} wants to trade items in {} with {}\nItems: {}",
                names.initiator, game, names.recipient, items
            ),
        };

        let announcement = format!(
            "Transaction #{}\n{}\nAdditional Details: {}\nStatus: Waiting for confirmation from both parties",
            transaction.id, proposal, transaction.details
        );

        let request = format!(
            "New Transaction Request #{}\n{} wants to make a trade with you ({}). \
             Please check the channel where the transaction was created to confirm or cancel.",
            transaction.id,
            names.initiator,
            transaction.kind.summary()
        );

        vec![
            Notification::shared(announcement),
            Notification::party(&transaction.recipient, request),
        ]
    }

    fn both_confirmed(transaction: &Transaction) -> Vec<Notification> {
        vec![Notification::shared(format!(
            "Transaction #{} Update\nBoth parties have confirmed! Transaction is now in escrow.",
            transaction.id
        ))]
    }

    fn cancelled(transaction: &Transaction, names: &PartyNames) -> Vec<Notification> {
        let Some(cancelled_by) = transaction.cancelled_by.as_ref() else {
            return vec![];
        };
        let canceller = names.name_of(transaction, cancelled_by);
        let reason = transaction
            .cancel_reason
            .as_deref()
            .unwrap_or("No reason provided");

        let mut notifications = vec![Notification::shared(format!(
            "{} has cancelled transaction #{}.\nReason: {}",
            canceller, transaction.id, reason
        ))];

        if let Some(counterparty) = transaction.counterparty_of(cancelled_by) {
            notifications.push(Notification::party(
                counterparty,
                format!(
                    "Transaction #{} was cancelled by {}.\nReason: {}",
                    transaction.id, canceller, reason
                ),
            ));
        }
        notifications
    }

    fn completed(transaction: &Transaction, names: &PartyNames) -> Vec<Notification> {
        vec![
            Notification::shared(format!(
                "Transaction #{} Update\nTransaction has been completed.",
                transaction.id
            )),
            Notification::party(
                &transaction.initiator,
                format!(
                    "Transaction #{} with {} has been completed.",
                    transaction.id, names.recipient
                ),
            ),
            Notification::party(
                &transaction.recipient,
                format!(
                    "Transaction #{} with {} has been completed.",
                    transaction.id, names.initiator
                ),
            ),
        ]
    }
}
