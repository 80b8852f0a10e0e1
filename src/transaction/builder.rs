use crate::common::{error::MiddlemanError, types::PartyId};

use super::TradeKind;

/// A validated request to open a new Transaction. Produced by [`NewTransactionBuilder`].
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub initiator: PartyId,
    pub recipient: PartyId,
    pub kind: TradeKind,
    pub details: Option<String>,
    pub(crate) _private: (),
}

pub struct NewTransactionBuilder {
    initiator: Option<PartyId>,
    recipient: Option<PartyId>,
    kind: Option<TradeKind>,
    details: Option<String>,
}

impl NewTransactionBuilder {
    pub fn new() -> Self {
        Self {
            initiator: None,
            recipient: None,
            kind: None,
            details: None,
        }
    }

    pub fn initiator(&mut self, initiator: impl Into<PartyId>) -> &mut Self {
        self.initiator = Some(initiator.into());
        self
    }

    pub fn recipient(&mut self, recipient: impl Into<PartyId>) -> &mut Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn crypto(&mut self, amount: impl Into<String>, currency: impl Into<String>) -> &mut Self {
        self.kind = Some(TradeKind::Crypto {
            amount: amount.into(),
            currency: currency.into(),
        });
        self
    }

    pub fn in_game_items(
        &mut self,
        game: impl Into<String>,
        items: impl Into<String>,
    ) -> &mut Self {
        self.kind = Some(TradeKind::InGameItems {
            game: game.into(),
            items: items.into(),
        });
        self
    }

    pub fn details(&mut self, details: impl Into<String>) -> &mut Self {
        self.details = Some(details.into());
        self
    }

    pub fn build(&self) -> Result<NewTransaction, MiddlemanError> {
        let Some(initiator) = self.initiator.as_ref() else {
            return Err(MiddlemanError::Validation("No Initiator defined".to_string()));
        };

        let Some(recipient) = self.recipient.as_ref() else {
            return Err(MiddlemanError::Validation("No Recipient defined".to_string()));
        };

        let Some(kind) = self.kind.as_ref() else {
            return Err(MiddlemanError::Validation(
                "No Trade Kind defined. Either crypto or in-game items is required".to_string(),
            ));
        };

        let kind = normalize_kind(kind)?;

        let details = self
            .details
            .as_ref()
            .map(|details| details.trim().to_string())
            .filter(|details| !details.is_empty());

        Ok(NewTransaction {
            initiator: initiator.to_owned(),
            recipient: recipient.to_owned(),
            kind,
            details,
            _private: (),
        })
    }
}

impl Default for NewTransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_kind(kind: &TradeKind) -> Result<TradeKind, MiddlemanError> {
    match kind {
        TradeKind::Crypto { amount, currency } => {
            // Presence only. The amount text is kept exactly as entered.
            if amount.trim().is_empty() {
                return Err(MiddlemanError::Validation(
                    "Crypto trade requires an amount".to_string(),
                ));
            }
            let currency = currency.trim();
            if currency.is_empty() {
                return Err(MiddlemanError::Validation(
                    "Crypto trade requires a currency".to_string(),
                ));
            }
            Ok(TradeKind::Crypto {
                amount: amount.to_owned(),
                currency: currency.to_uppercase(),
            })
        }
        TradeKind::InGameItems { game, items } => {
            if game.trim().is_empty() {
                return Err(MiddlemanError::Validation(
                    "In-game items trade requires a game name".to_string(),
                ));
            }
            if items.trim().is_empty() {
                return Err(MiddlemanError::Validation(
                    "In-game items trade requires an items description".to_string(),
                ));
            }
            Ok(kind.to_owned())
        }
    }
}
