use std::{str::FromStr, time::SystemTime};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::common::{
    error::MiddlemanError,
    types::{PartyId, PartyRole, TransactionId},
};

pub const NO_DETAILS_PLACEHOLDER: &str = "No additional details provided";

#[derive(
    PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize, EnumString, Display,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Escrow,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            TransactionStatus::Pending | TransactionStatus::Escrow => false,
            TransactionStatus::Completed | TransactionStatus::Cancelled => true,
        }
    }
}

#[derive(
    PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize, EnumString, Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    /// Pending or Escrow
    #[default]
    Active,
    Completed,
    Cancelled,
    All,
}

impl StatusFilter {
    /// Parses user supplied filter text such as `active` or ` ALL `.
    pub fn parse(filter: &str) -> Result<StatusFilter, MiddlemanError> {
        let filter = StatusFilter::from_str(filter.trim())?;
        Ok(filter)
    }

    pub fn matches(&self, status: TransactionStatus) -> bool {
        match self {
            StatusFilter::Active => !status.is_terminal(),
            StatusFilter::Completed => status == TransactionStatus::Completed,
            StatusFilter::Cancelled => status == TransactionStatus::Cancelled,
            StatusFilter::All => true,
        }
    }
}

/// What is being traded. Each kind carries only its own fields.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "type")]
pub enum TradeKind {
    /// `amount` is kept verbatim as entered. It is never parsed.
    #[serde(rename = "crypto")]
    #[strum(serialize = "crypto")]
    Crypto { amount: String, currency: String },

    #[serde(rename = "ingame")]
    #[strum(serialize = "ingame")]
    InGameItems { game: String, items: String },
}

impl TradeKind {
    /// Short one-line description, e.g. `0.5 BTC` or `Minecraft items`.
    pub fn summary(&self) -> String {
        match self {
            TradeKind::Crypto { amount, currency } => format!("{} {}", amount, currency),
            TradeKind::InGameItems { game, .. } => format!("{} items", game),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub initiator: PartyId,
    pub recipient: PartyId,
    #[serde(flatten)]
    pub kind: TradeKind,
    pub details: String,
    pub status: TransactionStatus,
    pub initiator_confirmed: bool,
    pub recipient_confirmed: bool,
    pub created_at: SystemTime,
    pub escrow_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub cancelled_at: Option<SystemTime>,
    pub cancelled_by: Option<PartyId>,
    pub cancel_reason: Option<String>,
}

impl Transaction {
    pub fn is_participant(&self, party: &str) -> bool {
        self.initiator == party || self.recipient == party
    }

    pub fn role_of(&self, party: &str) -> Option<PartyRole> {
        if self.initiator == party {
            Some(PartyRole::Seller)
        } else if self.recipient == party {
            Some(PartyRole::Buyer)
        } else {
            None
        }
    }

    pub fn counterparty_of(&self, party: &str) -> Option<&PartyId> {
        match self.role_of(party)? {
            PartyRole::Seller => Some(&self.recipient),
            PartyRole::Buyer => Some(&self.initiator),
        }
    }

    pub fn both_confirmed(&self) -> bool {
        self.initiator_confirmed && self.recipient_confirmed
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SomeTestParams;

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse("active").unwrap(), StatusFilter::Active);
        assert_eq!(StatusFilter::parse(" ALL ").unwrap(), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse("Cancelled").unwrap(),
            StatusFilter::Cancelled
        );

        let error = StatusFilter::parse("escrow").unwrap_err();
        assert!(matches!(error, MiddlemanError::StrumParsing(_)));
        assert!(error.to_string().starts_with("Middleman-Error | StrumParseError"));
        assert_eq!(StatusFilter::default(), StatusFilter::Active);
    }

    #[test]
    fn test_status_filter_matches() {
        assert!(StatusFilter::Active.matches(TransactionStatus::Pending));
        assert!(StatusFilter::Active.matches(TransactionStatus::Escrow));
        assert!(!StatusFilter::Active.matches(TransactionStatus::Completed));
        assert!(!StatusFilter::Completed.matches(TransactionStatus::Cancelled));
        assert!(StatusFilter::All.matches(TransactionStatus::Cancelled));
    }

    #[test]
    fn test_roles_and_counterparty() {
        let transaction = SomeTestParams::crypto_transaction();
        let alice = SomeTestParams::initiator_id();
        let bob = SomeTestParams::recipient_id();
        let carol = SomeTestParams::outsider_id();

        assert_eq!(transaction.role_of(&alice), Some(PartyRole::Seller));
        assert_eq!(transaction.role_of(&bob), Some(PartyRole::Buyer));
        assert_eq!(transaction.role_of(&carol), None);
        assert_eq!(transaction.counterparty_of(&alice), Some(&bob));
        assert_eq!(transaction.counterparty_of(&carol), None);
        assert!(!transaction.is_participant(&carol));
    }

    #[test]
    fn test_serialized_layout() {
        let transaction = SomeTestParams::crypto_transaction();
        let json = serde_json::to_value(&transaction).unwrap();
        assert_eq!(json["type"], "crypto");
        assert_eq!(json["amount"], "0.5");
        assert_eq!(json["currency"], "BTC");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["initiatorConfirmed"], false);

        let restored: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(restored, transaction);
    }

    #[test]
    fn test_kind_summary() {
        let kind = TradeKind::InGameItems {
            game: "Minecraft".to_string(),
            items: "64 diamonds".to_string(),
        };
        assert_eq!(kind.summary(), "Minecraft items");
        let label: &'static str = (&kind).into();
        assert_eq!(label, "ingame");
    }
}
