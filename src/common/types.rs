use serde::{Deserialize, Serialize};
use strum_macros::{Display, IntoStaticStr};

/// Opaque party identifier as handed to us by the front end. Only ever compared for equality.
pub type PartyId = String;

/// Short hex identifier of a Transaction.
pub type TransactionId = String;

/// Where a Notification should be delivered.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Serialize, Deserialize)]
pub enum NotifyTarget {
    Party(PartyId),
    SharedChannel,
}

impl std::fmt::Display for NotifyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyTarget::Party(party) => write!(f, "party {}", party),
            NotifyTarget::SharedChannel => write!(f, "shared channel"),
        }
    }
}

/// A party's role within a Transaction, as presented to users.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Display, IntoStaticStr, Serialize, Deserialize)]
pub enum PartyRole {
    Seller,
    Buyer,
}
