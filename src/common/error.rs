use std::{error::Error, fmt};

use crate::{
    common::types::{NotifyTarget, PartyId, TransactionId},
    transaction::TransactionStatus,
};

#[derive(Debug)]
pub enum MiddlemanError {
    // Rejections surfaced to the caller. None of these mutate or persist anything.
    SelfTrade {
        party: PartyId,
    },
    InvalidCounterparty {
        party: PartyId,
    },
    Validation(String),
    NotFound(TransactionId),
    NotAParticipant {
        id: TransactionId,
        party: PartyId,
    },
    Unauthorized {
        id: TransactionId,
        party: PartyId,
    },
    TerminalState {
        id: TransactionId,
        status: TransactionStatus,
    },
    InvalidTransition {
        id: TransactionId,
        status: TransactionStatus,
        action: &'static str,
    },

    // Collaborator-only. Reported, never undoes a committed transition.
    DeliveryFailed {
        target: NotifyTarget,
        reason: String,
    },

    Simple(String),
    Io(std::io::Error),
    SerdesJson(serde_json::Error),
    StrumParsing(strum::ParseError),
    MpscSend(String),
    OneshotRecv(tokio::sync::oneshot::error::RecvError),
}

impl MiddlemanError {
    /// True for the errors that reject a caller's action because of a protocol rule,
    /// as opposed to infrastructure faults.
    pub fn is_domain_rejection(&self) -> bool {
        matches!(
            self,
            MiddlemanError::SelfTrade { .. }
                | MiddlemanError::InvalidCounterparty { .. }
                | MiddlemanError::Validation(_)
                | MiddlemanError::NotFound(_)
                | MiddlemanError::NotAParticipant { .. }
                | MiddlemanError::Unauthorized { .. }
                | MiddlemanError::TerminalState { .. }
                | MiddlemanError::InvalidTransition { .. }
        )
    }

    /// True when a trade task stopped before taking or answering the request. The request
    /// was never applied and can be retried against a fresh task.
    pub(crate) fn is_trade_closed(&self) -> bool {
        matches!(
            self,
            MiddlemanError::MpscSend(_) | MiddlemanError::OneshotRecv(_)
        )
    }
}

impl Error for MiddlemanError {}

impl fmt::Display for MiddlemanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let error_string = match self {
            MiddlemanError::SelfTrade { party } => format!(
                "Middleman-Error | SelfTrade - Party {} cannot create a transaction with themselves",
                party
            ),
            MiddlemanError::InvalidCounterparty { party } => format!(
                "Middleman-Error | InvalidCounterparty - Party {} is an automated account and cannot trade",
                party
            ),
            MiddlemanError::Validation(msg) => {
                format!("Middleman-Error | Validation - {}", msg)
            }
            MiddlemanError::NotFound(id) => {
                format!("Middleman-Error | NotFound - Transaction #{} was not found", id)
            }
            MiddlemanError::NotAParticipant { id, party } => format!(
                "Middleman-Error | NotAParticipant - Party {} is not a participant in transaction #{}",
                party, id
            ),
            MiddlemanError::Unauthorized { id, party } => format!(
                "Middleman-Error | Unauthorized - Party {} does not have permission for transaction #{}",
                party, id
            ),
            MiddlemanError::TerminalState { id, status } => format!(
                "Middleman-Error | TerminalState - Transaction #{} is already finalized as {}",
                id, status
            ),
            MiddlemanError::InvalidTransition { id, status, action } => format!(
                "Middleman-Error | InvalidTransition - Transaction #{} cannot {} while {}",
                id, action, status
            ),
            MiddlemanError::DeliveryFailed { target, reason } => format!(
                "Middleman-Error | DeliveryFailed - Could not deliver to {} - {}",
                target, reason
            ),
            MiddlemanError::Simple(msg) => format!("Middleman-Error | Other - {}", msg),
            MiddlemanError::Io(err) => format!("Middleman-Error | IoError - {}", err),
            MiddlemanError::SerdesJson(err) => {
                format!("Middleman-Error | SerdesJsonError - {}", err)
            }
            MiddlemanError::StrumParsing(err) => {
                format!("Middleman-Error | StrumParseError - {}", err)
            }
            MiddlemanError::MpscSend(msg) => {
                format!("Middleman-Error | MpscSendError - {}", msg)
            }
            MiddlemanError::OneshotRecv(err) => {
                format!("Middleman-Error | OneshotRecvError - {}", err)
            }
        };
        write!(f, "{}", error_string)
    }
}

impl From<std::io::Error> for MiddlemanError {
    fn from(e: std::io::Error) -> MiddlemanError {
        MiddlemanError::Io(e)
    }
}

impl From<serde_json::Error> for MiddlemanError {
    fn from(e: serde_json::Error) -> MiddlemanError {
        MiddlemanError::SerdesJson(e)
    }
}

impl From<strum::ParseError> for MiddlemanError {
    fn from(e: strum::ParseError) -> MiddlemanError {
        MiddlemanError::StrumParsing(e)
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MiddlemanError {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> MiddlemanError {
        MiddlemanError::MpscSend(e.to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for MiddlemanError {
    fn from(e: tokio::sync::oneshot::error::RecvError) -> MiddlemanError {
        MiddlemanError::OneshotRecv(e)
    }
}
