use thiserror::Error;

use super::types::LifeStatus;

/// Hard failures. Everything else an operation can refuse is a [`Rejection`].
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("record {id} is {status:?}; no further ticks or decisions are accepted")]
    Terminal { id: String, status: LifeStatus },
    #[error("no record with id {0}")]
    UnknownRecord(String),
    #[error("invalid new player: {0}")]
    InvalidSetup(String),
}

/// Validation failures. These leave the record untouched and are reported
/// back to the caller as the outcome message.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("Insufficient funds: need ${required:.0}, have ${available:.0}")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("Not enough time this month: need {required:.0}h, {available:.0}h left")]
    InsufficientTime { required: f64, available: f64 },
    #[error("No event is waiting for a response")]
    NoPendingEvent,
    #[error("This event expects {expected}, not {given}")]
    ChoiceMismatch {
        expected: &'static str,
        given: &'static str,
    },
    #[error("No active venture")]
    NoVenture,
    #[error("A venture is already running")]
    VentureExists,
    #[error("The venture is not in management mode yet")]
    NotManaged,
    #[error("Unknown {kind} {id}")]
    UnknownTarget { kind: &'static str, id: u64 },
    #[error("Too soon: try again in {months} month(s)")]
    Cooldown { months: u32 },
    #[error("{0}")]
    Invalid(String),
}
