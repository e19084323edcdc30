//! Error taxonomy for engine operations.
//!
//! Every player-triggered operation fails into one of five classes, each
//! with a stable wire code. Intake failures reject only the offending
//! request; they never tear down a round or a connection.

use crate::ledger::LedgerError;
use parlor_types::Chips;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Malformed or out-of-range input: unknown bet kind, non-positive
    /// amount, an operation that makes no sense in the current state.
    #[error("{0}")]
    Validation(String),

    #[error("insufficient chips: needed {needed}, available {available}")]
    InsufficientFunds { needed: Chips, available: Chips },

    /// Structurally valid but arrived in the wrong phase (betting frozen,
    /// round not running, match already decided).
    #[error("{0}")]
    Timing(String),

    /// The referenced player, bet, game, or match does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("persistence failure: {0}")]
    Persistence(LedgerError),
}

impl Error {
    /// Stable error code carried in wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION",
            Error::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Error::Timing(_) => "TIMING",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Persistence(_) => "PERSISTENCE",
        }
    }
}

impl From<LedgerError> for Error {
    fn from(err: LedgerError) -> Error {
        match err {
            LedgerError::InsufficientChips { needed, available } => {
                Error::InsufficientFunds { needed, available }
            }
            LedgerError::UnknownPlayer(player) => Error::NotFound(format!("unknown player: {player}")),
            LedgerError::UnknownBet(id) => Error::NotFound(format!("unknown bet: {id}")),
            LedgerError::UnknownGame(id) => Error::NotFound(format!("unknown game: {id}")),
            other => Error::Persistence(other),
        }
    }
}
