//! Common types used throughout parlor.
//!
//! This crate holds the vocabulary shared by the game engines and the
//! gateway: playing cards, chip amounts, wager kinds, and the JSON wire
//! surface. Nothing here owns state or talks to the network; every type is
//! plain data with its serialization rules attached.

pub mod api;
pub mod bets;
pub mod cards;
pub mod chips;

pub use bets::{BetSelection, CoinSide, DuelRole, Lucky7Bet, ParseBetError, PileSide, LUCKY_RANK};
pub use cards::{fresh_deck, Card, Color, Suit, DECK_SIZE};
pub use chips::{Chips, STARTING_CHIPS};

/// Stable external identity for a player. Authentication happens upstream;
/// by the time an id reaches this workspace it is trusted.
pub type PlayerId = String;
