//! Wager vocabulary: bet kinds, win predicates, payout multipliers.
//!
//! Every bet kind is a closed enum; unknown wire strings fail parsing
//! instead of mapping to a default. Win predicates and multipliers are
//! exhaustive matches so adding a variant forces both to be revisited.

use crate::cards::{Card, Color};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The rank that wins [`Lucky7Bet::Lucky7`] and defeats both color bets.
pub const LUCKY_RANK: u8 = 7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown bet type: {0}")]
pub struct ParseBetError(pub String);

/// Bet categories for the Lucky 7 table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lucky7Bet {
    Red,
    Black,
    High,
    Low,
    Lucky7,
}

impl Lucky7Bet {
    pub const ALL: [Lucky7Bet; 5] = [
        Lucky7Bet::Red,
        Lucky7Bet::Black,
        Lucky7Bet::High,
        Lucky7Bet::Low,
        Lucky7Bet::Lucky7,
    ];

    /// Whether this category wins against the revealed card.
    ///
    /// A rank-7 card wins only `Lucky7`: the color bets require the color
    /// to match AND the rank to differ from 7, and 7 sits in neither the
    /// high (8..=13) nor the low (1..=6) band.
    pub fn wins_on(&self, card: &Card) -> bool {
        match self {
            Lucky7Bet::Red => card.color() == Color::Red && card.rank() != LUCKY_RANK,
            Lucky7Bet::Black => card.color() == Color::Black && card.rank() != LUCKY_RANK,
            Lucky7Bet::High => card.rank() > LUCKY_RANK,
            Lucky7Bet::Low => card.rank() < LUCKY_RANK,
            Lucky7Bet::Lucky7 => card.rank() == LUCKY_RANK,
        }
    }

    /// Total returned per winning chip (the stake was debited at placement).
    pub fn multiplier(&self) -> u64 {
        match self {
            Lucky7Bet::Red => 2,
            Lucky7Bet::Black => 2,
            Lucky7Bet::High => 2,
            Lucky7Bet::Low => 2,
            Lucky7Bet::Lucky7 => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lucky7Bet::Red => "red",
            Lucky7Bet::Black => "black",
            Lucky7Bet::High => "high",
            Lucky7Bet::Low => "low",
            Lucky7Bet::Lucky7 => "lucky7",
        }
    }
}

impl fmt::Display for Lucky7Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lucky7Bet {
    type Err = ParseBetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Lucky7Bet::Red),
            "black" => Ok(Lucky7Bet::Black),
            "high" => Ok(Lucky7Bet::High),
            "low" => Ok(Lucky7Bet::Low),
            "lucky7" => Ok(Lucky7Bet::Lucky7),
            other => Err(ParseBetError(other.to_string())),
        }
    }
}

/// The two faces of the coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn other(&self) -> CoinSide {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }

    /// Total returned per winning chip.
    pub fn multiplier(&self) -> u64 {
        match self {
            CoinSide::Heads => 2,
            CoinSide::Tails => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoinSide::Heads => "heads",
            CoinSide::Tails => "tails",
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoinSide {
    type Err = ParseBetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heads" => Ok(CoinSide::Heads),
            "tails" => Ok(CoinSide::Tails),
            other => Err(ParseBetError(other.to_string())),
        }
    }
}

/// The two piles in an Andar Bahar duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PileSide {
    Andar,
    Bahar,
}

impl PileSide {
    pub fn other(&self) -> PileSide {
        match self {
            PileSide::Andar => PileSide::Bahar,
            PileSide::Bahar => PileSide::Andar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PileSide::Andar => "andar",
            PileSide::Bahar => "bahar",
        }
    }
}

impl fmt::Display for PileSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PileSide {
    type Err = ParseBetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "andar" => Ok(PileSide::Andar),
            "bahar" => Ok(PileSide::Bahar),
            other => Err(ParseBetError(other.to_string())),
        }
    }
}

/// Role assigned to each duel participant by coin flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelRole {
    Dealer,
    Guesser,
}

impl DuelRole {
    pub fn other(&self) -> DuelRole {
        match self {
            DuelRole::Dealer => DuelRole::Guesser,
            DuelRole::Guesser => DuelRole::Dealer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DuelRole::Dealer => "dealer",
            DuelRole::Guesser => "guesser",
        }
    }
}

impl fmt::Display for DuelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bet selection as it arrives from the wire: either a Lucky 7 category
/// or a coin side. The string sets are disjoint, so the untagged decode is
/// unambiguous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BetSelection {
    Table(Lucky7Bet),
    Coin(CoinSide),
}

impl BetSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetSelection::Table(bet) => bet.as_str(),
            BetSelection::Coin(side) => side.as_str(),
        }
    }

    /// Total returned per winning chip for this selection.
    pub fn multiplier(&self) -> u64 {
        match self {
            BetSelection::Table(bet) => bet.multiplier(),
            BetSelection::Coin(side) => side.multiplier(),
        }
    }
}

impl fmt::Display for BetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
