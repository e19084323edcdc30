//! Playing-card primitives.
//!
//! Cards map to deck indices `0..=51` with `index = suit * 13 + (rank - 1)`.
//! Suits are ordered spades, hearts, diamonds, clubs; ranks are one-based
//! (ace = 1 through king = 13). On the wire a card serializes as an object
//! with `rank`, `suit`, plus the derived `color` and `label` so clients never
//! re-implement suit/color math.

use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use serde::{
    de::{self, Deserializer},
    ser::{SerializeStruct, Serializer},
    Deserialize, Serialize,
};
use std::fmt;

/// Number of distinct cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Ranks per suit (ace = 1 through king = 13).
pub const RANKS_PER_SUIT: u8 = 13;

/// Card color derived from the suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

/// One of the four suits, in deck-index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

    pub fn color(&self) -> Color {
        match self {
            Suit::Spades | Suit::Clubs => Color::Black,
            Suit::Hearts | Suit::Diamonds => Color::Red,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        }
    }

    fn index(&self) -> u8 {
        match self {
            Suit::Spades => 0,
            Suit::Hearts => 1,
            Suit::Diamonds => 2,
            Suit::Clubs => 3,
        }
    }

    fn from_index(index: u8) -> Option<Suit> {
        Suit::ALL.get(index as usize).copied()
    }
}

/// A single playing card. The rank is always within `1..=13`; construction
/// validates it, so holding a `Card` means holding a real card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Card {
    rank: u8,
    suit: Suit,
}

impl Card {
    /// Builds a card from a one-based rank and suit. Returns `None` when the
    /// rank falls outside `1..=13`.
    pub fn new(rank: u8, suit: Suit) -> Option<Card> {
        if rank == 0 || rank > RANKS_PER_SUIT {
            return None;
        }
        Some(Card { rank, suit })
    }

    /// Builds a card from its deck index (`0..=51`).
    pub fn from_index(index: u8) -> Option<Card> {
        if index as usize >= DECK_SIZE {
            return None;
        }
        let suit = Suit::from_index(index / RANKS_PER_SUIT)?;
        Some(Card {
            rank: index % RANKS_PER_SUIT + 1,
            suit,
        })
    }

    /// Deck index of this card (`0..=51`).
    pub fn index(&self) -> u8 {
        self.suit.index() * RANKS_PER_SUIT + (self.rank - 1)
    }

    /// One-based rank (ace = 1, king = 13).
    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn color(&self) -> Color {
        self.suit.color()
    }

    /// Short rank label as shown to players (`A`, `2`..`10`, `J`, `Q`, `K`).
    pub fn rank_label(&self) -> &'static str {
        const LABELS: [&str; 13] = [
            "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
        ];
        LABELS[(self.rank - 1) as usize]
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_label(), self.suit.symbol())
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Card", 4)?;
        state.serialize_field("rank", &self.rank)?;
        state.serialize_field("suit", &self.suit)?;
        state.serialize_field("color", &self.color())?;
        state.serialize_field("label", self.rank_label())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Card, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            rank: u8,
            suit: Suit,
        }
        let raw = Raw::deserialize(deserializer)?;
        Card::new(raw.rank, raw.suit)
            .ok_or_else(|| de::Error::custom(format!("card rank out of range: {}", raw.rank)))
    }
}

impl Distribution<Card> for Standard {
    /// Uniform draw over the 52-card deck.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        Card {
            rank: rng.gen_range(1..=RANKS_PER_SUIT),
            suit: Suit::ALL[rng.gen_range(0..Suit::ALL.len())],
        }
    }
}

/// The 52 distinct cards in deck-index order.
pub fn fresh_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in 1..=RANKS_PER_SUIT {
            deck.push(Card { rank, suit });
        }
    }
    deck
}
