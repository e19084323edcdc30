//! Outcome generation.
//!
//! Every random decision in the system (card draws, coin flips, deck
//! shuffles, duel role assignment) flows through [`OutcomeRng`], a ChaCha20
//! CSPRNG. Production seeds it from OS entropy; tests seed it from a `u64`
//! so rounds replay deterministically.

use parlor_types::{fresh_deck, Card, CoinSide, DuelRole, Lucky7Bet};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

pub struct OutcomeRng {
    rng: ChaCha20Rng,
}

impl OutcomeRng {
    /// Production constructor, seeded from the operating system's CSPRNG.
    pub fn from_os_entropy() -> OutcomeRng {
        OutcomeRng {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Deterministic constructor for tests and replay.
    pub fn from_seed(seed: u64) -> OutcomeRng {
        OutcomeRng {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw over the 52-card deck.
    pub fn draw_card(&mut self) -> Card {
        self.rng.gen()
    }

    /// Uniform coin flip.
    pub fn flip_coin(&mut self) -> CoinSide {
        if self.rng.gen::<bool>() {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    /// Uniform role assignment for a duel pairing.
    pub fn assign_role(&mut self) -> DuelRole {
        if self.rng.gen::<bool>() {
            DuelRole::Dealer
        } else {
            DuelRole::Guesser
        }
    }

    /// Fisher-Yates shuffle of a fresh deck.
    pub fn shuffled_deck(&mut self) -> Vec<Card> {
        let mut deck = fresh_deck();
        deck.shuffle(&mut self.rng);
        deck
    }

    /// Uniform draw over the cards that would win `category`: the override
    /// channel forces a category, never a specific card.
    pub fn card_in_category(&mut self, category: Lucky7Bet) -> Card {
        let candidates: Vec<Card> = fresh_deck()
            .into_iter()
            .filter(|card| category.wins_on(card))
            .collect();
        // Every category matches at least four cards in a fresh deck.
        match candidates.choose(&mut self.rng) {
            Some(card) => *card,
            None => self.draw_card(),
        }
    }
}
