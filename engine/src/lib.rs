//! Game engines for parlor.
//!
//! Each game is a synchronous state machine over logical one-second ticks:
//! the gateway owns the wall clock and calls [`tick`](lucky7::Lucky7Round::tick)
//! once per second, while tests step rounds deterministically with a seeded
//! RNG and no runtime. Engines mutate their round state, wager maps, and
//! house stats only behind the caller's lock (single writer); every chip
//! movement goes through the [`ledger::Ledger`] seam as one atomic
//! operation; settlement always completes before any reveal event is handed
//! back for broadcast.

pub mod andar_bahar;
pub mod clock;
pub mod coin_toss;
pub mod error;
pub mod house;
pub mod ledger;
pub mod lucky7;
pub mod outcome;
pub mod overrides;
pub mod settlement;


pub use andar_bahar::{DuelConfig, DuelMatchmaker};
pub use clock::{RoundPhase, RoundTiming};
pub use coin_toss::CoinTossRound;
pub use error::Error;
pub use house::HouseStats;
pub use ledger::{BetId, GameId, Ledger, LedgerError, MemoryLedger};
pub use lucky7::Lucky7Round;
pub use outcome::OutcomeRng;
pub use settlement::{settle_round, PlacedWager, RoundSettlement};
