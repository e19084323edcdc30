//! Chip ledger seam.
//!
//! All balance movement happens through the [`Ledger`] trait, one atomic
//! operation at a time: a wager debit and its bet row are created together,
//! and a bet resolves exactly once. The engines never touch balances
//! directly, so a real persistence backend can replace [`MemoryLedger`]
//! behind this trait without touching game code.

use parlor_types::{
    api::{GameKind, OutcomeView},
    BetSelection, Chips, PlayerId, STARTING_CHIPS,
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard},
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

pub type BetId = u64;
pub type GameId = u64;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),
    #[error("unknown bet: {0}")]
    UnknownBet(BetId),
    #[error("unknown game: {0}")]
    UnknownGame(GameId),
    #[error("insufficient chips: needed {needed}, available {available}")]
    InsufficientChips { needed: Chips, available: Chips },
    #[error("bet {0} already resolved")]
    AlreadyResolved(BetId),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Proof that a wager was debited and recorded.
#[derive(Debug, Clone, Copy)]
pub struct BetReceipt {
    pub bet_id: BetId,
    /// Balance after the debit.
    pub balance: Chips,
}

/// Proof that a bet was resolved.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub bet_id: BetId,
    /// Owner's balance after any payout.
    pub balance: Chips,
}

/// Persistent record of one game (a shared round or a duel).
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game_id: GameId,
    pub kind: GameKind,
    pub outcome: Option<OutcomeView>,
    pub completed: bool,
    pub created_at_ms: u64,
}

/// The persistence seam. Implementations must apply each call atomically
/// and serialize operations that touch the same player's balance.
pub trait Ledger: Send + Sync {
    /// Creates the account on first sight and grants the starting chips
    /// once; later calls just refresh the display name. Returns the
    /// current balance.
    fn register_player(&self, player: &str, name: Option<&str>) -> Result<Chips, LedgerError>;

    fn player_name(&self, player: &str) -> Result<String, LedgerError>;

    fn player_balance(&self, player: &str) -> Result<Chips, LedgerError>;

    /// Debits `amount` if the balance covers it and records the bet row,
    /// as one operation. Never partially applies.
    fn debit_and_create_bet(
        &self,
        player: &str,
        amount: Chips,
        kind: BetSelection,
        game_id: GameId,
    ) -> Result<BetReceipt, LedgerError>;

    /// Marks the bet resolved and credits `payout` when `won`. A second
    /// call for the same bet fails with [`LedgerError::AlreadyResolved`]
    /// and moves no chips.
    fn resolve_bet(&self, bet_id: BetId, won: bool, payout: Chips)
        -> Result<Resolution, LedgerError>;

    /// Unconditional credit. Returns the new balance.
    fn credit(&self, player: &str, amount: Chips) -> Result<Chips, LedgerError>;

    /// Debit that fails on insufficient balance. Returns the new balance.
    fn debit(&self, player: &str, amount: Chips) -> Result<Chips, LedgerError>;

    fn create_game(&self, kind: GameKind) -> Result<GameId, LedgerError>;

    fn update_game_outcome(&self, game_id: GameId, outcome: OutcomeView)
        -> Result<(), LedgerError>;

    fn mark_game_completed(&self, game_id: GameId) -> Result<(), LedgerError>;

    /// Newest-first history. Callers treat failures as an empty feed.
    fn recent_games(&self, kind: GameKind, limit: usize) -> Result<Vec<GameRecord>, LedgerError>;

    fn total_game_count(&self, kind: GameKind) -> Result<u64, LedgerError>;
}

/// Audit view of one bet row.
#[derive(Debug, Clone)]
pub struct BetRecord {
    pub player: PlayerId,
    pub amount: Chips,
    pub kind: BetSelection,
    pub game_id: GameId,
    /// `(won, payout)` once resolved.
    pub resolved: Option<(bool, Chips)>,
}

/// Operations of [`MemoryLedger`] that tests can make fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    Balance,
    DebitAndCreateBet,
    ResolveBet,
    Credit,
    Debit,
    CreateGame,
    UpdateGameOutcome,
    MarkGameCompleted,
    RecentGames,
    TotalGameCount,
}

#[derive(Debug)]
struct Account {
    name: String,
    balance: Chips,
}

#[derive(Debug)]
struct BetRow {
    player: PlayerId,
    amount: Chips,
    kind: BetSelection,
    game_id: GameId,
    /// `(won, payout)` once resolved.
    resolved: Option<(bool, Chips)>,
}

#[derive(Default)]
struct Inner {
    players: HashMap<PlayerId, Account>,
    bets: HashMap<BetId, BetRow>,
    games: BTreeMap<GameId, GameRecord>,
    next_bet_id: BetId,
    next_game_id: GameId,
    fail_once: HashSet<LedgerOp>,
}

/// In-process ledger. One mutex serializes every operation, which is
/// stronger than the per-player serialization the trait requires.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `op` fail with [`LedgerError::Unavailable`].
    /// Exists so tests can exercise the degraded paths.
    pub fn fail_next(&self, op: LedgerOp) {
        self.locked().fail_once.insert(op);
    }

    /// Audit read used by operator tooling and tests.
    pub fn bet_record(&self, bet_id: BetId) -> Option<BetRecord> {
        let inner = self.locked();
        inner.bets.get(&bet_id).map(|row| BetRecord {
            player: row.player.clone(),
            amount: row.amount,
            kind: row.kind,
            game_id: row.game_id,
            resolved: row.resolved,
        })
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Inner {
    fn take_fault(&mut self, op: LedgerOp) -> Result<(), LedgerError> {
        if self.fail_once.remove(&op) {
            return Err(LedgerError::Unavailable(format!("injected failure: {op:?}")));
        }
        Ok(())
    }

    fn account_mut(&mut self, player: &str) -> Result<&mut Account, LedgerError> {
        self.players
            .get_mut(player)
            .ok_or_else(|| LedgerError::UnknownPlayer(player.to_string()))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

impl Ledger for MemoryLedger {
    fn register_player(&self, player: &str, name: Option<&str>) -> Result<Chips, LedgerError> {
        let mut inner = self.locked();
        if let Some(account) = inner.players.get_mut(player) {
            if let Some(name) = name {
                if !name.is_empty() {
                    account.name = name.to_string();
                }
            }
            return Ok(account.balance);
        }
        let display = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => player.to_string(),
        };
        inner.players.insert(
            player.to_string(),
            Account {
                name: display,
                balance: STARTING_CHIPS,
            },
        );
        Ok(STARTING_CHIPS)
    }

    fn player_name(&self, player: &str) -> Result<String, LedgerError> {
        let inner = self.locked();
        inner
            .players
            .get(player)
            .map(|account| account.name.clone())
            .ok_or_else(|| LedgerError::UnknownPlayer(player.to_string()))
    }

    fn player_balance(&self, player: &str) -> Result<Chips, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::Balance)?;
        inner
            .players
            .get(player)
            .map(|account| account.balance)
            .ok_or_else(|| LedgerError::UnknownPlayer(player.to_string()))
    }

    fn debit_and_create_bet(
        &self,
        player: &str,
        amount: Chips,
        kind: BetSelection,
        game_id: GameId,
    ) -> Result<BetReceipt, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::DebitAndCreateBet)?;
        let account = inner.account_mut(player)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientChips {
                needed: amount,
                available: account.balance,
            });
        }
        account.balance = account.balance.saturating_sub(amount);
        let balance = account.balance;

        let bet_id = inner.next_bet_id;
        inner.next_bet_id = inner.next_bet_id.saturating_add(1);
        inner.bets.insert(
            bet_id,
            BetRow {
                player: player.to_string(),
                amount,
                kind,
                game_id,
                resolved: None,
            },
        );
        Ok(BetReceipt { bet_id, balance })
    }

    fn resolve_bet(
        &self,
        bet_id: BetId,
        won: bool,
        payout: Chips,
    ) -> Result<Resolution, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::ResolveBet)?;
        let owner = {
            let row = inner
                .bets
                .get_mut(&bet_id)
                .ok_or(LedgerError::UnknownBet(bet_id))?;
            if row.resolved.is_some() {
                return Err(LedgerError::AlreadyResolved(bet_id));
            }
            row.resolved = Some((won, if won { payout } else { Chips::ZERO }));
            row.player.clone()
        };
        let account = inner.account_mut(&owner)?;
        if won {
            account.balance = account.balance.saturating_add(payout);
        }
        Ok(Resolution {
            bet_id,
            balance: account.balance,
        })
    }

    fn credit(&self, player: &str, amount: Chips) -> Result<Chips, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::Credit)?;
        let account = inner.account_mut(player)?;
        account.balance = account.balance.saturating_add(amount);
        Ok(account.balance)
    }

    fn debit(&self, player: &str, amount: Chips) -> Result<Chips, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::Debit)?;
        let account = inner.account_mut(player)?;
        if account.balance < amount {
            return Err(LedgerError::InsufficientChips {
                needed: amount,
                available: account.balance,
            });
        }
        account.balance = account.balance.saturating_sub(amount);
        Ok(account.balance)
    }

    fn create_game(&self, kind: GameKind) -> Result<GameId, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::CreateGame)?;
        let game_id = inner.next_game_id;
        inner.next_game_id = inner.next_game_id.saturating_add(1);
        inner.games.insert(
            game_id,
            GameRecord {
                game_id,
                kind,
                outcome: None,
                completed: false,
                created_at_ms: now_ms(),
            },
        );
        Ok(game_id)
    }

    fn update_game_outcome(
        &self,
        game_id: GameId,
        outcome: OutcomeView,
    ) -> Result<(), LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::UpdateGameOutcome)?;
        let record = inner
            .games
            .get_mut(&game_id)
            .ok_or(LedgerError::UnknownGame(game_id))?;
        record.outcome = Some(outcome);
        Ok(())
    }

    fn mark_game_completed(&self, game_id: GameId) -> Result<(), LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::MarkGameCompleted)?;
        let record = inner
            .games
            .get_mut(&game_id)
            .ok_or(LedgerError::UnknownGame(game_id))?;
        record.completed = true;
        Ok(())
    }

    fn recent_games(&self, kind: GameKind, limit: usize) -> Result<Vec<GameRecord>, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::RecentGames)?;
        Ok(inner
            .games
            .values()
            .rev()
            .filter(|record| record.kind == kind)
            .take(limit)
            .cloned()
            .collect())
    }

    fn total_game_count(&self, kind: GameKind) -> Result<u64, LedgerError> {
        let mut inner = self.locked();
        inner.take_fault(LedgerOp::TotalGameCount)?;
        Ok(inner
            .games
            .values()
            .filter(|record| record.kind == kind)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_types::Lucky7Bet;

    fn bet_kind() -> BetSelection {
        BetSelection::Table(Lucky7Bet::Red)
    }

    #[test]
    fn registration_grants_starting_chips_once() {
        let ledger = MemoryLedger::new();
        assert_eq!(
            ledger.register_player("p1", Some("Ada")).unwrap(),
            STARTING_CHIPS
        );

        // Burn some chips, then re-register: no second grant.
        let game = ledger.create_game(GameKind::Lucky7).unwrap();
        ledger
            .debit_and_create_bet("p1", Chips::from_whole(400), bet_kind(), game)
            .unwrap();
        let balance = ledger.register_player("p1", None).unwrap();
        assert_eq!(balance, Chips::from_whole(600));
        assert_eq!(ledger.player_name("p1").unwrap(), "Ada");
    }

    #[test]
    fn debit_and_create_bet_is_all_or_nothing() {
        let ledger = MemoryLedger::new();
        ledger.register_player("p1", None).unwrap();
        let game = ledger.create_game(GameKind::Lucky7).unwrap();

        let err = ledger
            .debit_and_create_bet("p1", Chips::from_whole(2_000), bet_kind(), game)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientChips {
                needed: Chips::from_whole(2_000),
                available: STARTING_CHIPS,
            }
        );
        // Nothing moved, nothing recorded.
        assert_eq!(ledger.player_balance("p1").unwrap(), STARTING_CHIPS);

        let receipt = ledger
            .debit_and_create_bet("p1", Chips::from_whole(100), bet_kind(), game)
            .unwrap();
        assert_eq!(receipt.balance, Chips::from_whole(900));

        let record = ledger.bet_record(receipt.bet_id).unwrap();
        assert_eq!(record.player, "p1");
        assert_eq!(record.amount, Chips::from_whole(100));
        assert_eq!(record.game_id, game);
        assert!(record.resolved.is_none());
    }

    #[test]
    fn resolve_bet_is_exactly_once() {
        let ledger = MemoryLedger::new();
        ledger.register_player("p1", None).unwrap();
        let game = ledger.create_game(GameKind::Lucky7).unwrap();
        let receipt = ledger
            .debit_and_create_bet("p1", Chips::from_whole(100), bet_kind(), game)
            .unwrap();

        let resolution = ledger
            .resolve_bet(receipt.bet_id, true, Chips::from_whole(200))
            .unwrap();
        assert_eq!(resolution.balance, Chips::from_whole(1_100));

        // A replay moves no chips.
        let err = ledger
            .resolve_bet(receipt.bet_id, true, Chips::from_whole(200))
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyResolved(receipt.bet_id));
        assert_eq!(ledger.player_balance("p1").unwrap(), Chips::from_whole(1_100));
    }

    #[test]
    fn losing_resolution_pays_nothing() {
        let ledger = MemoryLedger::new();
        ledger.register_player("p1", None).unwrap();
        let game = ledger.create_game(GameKind::CoinToss).unwrap();
        let receipt = ledger
            .debit_and_create_bet("p1", Chips::from_whole(50), bet_kind(), game)
            .unwrap();
        let resolution = ledger
            .resolve_bet(receipt.bet_id, false, Chips::ZERO)
            .unwrap();
        assert_eq!(resolution.balance, Chips::from_whole(950));
    }

    #[test]
    fn credit_and_debit_are_independent_ops() {
        let ledger = MemoryLedger::new();
        ledger.register_player("winner", None).unwrap();
        ledger.register_player("loser", None).unwrap();

        let stake = Chips::from_whole(250);
        assert_eq!(
            ledger.credit("winner", stake).unwrap(),
            Chips::from_whole(1_250)
        );
        assert_eq!(
            ledger.debit("loser", stake).unwrap(),
            Chips::from_whole(750)
        );

        let err = ledger.debit("loser", Chips::from_whole(10_000)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientChips { .. }));
        assert_eq!(ledger.player_balance("loser").unwrap(), Chips::from_whole(750));
    }

    #[test]
    fn game_records_track_outcome_and_completion() {
        let ledger = MemoryLedger::new();
        let game = ledger.create_game(GameKind::CoinToss).unwrap();
        ledger
            .update_game_outcome(game, OutcomeView::Coin(parlor_types::CoinSide::Tails))
            .unwrap();
        ledger.mark_game_completed(game).unwrap();

        let recent = ledger.recent_games(GameKind::CoinToss, 10).unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent[0].completed);
        assert_eq!(
            recent[0].outcome,
            Some(OutcomeView::Coin(parlor_types::CoinSide::Tails))
        );
        assert_eq!(ledger.total_game_count(GameKind::CoinToss).unwrap(), 1);
        assert_eq!(ledger.total_game_count(GameKind::Lucky7).unwrap(), 0);
    }

    #[test]
    fn recent_games_are_newest_first_and_bounded() {
        let ledger = MemoryLedger::new();
        for _ in 0..5 {
            ledger.create_game(GameKind::Lucky7).unwrap();
        }
        let recent = ledger.recent_games(GameKind::Lucky7, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].game_id > recent[1].game_id);
        assert!(recent[1].game_id > recent[2].game_id);
    }

    #[test]
    fn injected_faults_fail_exactly_one_call() {
        let ledger = MemoryLedger::new();
        ledger.register_player("p1", None).unwrap();
        ledger.fail_next(LedgerOp::RecentGames);
        assert!(matches!(
            ledger.recent_games(GameKind::Lucky7, 5),
            Err(LedgerError::Unavailable(_))
        ));
        assert!(ledger.recent_games(GameKind::Lucky7, 5).is_ok());
    }

    #[test]
    fn unknown_entities_are_reported_as_such() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.player_balance("ghost"),
            Err(LedgerError::UnknownPlayer(_))
        ));
        assert!(matches!(
            ledger.resolve_bet(99, true, Chips::ZERO),
            Err(LedgerError::UnknownBet(99))
        ));
        assert!(matches!(
            ledger.mark_game_completed(42),
            Err(LedgerError::UnknownGame(42))
        ));
    }
}
