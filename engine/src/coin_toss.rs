//! Coin Toss round engine.
//!
//! A shared 30-second round over a coin flip, with a two-phase wager flow:
//! `place` reserves a side and amount without moving chips, `lock` commits
//! the wager through the ledger, `cancel` discards the reservation. Only
//! locked wagers settle. Unless an admin override is armed, the outcome is
//! the side that pays the house least; ties fall back to a fair flip.

use crate::{
    clock::{RoundPhase, RoundTiming, Step},
    error::Error,
    house::HouseStats,
    ledger::{GameId, Ledger},
    outcome::OutcomeRng,
    overrides::OverrideSlot,
    settlement::{settle_round, PlacedWager},
};
use parlor_types::{
    api::{
        AdminRoundSnapshot, BetTotal, BetView, GameKind, LockInput, OutcomeView, RoomSnapshot,
        ServerEvent,
    },
    BetSelection, Chips, CoinSide, PlayerId,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, error, info, warn};

pub struct CoinTossRound {
    timing: RoundTiming,
    ledger: Arc<dyn Ledger>,
    rng: OutcomeRng,
    phase: RoundPhase,
    round_number: u64,
    game_id: Option<GameId>,
    outcome: Option<CoinSide>,
    /// Reservations: side and amount, no chips moved yet. At most one per
    /// player; discarded at the freeze and on disconnect.
    pending: HashMap<PlayerId, (CoinSide, Chips)>,
    /// Committed wagers, debited through the ledger.
    wagers: Vec<PlacedWager>,
    /// Players who already locked this round. One lock per round.
    locked: HashSet<PlayerId>,
    present: HashSet<PlayerId>,
    override_slot: OverrideSlot<CoinSide>,
    house: HouseStats,
}

impl CoinTossRound {
    pub fn new(timing: RoundTiming, ledger: Arc<dyn Ledger>, rng: OutcomeRng) -> CoinTossRound {
        CoinTossRound {
            timing,
            ledger,
            rng,
            phase: RoundPhase::Waiting,
            round_number: 0,
            game_id: None,
            outcome: None,
            pending: HashMap::new(),
            wagers: Vec::new(),
            locked: HashSet::new(),
            present: HashSet::new(),
            override_slot: OverrideSlot::new(),
            house: HouseStats::new(),
        }
    }

    pub fn join(&mut self, player: &str) {
        self.present.insert(player.to_string());
    }

    pub fn handle_disconnect(&mut self, player: &str) {
        // A reservation dies with the connection; a locked wager is already
        // the ledger's and settles regardless.
        self.present.remove(player);
        self.pending.remove(player);
    }

    pub fn current_game_id(&self) -> Option<GameId> {
        self.game_id
    }

    pub fn house_stats(&self) -> &HouseStats {
        &self.house
    }

    /// Reserves a side and amount. No chips move; the balance is only
    /// checked so an obviously unfundable reservation is refused up front.
    pub fn place_bet(
        &mut self,
        player: &str,
        side: CoinSide,
        amount: Chips,
    ) -> Result<ServerEvent, Error> {
        self.open_game_id()?;
        if amount.is_zero() {
            return Err(Error::Validation("wager amount must be positive".into()));
        }
        if self.locked.contains(player) {
            return Err(Error::Validation(
                "a wager is already locked for this round".into(),
            ));
        }
        if self.pending.contains_key(player) {
            return Err(Error::Validation(
                "a pending wager already exists; lock or cancel it first".into(),
            ));
        }
        let available = self.ledger.player_balance(player)?;
        if available < amount {
            return Err(Error::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        self.pending.insert(player.to_string(), (side, amount));
        debug!(player, side = %side, amount = %amount, "coin toss wager pending");
        Ok(ServerEvent::BetPlaced {
            player_id: player.to_string(),
            room: GameKind::CoinToss,
            bet: BetView {
                kind: BetSelection::Coin(side),
                amount,
            },
            remaining_chips: available,
        })
    }

    /// Commits a wager through the ledger. A pending reservation takes
    /// precedence; without one the caller must supply the side and amount
    /// inline. The debit and the bet row are one atomic call.
    pub fn lock_bet(
        &mut self,
        player: &str,
        input: Option<LockInput>,
    ) -> Result<ServerEvent, Error> {
        let game_id = self.open_game_id()?;
        if self.locked.contains(player) {
            return Err(Error::Validation(
                "a wager is already locked for this round".into(),
            ));
        }
        let (side, amount) = match self.pending.get(player) {
            Some(&(side, amount)) => (side, amount),
            None => match input {
                Some(input) => (input.side, input.amount),
                None => {
                    return Err(Error::Validation("no pending wager to lock".into()));
                }
            },
        };
        if amount.is_zero() {
            return Err(Error::Validation("wager amount must be positive".into()));
        }

        let kind = BetSelection::Coin(side);
        // On failure the reservation survives; the freeze will clear it.
        let receipt = self.ledger.debit_and_create_bet(player, amount, kind, game_id)?;
        self.pending.remove(player);
        self.locked.insert(player.to_string());
        self.wagers.push(PlacedWager {
            bet_id: receipt.bet_id,
            player: player.to_string(),
            kind,
            amount,
        });
        debug!(player, side = %side, amount = %amount, "coin toss wager locked");
        Ok(ServerEvent::BetLocked {
            player_id: player.to_string(),
            room: GameKind::CoinToss,
            bet: BetView { kind, amount },
            remaining_chips: receipt.balance,
        })
    }

    /// Discards the player's pending reservation. Locked wagers cannot be
    /// cancelled.
    pub fn cancel_bet(&mut self, player: &str) -> Result<ServerEvent, Error> {
        if self.pending.remove(player).is_none() {
            return Err(Error::Validation("no pending wager to cancel".into()));
        }
        debug!(player, "coin toss reservation cancelled");
        Ok(ServerEvent::BetsCancelled {
            player_id: player.to_string(),
            room: GameKind::CoinToss,
        })
    }

    /// Admin hook, same contract as the card table: current game id only,
    /// before the freeze, last write wins.
    pub fn set_override(&mut self, game_id: GameId, side: CoinSide) -> bool {
        if self.game_id != Some(game_id) || !self.timing.accepts_wagers(&self.phase) {
            return false;
        }
        self.override_slot.arm(game_id, side);
        info!(game_id, side = %side, "coin toss outcome override armed");
        true
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: GameKind::CoinToss,
            status: self.phase.status(),
            round_number: self.round_number,
            countdown_time: self.phase.countdown_remaining(),
            players_present: self.present.len(),
            wager_count: self.wagers.len(),
        }
    }

    pub fn admin_snapshot(&self) -> AdminRoundSnapshot {
        let mut bets_by_type = Vec::with_capacity(2);
        for side in [CoinSide::Heads, CoinSide::Tails] {
            let kind = BetSelection::Coin(side);
            let mut total = Chips::ZERO;
            let mut count = 0u32;
            for wager in self.wagers.iter().filter(|wager| wager.kind == kind) {
                total = total.saturating_add(wager.amount);
                count = count.saturating_add(1);
            }
            bets_by_type.push(BetTotal { kind, total, count });
        }
        AdminRoundSnapshot {
            room: GameKind::CoinToss,
            game_id: self.game_id,
            status: self.phase.status(),
            round_number: self.round_number,
            time_remaining: self.phase.countdown_remaining(),
            total_bets: self.wagers.iter().map(|wager| wager.amount).sum(),
            bets_by_type,
            current_outcome: self.outcome.map(OutcomeView::Coin),
            house_stats: self.house.summary(),
        }
    }

    /// Advances one logical second.
    pub fn tick(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        if matches!(self.phase, RoundPhase::Waiting) {
            if !self.present.is_empty() {
                self.try_start_round(&mut events);
            }
            return events;
        }

        let (next, step) = self.timing.step(self.phase);
        self.phase = next;
        match step {
            Step::Idle => {}
            Step::Tick { remaining } => events.push(ServerEvent::CountdownTick {
                room: GameKind::CoinToss,
                time: remaining,
            }),
            Step::Freeze { remaining } => {
                events.push(ServerEvent::CountdownTick {
                    room: GameKind::CoinToss,
                    time: remaining,
                });
                self.clear_pending(&mut events);
                self.finalize_outcome();
            }
            Step::Reveal => self.reveal(&mut events),
            Step::RoundOver => self.finish_round(&mut events),
        }
        events
    }

    fn open_game_id(&self) -> Result<GameId, Error> {
        if !self.timing.accepts_wagers(&self.phase) {
            return Err(Error::Timing("betting is closed for this round".into()));
        }
        self.game_id
            .ok_or_else(|| Error::Timing("no round is accepting wagers".into()))
    }

    fn try_start_round(&mut self, events: &mut Vec<ServerEvent>) {
        match self.ledger.create_game(GameKind::CoinToss) {
            Ok(game_id) => {
                self.round_number = self.round_number.saturating_add(1);
                self.game_id = Some(game_id);
                self.outcome = None;
                self.wagers.clear();
                self.pending.clear();
                self.locked.clear();
                self.phase = self.timing.start_phase();
                info!(game_id, round = self.round_number, "coin toss round started");
                events.push(ServerEvent::GameStarting {
                    room: GameKind::CoinToss,
                    countdown_time: self.timing.countdown_secs,
                    round_number: self.round_number,
                });
            }
            Err(err) => {
                warn!(%err, "could not create coin toss game record");
            }
        }
    }

    /// Drops every reservation that never locked, telling each owner.
    fn clear_pending(&mut self, events: &mut Vec<ServerEvent>) {
        if self.pending.is_empty() {
            return;
        }
        let mut players: Vec<PlayerId> = self.pending.drain().map(|(player, _)| player).collect();
        players.sort();
        for player in players {
            debug!(player = %player, "unlocked coin toss reservation expired");
            events.push(ServerEvent::BetsCancelled {
                player_id: player,
                room: GameKind::CoinToss,
            });
        }
    }

    fn finalize_outcome(&mut self) {
        let side = match self.game_id.and_then(|id| self.override_slot.take_for(id)) {
            Some(side) => {
                info!(game_id = ?self.game_id, side = %side, "coin toss override consumed");
                side
            }
            None => self.house_choice(),
        };
        debug!(game_id = ?self.game_id, side = %side, "coin toss outcome finalized");
        self.outcome = Some(side);
    }

    /// The side that pays out less. Both sides pay even money, so stake
    /// totals decide; a tie (including an empty book) is a fair flip.
    fn house_choice(&mut self) -> CoinSide {
        let mut heads = Chips::ZERO;
        let mut tails = Chips::ZERO;
        for wager in &self.wagers {
            match wager.kind {
                BetSelection::Coin(CoinSide::Heads) => heads = heads.saturating_add(wager.amount),
                BetSelection::Coin(CoinSide::Tails) => tails = tails.saturating_add(wager.amount),
                BetSelection::Table(_) => {}
            }
        }
        if heads < tails {
            CoinSide::Heads
        } else if tails < heads {
            CoinSide::Tails
        } else {
            self.rng.flip_coin()
        }
    }

    fn reveal(&mut self, events: &mut Vec<ServerEvent>) {
        let side = match self.outcome {
            Some(side) => side,
            None => {
                let side = self.house_choice();
                self.outcome = Some(side);
                side
            }
        };

        let settlement = settle_round(self.ledger.as_ref(), &self.wagers, |wager| {
            wager.kind == BetSelection::Coin(side)
        });
        let profit = self
            .house
            .record_round(settlement.total_wagered, settlement.total_paid);

        if let Some(game_id) = self.game_id {
            if let Err(err) = self
                .ledger
                .update_game_outcome(game_id, OutcomeView::Coin(side))
            {
                error!(game_id, %err, "failed to persist coin toss outcome");
            }
            if let Err(err) = self.ledger.mark_game_completed(game_id) {
                error!(game_id, %err, "failed to complete coin toss game record");
            }
        }
        info!(
            game_id = ?self.game_id,
            side = %side,
            wagered = %settlement.total_wagered,
            paid = %settlement.total_paid,
            profit_cents = profit,
            "coin toss round settled"
        );

        events.push(ServerEvent::CoinRevealed {
            room: GameKind::CoinToss,
            outcome: side,
        });
        for player in settlement.per_player {
            events.push(ServerEvent::RoundResult {
                player_id: player.player,
                room: GameKind::CoinToss,
                results: player.results,
                balance: player.balance,
            });
        }
    }

    fn finish_round(&mut self, events: &mut Vec<ServerEvent>) {
        events.push(ServerEvent::RoundEnded {
            room: GameKind::CoinToss,
        });
        self.wagers.clear();
        self.locked.clear();
        self.pending.clear();
        self.game_id = None;
        self.outcome = None;
        self.override_slot.clear();
    }
}
