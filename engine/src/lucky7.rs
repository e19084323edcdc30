//! Lucky 7 round engine.
//!
//! A shared 60-second round over a single hidden card draw. Players wager
//! on categories (red/black/high/low/lucky7); intake closes 10 seconds
//! before the reveal, the outcome is finalized at that freeze (admin
//! override first, CSPRNG otherwise), and every wager settles through the
//! ledger before the reveal event leaves the engine.

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
    api::{AdminRoundSnapshot, BetTotal, BetView, GameKind, OutcomeView, RoomSnapshot, ServerEvent},
    BetSelection, Card, Chips, Lucky7Bet, PlayerId,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, error, info, warn};

pub struct Lucky7Round {
    timing: RoundTiming,
    ledger: Arc<dyn Ledger>,
    rng: OutcomeRng,
    phase: RoundPhase,
    round_number: u64,
    game_id: Option<GameId>,
    /// Finalized at the freeze, public only from the reveal tick on.
    outcome: Option<Card>,
    wagers: Vec<PlacedWager>,
    /// Wagers of the immediately preceding round, for repeat.
    last_round: HashMap<PlayerId, Vec<(Lucky7Bet, Chips)>>,
    present: HashSet<PlayerId>,
    override_slot: OverrideSlot<Lucky7Bet>,
    house: HouseStats,
}

impl Lucky7Round {
    pub fn new(timing: RoundTiming, ledger: Arc<dyn Ledger>, rng: OutcomeRng) -> Lucky7Round {
        Lucky7Round {
            timing,
            ledger,
            rng,
            phase: RoundPhase::Waiting,
            round_number: 0,
            game_id: None,
            outcome: None,
            wagers: Vec::new(),
            last_round: HashMap::new(),
            present: HashSet::new(),
            override_slot: OverrideSlot::new(),
            house: HouseStats::new(),
        }
    }

    pub fn join(&mut self, player: &str) {
        self.present.insert(player.to_string());
    }

    pub fn handle_disconnect(&mut self, player: &str) {
        // Committed wagers stay: they are keyed by player identity and
        // settle whether or not the player returns.
        self.present.remove(player);
    }

    pub fn current_game_id(&self) -> Option<GameId> {
        self.game_id
    }

    pub fn house_stats(&self) -> &HouseStats {
        &self.house
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
                room: GameKind::Lucky7,
                time: remaining,
            }),
            Step::Freeze { remaining } => {
                self.finalize_outcome();
                events.push(ServerEvent::CountdownTick {
                    room: GameKind::Lucky7,
                    time: remaining,
                });
            }
            Step::Reveal => self.reveal(&mut events),
            Step::RoundOver => self.finish_round(&mut events),
        }
        events
    }

    /// Places an immediate-commit wager: the debit and the bet row are one
    /// atomic ledger call. Validation order is timing, then amount, then
    /// funds.
    pub fn place_bet(
        &mut self,
        player: &str,
        bet: Lucky7Bet,
        amount: Chips,
    ) -> Result<ServerEvent, Error> {
        let game_id = self.open_game_id()?;
        if amount.is_zero() {
            return Err(Error::Validation("wager amount must be positive".into()));
        }
        let kind = BetSelection::Table(bet);
        let receipt = self.ledger.debit_and_create_bet(player, amount, kind, game_id)?;
        self.wagers.push(PlacedWager {
            bet_id: receipt.bet_id,
            player: player.to_string(),
            kind,
            amount,
        });
        debug!(player, bet = %bet, amount = %amount, "lucky7 wager placed");
        Ok(ServerEvent::BetPlaced {
            player_id: player.to_string(),
            room: GameKind::Lucky7,
            bet: BetView { kind, amount },
            remaining_chips: receipt.balance,
        })
    }

    /// Re-submits the player's wagers from the immediately preceding round.
    /// The whole set is validated against the balance before any wager is
    /// placed.
    pub fn repeat_bets(&mut self, player: &str) -> Result<Vec<ServerEvent>, Error> {
        let game_id = self.open_game_id()?;
        let previous = match self.last_round.get(player) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return Err(Error::Validation("no wagers to repeat".into())),
        };

        let needed: Chips = previous.iter().map(|(_, amount)| *amount).sum();
        let available = self.ledger.player_balance(player)?;
        if available < needed {
            return Err(Error::InsufficientFunds { needed, available });
        }

        let mut events = Vec::with_capacity(previous.len());
        for (bet, amount) in previous {
            let kind = BetSelection::Table(bet);
            match self.ledger.debit_and_create_bet(player, amount, kind, game_id) {
                Ok(receipt) => {
                    self.wagers.push(PlacedWager {
                        bet_id: receipt.bet_id,
                        player: player.to_string(),
                        kind,
                        amount,
                    });
                    events.push(ServerEvent::BetPlaced {
                        player_id: player.to_string(),
                        room: GameKind::Lucky7,
                        bet: BetView { kind, amount },
                        remaining_chips: receipt.balance,
                    });
                }
                Err(err) => {
                    // The funds pre-check passed, so only an outage lands
                    // here; earlier wagers of the batch stay committed.
                    error!(player, %err, "repeat aborted mid-batch");
                    return Err(err.into());
                }
            }
        }
        info!(player, count = events.len(), "lucky7 wagers repeated");
        Ok(events)
    }

    /// Admin hook: forces the category of this round's outcome. Accepted
    /// only for the current game id and only while the outcome is still
    /// open (before the freeze). Last write wins.
    pub fn set_override(&mut self, game_id: GameId, category: Lucky7Bet) -> bool {
        if self.game_id != Some(game_id) || !self.timing.accepts_wagers(&self.phase) {
            return false;
        }
        self.override_slot.arm(game_id, category);
        info!(game_id, category = %category, "lucky7 outcome override armed");
        true
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: GameKind::Lucky7,
            status: self.phase.status(),
            round_number: self.round_number,
            countdown_time: self.phase.countdown_remaining(),
            players_present: self.present.len(),
            wager_count: self.wagers.len(),
        }
    }

    pub fn admin_snapshot(&self) -> AdminRoundSnapshot {
        let mut bets_by_type = Vec::with_capacity(Lucky7Bet::ALL.len());
        for bet in Lucky7Bet::ALL {
            let kind = BetSelection::Table(bet);
            let matching = self.wagers.iter().filter(|wager| wager.kind == kind);
            let mut total = Chips::ZERO;
            let mut count = 0u32;
            for wager in matching {
                total = total.saturating_add(wager.amount);
                count = count.saturating_add(1);
            }
            bets_by_type.push(BetTotal { kind, total, count });
        }
        AdminRoundSnapshot {
            room: GameKind::Lucky7,
            game_id: self.game_id,
            status: self.phase.status(),
            round_number: self.round_number,
            time_remaining: self.phase.countdown_remaining(),
            total_bets: self.wagers.iter().map(|wager| wager.amount).sum(),
            bets_by_type,
            current_outcome: self.outcome.map(OutcomeView::Card),
            house_stats: self.house.summary(),
        }
    }

    fn open_game_id(&self) -> Result<GameId, Error> {
        if !self.timing.accepts_wagers(&self.phase) {
            return Err(Error::Timing("betting is closed for this round".into()));
        }
        self.game_id
            .ok_or_else(|| Error::Timing("no round is accepting wagers".into()))
    }

    fn try_start_round(&mut self, events: &mut Vec<ServerEvent>) {
        match self.ledger.create_game(GameKind::Lucky7) {
            Ok(game_id) => {
                self.round_number = self.round_number.saturating_add(1);
                self.game_id = Some(game_id);
                self.outcome = None;
                self.wagers.clear();
                self.phase = self.timing.start_phase();
                info!(game_id, round = self.round_number, "lucky7 round started");
                events.push(ServerEvent::GameStarting {
                    room: GameKind::Lucky7,
                    countdown_time: self.timing.countdown_secs,
                    round_number: self.round_number,
                });
            }
            Err(err) => {
                // Stay in waiting and retry next tick; a round that already
                // started never blocks on the ledger.
                warn!(%err, "could not create lucky7 game record");
            }
        }
    }

    fn finalize_outcome(&mut self) {
        let card = match self.game_id.and_then(|id| self.override_slot.take_for(id)) {
            Some(category) => {
                info!(game_id = ?self.game_id, category = %category, "lucky7 override consumed");
                self.rng.card_in_category(category)
            }
            None => self.rng.draw_card(),
        };
        debug!(game_id = ?self.game_id, card = %card, "lucky7 outcome finalized");
        self.outcome = Some(card);
    }

    fn reveal(&mut self, events: &mut Vec<ServerEvent>) {
        let card = match self.outcome {
            Some(card) => card,
            None => {
                // Freeze never fired (degenerate timing); draw late rather
                // than stall the round.
                let card = self.rng.draw_card();
                self.outcome = Some(card);
                card
            }
        };

        let settlement = settle_round(self.ledger.as_ref(), &self.wagers, |wager| {
            matches!(wager.kind, BetSelection::Table(bet) if bet.wins_on(&card))
        });
        let profit = self
            .house
            .record_round(settlement.total_wagered, settlement.total_paid);

        if let Some(game_id) = self.game_id {
            if let Err(err) = self
                .ledger
                .update_game_outcome(game_id, OutcomeView::Card(card))
            {
                error!(game_id, %err, "failed to persist lucky7 outcome");
            }
            if let Err(err) = self.ledger.mark_game_completed(game_id) {
                error!(game_id, %err, "failed to complete lucky7 game record");
            }
        }
        info!(
            game_id = ?self.game_id,
            card = %card,
            wagered = %settlement.total_wagered,
            paid = %settlement.total_paid,
            profit_cents = profit,
            "lucky7 round settled"
        );

        // Settlement is complete; only now may the reveal go out.
        events.push(ServerEvent::CardRevealed {
            room: GameKind::Lucky7,
            card,
        });
        for player in settlement.per_player {
            events.push(ServerEvent::RoundResult {
                player_id: player.player,
                room: GameKind::Lucky7,
                results: player.results,
                balance: player.balance,
            });
        }
    }

    fn finish_round(&mut self, events: &mut Vec<ServerEvent>) {
        events.push(ServerEvent::RoundEnded {
            room: GameKind::Lucky7,
        });

        let mut last: HashMap<PlayerId, Vec<(Lucky7Bet, Chips)>> = HashMap::new();
        for wager in self.wagers.drain(..) {
            if let BetSelection::Table(bet) = wager.kind {
                last.entry(wager.player).or_default().push((bet, wager.amount));
            }
        }
        self.last_round = last;
        self.game_id = None;
        self.outcome = None;
        self.override_slot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerOp, MemoryLedger};

    const TEST_TIMING: RoundTiming = RoundTiming {
        countdown_secs: 12,
        freeze_cutoff_secs: 10,
        intermission_secs: 2,
    };

    fn fixture() -> (Lucky7Round, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let round = Lucky7Round::new(TEST_TIMING, ledger.clone(), OutcomeRng::from_seed(0x7777));
        (round, ledger)
    }

    fn start_round(round: &mut Lucky7Round, player: &str) -> GameId {
        round.join(player);
        let events = round.tick();
        assert!(
            events
                .iter()
                .any(|event| matches!(event, ServerEvent::GameStarting { .. })),
            "round should start once a player is present"
        );
        round.current_game_id().unwrap()
    }

    /// Ticks until the freeze fires (betting closed, outcome finalized).
    fn run_to_freeze(round: &mut Lucky7Round) {
        for _ in 0..TEST_TIMING.countdown_secs {
            round.tick();
            if !round
                .timing
                .accepts_wagers(&round.phase)
            {
                return;
            }
        }
        panic!("freeze never fired");
    }

    /// Ticks through reveal, returning the reveal tick's events.
    fn run_to_reveal(round: &mut Lucky7Round) -> Vec<ServerEvent> {
        for _ in 0..=TEST_TIMING.countdown_secs {
            let events = round.tick();
            if events
                .iter()
                .any(|event| matches!(event, ServerEvent::CardRevealed { .. }))
            {
                return events;
            }
        }
        panic!("reveal never fired");
    }

    /// Ticks through the intermission until the round ends.
    fn run_to_round_end(round: &mut Lucky7Round) {
        for _ in 0..=TEST_TIMING.intermission_secs {
            let events = round.tick();
            if events
                .iter()
                .any(|event| matches!(event, ServerEvent::RoundEnded { .. }))
            {
                return;
            }
        }
        panic!("round never ended");
    }

    #[test]
    fn waits_for_presence_then_starts() {
        let (mut round, _ledger) = fixture();
        assert!(round.tick().is_empty());
        assert_eq!(round.snapshot().status, parlor_types::api::RoundStatus::Waiting);

        round.join("p1");
        let events = round.tick();
        match &events[0] {
            ServerEvent::GameStarting {
                countdown_time,
                round_number,
                ..
            } => {
                assert_eq!(*countdown_time, TEST_TIMING.countdown_secs);
                assert_eq!(*round_number, 1);
            }
            other => panic!("expected game-starting, got {other:?}"),
        }
        let snapshot = round.snapshot();
        assert_eq!(snapshot.status, parlor_types::api::RoundStatus::Countdown);
        assert_eq!(snapshot.countdown_time, Some(TEST_TIMING.countdown_secs));
    }

    #[test]
    fn countdown_broadcasts_each_second() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");

        let events = round.tick();
        assert!(matches!(
            events[0],
            ServerEvent::CountdownTick { time, .. } if time == TEST_TIMING.countdown_secs - 1
        ));
    }

    #[test]
    fn wagers_rejected_from_the_freeze_boundary_on() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");

        // One second in: remaining 11, still open.
        round.tick();
        round
            .place_bet("p1", Lucky7Bet::Red, Chips::from_whole(10))
            .unwrap();

        // Next tick lands exactly on the cutoff: closed, boundary exclusive.
        round.tick();
        let err = round
            .place_bet("p1", Lucky7Bet::Red, Chips::from_whole(10))
            .unwrap_err();
        assert!(matches!(err, Error::Timing(_)));

        // And outside a round entirely.
        let (mut idle, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        let err = idle
            .place_bet("p1", Lucky7Bet::Red, Chips::from_whole(10))
            .unwrap_err();
        assert!(matches!(err, Error::Timing(_)));
    }

    #[test]
    fn zero_amount_is_a_validation_error() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");
        let err = round.place_bet("p1", Lucky7Bet::High, Chips::ZERO).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn lone_lucky7_hit_pays_twelve_to_one() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        let game_id = start_round(&mut round, "p1");

        round
            .place_bet("p1", Lucky7Bet::Lucky7, Chips::from_whole(100))
            .unwrap();
        assert!(round.set_override(game_id, Lucky7Bet::Lucky7));

        let events = run_to_reveal(&mut round);
        let card = events
            .iter()
            .find_map(|event| match event {
                ServerEvent::CardRevealed { card, .. } => Some(*card),
                _ => None,
            })
            .unwrap();
        assert_eq!(card.rank(), 7);

        let result = events
            .iter()
            .find_map(|event| match event {
                ServerEvent::RoundResult { balance, results, .. } => Some((*balance, results.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(result.1[0].payout, Chips::from_whole(1_200));
        // 1000 - 100 + 1200.
        assert_eq!(result.0, Chips::from_whole(2_100));

        let summary = round.house_stats().summary();
        assert_eq!(summary.last_round_profit, -1_100.0);
    }

    #[test]
    fn a_seven_defeats_every_other_category() {
        let (mut round, ledger) = fixture();
        for player in ["red", "black", "high", "low", "lucky"] {
            ledger.register_player(player, None).unwrap();
        }
        let game_id = start_round(&mut round, "red");

        round.place_bet("red", Lucky7Bet::Red, Chips::from_whole(10)).unwrap();
        round.place_bet("black", Lucky7Bet::Black, Chips::from_whole(10)).unwrap();
        round.place_bet("high", Lucky7Bet::High, Chips::from_whole(10)).unwrap();
        round.place_bet("low", Lucky7Bet::Low, Chips::from_whole(10)).unwrap();
        round.place_bet("lucky", Lucky7Bet::Lucky7, Chips::from_whole(10)).unwrap();
        assert!(round.set_override(game_id, Lucky7Bet::Lucky7));

        let events = run_to_reveal(&mut round);
        for event in &events {
            if let ServerEvent::RoundResult { player_id, results, .. } = event {
                let expected_win = player_id == "lucky";
                assert_eq!(results[0].won, expected_win, "player {player_id}");
            }
        }

        // 50 wagered, 120 paid to the lucky7 winner.
        let summary = round.house_stats().summary();
        assert_eq!(summary.total_wagered, Chips::from_whole(50));
        assert_eq!(summary.total_paid_out, Chips::from_whole(120));
    }

    #[test]
    fn insufficient_funds_places_nothing() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        // Leave the player with 50 chips.
        ledger.debit("p1", Chips::from_whole(950)).unwrap();
        start_round(&mut round, "p1");

        let err = round
            .place_bet("p1", Lucky7Bet::Red, Chips::from_whole(100))
            .unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientFunds {
                needed: Chips::from_whole(100),
                available: Chips::from_whole(50),
            }
        );
        assert_eq!(round.snapshot().wager_count, 0);
        assert_eq!(ledger.player_balance("p1").unwrap(), Chips::from_whole(50));
    }

    #[test]
    fn override_requires_current_game_and_open_outcome() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();

        // No round yet.
        assert!(!round.set_override(0, Lucky7Bet::Red));

        let game_id = start_round(&mut round, "p1");
        assert!(!round.set_override(game_id + 1, Lucky7Bet::Red));
        assert!(round.set_override(game_id, Lucky7Bet::Red));

        // Past the freeze the outcome is locked.
        run_to_freeze(&mut round);
        assert!(!round.set_override(game_id, Lucky7Bet::Black));
    }

    #[test]
    fn override_last_write_wins() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        let game_id = start_round(&mut round, "p1");

        assert!(round.set_override(game_id, Lucky7Bet::High));
        assert!(round.set_override(game_id, Lucky7Bet::Low));

        let events = run_to_reveal(&mut round);
        let card = events
            .iter()
            .find_map(|event| match event {
                ServerEvent::CardRevealed { card, .. } => Some(*card),
                _ => None,
            })
            .unwrap();
        assert!(card.rank() < 7, "low override should produce a low card");
    }

    #[test]
    fn stale_game_id_cannot_arm_next_round() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        let first_id = start_round(&mut round, "p1");
        run_to_reveal(&mut round);
        run_to_round_end(&mut round);

        // Next round gets a fresh id; the old one is refused.
        let events = round.tick();
        assert!(matches!(events[0], ServerEvent::GameStarting { .. }));
        let second_id = round.current_game_id().unwrap();
        assert_ne!(first_id, second_id);
        assert!(!round.set_override(first_id, Lucky7Bet::Lucky7));
    }

    #[test]
    fn repeat_resubmits_previous_round_exactly() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");
        round.place_bet("p1", Lucky7Bet::Red, Chips::from_whole(30)).unwrap();
        round.place_bet("p1", Lucky7Bet::Low, Chips::from_whole(20)).unwrap();
        run_to_reveal(&mut round);
        run_to_round_end(&mut round);

        // New round; repeat re-places both wagers.
        round.tick();
        let events = round.repeat_bets("p1").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(round.snapshot().wager_count, 2);
        let amounts: Vec<Chips> = events
            .iter()
            .filter_map(|event| match event {
                ServerEvent::BetPlaced { bet, .. } => Some(bet.amount),
                _ => None,
            })
            .collect();
        assert_eq!(amounts, vec![Chips::from_whole(30), Chips::from_whole(20)]);
    }

    #[test]
    fn repeat_is_all_or_nothing_against_the_balance() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");
        round.place_bet("p1", Lucky7Bet::Red, Chips::from_whole(400)).unwrap();
        round.place_bet("p1", Lucky7Bet::Black, Chips::from_whole(400)).unwrap();
        run_to_reveal(&mut round);
        run_to_round_end(&mut round);

        // Drain the balance below the repeat total.
        let balance = ledger.player_balance("p1").unwrap();
        ledger
            .debit("p1", balance.saturating_sub(Chips::from_whole(500)))
            .unwrap();

        round.tick();
        let err = round.repeat_bets("p1").unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        // Nothing was placed.
        assert_eq!(round.snapshot().wager_count, 0);
        assert_eq!(ledger.player_balance("p1").unwrap(), Chips::from_whole(500));
    }

    #[test]
    fn repeat_without_history_is_rejected() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");
        let err = round.repeat_bets("p1").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn empty_round_still_reveals_and_counts() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");

        let events = run_to_reveal(&mut round);
        assert!(events
            .iter()
            .any(|event| matches!(event, ServerEvent::CardRevealed { .. })));
        assert!(!events
            .iter()
            .any(|event| matches!(event, ServerEvent::RoundResult { .. })));
        assert_eq!(round.house_stats().rounds_settled(), 1);
    }

    #[test]
    fn wagers_settle_after_disconnect() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        ledger.register_player("p2", None).unwrap();
        start_round(&mut round, "p1");
        round.join("p2");
        round.place_bet("p2", Lucky7Bet::Red, Chips::from_whole(25)).unwrap();

        round.handle_disconnect("p2");
        let events = run_to_reveal(&mut round);
        assert!(
            events.iter().any(|event| matches!(
                event,
                ServerEvent::RoundResult { player_id, .. } if player_id == "p2"
            )),
            "disconnected player's wager must still settle"
        );
    }

    #[test]
    fn start_retries_after_ledger_outage() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        ledger.fail_next(LedgerOp::CreateGame);

        round.join("p1");
        assert!(round.tick().is_empty());
        assert_eq!(round.snapshot().status, parlor_types::api::RoundStatus::Waiting);

        // Outage over: next tick starts the round.
        let events = round.tick();
        assert!(matches!(events[0], ServerEvent::GameStarting { .. }));
    }

    #[test]
    fn reveal_tick_orders_settlement_before_reveal_broadcast() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        start_round(&mut round, "p1");
        round.place_bet("p1", Lucky7Bet::Red, Chips::from_whole(10)).unwrap();

        let events = run_to_reveal(&mut round);
        // By the time any event is visible the ledger is already settled:
        // the bet row resolves in the same tick that emits the reveal.
        let reveal_index = events
            .iter()
            .position(|event| matches!(event, ServerEvent::CardRevealed { .. }))
            .unwrap();
        let result_index = events
            .iter()
            .position(|event| matches!(event, ServerEvent::RoundResult { .. }))
            .unwrap();
        assert!(reveal_index < result_index);
        assert_eq!(round.house_stats().rounds_settled(), 1);
    }

    #[test]
    fn hidden_outcome_never_leaks_before_reveal() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();
        let game_id = start_round(&mut round, "p1");
        assert!(round.set_override(game_id, Lucky7Bet::Lucky7));

        run_to_freeze(&mut round);
        // Finalized but not revealed: admin sees it, the room does not.
        assert!(round.admin_snapshot().current_outcome.is_some());
        let snapshot = round.snapshot();
        assert_eq!(snapshot.status, parlor_types::api::RoundStatus::Countdown);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("card").is_none());
        assert!(json.get("outcome").is_none());
    }

    #[test]
    fn house_stats_accumulate_across_rounds() {
        let (mut round, ledger) = fixture();
        ledger.register_player("p1", None).unwrap();

        for _ in 0..2 {
            let game_id = start_round(&mut round, "p1");
            round.place_bet("p1", Lucky7Bet::Red, Chips::from_whole(10)).unwrap();
            // Force a black outcome so the red wager loses.
            assert!(round.set_override(game_id, Lucky7Bet::Black));
            run_to_reveal(&mut round);
            run_to_round_end(&mut round);
        }

        let summary = round.house_stats().summary();
        assert_eq!(summary.rounds_settled, 2);
        assert_eq!(summary.total_wagered, Chips::from_whole(20));
        assert_eq!(summary.house_profit, 20.0);
    }
}
