//! Andar Bahar duels: FIFO matchmaking and the 1v1 match machine.
//!
//! Two queued players are paired into a match priced at the earlier
//! player's stake. One becomes the dealer, the other the guesser, by a
//! fair flip. After a short start delay a joker is drawn and shown to
//! both; the guesser then calls the pile the joker's rank will land on.
//! The deal alternates piles starting from the joker's color side, stops
//! at the first rank match, and the stake moves from loser to winner in
//! two independent ledger transfers. No chips move before settlement, so
//! a voided match (underfunded, idle, or disconnected) has nothing to
//! refund.

use crate::{
    error::Error,
    ledger::Ledger,
    outcome::OutcomeRng,
};
use parlor_types::{
    api::{GameKind, OutcomeView, RoomSnapshot, RoundStatus, ServerEvent},
    Card, Chips, Color, DuelRole, PileSide, PlayerId,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tracing::{debug, error, info, warn};

/// Timing knobs for a duel, in logical seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuelConfig {
    /// Delay between the pairing and the joker draw.
    pub start_delay_secs: u32,
    /// How long the guesser gets to call a side before the match voids.
    pub choice_timeout_secs: u32,
}

impl DuelConfig {
    pub const DEFAULT: DuelConfig = DuelConfig {
        start_delay_secs: 3,
        choice_timeout_secs: 60,
    };

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.start_delay_secs == 0 {
            return Err("duel start delay must be non-zero");
        }
        if self.choice_timeout_secs == 0 {
            return Err("duel choice timeout must be non-zero");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum MatchPhase {
    /// Start delay before the joker is drawn.
    Starting { countdown: u32 },
    /// Joker is public; waiting on the guesser's call.
    Choosing { joker: Card, idle: u32 },
}

struct DuelMatch {
    dealer: PlayerId,
    guesser: PlayerId,
    stake: Chips,
    phase: MatchPhase,
}

enum MatchStep {
    Waiting,
    StartReady,
    ChoiceTimedOut,
}

impl DuelMatch {
    fn step(&mut self) -> MatchStep {
        match &mut self.phase {
            MatchPhase::Starting { countdown } => {
                *countdown = countdown.saturating_sub(1);
                if *countdown == 0 {
                    MatchStep::StartReady
                } else {
                    MatchStep::Waiting
                }
            }
            MatchPhase::Choosing { idle, .. } => {
                *idle = idle.saturating_sub(1);
                if *idle == 0 {
                    MatchStep::ChoiceTimedOut
                } else {
                    MatchStep::Waiting
                }
            }
        }
    }
}

pub struct DuelMatchmaker {
    config: DuelConfig,
    ledger: Arc<dyn Ledger>,
    rng: OutcomeRng,
    /// Arrival order; the front two are paired first.
    queue: VecDeque<(PlayerId, Chips)>,
    /// Keyed by the ledger's game id.
    matches: HashMap<u64, DuelMatch>,
    by_player: HashMap<PlayerId, u64>,
    matches_started: u64,
}

impl DuelMatchmaker {
    pub fn new(config: DuelConfig, ledger: Arc<dyn Ledger>, rng: OutcomeRng) -> DuelMatchmaker {
        DuelMatchmaker {
            config,
            ledger,
            rng,
            queue: VecDeque::new(),
            matches: HashMap::new(),
            by_player: HashMap::new(),
            matches_started: 0,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: GameKind::AndarBahar,
            status: RoundStatus::Waiting,
            round_number: self.matches_started,
            countdown_time: None,
            players_present: self.queue.len() + self.by_player.len(),
            wager_count: self.matches.len(),
        }
    }

    /// Queues the player at the given stake and pairs immediately when an
    /// opponent is waiting.
    pub fn join_queue(&mut self, player: &str, stake: Chips) -> Result<Vec<ServerEvent>, Error> {
        if stake.is_zero() {
            return Err(Error::Validation("stake must be positive".into()));
        }
        if self.by_player.contains_key(player) {
            return Err(Error::Validation("already playing a duel".into()));
        }
        if self.queue.iter().any(|(queued, _)| queued == player) {
            return Err(Error::Validation("already waiting in the queue".into()));
        }
        let available = self.ledger.player_balance(player)?;
        if available < stake {
            return Err(Error::InsufficientFunds {
                needed: stake,
                available,
            });
        }

        self.queue.push_back((player.to_string(), stake));
        debug!(player, stake = %stake, position = self.queue.len(), "joined duel queue");
        let mut events = vec![ServerEvent::QueueJoined {
            player_id: player.to_string(),
            position: self.queue.len(),
        }];
        self.try_pair(&mut events);
        Ok(events)
    }

    pub fn leave_queue(&mut self, player: &str) -> Result<(), Error> {
        match self.queue.iter().position(|(queued, _)| queued == player) {
            Some(index) => {
                self.queue.remove(index);
                debug!(player, "left duel queue");
                Ok(())
            }
            None => Err(Error::Validation("not waiting in the queue".into())),
        }
    }

    /// The guesser's call. Deals the piles, settles the stake, and closes
    /// the match.
    pub fn choose_side(
        &mut self,
        player: &str,
        match_id: u64,
        side: PileSide,
    ) -> Result<Vec<ServerEvent>, Error> {
        let (dealer, guesser, stake, joker) = {
            let duel = self
                .matches
                .get(&match_id)
                .ok_or_else(|| Error::NotFound(format!("no duel with id {match_id}")))?;
            // A stranger learns nothing about someone else's match.
            if player != duel.dealer && player != duel.guesser {
                return Err(Error::NotFound(format!("no duel with id {match_id}")));
            }
            if player == duel.dealer {
                return Err(Error::Validation("only the guesser calls the side".into()));
            }
            let joker = match duel.phase {
                MatchPhase::Choosing { joker, .. } => joker,
                MatchPhase::Starting { .. } => {
                    return Err(Error::Timing("the joker is not on the table yet".into()));
                }
            };
            (duel.dealer.clone(), duel.guesser.clone(), duel.stake, joker)
        };
        self.matches.remove(&match_id);
        self.by_player.remove(&dealer);
        self.by_player.remove(&guesser);

        let deck = self.rng.shuffled_deck();
        let (andar, bahar, winning_side) = deal_piles(deck, joker);
        let (winner, loser) = if side == winning_side {
            (guesser.clone(), dealer.clone())
        } else {
            (dealer.clone(), guesser.clone())
        };

        // Two independent transfers; a failure is logged, never unwound.
        let winner_balance = match self.ledger.credit(&winner, stake) {
            Ok(balance) => Some(balance),
            Err(err) => {
                error!(match_id, winner = %winner, %err, "duel payout failed");
                None
            }
        };
        let loser_balance = match self.ledger.debit(&loser, stake) {
            Ok(balance) => Some(balance),
            Err(err) => {
                error!(match_id, loser = %loser, %err, "duel stake could not be collected");
                None
            }
        };

        if let Err(err) = self
            .ledger
            .update_game_outcome(match_id, OutcomeView::Pile(winning_side))
        {
            error!(match_id, %err, "failed to persist duel outcome");
        }
        if let Err(err) = self.ledger.mark_game_completed(match_id) {
            error!(match_id, %err, "failed to complete duel record");
        }
        info!(
            match_id,
            winner = %winner,
            side = %winning_side,
            guess = %side,
            stake = %stake,
            "duel settled"
        );

        let mut events = Vec::with_capacity(4);
        for recipient in [dealer.clone(), guesser.clone()] {
            events.push(ServerEvent::DuelDealt {
                player_id: recipient,
                match_id,
                andar: andar.clone(),
                bahar: bahar.clone(),
                winning_side,
            });
        }
        for (recipient, role) in [(dealer, DuelRole::Dealer), (guesser, DuelRole::Guesser)] {
            let balance = if recipient == winner {
                winner_balance
            } else {
                loser_balance
            };
            events.push(ServerEvent::DuelResult {
                player_id: recipient,
                match_id,
                winner: winner.clone(),
                your_role: role,
                balance,
            });
        }
        Ok(events)
    }

    /// Advances one logical second: retries stalled pairings, counts down
    /// match start delays, and voids idle matches.
    pub fn tick(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        self.try_pair(&mut events);

        let ids: Vec<u64> = self.matches.keys().copied().collect();
        for match_id in ids {
            let step = match self.matches.get_mut(&match_id) {
                Some(duel) => duel.step(),
                None => continue,
            };
            match step {
                MatchStep::Waiting => {}
                MatchStep::StartReady => self.start_or_void(match_id, &mut events),
                MatchStep::ChoiceTimedOut => {
                    let reasons = self.reasons_for_both(match_id, "the call timed out");
                    self.void_match(match_id, &reasons, &mut events);
                }
            }
        }
        events
    }

    /// Queue drop is silent; an in-flight match voids and the opponent is
    /// told.
    pub fn handle_disconnect(&mut self, player: &str) -> Vec<ServerEvent> {
        if let Some(index) = self.queue.iter().position(|(queued, _)| queued == player) {
            self.queue.remove(index);
        }
        let mut events = Vec::new();
        if let Some(&match_id) = self.by_player.get(player) {
            let opponent = self.matches.get(&match_id).map(|duel| {
                if duel.dealer == player {
                    duel.guesser.clone()
                } else {
                    duel.dealer.clone()
                }
            });
            let reasons: Vec<(PlayerId, String)> = opponent
                .into_iter()
                .map(|opponent| (opponent, "opponent disconnected".to_string()))
                .collect();
            info!(player, match_id, "duel abandoned by disconnect");
            self.void_match(match_id, &reasons, &mut events);
        }
        events
    }

    fn try_pair(&mut self, events: &mut Vec<ServerEvent>) {
        while self.queue.len() >= 2 {
            let (first, stake) = match self.queue.pop_front() {
                Some(entry) => entry,
                None => break,
            };
            let (second, second_stake) = match self.queue.pop_front() {
                Some(entry) => entry,
                None => {
                    self.queue.push_front((first, stake));
                    break;
                }
            };
            match self.ledger.create_game(GameKind::AndarBahar) {
                Ok(match_id) => {
                    let (dealer, guesser) = match self.rng.assign_role() {
                        DuelRole::Dealer => (first, second),
                        DuelRole::Guesser => (second, first),
                    };
                    // The earlier player's stake prices the match.
                    self.by_player.insert(dealer.clone(), match_id);
                    self.by_player.insert(guesser.clone(), match_id);
                    self.matches.insert(
                        match_id,
                        DuelMatch {
                            dealer: dealer.clone(),
                            guesser: guesser.clone(),
                            stake,
                            phase: MatchPhase::Starting {
                                countdown: self.config.start_delay_secs,
                            },
                        },
                    );
                    self.matches_started = self.matches_started.saturating_add(1);
                    info!(match_id, dealer = %dealer, guesser = %guesser, stake = %stake, "duel matched");

                    let dealer_opponent = self.display_name(&guesser);
                    let guesser_opponent = self.display_name(&dealer);
                    events.push(ServerEvent::DuelMatched {
                        player_id: dealer,
                        match_id,
                        role: DuelRole::Dealer,
                        opponent: dealer_opponent,
                        stake,
                    });
                    events.push(ServerEvent::DuelMatched {
                        player_id: guesser,
                        match_id,
                        role: DuelRole::Guesser,
                        opponent: guesser_opponent,
                        stake,
                    });
                }
                Err(err) => {
                    warn!(%err, "could not open a duel record; players stay queued");
                    self.queue.push_front((second, second_stake));
                    self.queue.push_front((first, stake));
                    break;
                }
            }
        }
    }

    /// End of the start delay: both players must still cover the stake,
    /// then the joker goes on the table.
    fn start_or_void(&mut self, match_id: u64, events: &mut Vec<ServerEvent>) {
        let (dealer, guesser, stake) = match self.matches.get(&match_id) {
            Some(duel) => (duel.dealer.clone(), duel.guesser.clone(), duel.stake),
            None => return,
        };
        let dealer_ok = self.funded(&dealer, stake);
        let guesser_ok = self.funded(&guesser, stake);
        if dealer_ok && guesser_ok {
            let joker = self.rng.draw_card();
            if let Some(duel) = self.matches.get_mut(&match_id) {
                duel.phase = MatchPhase::Choosing {
                    joker,
                    idle: self.config.choice_timeout_secs,
                };
            }
            info!(match_id, joker = %joker, "joker on the table");
            for player in [dealer, guesser] {
                events.push(ServerEvent::JokerRevealed {
                    player_id: player,
                    match_id,
                    joker,
                });
            }
        } else {
            let reason_for = |ok: bool| {
                if ok {
                    "opponent could not cover the stake"
                } else {
                    "insufficient chips to cover the stake"
                }
            };
            let reasons = vec![
                (dealer, reason_for(dealer_ok).to_string()),
                (guesser, reason_for(guesser_ok).to_string()),
            ];
            self.void_match(match_id, &reasons, events);
        }
    }

    fn funded(&self, player: &str, stake: Chips) -> bool {
        match self.ledger.player_balance(player) {
            Ok(balance) => balance >= stake,
            Err(err) => {
                warn!(player, %err, "balance check failed at match start");
                false
            }
        }
    }

    fn reasons_for_both(&self, match_id: u64, reason: &str) -> Vec<(PlayerId, String)> {
        match self.matches.get(&match_id) {
            Some(duel) => vec![
                (duel.dealer.clone(), reason.to_string()),
                (duel.guesser.clone(), reason.to_string()),
            ],
            None => Vec::new(),
        }
    }

    fn void_match(
        &mut self,
        match_id: u64,
        reasons: &[(PlayerId, String)],
        events: &mut Vec<ServerEvent>,
    ) {
        let duel = match self.matches.remove(&match_id) {
            Some(duel) => duel,
            None => return,
        };
        self.by_player.remove(&duel.dealer);
        self.by_player.remove(&duel.guesser);
        if let Err(err) = self.ledger.mark_game_completed(match_id) {
            warn!(match_id, %err, "could not close the voided duel record");
        }
        info!(match_id, "duel voided");
        for (player, reason) in reasons {
            events.push(ServerEvent::DuelCancelled {
                player_id: player.clone(),
                match_id,
                reason: reason.clone(),
            });
        }
    }

    fn display_name(&self, player: &str) -> String {
        self.ledger
            .player_name(player)
            .unwrap_or_else(|_| player.to_string())
    }
}

/// Deals the piles for a joker: the joker's own card is skipped, the first
/// card lands on andar for a black joker and bahar for a red one, the deal
/// alternates, and it stops the moment a card matches the joker's rank.
/// That pile wins.
fn deal_piles(cards: Vec<Card>, joker: Card) -> (Vec<Card>, Vec<Card>, PileSide) {
    let mut andar = Vec::new();
    let mut bahar = Vec::new();
    let mut side = if joker.color() == Color::Black {
        PileSide::Andar
    } else {
        PileSide::Bahar
    };
    for card in cards.into_iter().filter(|card| *card != joker) {
        let hit = card.rank() == joker.rank();
        match side {
            PileSide::Andar => andar.push(card),
            PileSide::Bahar => bahar.push(card),
        }
        if hit {
            return (andar, bahar, side);
        }
        side = side.other();
    }
    // A full deck always holds three more cards of the joker's rank, so
    // falling out of the loop means the caller handed us a short deck.
    (andar, bahar, side)
}
