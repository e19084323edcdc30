//! The three game rooms behind one lock.
//!
//! Every inbound request and the tick loop funnel through [`Rooms`], so
//! room state only ever changes under the mutex in
//! [`AppState`](crate::AppState). The engines themselves are synchronous;
//! nothing here awaits.

use crate::config::GatewayConfig;
use parlor_engine::{
    CoinTossRound, DuelMatchmaker, Error, GameId, Ledger, Lucky7Round, MemoryLedger, OutcomeRng,
};
use parlor_types::{
    api::{AdminRoundSnapshot, ClientMessage, GameKind, RecentOutcome, ServerEvent},
    BetSelection, CoinSide, Lucky7Bet,
};
use std::sync::Arc;
use tracing::warn;

pub struct Rooms {
    lucky7: Lucky7Round,
    coin_toss: CoinTossRound,
    duels: DuelMatchmaker,
    ledger: Arc<MemoryLedger>,
    recent_limit: usize,
}

impl Rooms {
    pub fn new(config: &GatewayConfig, ledger: Arc<MemoryLedger>) -> Rooms {
        Rooms {
            lucky7: Lucky7Round::new(
                config.lucky7.to_timing(),
                ledger.clone(),
                OutcomeRng::from_os_entropy(),
            ),
            coin_toss: CoinTossRound::new(
                config.coin_toss.to_timing(),
                ledger.clone(),
                OutcomeRng::from_os_entropy(),
            ),
            duels: DuelMatchmaker::new(
                config.duel.to_config(),
                ledger.clone(),
                OutcomeRng::from_os_entropy(),
            ),
            ledger,
            recent_limit: config.recent_results_limit,
        }
    }

    /// Advances every room by one logical second.
    pub fn tick_all(&mut self) -> Vec<ServerEvent> {
        let mut events = self.lucky7.tick();
        events.extend(self.coin_toss.tick());
        events.extend(self.duels.tick());
        events
    }

    /// Registers the player and returns their opening view: a snapshot of
    /// each room plus the recent-results feed.
    pub fn join(&mut self, player: &str, name: Option<&str>) -> Result<Vec<ServerEvent>, Error> {
        self.ledger.register_player(player, name)?;
        self.lucky7.join(player);
        self.coin_toss.join(player);

        let mut events = vec![
            ServerEvent::RoomState {
                player_id: player.to_string(),
                snapshot: self.lucky7.snapshot(),
            },
            ServerEvent::RoomState {
                player_id: player.to_string(),
                snapshot: self.coin_toss.snapshot(),
            },
            ServerEvent::RoomState {
                player_id: player.to_string(),
                snapshot: self.duels.snapshot(),
            },
        ];
        for kind in [GameKind::Lucky7, GameKind::CoinToss, GameKind::AndarBahar] {
            if let Some(event) = self.recent_results_event(player, kind) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// A history outage degrades to joining without the feed.
    fn recent_results_event(&self, player: &str, kind: GameKind) -> Option<ServerEvent> {
        if self.recent_limit == 0 {
            return None;
        }
        let records = match self.ledger.recent_games(kind, self.recent_limit) {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, room = kind.as_str(), "recent results unavailable");
                return None;
            }
        };
        let results = records
            .into_iter()
            .filter(|record| record.completed)
            .filter_map(|record| {
                record.outcome.map(|outcome| RecentOutcome {
                    game_id: record.game_id,
                    outcome,
                })
            })
            .collect();
        Some(ServerEvent::RecentResults {
            player_id: player.to_string(),
            room: kind,
            results,
        })
    }

    pub fn disconnect(&mut self, player: &str) -> Vec<ServerEvent> {
        self.lucky7.handle_disconnect(player);
        self.coin_toss.handle_disconnect(player);
        self.duels.handle_disconnect(player)
    }

    /// Routes one client request to its room. `Join` must have been
    /// screened by the connection layer first; it lands here so every
    /// message type has exactly one dispatch path.
    pub fn dispatch(&mut self, msg: &ClientMessage) -> Result<Vec<ServerEvent>, Error> {
        match msg {
            ClientMessage::Join {
                player_id, name, ..
            } => self.join(player_id, name.as_deref()),
            ClientMessage::PlaceBet {
                player_id,
                game,
                bet,
                amount,
                ..
            } => match (game, bet) {
                (GameKind::Lucky7, BetSelection::Table(bet)) => {
                    Ok(vec![self.lucky7.place_bet(player_id, *bet, *amount)?])
                }
                (GameKind::CoinToss, BetSelection::Coin(side)) => {
                    Ok(vec![self.coin_toss.place_bet(player_id, *side, *amount)?])
                }
                (GameKind::AndarBahar, _) => Err(Error::Validation(
                    "duels take stakes via joinDuelQueue".into(),
                )),
                _ => Err(Error::Validation(
                    "bet kind does not match the game".into(),
                )),
            },
            ClientMessage::LockBet { player_id, bet, .. } => {
                Ok(vec![self.coin_toss.lock_bet(player_id, *bet)?])
            }
            ClientMessage::CancelBet { player_id, .. } => {
                Ok(vec![self.coin_toss.cancel_bet(player_id)?])
            }
            ClientMessage::RepeatBets { player_id, .. } => self.lucky7.repeat_bets(player_id),
            ClientMessage::JoinDuelQueue {
                player_id, stake, ..
            } => self.duels.join_queue(player_id, *stake),
            ClientMessage::LeaveDuelQueue { player_id, .. } => {
                self.duels.leave_queue(player_id)?;
                Ok(Vec::new())
            }
            ClientMessage::ChooseSide {
                player_id,
                match_id,
                side,
                ..
            } => self.duels.choose_side(player_id, *match_id, *side),
        }
    }

    /// Arms an outcome override for round `game_id` of the named game.
    /// The engine reports acceptance; a stale id or a round past its
    /// freeze both come back `false`.
    pub fn set_override(
        &mut self,
        game: GameKind,
        game_id: GameId,
        outcome: &str,
    ) -> Result<bool, Error> {
        match game {
            GameKind::Lucky7 => {
                let category: Lucky7Bet = outcome.parse().map_err(|_| {
                    Error::Validation(format!("unknown lucky7 outcome {outcome:?}"))
                })?;
                Ok(self.lucky7.set_override(game_id, category))
            }
            GameKind::CoinToss => {
                let side: CoinSide = outcome.parse().map_err(|_| {
                    Error::Validation(format!("unknown coin toss outcome {outcome:?}"))
                })?;
                Ok(self.coin_toss.set_override(game_id, side))
            }
            GameKind::AndarBahar => Err(Error::Validation("duels cannot be overridden".into())),
        }
    }

    /// Operator round view. Duels have no shared round to inspect.
    pub fn admin_round(&self, game: GameKind) -> Option<AdminRoundSnapshot> {
        match game {
            GameKind::Lucky7 => Some(self.lucky7.admin_snapshot()),
            GameKind::CoinToss => Some(self.coin_toss.admin_snapshot()),
            GameKind::AndarBahar => None,
        }
    }
}
