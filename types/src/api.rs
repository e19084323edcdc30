//! JSON wire surface between clients, the gateway, and the admin tooling.
//!
//! Messages are tagged with a `type` field and use camelCase keys. Requests
//! carry a client-chosen `requestId` that the matching ack or error echoes
//! back; everything else flows as server events, either broadcast to a room
//! or targeted at one player (see [`ServerEvent::audience`]).

use crate::{
    bets::{BetSelection, CoinSide, DuelRole, PileSide},
    cards::Card,
    chips::Chips,
    PlayerId,
};
use serde::{Deserialize, Serialize};

/// The three games a connection can talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    Lucky7,
    CoinToss,
    AndarBahar,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Lucky7 => "lucky7",
            GameKind::CoinToss => "coinToss",
            GameKind::AndarBahar => "andarBahar",
        }
    }
}

/// Public lifecycle label for a shared round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Waiting,
    Countdown,
    Revealed,
}

/// Explicit side+amount pair used when locking without a pending wager.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct LockInput {
    pub side: CoinSide,
    pub amount: Chips,
}

/// Messages clients send over the socket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Must be the first message on a connection.
    #[serde(rename = "join")]
    Join {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        name: Option<String>,
    },
    #[serde(rename = "placeBet")]
    PlaceBet {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        game: GameKind,
        bet: BetSelection,
        amount: Chips,
    },
    /// Coin Toss only: commit the pending wager, or the explicit one.
    #[serde(rename = "lockBet")]
    LockBet {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        bet: Option<LockInput>,
    },
    /// Coin Toss only: discard the pending (unlocked) wager.
    #[serde(rename = "cancelBet")]
    CancelBet {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    /// Lucky 7 only: re-submit last round's wagers.
    #[serde(rename = "repeatBets")]
    RepeatBets {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(rename = "joinDuelQueue")]
    JoinDuelQueue {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        stake: Chips,
    },
    #[serde(rename = "leaveDuelQueue")]
    LeaveDuelQueue {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(rename = "chooseSide")]
    ChooseSide {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        side: PileSide,
    },
}

impl ClientMessage {
    pub fn request_id(&self) -> &str {
        match self {
            ClientMessage::Join { request_id, .. }
            | ClientMessage::PlaceBet { request_id, .. }
            | ClientMessage::LockBet { request_id, .. }
            | ClientMessage::CancelBet { request_id, .. }
            | ClientMessage::RepeatBets { request_id, .. }
            | ClientMessage::JoinDuelQueue { request_id, .. }
            | ClientMessage::LeaveDuelQueue { request_id, .. }
            | ClientMessage::ChooseSide { request_id, .. } => request_id,
        }
    }

    pub fn player_id(&self) -> &str {
        match self {
            ClientMessage::Join { player_id, .. }
            | ClientMessage::PlaceBet { player_id, .. }
            | ClientMessage::LockBet { player_id, .. }
            | ClientMessage::CancelBet { player_id, .. }
            | ClientMessage::RepeatBets { player_id, .. }
            | ClientMessage::JoinDuelQueue { player_id, .. }
            | ClientMessage::LeaveDuelQueue { player_id, .. }
            | ClientMessage::ChooseSide { player_id, .. } => player_id,
        }
    }
}

/// Direct reply to one request.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    #[serde(rename = "ack")]
    Ack {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "requestId")]
        request_id: String,
        code: String,
        message: String,
    },
}

/// A wager as shown back to clients.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BetView {
    #[serde(rename = "type")]
    pub kind: BetSelection,
    pub amount: Chips,
}

/// Settlement outcome of one wager.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WagerResult {
    pub bet: BetView,
    pub won: bool,
    pub payout: Chips,
}

/// Revealed outcome of a finished game, shape depending on the game.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeView {
    Card(Card),
    Coin(CoinSide),
    Pile(PileSide),
}

/// One entry of the recent-results feed.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RecentOutcome {
    #[serde(rename = "gameId")]
    pub game_id: u64,
    pub outcome: OutcomeView,
}

/// Public view of a shared round. Never carries the hidden outcome or any
/// other player's wagers.
#[derive(Clone, Debug, Serialize)]
pub struct RoomSnapshot {
    pub room: GameKind,
    pub status: RoundStatus,
    #[serde(rename = "roundNumber")]
    pub round_number: u64,
    #[serde(rename = "countdownTime", skip_serializing_if = "Option::is_none")]
    pub countdown_time: Option<u32>,
    #[serde(rename = "playersPresent")]
    pub players_present: usize,
    #[serde(rename = "wagerCount")]
    pub wager_count: usize,
}

/// Wagered total for one bet kind, admin snapshot only.
#[derive(Clone, Debug, Serialize)]
pub struct BetTotal {
    #[serde(rename = "type")]
    pub kind: BetSelection,
    pub total: Chips,
    pub count: u32,
}

/// Cumulative house accounting, admin snapshot only.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct HouseStatsSummary {
    #[serde(rename = "totalWagered")]
    pub total_wagered: Chips,
    #[serde(rename = "totalPaidOut")]
    pub total_paid_out: Chips,
    /// Signed, in chip units.
    #[serde(rename = "houseProfit")]
    pub house_profit: f64,
    #[serde(rename = "lastRoundProfit")]
    pub last_round_profit: f64,
    #[serde(rename = "roundsSettled")]
    pub rounds_settled: u64,
    #[serde(rename = "edgePercent")]
    pub edge_percent: f64,
}

/// Operator view of a round. The finalized outcome appears only once the
/// betting freeze has passed; before that there is nothing to leak.
#[derive(Clone, Debug, Serialize)]
pub struct AdminRoundSnapshot {
    pub room: GameKind,
    #[serde(rename = "gameId", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<u64>,
    pub status: RoundStatus,
    #[serde(rename = "roundNumber")]
    pub round_number: u64,
    #[serde(rename = "timeRemaining", skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
    #[serde(rename = "totalBets")]
    pub total_bets: Chips,
    #[serde(rename = "betsByType")]
    pub bets_by_type: Vec<BetTotal>,
    #[serde(rename = "currentOutcome", skip_serializing_if = "Option::is_none")]
    pub current_outcome: Option<OutcomeView>,
    #[serde(rename = "houseStats")]
    pub house_stats: HouseStatsSummary,
}

/// Who should receive a [`ServerEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience<'a> {
    Everyone,
    Player(&'a str),
}

/// Events pushed by the server. `player_id` fields mark targeted events;
/// the gateway filters them per connection.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "game-starting")]
    GameStarting {
        room: GameKind,
        #[serde(rename = "countdownTime")]
        countdown_time: u32,
        #[serde(rename = "roundNumber")]
        round_number: u64,
    },
    #[serde(rename = "countdown-tick")]
    CountdownTick {
        room: GameKind,
        time: u32,
    },
    #[serde(rename = "card-revealed")]
    CardRevealed {
        room: GameKind,
        card: Card,
    },
    #[serde(rename = "coin-revealed")]
    CoinRevealed {
        room: GameKind,
        outcome: CoinSide,
    },
    #[serde(rename = "round-ended")]
    RoundEnded {
        room: GameKind,
    },
    #[serde(rename = "room-state")]
    RoomState {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        snapshot: RoomSnapshot,
    },
    #[serde(rename = "recent-results")]
    RecentResults {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
        results: Vec<RecentOutcome>,
    },
    #[serde(rename = "bet-placed")]
    BetPlaced {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
        bet: BetView,
        #[serde(rename = "remainingChips")]
        remaining_chips: Chips,
    },
    #[serde(rename = "bet-locked")]
    BetLocked {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
        bet: BetView,
        #[serde(rename = "remainingChips")]
        remaining_chips: Chips,
    },
    #[serde(rename = "bets-cancelled")]
    BetsCancelled {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
    },
    #[serde(rename = "bet-error")]
    BetError {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
        message: String,
    },
    #[serde(rename = "round-result")]
    RoundResult {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        room: GameKind,
        results: Vec<WagerResult>,
        balance: Chips,
    },
    #[serde(rename = "queue-joined")]
    QueueJoined {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        position: usize,
    },
    #[serde(rename = "duel-matched")]
    DuelMatched {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        role: DuelRole,
        opponent: String,
        stake: Chips,
    },
    #[serde(rename = "joker-revealed")]
    JokerRevealed {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        joker: Card,
    },
    #[serde(rename = "duel-dealt")]
    DuelDealt {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        andar: Vec<Card>,
        bahar: Vec<Card>,
        #[serde(rename = "winningSide")]
        winning_side: PileSide,
    },
    #[serde(rename = "duel-result")]
    DuelResult {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        winner: PlayerId,
        #[serde(rename = "yourRole")]
        your_role: DuelRole,
        /// Absent when the ledger could not report a post-match balance.
        balance: Option<Chips>,
    },
    #[serde(rename = "duel-cancelled")]
    DuelCancelled {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "matchId")]
        match_id: u64,
        reason: String,
    },
}

impl ServerEvent {
    /// Broadcast scope of this event. Room-wide events go to every
    /// connection; targeted events only to sockets joined as that player.
    pub fn audience(&self) -> Audience<'_> {
        match self {
            ServerEvent::GameStarting { .. }
            | ServerEvent::CountdownTick { .. }
            | ServerEvent::CardRevealed { .. }
            | ServerEvent::CoinRevealed { .. }
            | ServerEvent::RoundEnded { .. } => Audience::Everyone,
            ServerEvent::RoomState { player_id, .. }
            | ServerEvent::RecentResults { player_id, .. }
            | ServerEvent::BetPlaced { player_id, .. }
            | ServerEvent::BetLocked { player_id, .. }
            | ServerEvent::BetsCancelled { player_id, .. }
            | ServerEvent::BetError { player_id, .. }
            | ServerEvent::RoundResult { player_id, .. }
            | ServerEvent::QueueJoined { player_id, .. }
            | ServerEvent::DuelMatched { player_id, .. }
            | ServerEvent::JokerRevealed { player_id, .. }
            | ServerEvent::DuelDealt { player_id, .. }
            | ServerEvent::DuelResult { player_id, .. }
            | ServerEvent::DuelCancelled { player_id, .. } => Audience::Player(player_id),
        }
    }
}
