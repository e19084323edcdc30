//! Round settlement.
//!
//! Settlement runs synchronously at reveal time, strictly before any reveal
//! event leaves the engine. Each wager resolves through the ledger exactly
//! once; a failed resolution is logged and skipped so one bad row can never
//! strand the rest of the round.

use crate::ledger::{BetId, Ledger};
use parlor_types::{
    api::{BetView, WagerResult},
    BetSelection, Chips, PlayerId,
};
use std::collections::HashMap;
use tracing::{error, warn};

/// A committed wager awaiting settlement. The debit already happened when
/// the ledger issued `bet_id`.
#[derive(Debug, Clone)]
pub struct PlacedWager {
    pub bet_id: BetId,
    pub player: PlayerId,
    pub kind: BetSelection,
    pub amount: Chips,
}

impl PlacedWager {
    pub fn view(&self) -> BetView {
        BetView {
            kind: self.kind,
            amount: self.amount,
        }
    }
}

/// Per-player slice of a settled round.
#[derive(Debug)]
pub struct PlayerSettlement {
    pub player: PlayerId,
    pub results: Vec<WagerResult>,
    /// Balance after the last successful resolution for this player.
    pub balance: Chips,
}

/// Aggregate result of settling one round.
#[derive(Debug, Default)]
pub struct RoundSettlement {
    /// Everything staked this round, including wagers whose resolution
    /// later failed (the house holds those chips either way).
    pub total_wagered: Chips,
    /// Everything actually credited back to players.
    pub total_paid: Chips,
    pub per_player: Vec<PlayerSettlement>,
    pub failures: u32,
}

/// Resolves every wager against the judge's verdict. Winning wagers pay
/// `amount * multiplier`; losing wagers pay nothing. Resolution order is
/// placement order, and per-player aggregation preserves it.
pub fn settle_round(
    ledger: &dyn Ledger,
    wagers: &[PlacedWager],
    judge: impl Fn(&PlacedWager) -> bool,
) -> RoundSettlement {
    let mut settlement = RoundSettlement::default();
    let mut order: Vec<PlayerId> = Vec::new();
    let mut grouped: HashMap<PlayerId, PlayerSettlement> = HashMap::new();

    for wager in wagers {
        settlement.total_wagered = settlement.total_wagered.saturating_add(wager.amount);

        let won = judge(wager);
        let payout = if won {
            match wager.amount.checked_mul(wager.kind.multiplier()) {
                Some(payout) => payout,
                None => {
                    // Wire caps make this unreachable; treat it as a failed
                    // resolution rather than paying a wrapped amount.
                    error!(bet_id = wager.bet_id, "payout overflow, skipping wager");
                    settlement.failures = settlement.failures.saturating_add(1);
                    continue;
                }
            }
        } else {
            Chips::ZERO
        };

        match ledger.resolve_bet(wager.bet_id, won, payout) {
            Ok(resolution) => {
                if won {
                    settlement.total_paid = settlement.total_paid.saturating_add(payout);
                }
                let entry = grouped.entry(wager.player.clone()).or_insert_with(|| {
                    order.push(wager.player.clone());
                    PlayerSettlement {
                        player: wager.player.clone(),
                        results: Vec::new(),
                        balance: resolution.balance,
                    }
                });
                entry.balance = resolution.balance;
                entry.results.push(WagerResult {
                    bet: wager.view(),
                    won,
                    payout,
                });
            }
            Err(err) => {
                // Keep settling: one stuck row must not strand the round.
                error!(
                    bet_id = wager.bet_id,
                    player = %wager.player,
                    %err,
                    "failed to resolve wager"
                );
                settlement.failures = settlement.failures.saturating_add(1);
            }
        }
    }

    if settlement.failures > 0 {
        warn!(
            failures = settlement.failures,
            total = wagers.len(),
            "round settled with unresolved wagers"
        );
    }

    settlement.per_player = order
        .into_iter()
        .filter_map(|player| grouped.remove(&player))
        .collect();
    settlement
}
