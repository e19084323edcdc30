//! Cumulative house accounting.
//!
//! One [`HouseStats`] lives inside each shared-round engine and is updated
//! exactly once per settled round. It is never reset while the process
//! lives; rounds come and go, the totals stay.

use parlor_types::{api::HouseStatsSummary, Chips};

#[derive(Debug, Default)]
pub struct HouseStats {
    total_wagered: Chips,
    total_paid_out: Chips,
    /// Signed, cents. Negative when the players are ahead.
    profit_cents: i64,
    last_round_profit_cents: i64,
    rounds_settled: u64,
}

impl HouseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one settled round into the totals and returns that round's
    /// house profit in cents (`wagered - paid`, signed).
    pub fn record_round(&mut self, wagered: Chips, paid: Chips) -> i64 {
        let profit = wagered.signed_diff_cents(paid);
        self.total_wagered = self.total_wagered.saturating_add(wagered);
        self.total_paid_out = self.total_paid_out.saturating_add(paid);
        self.profit_cents = self.profit_cents.saturating_add(profit);
        self.last_round_profit_cents = profit;
        self.rounds_settled = self.rounds_settled.saturating_add(1);
        profit
    }

    pub fn rounds_settled(&self) -> u64 {
        self.rounds_settled
    }

    pub fn total_wagered(&self) -> Chips {
        self.total_wagered
    }

    /// House edge so far: profit / total wagered, as a percentage. Zero
    /// while nothing has been wagered.
    pub fn edge_percent(&self) -> f64 {
        if self.total_wagered.is_zero() {
            return 0.0;
        }
        self.profit_cents as f64 / self.total_wagered.cents() as f64 * 100.0
    }

    pub fn summary(&self) -> HouseStatsSummary {
        HouseStatsSummary {
            total_wagered: self.total_wagered,
            total_paid_out: self.total_paid_out,
            house_profit: self.profit_cents as f64 / 100.0,
            last_round_profit: self.last_round_profit_cents as f64 / 100.0,
            rounds_settled: self.rounds_settled,
            edge_percent: self.edge_percent(),
        }
    }
}
