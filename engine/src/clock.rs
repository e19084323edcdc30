//! Round phase clock for the shared-table games.
//!
//! A round walks `Waiting -> Countdown -> Revealed -> Waiting` in logical
//! one-second steps. The clock is pure: it computes transitions and tells
//! the caller what must happen (`Freeze`, `Reveal`, `RoundOver`); engines
//! apply the effects. Keeping it free of I/O lets tests walk whole rounds
//! without a runtime or a wall clock.

use parlor_types::api::RoundStatus;

/// Durations for one round, in logical seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTiming {
    pub countdown_secs: u32,
    /// Wagers close when the countdown reaches this value (boundary
    /// exclusive: a wager at exactly the cutoff is rejected).
    pub freeze_cutoff_secs: u32,
    pub intermission_secs: u32,
}

impl RoundTiming {
    pub const LUCKY7: RoundTiming = RoundTiming {
        countdown_secs: 60,
        freeze_cutoff_secs: 10,
        intermission_secs: 6,
    };

    pub const COIN_TOSS: RoundTiming = RoundTiming {
        countdown_secs: 30,
        freeze_cutoff_secs: 10,
        intermission_secs: 6,
    };

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.countdown_secs == 0 {
            return Err("countdown must be non-zero");
        }
        if self.freeze_cutoff_secs == 0 {
            return Err("freeze cutoff must be non-zero");
        }
        if self.freeze_cutoff_secs >= self.countdown_secs {
            return Err("freeze cutoff must fall inside the countdown");
        }
        if self.intermission_secs == 0 {
            return Err("intermission must be non-zero");
        }
        Ok(())
    }

    /// Phase a freshly started round begins in.
    pub fn start_phase(&self) -> RoundPhase {
        RoundPhase::Countdown {
            remaining: self.countdown_secs,
        }
    }

    /// Whether wagers are currently accepted: only during the countdown and
    /// strictly before the freeze boundary.
    pub fn accepts_wagers(&self, phase: &RoundPhase) -> bool {
        matches!(phase, RoundPhase::Countdown { remaining } if *remaining > self.freeze_cutoff_secs)
    }

    /// Advance one logical second.
    pub fn step(&self, phase: RoundPhase) -> (RoundPhase, Step) {
        match phase {
            RoundPhase::Waiting => (RoundPhase::Waiting, Step::Idle),
            RoundPhase::Countdown { remaining } => {
                let next = remaining.saturating_sub(1);
                if next == 0 {
                    (
                        RoundPhase::Revealed {
                            linger: self.intermission_secs,
                        },
                        Step::Reveal,
                    )
                } else if next == self.freeze_cutoff_secs {
                    (RoundPhase::Countdown { remaining: next }, Step::Freeze { remaining: next })
                } else {
                    (RoundPhase::Countdown { remaining: next }, Step::Tick { remaining: next })
                }
            }
            RoundPhase::Revealed { linger } => {
                let next = linger.saturating_sub(1);
                if next == 0 {
                    (RoundPhase::Waiting, Step::RoundOver)
                } else {
                    (RoundPhase::Revealed { linger: next }, Step::Idle)
                }
            }
        }
    }
}

/// Lifecycle position of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// No round running; one starts as soon as a player is present.
    Waiting,
    Countdown { remaining: u32 },
    /// Outcome is public; the next round starts after the linger expires.
    Revealed { linger: u32 },
}

impl RoundPhase {
    pub fn status(&self) -> RoundStatus {
        match self {
            RoundPhase::Waiting => RoundStatus::Waiting,
            RoundPhase::Countdown { .. } => RoundStatus::Countdown,
            RoundPhase::Revealed { .. } => RoundStatus::Revealed,
        }
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        match self {
            RoundPhase::Countdown { remaining } => Some(*remaining),
            _ => None,
        }
    }
}

/// What one step of the clock requires from the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Idle,
    /// Countdown advanced; broadcast the new remaining time.
    Tick { remaining: u32 },
    /// Countdown reached the freeze boundary: close intake and finalize the
    /// outcome, then broadcast the tick.
    Freeze { remaining: u32 },
    /// Countdown expired: settle every wager, persist, and only then reveal.
    Reveal,
    /// Intermission expired: clear per-round state.
    RoundOver,
}
