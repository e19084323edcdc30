//! Admin override slot.
//!
//! Operators can force the *category* of the next outcome (never a specific
//! card) while a round is still open. The slot holds at most one entry per
//! engine; repeated writes replace it (last write wins). The engine consumes
//! the entry at the betting freeze and clears the slot unconditionally at
//! round end, so an unconsumed override can never leak into a later round.

use crate::ledger::GameId;

#[derive(Debug)]
pub struct OverrideSlot<T> {
    entry: Option<(GameId, T)>,
}

impl<T> Default for OverrideSlot<T> {
    fn default() -> Self {
        OverrideSlot { entry: None }
    }
}

impl<T> OverrideSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot for `game_id`, replacing any previous entry. Callers
    /// must have validated that `game_id` is the current round and that the
    /// outcome is still open.
    pub fn arm(&mut self, game_id: GameId, value: T) {
        self.entry = Some((game_id, value));
    }

    /// Consumes the entry if it targets `game_id`; a mismatched entry stays
    /// put for the round-end clear.
    pub fn take_for(&mut self, game_id: GameId) -> Option<T> {
        match self.entry.take() {
            Some((armed, value)) if armed == game_id => Some(value),
            other => {
                self.entry = other;
                None
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.entry.is_some()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut slot = OverrideSlot::new();
        slot.arm(1, "red");
        slot.arm(1, "black");
        assert_eq!(slot.take_for(1), Some("black"));
        assert!(!slot.is_armed());
    }

    #[test]
    fn take_is_single_use() {
        let mut slot = OverrideSlot::new();
        slot.arm(3, 7u8);
        assert_eq!(slot.take_for(3), Some(7));
        assert_eq!(slot.take_for(3), None);
    }

    #[test]
    fn mismatched_game_id_is_not_consumed() {
        let mut slot = OverrideSlot::new();
        slot.arm(4, 'x');
        assert_eq!(slot.take_for(9), None);
        assert!(slot.is_armed());
        slot.clear();
        assert!(!slot.is_armed());
    }
}
