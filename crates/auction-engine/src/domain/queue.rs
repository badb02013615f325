//! §4.2 "Queue State" (C2). Pure, in-memory operations on [`QueueState`] —
//! no I/O, so every invariant in §8 (P6, P7, P8) is a plain unit test here.
//! The persistence boundary loads/stores this whole struct as one JSON blob
//! (§6 "Persisted state layout").

use {
    crate::domain::{error::EngineError, money::Money},
    auction_storage::{PlayerId, TeamId},
    serde::{Deserialize, Serialize},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Sold,
    Unsold,
    Deferred,
}

/// §3 "HistoryEntry". Appended on each settlement action, popped on UNDO.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub player_id: PlayerId,
    pub team_id: Option<TeamId>,
    pub price: Money,
    pub action: Action,
}

/// §3 "QueueState (per Auction)".
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    pub queue: Vec<PlayerId>,
    pub index: usize,
    pub deferred: Vec<PlayerId>,
    pub unsold: Vec<PlayerId>,
    pub history: Vec<HistoryEntry>,
    pub started: bool,
}

impl QueueState {
    pub fn new(queue: Vec<PlayerId>) -> Self {
        Self { queue, index: 0, deferred: Vec::new(), unsold: Vec::new(), history: Vec::new(), started: false }
    }

    pub fn current(&self) -> Option<PlayerId> {
        self.queue.get(self.index).copied()
    }

    pub fn advance(&mut self) {
        self.index += 1;
    }

    /// Removes the player at the cursor without advancing, and appends it to
    /// `deferred`. Downstream ordering is preserved automatically: once the
    /// element at `index` is removed, the next queue entry slides into its
    /// place.
    pub fn defer(&mut self, player_id: PlayerId) -> Result<(), EngineError> {
        if self.current() != Some(player_id) {
            return Err(EngineError::precondition("defer target is not the current player"));
        }
        self.queue.remove(self.index);
        self.deferred.push(player_id);
        Ok(())
    }

    pub fn mark_unsold(&mut self, player_id: PlayerId) -> Result<(), EngineError> {
        if self.current() != Some(player_id) {
            return Err(EngineError::precondition("unsold target is not the current player"));
        }
        self.unsold.push(player_id);
        self.advance();
        Ok(())
    }

    /// §4.2 `autoReturnIfExhausted`, §8 P8. Returns whether it did anything.
    pub fn auto_return_if_exhausted(&mut self) -> bool {
        if self.index >= self.queue.len() && !self.deferred.is_empty() {
            self.queue.append(&mut self.deferred);
            true
        } else {
            false
        }
    }

    /// §4.2 "UNDO semantics". Single-step: inverts exactly the entry passed
    /// in, which callers obtain by popping `history` (see
    /// [`QueueState::pop_history`]).
    pub fn undo(&mut self, entry: &HistoryEntry) -> Result<(), EngineError> {
        match entry.action {
            Action::Sold => self.decrement_index()?,
            Action::Unsold => {
                remove_one(&mut self.unsold, entry.player_id);
                self.decrement_index()?;
            }
            Action::Deferred => {
                if let Some(pos) = self.deferred.iter().position(|&p| p == entry.player_id) {
                    self.deferred.remove(pos);
                } else if let Some(pos) = self.queue.iter().position(|&p| p == entry.player_id) {
                    self.queue.remove(pos);
                } else {
                    return Err(EngineError::precondition("deferred player not found to undo"));
                }
                self.queue.insert(self.index, entry.player_id);
            }
        }
        Ok(())
    }

    fn decrement_index(&mut self) -> Result<(), EngineError> {
        self.index = self
            .index
            .checked_sub(1)
            .ok_or_else(|| EngineError::precondition("cannot undo: index already at 0"))?;
        Ok(())
    }

    /// §4.2 "UNDO is single-step only: it pops the last HistoryEntry.
    /// Failure if history is empty".
    pub fn pop_history(&mut self) -> Result<HistoryEntry, EngineError> {
        self.history.pop().ok_or_else(|| EngineError::precondition("nothing to undo"))
    }

    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}

fn remove_one(items: &mut Vec<PlayerId>, target: PlayerId) {
    if let Some(pos) = items.iter().position(|&p| p == target) {
        items.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u128) -> PlayerId {
        PlayerId(uuid::Uuid::from_u128(n))
    }

    #[test]
    fn defer_and_auto_return_scenario_from_spec() {
        let (p1, p2, p3) = (pid(1), pid(2), pid(3));
        let mut queue = QueueState::new(vec![p1, p2, p3]);

        queue.defer(p1).unwrap();
        assert_eq!(queue.queue, vec![p2, p3]);
        assert_eq!(queue.index, 0);
        assert_eq!(queue.deferred, vec![p1]);

        queue.advance(); // SOLD p2
        queue.advance(); // SOLD p3
        assert_eq!(queue.index, 2);

        let returned = queue.auto_return_if_exhausted();
        assert!(returned);
        assert_eq!(queue.queue, vec![p2, p3, p1]);
        assert_eq!(queue.current(), Some(p1));
    }

    #[test]
    fn undo_of_sold_restores_index() {
        let (p1, p2) = (pid(1), pid(2));
        let mut queue = QueueState::new(vec![p1, p2]);
        queue.advance();
        queue.push_history(HistoryEntry { player_id: p1, team_id: None, price: Money(100), action: Action::Sold });
        assert_eq!(queue.current(), Some(p2));

        let entry = queue.pop_history().unwrap();
        queue.undo(&entry).unwrap();
        assert_eq!(queue.index, 0);
        assert_eq!(queue.current(), Some(p1));
    }

    #[test]
    fn undo_of_deferred_after_auto_return_finds_it_in_the_requeued_tail() {
        let (p1, p2, p3) = (pid(1), pid(2), pid(3));
        let mut queue = QueueState::new(vec![p1, p2, p3]);
        queue.defer(p1).unwrap();
        queue.push_history(HistoryEntry { player_id: p1, team_id: None, price: Money(0), action: Action::Deferred });
        queue.advance();
        queue.advance();
        queue.auto_return_if_exhausted();
        assert_eq!(queue.queue, vec![p2, p3, p1]);

        let entry = queue.pop_history().unwrap();
        queue.undo(&entry).unwrap();
        assert_eq!(queue.current(), Some(p1));
        assert!(!queue.queue.contains(&p1) || queue.queue.iter().filter(|&&p| p == p1).count() == 1);
    }

    #[test]
    fn undo_with_empty_history_fails() {
        let mut queue = QueueState::new(vec![pid(1)]);
        assert!(queue.pop_history().is_err());
    }
}
