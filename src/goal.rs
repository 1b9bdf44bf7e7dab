//! Goal ledger: remaining target counts and the move budget.

use crate::item::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goal {
    pub item: ItemId,
    pub remaining: u32,
}

/// Tracks target items and moves. Counts never go below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalLedger {
    goals: Vec<Goal>,
    moves_left: u32,
    finished: bool,
}

impl GoalLedger {
    /// Repeated targets are merged. A ledger with no targets is never finished.
    pub fn new(targets: &[(ItemId, u32)], moves: u32) -> Self {
        let mut goals: Vec<Goal> = Vec::with_capacity(targets.len());
        for &(item, count) in targets {
            match goals.iter_mut().find(|g| g.item == item) {
                Some(goal) => goal.remaining += count,
                None => goals.push(Goal {
                    item,
                    remaining: count,
                }),
            }
        }
        let mut ledger = Self {
            goals,
            moves_left: moves,
            finished: false,
        };
        ledger.recompute();
        ledger
    }

    /// Count one popped item against its target, if tracked.
    pub fn register_pop(&mut self, item: ItemId) {
        if let Some(goal) = self
            .goals
            .iter_mut()
            .find(|g| g.item == item && g.remaining > 0)
        {
            goal.remaining -= 1;
        }
        self.recompute();
    }

    /// Spend one move. Returns true when the budget is exhausted afterwards.
    /// Once the goal is finished no further moves are spent.
    pub fn consume_move(&mut self) -> bool {
        if !self.finished {
            self.moves_left = self.moves_left.saturating_sub(1);
        }
        self.is_out_of_moves()
    }

    pub fn add_move(&mut self) {
        self.moves_left = self.moves_left.saturating_add(1);
    }

    fn recompute(&mut self) {
        self.finished = !self.goals.is_empty() && self.goals.iter().all(|g| g.remaining == 0);
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn remaining(&self, item: ItemId) -> Option<u32> {
        self.goals.iter().find(|g| g.item == item).map(|g| g.remaining)
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_out_of_moves(&self) -> bool {
        self.moves_left == 0
    }
}
