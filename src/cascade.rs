//! Cascade controller: selection, swap, match, pop, drop, spawn, repeat.

use crate::effects;
use crate::goal::GoalLedger;
use crate::grid::{Axis, Grid, Pos, Tile};
use crate::item::Catalog;
use crate::matcher;
use crate::presenter::{HIDDEN, Listener, Presenter, SHOWN};
use crate::spawner::Spawner;
use tracing::{debug, info, trace};

/// Where the board is in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingSecondSelection,
    Swapping,
    Matching,
    Popping,
    Dropping,
    Spawning,
    GoalReached,
    MoveLimitReached,
}

impl Phase {
    pub fn accepts_selection(self) -> bool {
        matches!(self, Self::Idle | Self::AwaitingSecondSelection)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GoalReached | Self::MoveLimitReached)
    }
}

/// Result of one `select` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A cascade is running or the level is over.
    Ignored,
    /// Obstacle or out-of-bounds tile; selection cleared.
    Rejected,
    /// Tile is now the (only) selected one.
    Selected,
    /// The swap matched nothing and was undone. No move spent.
    Reverted,
    Resolved(TurnReport),
}

/// Summary of a resolved move, chain reactions included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub swap: (Pos, Pos),
    /// Axis the swap itself matched on.
    pub axis: Axis,
    /// Regions popped over the whole cascade.
    pub pops: u32,
    /// Tiles emptied, effects included.
    pub cleared: u32,
    pub score: u32,
    pub moves_left: u32,
    pub phase: Phase,
}

/// One grid and everything needed to play it. Owns the state; collaborators only see
/// positions.
#[derive(Debug)]
pub struct Board<P, L = ()> {
    grid: Grid,
    catalog: Catalog,
    ledger: GoalLedger,
    spawner: Spawner,
    selection: Vec<Pos>,
    phase: Phase,
    score: u32,
    presenter: P,
    listener: L,
}

impl<P: Presenter, L: Listener> Board<P, L> {
    /// Empty non-obstacle slots are filled by the spawner. A finished ledger or an
    /// exhausted budget puts the board straight into its terminal phase.
    pub fn new(
        mut grid: Grid,
        catalog: Catalog,
        ledger: GoalLedger,
        mut spawner: Spawner,
        presenter: P,
        listener: L,
    ) -> Self {
        spawner.fill(&mut grid, &catalog);
        let phase = if ledger.is_finished() {
            Phase::GoalReached
        } else if ledger.is_out_of_moves() {
            Phase::MoveLimitReached
        } else {
            Phase::Idle
        };
        Self {
            grid,
            catalog,
            ledger,
            spawner,
            selection: Vec::with_capacity(2),
            phase,
            score: 0,
            presenter,
            listener,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &GoalLedger {
        &self.ledger
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selection(&self) -> &[Pos] {
        &self.selection
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// A swap that would match, if any.
    pub fn hint(&mut self) -> Option<(Pos, Pos)> {
        matcher::find_legal_move(&mut self.grid, &self.catalog)
    }

    pub fn legal_moves(&mut self) -> Vec<(Pos, Pos)> {
        matcher::legal_moves(&mut self.grid, &self.catalog)
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "phase");
            self.phase = phase;
        }
    }

    /// Pick a tile. The second pick of an adjacent tile plays the swap and runs the
    /// whole cascade before returning.
    pub async fn select(&mut self, pos: Pos) -> SelectOutcome {
        if !self.phase.accepts_selection() {
            return SelectOutcome::Ignored;
        }
        if self.grid.tile(pos).is_none_or(Tile::is_obstacle) {
            debug!(%pos, "selection rejected");
            self.selection.clear();
            self.set_phase(Phase::Idle);
            return SelectOutcome::Rejected;
        }
        let first = match self.selection.first().copied() {
            None => {
                self.selection.push(pos);
                self.set_phase(Phase::AwaitingSecondSelection);
                return SelectOutcome::Selected;
            }
            Some(first) if first == pos => return SelectOutcome::Selected,
            Some(first) if first.is_adjacent(pos) => first,
            Some(_) => {
                self.selection.clear();
                self.selection.push(pos);
                return SelectOutcome::Selected;
            }
        };
        self.selection.push(pos);
        let outcome = self.play(first, pos).await;
        self.selection.clear();
        outcome
    }

    async fn play(&mut self, a: Pos, b: Pos) -> SelectOutcome {
        self.set_phase(Phase::Swapping);
        self.grid.swap_items(a, b);
        self.presenter.animate_move(a, b).await;

        self.set_phase(Phase::Matching);
        let Some(axis) = matcher::poppable_axis(&self.grid, &self.catalog) else {
            debug!(%a, %b, "no match, reverting swap");
            self.set_phase(Phase::Swapping);
            self.grid.swap_items(a, b);
            self.presenter.animate_move(a, b).await;
            self.set_phase(Phase::Idle);
            return SelectOutcome::Reverted;
        };
        self.ledger.consume_move();
        debug!(%a, %b, ?axis, moves_left = self.ledger.moves_left(), "move played");

        let mut report = TurnReport {
            swap: (a, b),
            axis,
            pops: 0,
            cleared: 0,
            score: 0,
            moves_left: 0,
            phase: Phase::Idle,
        };
        self.pop_all(axis, &mut report).await;
        self.settle(&mut report).await;
        self.finish_turn();

        report.moves_left = self.ledger.moves_left();
        report.phase = self.phase;
        SelectOutcome::Resolved(report)
    }

    /// Drop and spawn until the board is full, pop whatever matched, repeat until a
    /// pass changes nothing.
    async fn settle(&mut self, report: &mut TurnReport) {
        loop {
            if self.grid.has_empty() {
                self.set_phase(Phase::Dropping);
                self.drop_all().await;
                self.set_phase(Phase::Spawning);
                self.spawn_wave().await;
                continue;
            }
            self.set_phase(Phase::Matching);
            let Some(axis) = matcher::poppable_axis(&self.grid, &self.catalog) else {
                break;
            };
            self.pop_all(axis, report).await;
        }
    }

    /// Pop every poppable region on `axis`, rescanning from the top-left after each.
    async fn pop_all(&mut self, axis: Axis, report: &mut TurnReport) {
        self.set_phase(Phase::Popping);
        while let Some(region) = matcher::first_poppable(&self.grid, &self.catalog, axis) {
            let (cleared, gained) = self.pop_region(&region).await;
            report.pops += 1;
            report.cleared = report.cleared.saturating_add(cleared);
            report.score = report.score.saturating_add(gained);
        }
    }

    /// Empty one region, feeding the ledger and running special effects in order.
    /// Returns (tiles emptied, score gained).
    async fn pop_region(&mut self, region: &[Pos]) -> (u32, u32) {
        let value = self
            .grid
            .item(region[0])
            .map_or(0, |item| self.catalog.value(item));
        let gained = region_score(value, region.len());
        self.score = self.score.saturating_add(gained);
        self.listener.add_score(gained);

        let mut removed = Vec::with_capacity(region.len());
        for &pos in region {
            let Some(item) = self.grid.tile_mut(pos).and_then(Tile::take_item) else {
                continue;
            };
            self.ledger.register_pop(item);
            removed.push(pos);
            if let Some(effect) = self.catalog.effect(item) {
                removed.extend(effects::execute(effect, pos, &mut self.grid, &mut self.ledger));
            }
        }
        debug!(origin = %region[0], size = region.len(), removed = removed.len(), gained, "pop");
        self.presenter.animate_scale(&removed, HIDDEN).await;
        self.presenter.play_pop_sound();
        (removed.len() as u32, gained)
    }

    /// Gravity passes until nothing moves.
    async fn drop_all(&mut self) {
        loop {
            let moves = self.grid.plan_drop();
            if moves.is_empty() {
                break;
            }
            trace!(moves = moves.len(), "drop pass");
            self.grid.apply_drop(&moves);
            self.presenter.animate_moves(&moves).await;
        }
    }

    async fn spawn_wave(&mut self) {
        let spawned = self
            .spawner
            .spawn_wave(&mut self.grid, &self.catalog, self.ledger.is_finished());
        if !spawned.is_empty() {
            trace!(spawned = spawned.len(), "spawn wave");
            self.presenter.animate_scale(&spawned, SHOWN).await;
        }
    }

    fn finish_turn(&mut self) {
        if self.ledger.is_finished() {
            info!(score = self.score, "goal reached");
            self.set_phase(Phase::GoalReached);
            self.listener.on_goal_reached();
        } else if self.ledger.is_out_of_moves() {
            info!(score = self.score, "move limit reached");
            self.set_phase(Phase::MoveLimitReached);
            self.listener.on_move_limit_reached();
        } else {
            self.set_phase(Phase::Idle);
        }
    }
}

/// `value * max(1, n / 3) * n`.
pub fn region_score(value: u32, size: usize) -> u32 {
    let n = u32::try_from(size).unwrap_or(u32::MAX);
    value.saturating_mul((n / 3).max(1)).saturating_mul(n)
}
