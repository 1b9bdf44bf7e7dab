//! Spawner: fills empty slots with new items while keeping the board solvable.

use crate::grid::{Axis, Grid, Pos};
use crate::item::{Catalog, ItemId};
use crate::matcher;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

/// Chance that a spawned item is drawn from the special pool.
pub const DEFAULT_SPECIAL_CHANCE: f64 = 0.1;
/// Redraws allowed before the forced fallback kicks in.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSettings {
    pub special_chance: f64,
    pub max_retries: u32,
    /// Fixed seed for reproducible boards; entropy when None.
    pub seed: Option<u64>,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            special_chance: DEFAULT_SPECIAL_CHANCE,
            max_retries: DEFAULT_MAX_RETRIES,
            seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Spawner {
    rng: StdRng,
    special_chance: f64,
    max_retries: u32,
}

impl Spawner {
    pub fn new(settings: &SpawnSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            special_chance: settings.special_chance.clamp(0.0, 1.0),
            max_retries: settings.max_retries,
        }
    }

    /// One item: special with `special_chance` when the level has specials.
    pub fn draw(&mut self, catalog: &Catalog) -> ItemId {
        let specials = catalog.special_items();
        if !specials.is_empty() && self.rng.gen_bool(self.special_chance) {
            if let Some(&id) = specials.choose(&mut self.rng) {
                return id;
            }
        }
        self.draw_ordinary(catalog)
    }

    fn draw_ordinary(&mut self, catalog: &Catalog) -> ItemId {
        let items = catalog.items_for_level();
        items[self.rng.gen_range(0..items.len())]
    }

    /// Fill every empty slot at level start.
    ///
    /// Items are ordinary and chosen so that no region pops right away. The board must
    /// end stable: no ready match and at least one legal move. Random fills are redrawn
    /// up to `max_retries` times; after that, or when the authored layout itself is not
    /// stable, the board is settled in place. Returns every position whose item changed.
    pub fn fill(&mut self, grid: &mut Grid, catalog: &Catalog) -> Vec<Pos> {
        let slots: Vec<Pos> = grid.positions().filter(|&p| grid.is_empty(p)).collect();
        if !slots.is_empty() {
            for attempt in 0..=self.max_retries {
                for &pos in &slots {
                    grid.set_item(pos, None);
                }
                for &pos in &slots {
                    let item = self.draw_quiet(grid, catalog, pos);
                    grid.set_item(pos, Some(item));
                }
                if is_stable(grid, catalog) {
                    debug!(attempt, filled = slots.len(), "initial fill");
                    return slots;
                }
            }
            warn!(retries = self.max_retries, "initial fill is not stable; settling it");
        }
        let settled = self.settle(grid, catalog);
        merge(slots, settled)
    }

    /// Clear ready matches and force a legal move until the board is stable. Cleared
    /// tiles are refilled quietly after gravity; nothing is scored. Returns the
    /// positions whose item differs from before.
    fn settle(&mut self, grid: &mut Grid, catalog: &Catalog) -> Vec<Pos> {
        let before = grid.clone();
        let limit = (self.max_retries as usize + 1) * grid.width() * grid.height();
        let mut settled = false;
        for _ in 0..limit {
            let ready = Axis::ALL
                .into_iter()
                .find_map(|axis| matcher::first_poppable(grid, catalog, axis));
            if let Some(region) = ready {
                debug!(origin = %region[0], size = region.len(), "clearing ready match");
                for &pos in &region {
                    grid.set_item(pos, None);
                }
                loop {
                    let moves = grid.plan_drop();
                    if moves.is_empty() {
                        break;
                    }
                    grid.apply_drop(&moves);
                }
                let empties: Vec<Pos> = grid.positions().filter(|&p| grid.is_empty(p)).collect();
                for pos in empties {
                    let item = self.draw_quiet(grid, catalog, pos);
                    grid.set_item(pos, Some(item));
                }
                continue;
            }
            if matcher::has_any_legal_move(grid, catalog) {
                settled = true;
                break;
            }
            let playable: Vec<Pos> = grid.positions().filter(|&p| !grid.is_obstacle(p)).collect();
            self.force_solvable(grid, catalog, &playable);
        }
        if !settled {
            warn!(limit, "board could not be settled");
        }
        grid.positions()
            .filter(|&p| grid.item(p) != before.item(p))
            .collect()
    }

    /// Ordinary item for `pos` that does not complete a run, if one exists.
    fn draw_quiet(&mut self, grid: &mut Grid, catalog: &Catalog, pos: Pos) -> ItemId {
        let mut candidates = catalog.items_for_level().to_vec();
        candidates.shuffle(&mut self.rng);
        for &item in &candidates {
            grid.set_item(pos, Some(item));
            let pops = Axis::ALL.into_iter().any(|axis| {
                matcher::is_poppable(&matcher::connected_tiles(grid, catalog, pos, axis))
            });
            grid.set_item(pos, None);
            if !pops {
                return item;
            }
        }
        candidates[0]
    }

    /// One spawn wave: empty slots in row 0 or right below an obstacle get new items.
    ///
    /// When the wave fills the last empty slots, the board must keep a legal move:
    /// the draw is redone up to `max_retries` times, then forced. `skip_check` turns
    /// the verification off (goal already reached). Returns every position whose item
    /// was set.
    pub fn spawn_wave(&mut self, grid: &mut Grid, catalog: &Catalog, skip_check: bool) -> Vec<Pos> {
        let slots = grid.spawn_slots();
        if slots.is_empty() {
            return slots;
        }
        let completes = slots.len() == grid.empty_count();
        if !completes || skip_check {
            self.assign(grid, catalog, &slots);
            return slots;
        }
        for attempt in 0..=self.max_retries {
            self.assign(grid, catalog, &slots);
            if matcher::has_any_legal_move(grid, catalog) {
                debug!(attempt, spawned = slots.len(), "spawn wave verified");
                return slots;
            }
        }
        warn!(retries = self.max_retries, "spawn left no legal move; forcing one");
        let forced = self.force_solvable(grid, catalog, &slots);
        merge(slots, forced)
    }

    fn assign(&mut self, grid: &mut Grid, catalog: &Catalog, slots: &[Pos]) {
        for &pos in slots {
            let item = self.draw(catalog);
            grid.set_item(pos, Some(item));
        }
    }

    /// Make sure a legal move exists. Returns the positions that were rewritten.
    ///
    /// First tries every single-slot substitution (ordinary items, then specials). If
    /// none works, writes a known pattern onto the grid's playable shape: x x y on
    /// three slots in a line and x next to the y, so swapping the last two matches.
    pub fn force_solvable(&mut self, grid: &mut Grid, catalog: &Catalog, slots: &[Pos]) -> Vec<Pos> {
        if matcher::has_any_legal_move(grid, catalog) {
            return Vec::new();
        }
        let candidates: Vec<ItemId> = catalog
            .items_for_level()
            .iter()
            .chain(catalog.special_items())
            .copied()
            .collect();
        for &slot in slots {
            let original = grid.item(slot);
            for &item in &candidates {
                grid.set_item(slot, Some(item));
                if matcher::poppable_axis(grid, catalog).is_none()
                    && matcher::has_any_legal_move(grid, catalog)
                {
                    debug!(%slot, ?item, "forced single substitution");
                    return vec![slot];
                }
            }
            grid.set_item(slot, original);
        }

        let Some((a, b, c, d)) = grid.playable_shape() else {
            return Vec::new();
        };
        let originals = [a, b, c, d].map(|p| grid.item(p));
        let items = catalog.items_for_level();
        let mut fallback = None;
        for &x in items {
            for &y in items.iter().filter(|&&y| y != x) {
                for (pos, item) in [(a, x), (b, x), (c, y), (d, x)] {
                    grid.set_item(pos, Some(item));
                }
                if matcher::poppable_axis(grid, catalog).is_none() {
                    debug!(%a, %d, "forced pattern");
                    return vec![a, b, c, d];
                }
                fallback.get_or_insert((x, y));
            }
        }
        // Every pattern pops immediately; keep the first, the cascade resolves it.
        match fallback {
            Some((x, y)) => {
                for (pos, item) in [(a, x), (b, x), (c, y), (d, x)] {
                    grid.set_item(pos, Some(item));
                }
                vec![a, b, c, d]
            }
            None => {
                for (pos, item) in [a, b, c, d].into_iter().zip(originals) {
                    grid.set_item(pos, item);
                }
                Vec::new()
            }
        }
    }
}

/// Full, no ready match, and at least one legal move.
pub fn is_stable(grid: &mut Grid, catalog: &Catalog) -> bool {
    !grid.has_empty()
        && matcher::poppable_axis(grid, catalog).is_none()
        && matcher::has_any_legal_move(grid, catalog)
}

fn merge(mut changed: Vec<Pos>, extra: Vec<Pos>) -> Vec<Pos> {
    for pos in extra {
        if !changed.contains(&pos) {
            changed.push(pos);
        }
    }
    changed
}
