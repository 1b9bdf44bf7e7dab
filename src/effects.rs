//! Special-item effects. They only touch tile contents and the ledger; the cascade
//! controller decides what happens next.

use crate::goal::GoalLedger;
use crate::grid::{Grid, Pos};
use crate::item::Effect;
use tracing::debug;

/// Run `effect` triggered at `origin`. Returns the tiles it emptied.
///
/// Emptied tiles are counted by the ledger like ordinary pops. Specials caught in the
/// blast are consumed without running their own effect.
pub fn execute(effect: Effect, origin: Pos, grid: &mut Grid, ledger: &mut GoalLedger) -> Vec<Pos> {
    let cleared = match effect {
        Effect::LineClear => {
            let targets: Vec<Pos> = grid
                .positions()
                .filter(|p| p.x == origin.x || p.y == origin.y)
                .collect();
            clear(grid, ledger, &targets)
        }
        Effect::Blast => {
            let targets: Vec<Pos> = grid
                .positions()
                .filter(|p| p.x.abs_diff(origin.x) <= 1 && p.y.abs_diff(origin.y) <= 1)
                .collect();
            clear(grid, ledger, &targets)
        }
        Effect::BonusMove => {
            ledger.add_move();
            Vec::new()
        }
    };
    debug!(?effect, %origin, cleared = cleared.len(), "special item executed");
    cleared
}

fn clear(grid: &mut Grid, ledger: &mut GoalLedger, targets: &[Pos]) -> Vec<Pos> {
    let mut cleared = Vec::with_capacity(targets.len());
    for &pos in targets {
        let Some(item) = grid.tile_mut(pos).and_then(|t| t.take_item()) else {
            continue;
        };
        ledger.register_pop(item);
        cleared.push(pos);
    }
    cleared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Catalog;
    use crate::testing::grid_from;

    #[test]
    fn test_line_clear_skips_obstacles() {
        let catalog = Catalog::standard();
        let apple = catalog.by_name("apple").unwrap();
        let mut grid = grid_from(&catalog, &["ABCG", "C.#A", "AGCB", "BAGC"]);
        let mut ledger = GoalLedger::new(&[(apple, 10)], 5);
        let cleared = execute(Effect::LineClear, Pos::new(2, 2), &mut grid, &mut ledger);
        // Row 2 plus column 2 minus the obstacle.
        assert_eq!(cleared.len(), 4 + 2);
        for x in 0..4 {
            assert!(grid.is_empty(Pos::new(x, 2)));
        }
        for y in [0, 3] {
            assert!(grid.is_empty(Pos::new(2, y)));
        }
        assert!(grid.is_obstacle(Pos::new(2, 1)));
        assert_eq!(grid.item(Pos::new(0, 0)), Some(apple));
        // Only the apple at (0,2) was on the lines.
        assert_eq!(ledger.remaining(apple), Some(9));
        assert_eq!(ledger.moves_left(), 5);
    }

    #[test]
    fn test_blast_clears_neighbourhood() {
        let catalog = Catalog::standard();
        let mut grid = grid_from(&catalog, &["ABCG", "CGAB", "AGCB", "BAGC"]);
        let mut ledger = GoalLedger::new(&[], 5);
        let cleared = execute(Effect::Blast, Pos::new(0, 0), &mut grid, &mut ledger);
        assert_eq!(cleared.len(), 4);
        assert!(grid.is_empty(Pos::new(1, 1)));
        assert!(!grid.is_empty(Pos::new(2, 0)));
    }

    #[test]
    fn test_bonus_move() {
        let catalog = Catalog::standard();
        let mut grid = grid_from(&catalog, &["ABCG", "CGAB", "AGCB"]);
        let before = grid.clone();
        let mut ledger = GoalLedger::new(&[], 2);
        let cleared = execute(Effect::BonusMove, Pos::new(1, 1), &mut grid, &mut ledger);
        assert!(cleared.is_empty());
        assert_eq!(grid, before);
        assert_eq!(ledger.moves_left(), 3);
    }
}
