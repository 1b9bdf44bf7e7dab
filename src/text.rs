//! Text side of the board: a presenter that logs animation steps and a listener that
//! keeps the running score.

use tilecascade::{Catalog, Goal, Grid, Listener, Pos, Presenter};
use tracing::{info, trace};

/// Counts animation steps instead of drawing them; every step completes at once.
#[derive(Debug, Default)]
pub struct TextPresenter {
    pub swaps: u32,
    pub drop_passes: u32,
    pub pops: u32,
}

impl Presenter for TextPresenter {
    async fn animate_move(&mut self, a: Pos, b: Pos) {
        trace!(%a, %b, "move");
        self.swaps += 1;
    }

    async fn animate_moves(&mut self, moves: &[(Pos, Pos)]) {
        trace!(moves = moves.len(), "drop");
        self.drop_passes += 1;
    }

    async fn animate_scale(&mut self, tiles: &[Pos], scale: f32) {
        trace!(tiles = tiles.len(), scale, "scale");
    }

    fn play_pop_sound(&mut self) {
        self.pops += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    GoalReached,
    MoveLimitReached,
}

#[derive(Debug, Default)]
pub struct ScoreKeeper {
    pub score: u32,
    pub outcome: Option<Outcome>,
}

impl Listener for ScoreKeeper {
    fn add_score(&mut self, delta: u32) {
        self.score = self.score.saturating_add(delta);
    }

    fn on_goal_reached(&mut self) {
        info!(score = self.score, "level cleared");
        self.outcome = Some(Outcome::GoalReached);
    }

    fn on_move_limit_reached(&mut self) {
        info!(score = self.score, "out of moves");
        self.outcome = Some(Outcome::MoveLimitReached);
    }
}

/// Board as rows of item symbols; `#` for obstacles, `.` for empty slots.
pub fn render(grid: &Grid, catalog: &Catalog) -> String {
    let mut out = String::with_capacity((grid.width() * 2 + 1) * grid.height());
    for tile in grid.tiles() {
        let x = tile.pos().x;
        if x > 0 {
            out.push(' ');
        }
        out.push(if tile.is_obstacle() {
            '#'
        } else {
            tile.item().map_or('.', |id| catalog.symbol(id))
        });
        if x + 1 == grid.width() {
            out.push('\n');
        }
    }
    out
}

/// Remaining counts, e.g. `apple 3, pear done`.
pub fn goals_line(goals: &[Goal], catalog: &Catalog) -> String {
    goals
        .iter()
        .map(|goal| {
            let name = catalog.get(goal.item).map_or("?", |item| item.name.as_str());
            match goal.remaining {
                0 => format!("{name} done"),
                n => format!("{name} {n}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilecascade::ItemId;

    #[test]
    fn test_render() {
        let catalog = Catalog::standard();
        let mut grid = Grid::new(3, 2, &[Pos::new(1, 0)]).unwrap();
        grid.set_item(Pos::new(0, 0), catalog.by_name("apple"));
        grid.set_item(Pos::new(2, 1), catalog.by_name("dynamite"));
        assert_eq!(render(&grid, &catalog), "A # .\n. . *\n");
    }

    #[test]
    fn test_goals_line() {
        let catalog = Catalog::standard();
        let apple = catalog.by_name("apple").unwrap();
        let pear = catalog.by_name("pear").unwrap();
        let goals = [
            Goal {
                item: apple,
                remaining: 3,
            },
            Goal {
                item: pear,
                remaining: 0,
            },
        ];
        assert_eq!(goals_line(&goals, &catalog), "apple 3, pear done");
        assert_eq!(goals_line(&[], &catalog), "");
        let unknown = Goal {
            item: ItemId(99),
            remaining: 1,
        };
        assert_eq!(goals_line(&[unknown], &catalog), "? 1");
    }

    #[test]
    fn test_score_keeper_saturates() {
        let mut keeper = ScoreKeeper::default();
        keeper.add_score(u32::MAX - 5);
        keeper.add_score(30);
        assert_eq!(keeper.score, u32::MAX);
    }
}
