//! App: builds the board from a level and lets a bot play it turn by turn.

use crate::text::{self, Outcome, ScoreKeeper, TextPresenter};
use crate::{PlayConfig, Strategy};
use anyhow::{Context, Result};
use futures::executor::block_on;
use std::cmp::Reverse;
use tilecascade::{
    Board, Catalog, Grid, Level, Pos, SelectOutcome, SpawnSettings, TurnReport, matcher,
};
use tracing::{debug, warn};

pub struct App {
    config: PlayConfig,
    board: Board<TextPresenter, ScoreKeeper>,
    turns: u32,
}

impl App {
    pub fn new(level: &Level, settings: &SpawnSettings, config: PlayConfig) -> Result<Self> {
        let board = level
            .build(
                &Catalog::standard(),
                settings,
                TextPresenter::default(),
                ScoreKeeper::default(),
            )
            .context("building level")?;
        Ok(Self {
            config,
            board,
            turns: 0,
        })
    }

    pub fn run(&mut self) {
        if !self.config.quiet {
            self.print_board();
        }
        block_on(self.run_loop());
        self.print_summary();
    }

    async fn run_loop(&mut self) {
        while self.turns < self.config.max_turns && !self.board.phase().is_terminal() {
            let Some((a, b)) = self.pick() else {
                warn!("stable board without a legal move");
                break;
            };
            self.board.select(a).await;
            match self.board.select(b).await {
                SelectOutcome::Resolved(report) => {
                    self.turns += 1;
                    if !self.config.quiet {
                        self.print_turn(&report);
                    }
                }
                other => {
                    warn!(%a, %b, ?other, "legal swap did not resolve");
                    break;
                }
            }
        }
    }

    fn pick(&mut self) -> Option<(Pos, Pos)> {
        match self.config.strategy {
            Strategy::First => self.board.hint(),
            Strategy::Greedy => {
                let moves = self.board.legal_moves();
                let grid = self.board.grid();
                let catalog = self.board.catalog();
                let best = moves
                    .into_iter()
                    .min_by_key(|&(a, b)| Reverse(match_size(grid, catalog, a, b)));
                debug!(?best, "greedy pick");
                best
            }
        }
    }

    fn print_board(&self) {
        print!("{}", text::render(self.board.grid(), self.board.catalog()));
    }

    fn print_turn(&self, report: &TurnReport) {
        let (a, b) = report.swap;
        println!(
            "turn {}: swap {a} {b} -> {} pops, {} cleared, +{} (score {}), {} moves left",
            self.turns,
            report.pops,
            report.cleared,
            report.score,
            self.board.score(),
            report.moves_left,
        );
        let goals = self.board.ledger().goals();
        if !goals.is_empty() {
            println!("goals: {}", text::goals_line(goals, self.board.catalog()));
        }
        self.print_board();
    }

    fn print_summary(&self) {
        let listener = self.board.listener();
        let presenter = self.board.presenter();
        let result = match listener.outcome {
            Some(Outcome::GoalReached) => "goal reached",
            Some(Outcome::MoveLimitReached) => "out of moves",
            None => "stopped",
        };
        println!(
            "{result} after {} turns: score {}, {} pops, {} drop passes",
            self.turns, listener.score, presenter.pops, presenter.drop_passes
        );
    }
}

/// Size of the first region that swapping `a` and `b` would pop; 0 if none.
fn match_size(grid: &Grid, catalog: &Catalog, a: Pos, b: Pos) -> usize {
    let mut grid = grid.clone();
    grid.swap_items(a, b);
    matcher::poppable_axis(&grid, catalog)
        .and_then(|axis| matcher::first_poppable(&grid, catalog, axis))
        .map_or(0, |region| region.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: Strategy) -> PlayConfig {
        PlayConfig {
            strategy,
            max_turns: 25,
            quiet: true,
        }
    }

    fn settings() -> SpawnSettings {
        SpawnSettings {
            special_chance: 0.0,
            max_retries: 10,
            seed: Some(11),
        }
    }

    #[test]
    fn test_match_size() {
        let catalog = Catalog::standard();
        let level = Level::parse(
            "level[row]=\"AABAA\"\nlevel[row]=\"CGAGC\"\nlevel[row]=\"GCPCG\"",
        )
        .unwrap();
        let grid = level
            .build(&catalog, &settings(), TextPresenter::default(), ScoreKeeper::default())
            .unwrap()
            .grid()
            .clone();
        assert_eq!(match_size(&grid, &catalog, Pos::new(2, 0), Pos::new(2, 1)), 5);
        assert_eq!(match_size(&grid, &catalog, Pos::new(0, 1), Pos::new(0, 2)), 0);
    }

    #[test]
    fn test_autoplay_stops() {
        for strategy in [Strategy::First, Strategy::Greedy] {
            let level = Level {
                moves: 10,
                specials: Some(Vec::new()),
                ..Level::default()
            };
            let mut app = App::new(&level, &settings(), config(strategy)).unwrap();
            block_on(app.run_loop());
            assert_eq!(app.turns, 10);
            assert!(app.board.phase().is_terminal());
            assert_eq!(app.board.listener().outcome, Some(Outcome::MoveLimitReached));
            assert_eq!(app.board.listener().score, app.board.score());
        }
    }

    #[test]
    fn test_greedy_prefers_bigger_match() {
        let level = Level::parse(
            "level[row]=\"AABAA\"\nlevel[row]=\"CGAGC\"\nlevel[row]=\"GCPCG\"",
        )
        .unwrap();
        let mut app = App::new(&level, &settings(), config(Strategy::Greedy)).unwrap();
        assert_eq!(app.pick(), Some((Pos::new(2, 0), Pos::new(2, 1))));
    }
}
