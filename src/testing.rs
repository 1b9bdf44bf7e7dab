//! Test helpers shared by the module tests.

use crate::grid::{Grid, Pos};
use crate::item::Catalog;
use crate::presenter::{Listener, Presenter};

/// Build a grid from rows of catalog symbols; `.` is empty, `#` an obstacle.
pub fn grid_from(catalog: &Catalog, rows: &[&str]) -> Grid {
    let obstacles: Vec<Pos> = rows
        .iter()
        .enumerate()
        .flat_map(|(y, row)| {
            row.chars()
                .enumerate()
                .filter(|&(_, c)| c == '#')
                .map(move |(x, _)| Pos::new(x, y))
        })
        .collect();
    let mut grid = Grid::new(rows[0].len(), rows.len(), &obstacles).unwrap();
    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            if let Some(id) = catalog.by_symbol(c) {
                grid.place(Pos::new(x, y), id).unwrap();
            }
        }
    }
    grid
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Move(Pos, Pos),
    Drop(Vec<(Pos, Pos)>),
    Scale(Vec<Pos>, f32),
    PopSound,
}

/// Presenter that records every call in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Presenter for Recorder {
    async fn animate_move(&mut self, a: Pos, b: Pos) {
        self.events.push(Event::Move(a, b));
    }

    async fn animate_moves(&mut self, moves: &[(Pos, Pos)]) {
        self.events.push(Event::Drop(moves.to_vec()));
    }

    async fn animate_scale(&mut self, tiles: &[Pos], scale: f32) {
        self.events.push(Event::Scale(tiles.to_vec(), scale));
    }

    fn play_pop_sound(&mut self) {
        self.events.push(Event::PopSound);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub score: u32,
    pub goal_reached: bool,
    pub move_limit_reached: bool,
}

impl Listener for Tally {
    fn add_score(&mut self, delta: u32) {
        self.score += delta;
    }

    fn on_goal_reached(&mut self) {
        self.goal_reached = true;
    }

    fn on_move_limit_reached(&mut self) {
        self.move_limit_reached = true;
    }
}
