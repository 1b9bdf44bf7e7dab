//! Collaborator interfaces: the presenter animates, the listener keeps score and
//! hears about the level outcome. Neither gets write access to the grid.

use crate::grid::Pos;
use std::future::Future;

/// Scale of a fully hidden tile icon.
pub const HIDDEN: f32 = 0.0;
/// Scale of a fully shown tile icon.
pub const SHOWN: f32 = 1.0;

/// Visual and audio side of the board. The controller awaits every returned future
/// before moving to the next step.
pub trait Presenter {
    /// Two tile icons trade places (swap or revert).
    fn animate_move(&mut self, a: Pos, b: Pos) -> impl Future<Output = ()>;

    /// One gravity pass. Columns are independent, so implementations may run the moves
    /// concurrently; the returned future resolves once all of them have finished.
    fn animate_moves(&mut self, moves: &[(Pos, Pos)]) -> impl Future<Output = ()> {
        async move {
            for &(from, to) in moves {
                self.animate_move(from, to).await;
            }
        }
    }

    /// Scale the icons of `tiles` to `scale` ([`HIDDEN`] on pop, [`SHOWN`] on spawn).
    fn animate_scale(&mut self, tiles: &[Pos], scale: f32) -> impl Future<Output = ()>;

    fn play_pop_sound(&mut self);
}

/// Score sink and level outcome.
pub trait Listener {
    fn add_score(&mut self, delta: u32);

    fn on_goal_reached(&mut self) {}

    fn on_move_limit_reached(&mut self) {}
}

/// Presenter with no visuals; every step completes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Presenter for Headless {
    async fn animate_move(&mut self, _a: Pos, _b: Pos) {}

    async fn animate_moves(&mut self, _moves: &[(Pos, Pos)]) {}

    async fn animate_scale(&mut self, _tiles: &[Pos], _scale: f32) {}

    fn play_pop_sound(&mut self) {}
}

impl Listener for () {
    fn add_score(&mut self, _delta: u32) {}
}
