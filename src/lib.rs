//! Match-three cascade engine.
//!
//! A [`Board`] owns a [`Grid`] of tiles, an item [`Catalog`], a [`GoalLedger`] and a
//! [`Spawner`]. Two adjacent selections swap items; a swap that lines up three or more
//! compatible items pops them, gravity drops what is above, new items spawn from the
//! top, and the loop repeats until the board is stable.

pub mod cascade;
pub mod effects;
pub mod goal;
pub mod grid;
pub mod item;
pub mod level;
pub mod matcher;
pub mod presenter;
pub mod spawner;

#[cfg(test)]
mod testing;

pub use cascade::{Board, Phase, SelectOutcome, TurnReport};
pub use goal::{Goal, GoalLedger};
pub use grid::{Axis, Grid, GridError, Pos, Tile};
pub use item::{Catalog, CatalogError, Effect, Item, ItemId, ItemKind};
pub use level::{LayoutCell, Level, LevelError};
pub use presenter::{Headless, Listener, Presenter};
pub use spawner::{SpawnSettings, Spawner};
