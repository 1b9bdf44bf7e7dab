//! Grid: fixed-size arrangement of tiles, obstacles, adjacency queries.

use crate::item::ItemId;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Tile coordinate. x grows right, y grows down; row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// True if `other` is one orthogonal step away.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Direction a match is walked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Horizontal first: it wins ties when both axes can pop.
    pub const ALL: [Self; 2] = [Self::Horizontal, Self::Vertical];

    pub fn contains(self, dx: i8, dy: i8) -> bool {
        match self {
            Self::Horizontal => dy == 0,
            Self::Vertical => dx == 0,
        }
    }
}

/// Left, top, right, bottom.
const NEIGHBOURS_4: [(i8, i8); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("coordinate {0} is outside the grid")]
    OutOfBounds(Pos),
    #[error("coordinate {0} is listed twice")]
    DuplicateCoordinate(Pos),
    #[error("obstacle {0} cannot hold an item")]
    ObstacleWithItem(Pos),
    #[error("grid has no three-in-a-line slots with a fourth adjacent; no move could ever match")]
    NoPlayableShape,
}

/// One slot of the grid. Identity is its coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pos: Pos,
    item: Option<ItemId>,
    obstacle: bool,
}

impl Tile {
    #[inline]
    pub fn pos(&self) -> Pos {
        self.pos
    }

    #[inline]
    pub fn item(&self) -> Option<ItemId> {
        self.item
    }

    #[inline]
    pub fn is_obstacle(&self) -> bool {
        self.obstacle
    }

    /// A playable slot with no item (only during a cascade).
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.obstacle && self.item.is_none()
    }

    /// Setting an item on an obstacle is ignored.
    #[inline]
    pub fn set_item(&mut self, item: Option<ItemId>) {
        if self.obstacle {
            return;
        }
        self.item = item;
    }

    #[inline]
    pub fn take_item(&mut self) -> Option<ItemId> {
        self.item.take()
    }
}

/// Playfield of tiles. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// tiles[y * width + x]
    tiles: Vec<Tile>,
}

impl Grid {
    /// Build an empty grid. Obstacles must be in bounds and unique.
    pub fn new(width: usize, height: usize, obstacles: &[Pos]) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        let mut tiles: Vec<Tile> = (0..height)
            .flat_map(|y| (0..width).map(move |x| Pos::new(x, y)))
            .map(|pos| Tile {
                pos,
                item: None,
                obstacle: false,
            })
            .collect();
        let mut seen = HashSet::new();
        for &pos in obstacles {
            if pos.x >= width || pos.y >= height {
                return Err(GridError::OutOfBounds(pos));
            }
            if !seen.insert(pos) {
                return Err(GridError::DuplicateCoordinate(pos));
            }
            tiles[pos.y * width + pos.x].obstacle = true;
        }
        let grid = Self {
            width,
            height,
            tiles,
        };
        if grid.playable_shape().is_none() {
            return Err(GridError::NoPlayableShape);
        }
        Ok(grid)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    #[inline]
    pub fn tile(&self, pos: Pos) -> Option<&Tile> {
        self.in_bounds(pos).then(|| &self.tiles[pos.y * self.width + pos.x])
    }

    #[inline]
    pub fn tile_mut(&mut self, pos: Pos) -> Option<&mut Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&mut self.tiles[pos.y * self.width + pos.x])
    }

    /// Item at `pos`; None for empty, obstacle, or out of bounds.
    #[inline]
    pub fn item(&self, pos: Pos) -> Option<ItemId> {
        self.tile(pos).and_then(Tile::item)
    }

    #[inline]
    pub fn set_item(&mut self, pos: Pos, item: Option<ItemId>) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.set_item(item);
        }
    }

    /// Put a fixed item at level construction. Unlike [`Grid::set_item`], an obstacle
    /// target is a construction error.
    pub fn place(&mut self, pos: Pos, item: ItemId) -> Result<(), GridError> {
        let tile = self.tile_mut(pos).ok_or(GridError::OutOfBounds(pos))?;
        if tile.obstacle {
            return Err(GridError::ObstacleWithItem(pos));
        }
        tile.item = Some(item);
        Ok(())
    }

    #[inline]
    pub fn is_obstacle(&self, pos: Pos) -> bool {
        self.tile(pos).is_some_and(Tile::is_obstacle)
    }

    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.tile(pos).is_some_and(Tile::is_empty)
    }

    /// All tiles, row by row from the top-left.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// All coordinates in top-left scan order.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Pos::new(x, y)))
    }

    pub fn has_empty(&self) -> bool {
        self.tiles.iter().any(Tile::is_empty)
    }

    pub fn empty_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_empty()).count()
    }

    /// In-bounds orthogonal neighbours: left, top, right, bottom.
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        NEIGHBOURS_4
            .iter()
            .filter_map(move |&(dx, dy)| self.offset(pos, dx, dy))
    }

    /// Neighbours restricted to one axis.
    pub fn axis_neighbours(&self, pos: Pos, axis: Axis) -> impl Iterator<Item = Pos> + '_ {
        NEIGHBOURS_4
            .iter()
            .filter(move |&&(dx, dy)| axis.contains(dx, dy))
            .filter_map(move |&(dx, dy)| self.offset(pos, dx, dy))
    }

    fn offset(&self, pos: Pos, dx: i8, dy: i8) -> Option<Pos> {
        let x = pos.x.checked_add_signed(isize::from(dx))?;
        let y = pos.y.checked_add_signed(isize::from(dy))?;
        let p = Pos::new(x, y);
        self.in_bounds(p).then_some(p)
    }

    /// Exchange the items of two tiles. Obstacles are left untouched.
    pub fn swap_items(&mut self, a: Pos, b: Pos) {
        if !self.in_bounds(a) || !self.in_bounds(b) || self.is_obstacle(a) || self.is_obstacle(b) {
            return;
        }
        let ia = a.y * self.width + a.x;
        let ib = b.y * self.width + b.x;
        let item_a = self.tiles[ia].item;
        self.tiles[ia].item = self.tiles[ib].item;
        self.tiles[ib].item = item_a;
    }

    /// Empty slots that receive new items: row 0, or directly below an obstacle.
    pub fn spawn_slots(&self) -> Vec<Pos> {
        self.positions()
            .filter(|&p| self.is_empty(p))
            .filter(|&p| p.y == 0 || self.is_obstacle(Pos::new(p.x, p.y - 1)))
            .collect()
    }

    /// Gravity moves for one pass, computed per column.
    ///
    /// Each column is split into segments by obstacles; items in a segment settle at its
    /// bottom, keeping their order. Columns touch disjoint tiles so the result is the
    /// concatenation of independent per-column plans. Returns `(from, to)` pairs.
    pub fn plan_drop(&self) -> Vec<(Pos, Pos)> {
        (0..self.width).flat_map(|x| self.plan_column(x)).collect()
    }

    fn plan_column(&self, x: usize) -> Vec<(Pos, Pos)> {
        let mut moves = Vec::new();
        let mut floor = self.height;
        for y in (0..self.height).rev() {
            let pos = Pos::new(x, y);
            if self.is_obstacle(pos) {
                floor = y;
                continue;
            }
            if self.item(pos).is_some() {
                let target = floor - 1;
                if target != y {
                    moves.push((pos, Pos::new(x, target)));
                }
                floor = target;
            }
        }
        moves
    }

    /// Apply a drop plan produced by [`Grid::plan_drop`].
    pub fn apply_drop(&mut self, moves: &[(Pos, Pos)]) {
        // Bottom-most moves come first per column, so targets are already vacated.
        for &(from, to) in moves {
            let item = self.tile_mut(from).and_then(Tile::take_item);
            self.set_item(to, item);
        }
    }

    /// Three playable slots in a line plus a fourth adjacent to the last one.
    ///
    /// Returns `(a, b, c, d)`: putting one item on a, b and d and another on c makes
    /// swapping c and d a legal move.
    pub fn playable_shape(&self) -> Option<(Pos, Pos, Pos, Pos)> {
        let open = |p: Option<Pos>| p.filter(|&p| !self.is_obstacle(p));
        for a in self.positions() {
            for (dx, dy) in [(1i8, 0i8), (0, 1)] {
                let Some(a) = open(Some(a)) else { continue };
                let Some(b) = open(self.offset(a, dx, dy)) else {
                    continue;
                };
                let Some(c) = open(self.offset(b, dx, dy)) else {
                    continue;
                };
                let d = self
                    .neighbours(c)
                    .find(|&d| d != b && !self.is_obstacle(d));
                if let Some(d) = d {
                    return Some((a, b, c, d));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u16) -> Option<ItemId> {
        Some(ItemId(n))
    }

    #[test]
    fn test_every_coordinate_has_one_tile() {
        let grid = Grid::new(4, 3, &[]).unwrap();
        let positions: Vec<_> = grid.tiles().map(Tile::pos).collect();
        let unique: HashSet<_> = positions.iter().copied().collect();
        assert_eq!(positions.len(), 12);
        assert_eq!(unique.len(), 12);
        for pos in grid.positions() {
            assert_eq!(grid.tile(pos).map(Tile::pos), Some(pos));
        }
    }

    #[test]
    fn test_rejects_bad_construction() {
        assert_eq!(
            Grid::new(0, 3, &[]),
            Err(GridError::ZeroSize {
                width: 0,
                height: 3
            })
        );
        assert_eq!(
            Grid::new(3, 3, &[Pos::new(3, 0)]),
            Err(GridError::OutOfBounds(Pos::new(3, 0)))
        );
        assert_eq!(
            Grid::new(4, 4, &[Pos::new(1, 1), Pos::new(1, 1)]),
            Err(GridError::DuplicateCoordinate(Pos::new(1, 1)))
        );
        assert_eq!(Grid::new(2, 2, &[]), Err(GridError::NoPlayableShape));
    }

    #[test]
    fn test_obstacle_never_holds_item() {
        let mut grid = Grid::new(4, 4, &[Pos::new(1, 1)]).unwrap();
        grid.set_item(Pos::new(1, 1), id(3));
        assert_eq!(grid.item(Pos::new(1, 1)), None);
        assert!(!grid.is_empty(Pos::new(1, 1)));
        assert_eq!(
            grid.place(Pos::new(1, 1), ItemId(3)),
            Err(GridError::ObstacleWithItem(Pos::new(1, 1)))
        );
        grid.set_item(Pos::new(0, 1), id(3));
        grid.swap_items(Pos::new(0, 1), Pos::new(1, 1));
        assert_eq!(grid.item(Pos::new(0, 1)), id(3));
        assert_eq!(grid.item(Pos::new(1, 1)), None);
    }

    #[test]
    fn test_neighbour_order_and_axis() {
        let grid = Grid::new(3, 3, &[]).unwrap();
        let all: Vec<_> = grid.neighbours(Pos::new(1, 1)).collect();
        assert_eq!(
            all,
            vec![Pos::new(0, 1), Pos::new(1, 0), Pos::new(2, 1), Pos::new(1, 2)]
        );
        let corner: Vec<_> = grid.neighbours(Pos::new(0, 0)).collect();
        assert_eq!(corner, vec![Pos::new(1, 0), Pos::new(0, 1)]);
        let vertical: Vec<_> = grid.axis_neighbours(Pos::new(1, 1), Axis::Vertical).collect();
        assert_eq!(vertical, vec![Pos::new(1, 0), Pos::new(1, 2)]);
    }

    #[test]
    fn test_drop_compacts_column_and_is_idempotent() {
        let mut grid = Grid::new(3, 4, &[]).unwrap();
        grid.set_item(Pos::new(0, 0), id(1));
        grid.set_item(Pos::new(0, 2), id(2));
        let moves = grid.plan_drop();
        assert_eq!(
            moves,
            vec![(Pos::new(0, 2), Pos::new(0, 3)), (Pos::new(0, 0), Pos::new(0, 2))]
        );
        grid.apply_drop(&moves);
        assert_eq!(grid.item(Pos::new(0, 3)), id(2));
        assert_eq!(grid.item(Pos::new(0, 2)), id(1));
        assert!(grid.is_empty(Pos::new(0, 0)));
        assert!(grid.plan_drop().is_empty());
    }

    #[test]
    fn test_drop_never_crosses_obstacle() {
        let mut grid = Grid::new(4, 4, &[Pos::new(0, 1)]).unwrap();
        grid.set_item(Pos::new(0, 0), id(1));
        assert!(grid.plan_drop().is_empty());
        grid.set_item(Pos::new(0, 2), id(2));
        let moves = grid.plan_drop();
        assert_eq!(moves, vec![(Pos::new(0, 2), Pos::new(0, 3))]);
        grid.apply_drop(&moves);
        assert_eq!(grid.spawn_slots(), vec![
            Pos::new(1, 0),
            Pos::new(2, 0),
            Pos::new(3, 0),
            Pos::new(0, 2),
        ]);
    }

    #[test]
    fn test_playable_shape_fits_single_row() {
        let grid = Grid::new(4, 1, &[]).unwrap();
        let (a, b, c, d) = grid.playable_shape().unwrap();
        assert_eq!((a, b, c, d), (Pos::new(0, 0), Pos::new(1, 0), Pos::new(2, 0), Pos::new(3, 0)));
        assert_eq!(Grid::new(3, 1, &[]), Err(GridError::NoPlayableShape));
    }
}
