//! Match detection: axis-restricted flood fill with anchor compatibility.
//!
//! A region grows from an origin tile through occupied neighbours on one axis. Ordinary
//! items must equal the region's anchor item; special items join when their partner is
//! the anchor and their affinity accepts it; a special next to another special only
//! chains with the same item. The anchor is the origin's item when that
//! is ordinary, otherwise the first ordinary neighbour met during the walk. A region
//! that never finds an anchor never grows past its origin.

use crate::grid::{Axis, Grid, Pos};
use crate::item::{Catalog, ItemId};
use std::collections::HashSet;

/// Minimum region size that pops.
pub const MIN_MATCH: usize = 3;

/// Maximal region reachable from `origin` along `axis`. Always contains `origin` first.
pub fn connected_tiles(grid: &Grid, catalog: &Catalog, origin: Pos, axis: Axis) -> Vec<Pos> {
    let mut region = vec![origin];
    let Some(origin_item) = grid.item(origin) else {
        return region;
    };
    let mut anchor = (!catalog.is_special(origin_item)).then_some(origin_item);
    let mut visited = HashSet::from([origin]);
    let mut stack = vec![(origin, origin_item)];

    while let Some((pos, item)) = stack.pop() {
        for next in grid.axis_neighbours(pos, axis) {
            if visited.contains(&next) {
                continue;
            }
            let Some(next_item) = grid.item(next) else {
                continue;
            };
            if anchor.is_none() && !catalog.is_special(next_item) {
                anchor = Some(next_item);
            }
            let Some(anchor) = anchor else { continue };
            if !compatible(catalog, item, next_item, anchor) {
                continue;
            }
            visited.insert(next);
            region.push(next);
            stack.push((next, next_item));
        }
    }
    region
}

/// Pairwise rule used while walking a region. Two specials only chain when they are
/// the same item.
pub fn compatible(catalog: &Catalog, a: ItemId, b: ItemId, anchor: ItemId) -> bool {
    match (catalog.is_special(a), catalog.is_special(b)) {
        (false, false) => a == anchor && b == anchor,
        (true, false) => b == anchor && catalog.accepts_anchor(a, anchor),
        (false, true) => a == anchor && catalog.accepts_anchor(b, anchor),
        (true, true) => a == b && catalog.accepts_anchor(a, anchor),
    }
}

#[inline]
pub fn is_poppable(region: &[Pos]) -> bool {
    region.len() >= MIN_MATCH
}

/// True if any tile's region on `axis` is poppable.
pub fn can_pop(grid: &Grid, catalog: &Catalog, axis: Axis) -> bool {
    first_poppable(grid, catalog, axis).is_some()
}

/// First poppable region on `axis` in top-left scan order.
pub fn first_poppable(grid: &Grid, catalog: &Catalog, axis: Axis) -> Option<Vec<Pos>> {
    grid.positions()
        .filter(|&pos| grid.item(pos).is_some())
        .map(|pos| connected_tiles(grid, catalog, pos, axis))
        .find(|region| is_poppable(region))
}

/// Axis to resolve, horizontal first.
pub fn poppable_axis(grid: &Grid, catalog: &Catalog) -> Option<Axis> {
    Axis::ALL
        .into_iter()
        .find(|&axis| can_pop(grid, catalog, axis))
}

/// Every swap of two occupied neighbours that would produce a pop.
///
/// Each pair is reported once, as (upper-left, lower-right). The grid is restored
/// before returning.
pub fn legal_moves(grid: &mut Grid, catalog: &Catalog) -> Vec<(Pos, Pos)> {
    let mut moves = Vec::new();
    for_each_swap(grid, catalog, |a, b| {
        moves.push((a, b));
        false
    });
    moves
}

pub fn find_legal_move(grid: &mut Grid, catalog: &Catalog) -> Option<(Pos, Pos)> {
    let mut found = None;
    for_each_swap(grid, catalog, |a, b| {
        found = Some((a, b));
        true
    });
    found
}

pub fn has_any_legal_move(grid: &mut Grid, catalog: &Catalog) -> bool {
    find_legal_move(grid, catalog).is_some()
}

/// Try every neighbour swap; `visit` returns true to stop early.
fn for_each_swap(grid: &mut Grid, catalog: &Catalog, mut visit: impl FnMut(Pos, Pos) -> bool) {
    for a in grid.positions() {
        if grid.item(a).is_none() {
            continue;
        }
        // Right and down cover every unordered pair once.
        for b in [Pos::new(a.x + 1, a.y), Pos::new(a.x, a.y + 1)] {
            if grid.item(b).is_none() {
                continue;
            }
            grid.swap_items(a, b);
            let pops = poppable_axis(grid, catalog).is_some();
            grid.swap_items(a, b);
            if pops && visit(a, b) {
                return;
            }
        }
    }
}
