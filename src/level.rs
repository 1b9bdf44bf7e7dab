//! Level files: `level[key]="value"` lines describing a board, its goals and budget.
//!
//! ```text
//! # comments and blank lines are ignored
//! level[moves]="15"
//! level[goal]="apple:12"
//! level[items]="apple,banana,cherry,grape"
//! level[specials]="dynamite,clover"
//! level[affinity]="dynamite:apple"
//! level[row]="..#.."
//! level[row]=".A.A."
//! ```
//!
//! Rows use `.` for a random item, `#` for an obstacle and an item symbol for a fixed
//! item. When rows are given they set the grid size.

use crate::cascade::Board;
use crate::goal::GoalLedger;
use crate::grid::{Grid, GridError, Pos};
use crate::item::{Catalog, CatalogError, ItemId};
use crate::presenter::{Listener, Presenter};
use crate::spawner::{DEFAULT_SPECIAL_CHANCE, SpawnSettings, Spawner};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WIDTH: usize = 6;
pub const DEFAULT_HEIGHT: usize = 6;
pub const DEFAULT_MOVES: u32 = 20;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("line {line}: unknown key {key}")]
    UnknownKey { line: usize, key: String },
    #[error("invalid value for {key}: {value}")]
    BadNumber { key: &'static str, value: String },
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}: unknown symbol {symbol:?}")]
    UnknownSymbol { row: usize, symbol: char },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// One authored cell of a layout row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutCell {
    Random,
    Obstacle,
    Fixed(ItemId),
}

/// Parsed level description. Item names are resolved against a catalog in
/// [`Level::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub width: usize,
    pub height: usize,
    pub moves: u32,
    /// `(item name, count)`.
    pub goals: Vec<(String, u32)>,
    /// Ordinary pool; None keeps the catalog's.
    pub items: Option<Vec<String>>,
    /// Special pool; None keeps the catalog's.
    pub specials: Option<Vec<String>>,
    /// `(special name, anchor item name)`.
    pub affinities: Vec<(String, String)>,
    pub special_chance: f64,
    pub rows: Vec<String>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            moves: DEFAULT_MOVES,
            goals: Vec::new(),
            items: None,
            specials: None,
            affinities: Vec::new(),
            special_chance: DEFAULT_SPECIAL_CHANCE,
            rows: Vec::new(),
        }
    }
}

impl Level {
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let s = std::fs::read_to_string(path)?;
        Self::parse(&s)
    }

    pub fn parse(s: &str) -> Result<Self, LevelError> {
        let mut level = Self::default();
        for (key, value, line) in parse_level_file(s)? {
            match key.as_str() {
                "width" => level.width = number("width", &value)?,
                "height" => level.height = number("height", &value)?,
                "moves" => level.moves = number("moves", &value)?,
                "goal" => {
                    let (name, count) = pair(&value, line)?;
                    level.goals.push((name, number("goal", &count)?));
                }
                "items" => level.items = Some(list(&value)),
                "specials" => level.specials = Some(list(&value)),
                "affinity" => level.affinities.push(pair(&value, line)?),
                "special_chance" => {
                    let chance: f64 = number("special_chance", &value)?;
                    if !(0.0..=1.0).contains(&chance) {
                        return Err(LevelError::BadNumber {
                            key: "special_chance",
                            value,
                        });
                    }
                    level.special_chance = chance;
                }
                "row" => level.rows.push(value),
                _ => return Err(LevelError::UnknownKey { line, key }),
            }
        }
        if let Some(first) = level.rows.first() {
            level.width = first.chars().count();
            level.height = level.rows.len();
        }
        Ok(level)
    }

    /// Catalog restricted to this level's pools, with affinities applied.
    pub fn catalog(&self, base: &Catalog) -> Result<Catalog, LevelError> {
        let names = |ids: &[ItemId]| -> Vec<String> {
            ids.iter().map(|&id| base[id].name.clone()).collect()
        };
        let items = self
            .items
            .clone()
            .unwrap_or_else(|| names(base.items_for_level()));
        let specials = self
            .specials
            .clone()
            .unwrap_or_else(|| names(base.special_items()));
        let items: Vec<&str> = items.iter().map(String::as_str).collect();
        let specials: Vec<&str> = specials.iter().map(String::as_str).collect();
        let mut catalog = base.for_level(&items, &specials)?;
        for (special, anchor) in &self.affinities {
            let special_id = resolve(&catalog, special)?;
            if !catalog.is_special(special_id) {
                return Err(CatalogError::NotSpecial(special.clone()).into());
            }
            let anchor_id = resolve(&catalog, anchor)?;
            catalog.set_affinity(special_id, Some(anchor_id));
        }
        Ok(catalog)
    }

    /// Cells row by row; all random when no rows were authored.
    pub fn layout(&self, catalog: &Catalog) -> Result<Vec<Vec<LayoutCell>>, LevelError> {
        if self.rows.is_empty() {
            return Ok(vec![vec![LayoutCell::Random; self.width]; self.height]);
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(y, row)| {
                let found = row.chars().count();
                if found != self.width {
                    return Err(LevelError::RowWidth {
                        row: y,
                        expected: self.width,
                        found,
                    });
                }
                row.chars()
                    .map(|c| match c {
                        '.' => Ok(LayoutCell::Random),
                        '#' => Ok(LayoutCell::Obstacle),
                        _ => catalog
                            .by_symbol(c)
                            .map(LayoutCell::Fixed)
                            .ok_or(LevelError::UnknownSymbol { row: y, symbol: c }),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    pub fn spawn_settings(&self, max_retries: u32, seed: Option<u64>) -> SpawnSettings {
        SpawnSettings {
            special_chance: self.special_chance,
            max_retries,
            seed,
        }
    }

    /// Build the grid, catalog and ledger and hand them to a new board, which fills
    /// the random cells.
    pub fn build<P: Presenter, L: Listener>(
        &self,
        base: &Catalog,
        settings: &SpawnSettings,
        presenter: P,
        listener: L,
    ) -> Result<Board<P, L>, LevelError> {
        let catalog = self.catalog(base)?;
        let layout = self.layout(&catalog)?;
        let cells = || {
            layout.iter().enumerate().flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(x, &cell)| (Pos::new(x, y), cell))
            })
        };
        let obstacles: Vec<Pos> = cells()
            .filter(|&(_, cell)| cell == LayoutCell::Obstacle)
            .map(|(pos, _)| pos)
            .collect();
        let mut grid = Grid::new(self.width, self.height, &obstacles)?;
        for (pos, cell) in cells() {
            if let LayoutCell::Fixed(item) = cell {
                grid.place(pos, item)?;
            }
        }
        let goals = self
            .goals
            .iter()
            .map(|(name, count)| Ok((resolve(&catalog, name)?, *count)))
            .collect::<Result<Vec<_>, LevelError>>()?;
        debug!(
            width = self.width,
            height = self.height,
            obstacles = obstacles.len(),
            goals = goals.len(),
            moves = self.moves,
            "level built"
        );
        let ledger = GoalLedger::new(&goals, self.moves);
        Ok(Board::new(
            grid,
            catalog,
            ledger,
            Spawner::new(settings),
            presenter,
            listener,
        ))
    }
}

fn resolve(catalog: &Catalog, name: &str) -> Result<ItemId, LevelError> {
    catalog
        .by_name(name)
        .ok_or_else(|| CatalogError::UnknownItem(name.to_string()).into())
}

fn number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, LevelError> {
    value.trim().parse().map_err(|_| LevelError::BadNumber {
        key,
        value: value.to_string(),
    })
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `left:right`, both sides trimmed and non-empty.
fn pair(value: &str, line: usize) -> Result<(String, String), LevelError> {
    value
        .split_once(':')
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .ok_or_else(|| LevelError::Parse {
            line,
            msg: format!("expected name:value, got {value:?}"),
        })
}

/// `(key, value, line number)` for every `level[key]="value"` line, in file order.
fn parse_level_file(s: &str) -> Result<Vec<(String, String, usize)>, LevelError> {
    let mut entries = Vec::new();
    for (i, line) in s.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |msg: &str| LevelError::Parse {
            line: line_no,
            msg: msg.to_string(),
        };
        let stripped = line
            .strip_prefix("level[")
            .ok_or_else(|| malformed("expected level[key]=\"value\""))?;
        let end = stripped.find(']').ok_or_else(|| malformed("missing ]"))?;
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        let value = rest
            .strip_prefix('=')
            .ok_or_else(|| malformed("missing ="))?
            .trim()
            .trim_matches('"')
            .trim_matches('\'');
        entries.push((key.to_string(), value.to_string(), line_no));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::Phase;
    use crate::matcher;
    use crate::presenter::Headless;

    const SAMPLE: &str = r##"
# small level
level[moves]="15"
level[goal]="apple:12"
level[goal]='pear: 4'
level[items]="apple, banana, cherry, pear"
level[specials]="dynamite"
level[affinity]="dynamite:apple"
level[special_chance]="0.25"
level[row]="..#.."
level[row]=".A..."
level[row]="....."
level[row]="....."
"##;

    fn settings() -> SpawnSettings {
        SpawnSettings {
            special_chance: 0.0,
            max_retries: 10,
            seed: Some(5),
        }
    }

    #[test]
    fn test_parse_level_file() {
        let entries = parse_level_file(r#"level[moves]="15""#).unwrap();
        assert_eq!(entries, vec![("moves".to_string(), "15".to_string(), 1)]);
        assert!(matches!(
            parse_level_file("moves=15"),
            Err(LevelError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_sample() {
        let level = Level::parse(SAMPLE).unwrap();
        assert_eq!(level.width, 5);
        assert_eq!(level.height, 4);
        assert_eq!(level.moves, 15);
        assert_eq!(
            level.goals,
            vec![("apple".to_string(), 12), ("pear".to_string(), 4)]
        );
        assert_eq!(level.specials, Some(vec!["dynamite".to_string()]));
        assert_eq!(level.special_chance, 0.25);
    }

    #[test]
    fn test_defaults() {
        let level = Level::parse("# nothing\n\n").unwrap();
        assert_eq!(level, Level::default());
        assert_eq!((level.width, level.height, level.moves), (6, 6, 20));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            Level::parse(r#"level[moves]="many""#),
            Err(LevelError::BadNumber { key: "moves", .. })
        ));
        assert!(matches!(
            Level::parse(r#"level[special_chance]="1.5""#),
            Err(LevelError::BadNumber { .. })
        ));
        assert!(matches!(
            Level::parse("level[colour]=\"red\"\n"),
            Err(LevelError::UnknownKey { line: 1, .. })
        ));
        assert!(matches!(
            Level::parse("\nlevel[goal]=\"apple\""),
            Err(LevelError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_layout_cells() {
        let catalog = Catalog::standard();
        let level = Level::parse(SAMPLE).unwrap();
        let layout = level.layout(&catalog).unwrap();
        assert_eq!(layout[0][2], LayoutCell::Obstacle);
        assert_eq!(layout[1][1], LayoutCell::Fixed(catalog.by_name("apple").unwrap()));
        assert_eq!(layout[3][4], LayoutCell::Random);

        let ragged = Level::parse("level[row]=\"....\"\nlevel[row]=\"...\"").unwrap();
        assert!(matches!(
            ragged.layout(&catalog),
            Err(LevelError::RowWidth {
                row: 1,
                expected: 4,
                found: 3
            })
        ));
        let unknown = Level::parse("level[row]=\"..x.\"").unwrap();
        assert!(matches!(
            unknown.layout(&catalog),
            Err(LevelError::UnknownSymbol { row: 0, symbol: 'x' })
        ));
    }

    #[test]
    fn test_catalog_pools_and_affinity() {
        let base = Catalog::standard();
        let level = Level::parse(SAMPLE).unwrap();
        let catalog = level.catalog(&base).unwrap();
        assert_eq!(catalog.items_for_level().len(), 4);
        let dynamite = catalog.by_name("dynamite").unwrap();
        assert_eq!(catalog.special_items(), &[dynamite]);
        let apple = catalog.by_name("apple").unwrap();
        let pear = catalog.by_name("pear").unwrap();
        assert!(catalog.accepts_anchor(dynamite, apple));
        assert!(!catalog.accepts_anchor(dynamite, pear));

        let everything = Level::default().catalog(&base).unwrap();
        assert_eq!(everything, base);

        let wrong = Level::parse(r#"level[affinity]="apple:pear""#).unwrap();
        assert!(matches!(
            wrong.catalog(&base),
            Err(LevelError::Catalog(CatalogError::NotSpecial(_)))
        ));
    }

    #[test]
    fn test_build_board() {
        let catalog = Catalog::standard();
        let level = Level::parse(SAMPLE).unwrap();
        let mut board = level.build(&catalog, &settings(), Headless, ()).unwrap();
        let apple = catalog.by_name("apple").unwrap();
        assert_eq!(board.phase(), Phase::Idle);
        assert_eq!(board.ledger().moves_left(), 15);
        assert_eq!(board.ledger().remaining(apple), Some(12));
        assert!(board.grid().is_obstacle(Pos::new(2, 0)));
        assert_eq!(board.grid().item(Pos::new(1, 1)), Some(apple));
        assert!(!board.grid().has_empty());
        assert_eq!(matcher::poppable_axis(board.grid(), board.catalog()), None);
        assert!(board.hint().is_some());
    }

    #[test]
    fn test_build_errors() {
        let catalog = Catalog::standard();
        let unknown_goal = Level::parse(r#"level[goal]="mango:3""#).unwrap();
        assert!(matches!(
            unknown_goal.build(&catalog, &settings(), Headless, ()),
            Err(LevelError::Catalog(CatalogError::UnknownItem(_)))
        ));
        let tiny = Level::parse("level[width]=\"2\"\nlevel[height]=\"2\"").unwrap();
        assert!(matches!(
            tiny.build(&catalog, &settings(), Headless, ()),
            Err(LevelError::Grid(GridError::NoPlayableShape))
        ));
        let one_item = Level::parse(r#"level[items]="apple""#).unwrap();
        assert!(matches!(
            one_item.build(&catalog, &settings(), Headless, ()),
            Err(LevelError::Catalog(CatalogError::TooFewItems(1)))
        ));
    }
}
