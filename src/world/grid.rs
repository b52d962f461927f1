// Tile grids the caster walks.  The engine only ever reads them; the game
// owns the data and may edit it between frames (doors, destructible walls).

/// One map level, indexed `grid[x][y]`.
///
/// * `<= 0` – passable, nothing drawn
/// * `n > 0` – wall, drawn with wall texture `n - 1`
pub type Grid = Vec<Vec<i32>>;

/// Read-only source of level grids.
///
/// Every level must be square and the same size as level 0; the caster uses
/// level 0's width for both axes when bounds-checking.
pub trait Map: Sync {
    fn num_levels(&self) -> usize;

    fn level(&self, index: usize) -> &Grid;

    /// Edge length of the (square) level grids.
    #[inline]
    fn size(&self) -> usize {
        self.level(0).len()
    }
}

/// Things that can go wrong when assembling a [`GridMap`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no levels")]
    NoLevels,

    #[error("level {0} is empty")]
    EmptyLevel(usize),

    /// A column of the grid has a different length than the grid width.
    #[error("level {level} is not square: column {column} has {rows} rows, expected {size}")]
    NotSquare {
        level: usize,
        column: usize,
        rows: usize,
        size: usize,
    },

    #[error("level {level} is {got} tiles wide, level 0 is {expected}")]
    SizeMismatch {
        level: usize,
        got: usize,
        expected: usize,
    },

    #[error("level {level} row {row}: unknown tile character `{ch}`")]
    BadTile { level: usize, row: usize, ch: char },
}

/// Plain in-memory [`Map`] with validated, square, same-sized levels.
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    levels: Vec<Grid>,
}

impl GridMap {
    pub fn new(levels: Vec<Grid>) -> Result<Self, MapError> {
        let expected = levels.first().ok_or(MapError::NoLevels)?.len();

        for (level, grid) in levels.iter().enumerate() {
            if grid.is_empty() {
                return Err(MapError::EmptyLevel(level));
            }
            if grid.len() != expected {
                return Err(MapError::SizeMismatch {
                    level,
                    got: grid.len(),
                    expected,
                });
            }
            if let Some((column, col)) = grid.iter().enumerate().find(|(_, c)| c.len() != expected)
            {
                return Err(MapError::NotSquare {
                    level,
                    column,
                    rows: col.len(),
                    size: expected,
                });
            }
        }

        Ok(Self { levels })
    }

    /// Build a map from ASCII art, one string per level.
    ///
    /// Each text row is a map row (`y`), each character a column (`x`):
    /// `.`/space are empty, `1`-`9` are tile codes.
    ///
    /// ```text
    /// 111
    /// 1.1
    /// 111
    /// ```
    pub fn parse(levels: &[&str]) -> Result<Self, MapError> {
        let grids = levels
            .iter()
            .enumerate()
            .map(|(level, text)| parse_level(level, text))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(grids)
    }

    /// Tile code at `(x, y)` on `level`, `None` when outside the map.
    pub fn tile(&self, level: usize, x: usize, y: usize) -> Option<i32> {
        self.levels.get(level)?.get(x)?.get(y).copied()
    }

    /// Overwrite a single tile; returns `false` if the cell does not exist.
    pub fn set_tile(&mut self, level: usize, x: usize, y: usize, code: i32) -> bool {
        match self
            .levels
            .get_mut(level)
            .and_then(|g| g.get_mut(x))
            .and_then(|c| c.get_mut(y))
        {
            Some(cell) => {
                *cell = code;
                true
            }
            None => false,
        }
    }
}

impl Map for GridMap {
    #[inline]
    fn num_levels(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    fn level(&self, index: usize) -> &Grid {
        &self.levels[index]
    }
}

fn parse_level(level: usize, text: &str) -> Result<Grid, MapError> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    // transpose: text is row-major, grids are column-major
    let mut grid = vec![vec![0; rows.len()]; width];
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            grid[x][y] = match ch {
                '.' | ' ' => 0,
                '1'..='9' => ch as i32 - '0' as i32,
                _ => return Err(MapError::BadTile { level, row: y, ch }),
            };
        }
    }
    Ok(grid)
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transposes_rows_into_columns() {
        let map = GridMap::parse(&["123\n4.5\n678"]).unwrap();
        assert_eq!(map.size(), 3);
        // (x, y) = (2, 0) is the '3' in the top row
        assert_eq!(map.tile(0, 2, 0), Some(3));
        assert_eq!(map.tile(0, 0, 1), Some(4));
        assert_eq!(map.tile(0, 1, 1), Some(0));
        assert_eq!(map.tile(0, 3, 0), None);
    }

    #[test]
    fn rejects_non_square_and_mismatched_levels() {
        assert_eq!(GridMap::new(vec![]).unwrap_err(), MapError::NoLevels);

        let err = GridMap::new(vec![vec![vec![0, 0], vec![0]]]).unwrap_err();
        assert_eq!(
            err,
            MapError::NotSquare {
                level: 0,
                column: 1,
                rows: 1,
                size: 2
            }
        );

        let err = GridMap::new(vec![vec![vec![0; 2]; 2], vec![vec![0; 3]; 3]]).unwrap_err();
        assert_eq!(
            err,
            MapError::SizeMismatch {
                level: 1,
                got: 3,
                expected: 2
            }
        );
    }

    #[test]
    fn bad_tile_character() {
        let err = GridMap::parse(&["1x\n11"]).unwrap_err();
        assert_eq!(
            err,
            MapError::BadTile {
                level: 0,
                row: 0,
                ch: 'x'
            }
        );
    }

    #[test]
    fn set_tile_guards_bounds() {
        let mut map = GridMap::parse(&["..\n.."]).unwrap();
        assert!(map.set_tile(0, 1, 1, 7));
        assert_eq!(map.tile(0, 1, 1), Some(7));
        assert!(!map.set_tile(0, 2, 0, 1));
        assert!(!map.set_tile(1, 0, 0, 1));
    }
}
