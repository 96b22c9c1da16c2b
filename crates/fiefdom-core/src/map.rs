use serde::{Deserialize, Serialize};
use thiserror::Error;

use fiefdom_protocol::{CellSnapshot, MapSnapshot, Pos};

use crate::config::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map shape is empty")]
    Empty,
    #[error("row {row} has {got} cells, expected {expected}")]
    IrregularRow { row: usize, expected: usize, got: usize },
    #[error("unknown cell character '{ch}' at row {row}, column {col}")]
    UnknownCell { ch: char, row: usize, col: usize },
}

/// One grid cell. Position is implicit in the map index.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Removed cells are holes in the board; nothing interacts with them.
    pub removed: bool,
    /// A player base may be placed here at game start.
    pub spawn: bool,
    /// Exactly one element may stand on a cell at a time.
    pub occupied: bool,
    /// Elements standing here get periodic bonus effects.
    pub bonus: bool,
}

#[derive(Clone, Debug)]
pub struct GameMap {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl GameMap {
    /// Parse a map shape: one row per line, `.` normal, `S` spawn, `X` removed,
    /// `C` bonus. All rows must have the same length.
    pub fn parse_shape(shape: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = shape.lines().filter(|l| !l.trim().is_empty()).collect();
        if rows.is_empty() {
            return Err(MapError::Empty);
        }

        let width = rows[0].chars().count();
        if width == 0 {
            return Err(MapError::Empty);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let got = line.chars().count();
            if got != width {
                return Err(MapError::IrregularRow {
                    row,
                    expected: width,
                    got,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::default(),
                    'S' => Cell {
                        spawn: true,
                        ..Cell::default()
                    },
                    'X' => Cell {
                        removed: true,
                        ..Cell::default()
                    },
                    'C' => Cell {
                        bonus: true,
                        ..Cell::default()
                    },
                    other => {
                        return Err(MapError::UnknownCell {
                            ch: other,
                            row,
                            col,
                        })
                    }
                };
                cells.push(cell);
            }
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            cells,
        })
    }

    /// Default rectangular board: top row removed, the four near-corner
    /// cells of the remaining area are spawns.
    pub fn build_rect(width: i32, height: i32) -> Self {
        let width = width.max(3);
        let height = height.max(3);
        let mut cells = vec![Cell::default(); (width * height) as usize];
        for x in 0..width {
            cells[x as usize].removed = true;
        }

        let mut map = Self {
            width,
            height,
            cells,
        };
        for pos in [
            Pos::new(0, 1),
            Pos::new(0, height - 1),
            Pos::new(width - 1, 1),
            Pos::new(width - 1, height - 1),
        ] {
            map.cell_mut(pos).expect("corner in bounds").spawn = true;
        }
        map
    }

    pub fn build_default() -> Self {
        Self::build_rect(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[inline]
    fn index(&self, pos: Pos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// In-bounds and not removed.
    pub fn is_usable(&self, pos: Pos) -> bool {
        self.cell(pos).map(|c| !c.removed).unwrap_or(false)
    }

    pub fn is_free(&self, pos: Pos) -> bool {
        self.cell(pos)
            .map(|c| !c.removed && !c.occupied)
            .unwrap_or(false)
    }

    /// Row-major iteration over usable cells.
    pub fn iter_usable(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                let pos = Pos::new(x, y);
                if self.is_usable(pos) {
                    Some(pos)
                } else {
                    None
                }
            })
        })
    }

    pub fn usable_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.removed).count()
    }

    /// Unclaimed spawn cells, row-major.
    pub fn spawn_cells(&self) -> Vec<Pos> {
        self.iter_usable()
            .filter(|&p| {
                let c = self.cell(p).expect("usable implies in bounds");
                c.spawn && !c.occupied
            })
            .collect()
    }

    pub fn neighbors4(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        pos.orthogonal_neighbors().filter(move |&n| self.in_bounds(n))
    }

    pub fn neighbors8(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        pos.all_neighbors().filter(move |&n| self.in_bounds(n))
    }

    pub fn to_snapshot(&self) -> MapSnapshot {
        MapSnapshot {
            width: self.width,
            height: self.height,
            cells: self
                .cells
                .iter()
                .map(|c| CellSnapshot {
                    removed: c.removed,
                    spawn: c.spawn,
                    bonus: c.bonus,
                })
                .collect(),
        }
    }

    /// Rebuild from a snapshot. Occupancy flags are re-derived by the caller
    /// when elements are placed back.
    pub fn from_snapshot(snap: &MapSnapshot) -> Self {
        Self {
            width: snap.width,
            height: snap.height,
            cells: snap
                .cells
                .iter()
                .map(|c| Cell {
                    removed: c.removed,
                    spawn: c.spawn,
                    occupied: false,
                    bonus: c.bonus,
                })
                .collect(),
        }
    }
}
