use std::path::Path;

use crate::constants::{PELLET_POINTS, POWER_PELLET_POINTS};
use crate::error::{LayoutError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Empty,
    Pellet,
    PowerPellet,
}

impl CellKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Wall),
            2 => Some(Self::Pellet),
            3 => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '0' | '-' => Some(Self::Empty),
            '1' | '#' => Some(Self::Wall),
            '2' | '.' => Some(Self::Pellet),
            '3' | 'o' => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            CellKind::Wall => '#',
            CellKind::Empty => '-',
            CellKind::Pellet => '.',
            CellKind::PowerPellet => 'o',
        }
    }

    fn is_collectible(self) -> bool {
        matches!(self, CellKind::Pellet | CellKind::PowerPellet)
    }
}

/// Rectangular maze: fixed walls plus the collectibles still on the board.
#[derive(Clone, Debug)]
pub struct Maze {
    cols: i32,
    rows: i32,
    cells: Vec<CellKind>,
    collectibles: usize,
}

impl Maze {
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let grid = rows
            .iter()
            .enumerate()
            .map(|(row, codes)| {
                codes
                    .as_ref()
                    .iter()
                    .enumerate()
                    .map(|(col, &code)| match CellKind::from_code(code) {
                        Some(kind) => Ok(kind),
                        None => Err(LayoutError::UnknownCode { col, row, code }),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_grid(grid)
    }

    /// Parses one row per non-blank line, written with digit codes or `#`, `-`, `.`, `o`.
    pub fn parse(text: &str) -> Result<Self> {
        let grid = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .filter(|symbol| !matches!(symbol, ',' | ' '))
                    .enumerate()
                    .map(|(col, symbol)| match CellKind::from_symbol(symbol) {
                        Some(kind) => Ok(kind),
                        None => Err(LayoutError::UnknownSymbol { col, row, symbol }),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_grid(grid)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn from_grid(grid: Vec<Vec<CellKind>>) -> Result<Self> {
        let expected = grid.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(LayoutError::Empty);
        }
        if let Some((row, found)) = grid
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != expected)
        {
            return Err(LayoutError::Ragged {
                row,
                expected,
                found,
            });
        }

        let rows = grid.len() as i32;
        let cells: Vec<CellKind> = grid.into_iter().flatten().collect();
        let collectibles = cells.iter().filter(|kind| kind.is_collectible()).count();
        Ok(Self {
            cols: expected as i32,
            rows,
            cells,
            collectibles,
        })
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols || row >= self.rows {
            return None;
        }
        Some((row * self.cols + col) as usize)
    }

    pub fn cell(&self, col: i32, row: i32) -> Option<CellKind> {
        self.index(col, row).map(|idx| self.cells[idx])
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.cell(col, row).is_none_or(|kind| kind == CellKind::Wall)
    }

    pub fn has_pellet(&self, col: i32, row: i32) -> bool {
        self.cell(col, row) == Some(CellKind::Pellet)
    }

    pub fn has_power_pellet(&self, col: i32, row: i32) -> bool {
        self.cell(col, row) == Some(CellKind::PowerPellet)
    }

    /// Clears a collectible and returns its points; anything else yields 0.
    pub fn consume(&mut self, col: i32, row: i32) -> u32 {
        let Some(idx) = self.index(col, row) else {
            return 0;
        };
        let points = match self.cells[idx] {
            CellKind::Pellet => PELLET_POINTS,
            CellKind::PowerPellet => POWER_PELLET_POINTS,
            CellKind::Wall | CellKind::Empty => return 0,
        };
        self.cells[idx] = CellKind::Empty;
        self.collectibles -= 1;
        points
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.collectibles
    }

    pub fn tiles(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols as usize)
            .map(|row| row.iter().map(|kind| kind.symbol()).collect())
            .collect()
    }
}
