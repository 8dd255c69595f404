//! Configuration errors, reported once when a simulation is built.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("maze layout is empty")]
    Empty,

    #[error("maze row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell code {code} at ({col},{row})")]
    UnknownCode { col: usize, row: usize, code: u8 },

    #[error("unknown cell symbol {symbol:?} at ({col},{row})")]
    UnknownSymbol {
        col: usize,
        row: usize,
        symbol: char,
    },

    #[error("{who} spawn ({col},{row}) is outside the maze or inside a wall")]
    BlockedSpawn { who: String, col: i32, row: i32 },

    #[error("power duration must be a finite, non-negative number of seconds, got {0}")]
    InvalidPowerDuration(f64),

    #[error("failed to read maze layout: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
