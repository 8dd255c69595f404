use crate::types::{Cell, GhostColor, GhostKind};

pub const TICK_RATE: u32 = 60;
pub const TICK_SECONDS: f64 = 1.0 / TICK_RATE as f64;
pub const TICK_US: u64 = 1_000_000 / TICK_RATE as u64;

pub const POWER_DURATION_SECS: f64 = 8.0;
pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const GHOST_POINTS: u32 = 200;

/// Fraction of the summed radii under which two agents touch.
pub const COLLISION_FACTOR: f32 = 0.9;
/// Max distance (px) from a cell center that still counts as centered.
pub const CENTER_EPSILON: f32 = 1.0;
/// Countdowns at or below this are treated as expired.
pub const TIMER_EPSILON: f64 = 1e-6;

pub const SCREEN_WIDTH: i32 = 800;
pub const SCREEN_HEIGHT: i32 = 600;
pub const HUD_HEIGHT: i32 = 80;
pub const HUD_OFFSET: i32 = 40;

pub const PLAYER_MIN_SPEED: f32 = 1.5;
pub const GHOST_MIN_SPEED: f32 = 1.2;
pub const FRIGHTENED_MIN_SPEED: f32 = 1.0;

pub const PATROL_KEEP_HEADING: f64 = 0.7;

// 1 = wall, 0 = empty, 2 = pellet, 3 = power pellet
pub const CLASSIC_LAYOUT: [[u8; 16]; 16] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 3, 1],
    [1, 2, 1, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1, 2, 2, 1],
    [1, 2, 2, 2, 1, 2, 2, 2, 2, 2, 1, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 1, 1, 1, 3, 1, 1, 1, 2, 1, 2, 2, 1],
    [1, 2, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 2, 1],
    [1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, 2, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 0, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 3, 1, 1, 1, 2, 1, 1, 1, 2, 1, 1, 1, 2, 3, 1],
    [1, 2, 2, 2, 1, 2, 2, 2, 2, 2, 1, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 1, 1, 1, 3, 1, 1, 1, 2, 1, 2, 2, 1],
    [1, 2, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 2, 2, 1],
    [1, 2, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, 2, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 0, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 2, 2, 2, 2, 2, 2, 3, 2, 2, 2, 2, 2, 2, 2, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

pub const CLASSIC_PLAYER_SPAWN: Cell = Cell { col: 1, row: 1 };

pub fn classic_ghost_spawns() -> Vec<(Cell, GhostColor, GhostKind)> {
    vec![
        (Cell { col: 14, row: 1 }, GhostColor::Red, GhostKind::Wander),
        (
            Cell { col: 14, row: 14 },
            GhostColor::Pink,
            GhostKind::Wander,
        ),
    ]
}
