use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub const MOVES: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            col: self.col + dx,
            row: self.row + dy,
        }
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostColor {
    Red,
    Pink,
    Cyan,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostKind {
    Wander,
    Patrol,
    Chaser,
}

impl GhostKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wander" => Some(Self::Wander),
            "patrol" => Some(Self::Patrol),
            "chaser" => Some(Self::Chaser),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Playing,
    Lost,
    Won,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickRate")]
    pub tick_rate: u32,
    #[serde(rename = "powerDurationSecs")]
    pub power_duration_secs: f64,
    #[serde(rename = "pelletPoints")]
    pub pellet_points: u32,
    #[serde(rename = "powerPelletPoints")]
    pub power_pellet_points: u32,
    #[serde(rename = "ghostPoints")]
    pub ghost_points: u32,
    pub seed: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeInit {
    pub cols: i32,
    pub rows: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: i32,
    #[serde(rename = "offsetX")]
    pub offset_x: i32,
    #[serde(rename = "offsetY")]
    pub offset_y: i32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub cell: Cell,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    pub radius: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: String,
    pub cell: Cell,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub color: GhostColor,
    pub kind: GhostKind,
    pub frightened: bool,
    #[serde(rename = "frightenedRemaining")]
    pub frightened_remaining: f64,
    pub home: Cell,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        cell: Cell,
    },
    PowerPelletEaten {
        cell: Cell,
    },
    PowerEnded,
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: String,
    },
    PlayerCaught {
        #[serde(rename = "ghostId")]
        ghost_id: String,
    },
    MazeCleared,
    Reset {
        seed: u64,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u32,
    #[serde(rename = "powerRemaining")]
    pub power_remaining: f64,
    pub outcome: Outcome,
    #[serde(rename = "collectiblesRemaining")]
    pub collectibles_remaining: usize,
    pub tiles: Vec<String>,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub outcome: Outcome,
    pub score: u32,
    pub ticks: u64,
    #[serde(rename = "durationSecs")]
    pub duration_secs: f64,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    pub power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "collectiblesRemaining")]
    pub collectibles_remaining: usize,
}
