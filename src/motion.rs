use crate::constants::CENTER_EPSILON;
use crate::geometry::Geometry;
use crate::maze::Maze;
use crate::types::{Cell, Direction, Point};

/// Continuous-position movement shared by the player and the ghosts.
///
/// `pos` is authoritative; `cell` is the grid cell containing it. Turns only
/// happen on a cell center, and a move never carries the agent past the next
/// center, so every center along a corridor is visited.
#[derive(Clone, Debug)]
pub struct Mover {
    pub cell: Cell,
    pub pos: Point,
    pub dir: Direction,
    pub next_dir: Direction,
    pub speed: f32,
    pub radius: f32,
}

impl Mover {
    pub fn spawn_at(cell: Cell, geometry: &Geometry, speed: f32) -> Self {
        Self {
            cell,
            pos: geometry.cell_center(cell),
            dir: Direction::None,
            next_dir: Direction::None,
            speed,
            radius: geometry.agent_radius(),
        }
    }

    /// Buffers a turn; it is applied the next time the mover sits on a cell center.
    pub fn set_dir(&mut self, dir: Direction) {
        self.next_dir = dir;
    }

    pub fn teleport(&mut self, cell: Cell, geometry: &Geometry) {
        self.cell = cell;
        self.pos = geometry.cell_center(cell);
        self.dir = Direction::None;
        self.next_dir = Direction::None;
    }

    pub fn sync_cell(&mut self, geometry: &Geometry) {
        self.cell = geometry.cell_at(self.pos);
    }

    pub fn is_centered(&self, geometry: &Geometry) -> bool {
        let center = geometry.cell_center(self.cell);
        (self.pos.x - center.x).abs() < CENTER_EPSILON
            && (self.pos.y - center.y).abs() < CENTER_EPSILON
    }

    pub fn is_open(&self, maze: &Maze, dir: Direction) -> bool {
        let next = self.cell.step(dir);
        !maze.is_wall(next.col, next.row)
    }

    /// Advances one tick. `speed` is nominal near centers: a move that would end within
    /// `CENTER_EPSILON` of the next center lands on it, so one tick covers up to
    /// `speed + CENTER_EPSILON`.
    pub fn step(&mut self, maze: &Maze, geometry: &Geometry) {
        self.sync_cell(geometry);
        let centered = self.is_centered(geometry);

        if centered {
            if self.next_dir != Direction::None && self.is_open(maze, self.next_dir) {
                self.dir = self.next_dir;
            }
            if self.dir != Direction::None && !self.is_open(maze, self.dir) {
                self.dir = Direction::None;
            }
        }

        let center = geometry.cell_center(self.cell);
        let (dx, dy) = self.dir.delta();
        if dx == 0 && dy == 0 {
            self.pos = center;
            return;
        }

        let along = if dx != 0 {
            (center.x - self.pos.x) * dx as f32
        } else {
            (center.y - self.pos.y) * dy as f32
        };
        let (ahead, target) = if centered || along <= 0.0 {
            (along + geometry.tile(), self.cell.step(self.dir))
        } else {
            (along, self.cell)
        };

        // land exactly on the center rather than stopping just short of or past it
        if ahead - self.speed < CENTER_EPSILON {
            let landing = geometry.cell_center(target);
            if dx != 0 {
                self.pos.x = landing.x;
            } else {
                self.pos.y = landing.y;
            }
        } else {
            self.pos.x += dx as f32 * self.speed;
            self.pos.y += dy as f32 * self.speed;
        }

        // corridor clamp
        if dx == 0 {
            self.pos.x = center.x;
        }
        if dy == 0 {
            self.pos.y = center.y;
        }
        self.sync_cell(geometry);
    }
}
