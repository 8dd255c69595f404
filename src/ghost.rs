use crate::constants::{PATROL_KEEP_HEADING, TIMER_EPSILON};
use crate::geometry::Geometry;
use crate::maze::Maze;
use crate::motion::Mover;
use crate::rng::Rng;
use crate::types::{Cell, Direction, GhostColor, GhostKind, GhostView};

#[derive(Clone, Debug)]
pub struct Ghost {
    pub id: String,
    pub mover: Mover,
    pub home: Cell,
    pub kind: GhostKind,
    base_color: GhostColor,
    color: GhostColor,
    base_speed: f32,
    frightened_speed: f32,
    frightened: bool,
    frightened_remaining: f64,
}

impl Ghost {
    pub fn new(
        id: String,
        home: Cell,
        color: GhostColor,
        kind: GhostKind,
        geometry: &Geometry,
    ) -> Self {
        let base_speed = geometry.ghost_speed();
        Self {
            id,
            mover: Mover::spawn_at(home, geometry, base_speed),
            home,
            kind,
            base_color: color,
            color,
            base_speed,
            frightened_speed: geometry.frightened_speed(),
            frightened: false,
            frightened_remaining: 0.0,
        }
    }

    pub fn is_frightened(&self) -> bool {
        self.frightened
    }

    pub fn frightened_remaining(&self) -> f64 {
        self.frightened_remaining
    }

    pub fn color(&self) -> GhostColor {
        self.color
    }

    pub fn scare(&mut self, duration: f64) {
        if duration <= TIMER_EPSILON {
            return;
        }
        self.frightened = true;
        self.frightened_remaining = duration;
        self.color = GhostColor::Frightened;
        self.mover.speed = self.frightened_speed;
    }

    /// Leaves the frightened state, restoring base speed and color together.
    pub fn calm(&mut self) {
        self.frightened = false;
        self.frightened_remaining = 0.0;
        self.color = self.base_color;
        self.mover.speed = self.base_speed;
    }

    /// Counts the frightened timer down; returns true on the tick it runs out.
    pub fn tick_fright(&mut self, dt: f64) -> bool {
        if !self.frightened {
            return false;
        }
        self.frightened_remaining -= dt;
        if self.frightened_remaining <= TIMER_EPSILON {
            self.calm();
            return true;
        }
        false
    }

    pub fn respawn(&mut self, geometry: &Geometry) {
        self.mover.teleport(self.home, geometry);
        self.calm();
    }

    /// Open directions from the current cell, never reversing unless it is the only way out.
    pub fn legal_directions(&self, maze: &Maze) -> Vec<Direction> {
        let reverse = self.mover.dir.opposite();
        let open: Vec<Direction> = Direction::MOVES
            .into_iter()
            .filter(|dir| self.mover.is_open(maze, *dir))
            .collect();
        let forward: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|dir| reverse == Direction::None || *dir != reverse)
            .collect();
        if forward.is_empty() {
            open
        } else {
            forward
        }
    }

    /// Picks the next heading when sitting on a cell center; elsewhere the ghost keeps going.
    pub fn choose_direction(
        &mut self,
        maze: &Maze,
        geometry: &Geometry,
        target: Cell,
        rng: &mut Rng,
    ) {
        if !self.mover.is_centered(geometry) {
            return;
        }
        let candidates = self.legal_directions(maze);
        if candidates.is_empty() {
            return;
        }
        let kind = if self.frightened {
            GhostKind::Wander
        } else {
            self.kind
        };
        let dir = pick_direction(
            kind,
            &candidates,
            self.mover.dir,
            self.mover.cell,
            target,
            rng,
        );
        self.mover.set_dir(dir);
    }

    pub fn view(&self) -> GhostView {
        GhostView {
            id: self.id.clone(),
            cell: self.mover.cell,
            x: self.mover.pos.x,
            y: self.mover.pos.y,
            dir: self.mover.dir,
            color: self.color,
            kind: self.kind,
            frightened: self.frightened,
            frightened_remaining: self.frightened_remaining,
            home: self.home,
            radius: self.mover.radius,
        }
    }
}

/// Given legal non-reversing moves, pick one. `candidates` must not be empty.
pub fn pick_direction(
    kind: GhostKind,
    candidates: &[Direction],
    heading: Direction,
    from: Cell,
    target: Cell,
    rng: &mut Rng,
) -> Direction {
    match kind {
        GhostKind::Wander => candidates[rng.pick_index(candidates.len())],
        GhostKind::Patrol => {
            if candidates.contains(&heading) && rng.bool(PATROL_KEEP_HEADING) {
                heading
            } else {
                candidates[rng.pick_index(candidates.len())]
            }
        }
        GhostKind::Chaser => candidates
            .iter()
            .copied()
            .min_by_key(|dir| from.step(*dir).manhattan(target))
            .unwrap_or(heading),
    }
}
