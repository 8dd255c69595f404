use std::collections::{HashSet, VecDeque};

use crate::maze::Maze;
use crate::types::{Cell, Direction, Snapshot};

/// Cells within this Manhattan distance of a non-frightened ghost are avoided.
const DANGER_RADIUS: i32 = 1;

/// Picks the first step of the shortest safe path to the nearest pellet or power pellet.
///
/// Falls back to ignoring ghosts when no safe path exists, and returns `None`
/// (keep the current intent) when nothing is reachable at all.
pub fn choose_input(maze: &Maze, snapshot: &Snapshot) -> Option<Direction> {
    let start = snapshot.player.cell;
    let danger: HashSet<Cell> = snapshot
        .ghosts
        .iter()
        .filter(|ghost| !ghost.frightened)
        .flat_map(|ghost| danger_zone(ghost.cell))
        .collect();

    first_step_to_collectible(maze, start, &danger)
        .or_else(|| first_step_to_collectible(maze, start, &HashSet::new()))
}

fn danger_zone(center: Cell) -> Vec<Cell> {
    let mut cells = Vec::new();
    for dr in -DANGER_RADIUS..=DANGER_RADIUS {
        for dc in -DANGER_RADIUS..=DANGER_RADIUS {
            if dr.abs() + dc.abs() <= DANGER_RADIUS {
                cells.push(Cell::new(center.col + dc, center.row + dr));
            }
        }
    }
    cells
}

fn first_step_to_collectible(
    maze: &Maze,
    start: Cell,
    blocked: &HashSet<Cell>,
) -> Option<Direction> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::new();
    for dir in Direction::MOVES {
        let next = start.step(dir);
        if is_passable(maze, next, blocked) && visited.insert(next) {
            queue.push_back((next, dir));
        }
    }

    while let Some((cell, first)) = queue.pop_front() {
        if maze.has_pellet(cell.col, cell.row) || maze.has_power_pellet(cell.col, cell.row) {
            return Some(first);
        }
        for dir in Direction::MOVES {
            let next = cell.step(dir);
            if is_passable(maze, next, blocked) && visited.insert(next) {
                queue.push_back((next, first));
            }
        }
    }
    None
}

fn is_passable(maze: &Maze, cell: Cell, blocked: &HashSet<Cell>) -> bool {
    !maze.is_wall(cell.col, cell.row) && !blocked.contains(&cell)
}
