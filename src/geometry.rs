use crate::constants::{
    FRIGHTENED_MIN_SPEED, GHOST_MIN_SPEED, HUD_HEIGHT, HUD_OFFSET, PLAYER_MIN_SPEED, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
use crate::types::{Cell, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenConfig {
    pub width: i32,
    pub height: i32,
    /// Vertical band reserved for the HUD, split above and below the maze.
    pub hud_height: i32,
    /// Extra downward shift of the maze inside the screen.
    pub hud_offset: i32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            hud_height: HUD_HEIGHT,
            hud_offset: HUD_OFFSET,
        }
    }
}

/// Maps grid cells to the pixel space agents move in. Computed once per simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub tile_size: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl Geometry {
    pub fn fit(screen: ScreenConfig, cols: i32, rows: i32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let tile_size = (screen.width / cols)
            .min((screen.height - screen.hud_height) / rows)
            .max(4);
        let offset_x = (screen.width - cols * tile_size).div_euclid(2);
        let offset_y = (screen.height - rows * tile_size).div_euclid(2) + screen.hud_offset;
        Self {
            tile_size,
            offset_x,
            offset_y,
        }
    }

    pub fn tile(&self) -> f32 {
        self.tile_size as f32
    }

    pub fn cell_center(&self, cell: Cell) -> Point {
        let half = self.tile_size / 2;
        Point {
            x: (self.offset_x + cell.col * self.tile_size + half) as f32,
            y: (self.offset_y + cell.row * self.tile_size + half) as f32,
        }
    }

    pub fn cell_at(&self, point: Point) -> Cell {
        Cell {
            col: ((point.x - self.offset_x as f32) / self.tile()).floor() as i32,
            row: ((point.y - self.offset_y as f32) / self.tile()).floor() as i32,
        }
    }

    pub fn agent_radius(&self) -> f32 {
        (self.tile_size / 2 - 2).max(1) as f32
    }

    pub fn player_speed(&self) -> f32 {
        PLAYER_MIN_SPEED.max(self.tile() / 8.0)
    }

    pub fn ghost_speed(&self) -> f32 {
        GHOST_MIN_SPEED.max(self.tile() / 9.0)
    }

    pub fn frightened_speed(&self) -> f32 {
        FRIGHTENED_MIN_SPEED.max(self.tile() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_screen_fits_sixteen_by_sixteen_maze() {
        let geometry = Geometry::fit(ScreenConfig::default(), 16, 16);
        assert_eq!(geometry.tile_size, 32);
        assert_eq!(geometry.offset_x, 144);
        assert_eq!(geometry.offset_y, 84);
        assert_eq!(geometry.agent_radius(), 14.0);
        assert_eq!(geometry.player_speed(), 4.0);
    }

    #[test]
    fn cell_center_maps_back_to_same_cell() {
        let geometry = Geometry::fit(ScreenConfig::default(), 16, 16);
        for (col, row) in [(0, 0), (1, 1), (7, 13), (15, 15)] {
            let cell = Cell::new(col, row);
            assert_eq!(geometry.cell_at(geometry.cell_center(cell)), cell);
        }
    }

    #[test]
    fn points_left_of_the_maze_map_to_negative_cells() {
        let geometry = Geometry::fit(ScreenConfig::default(), 16, 16);
        let cell = geometry.cell_at(Point { x: 10.0, y: 10.0 });
        assert!(cell.col < 0);
        assert!(cell.row < 0);
    }
}
