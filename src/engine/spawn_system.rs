use super::*;
use crate::error::LayoutError;

pub(super) fn validate_spawns(options: &GameEngineOptions) -> Result<()> {
    let layout = &options.layout;
    let spawns = std::iter::once(("player".to_string(), options.player_spawn)).chain(
        options
            .ghosts
            .iter()
            .enumerate()
            .map(|(idx, ghost)| (format!("ghost {}", idx + 1), ghost.home)),
    );
    for (who, cell) in spawns {
        if layout.is_wall(cell.col, cell.row) {
            return Err(LayoutError::BlockedSpawn {
                who,
                col: cell.col,
                row: cell.row,
            });
        }
    }
    let duration = options.power_duration_secs;
    if !duration.is_finite() || duration < 0.0 {
        return Err(LayoutError::InvalidPowerDuration(duration));
    }
    Ok(())
}

pub(super) fn spawn_actors(
    options: &GameEngineOptions,
    geometry: &Geometry,
) -> (Mover, Vec<Ghost>) {
    let player = Mover::spawn_at(options.player_spawn, geometry, geometry.player_speed());
    let ghosts = options
        .ghosts
        .iter()
        .enumerate()
        .map(|(idx, spawn)| {
            Ghost::new(
                format!("ghost_{}", idx + 1),
                spawn.home,
                spawn.color,
                spawn.kind,
                geometry,
            )
        })
        .collect();
    (player, ghosts)
}
