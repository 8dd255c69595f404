use crate::constants::{
    classic_ghost_spawns, CLASSIC_LAYOUT, CLASSIC_PLAYER_SPAWN, GHOST_POINTS, PELLET_POINTS,
    POWER_DURATION_SECS, POWER_PELLET_POINTS, TICK_RATE, TICK_SECONDS,
};
use crate::error::Result;
use crate::geometry::{Geometry, ScreenConfig};
use crate::ghost::Ghost;
use crate::maze::Maze;
use crate::motion::Mover;
use crate::rng::Rng;
use crate::types::{
    Cell, Direction, GameConfig, GameSummary, GhostColor, GhostKind, MazeInit, Outcome, PlayerView,
    RuntimeEvent, Snapshot,
};

mod collision_system;
mod spawn_system;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GhostSpawn {
    pub home: Cell,
    pub color: GhostColor,
    pub kind: GhostKind,
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub layout: Maze,
    pub player_spawn: Cell,
    pub ghosts: Vec<GhostSpawn>,
    pub screen: ScreenConfig,
    pub seed: u64,
    pub power_duration_secs: f64,
}

impl GameEngineOptions {
    pub fn classic(seed: u64) -> Result<Self> {
        Ok(Self {
            layout: Maze::from_rows(&CLASSIC_LAYOUT)?,
            player_spawn: CLASSIC_PLAYER_SPAWN,
            ghosts: classic_ghost_spawns()
                .into_iter()
                .map(|(home, color, kind)| GhostSpawn { home, color, kind })
                .collect(),
            screen: ScreenConfig::default(),
            seed,
            power_duration_secs: POWER_DURATION_SECS,
        })
    }

    /// Swaps in another maze; spawn cells stay as they are and are checked by `GameEngine::new`.
    pub fn with_layout(mut self, layout: Maze) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_ghost_kind(mut self, kind: GhostKind) -> Self {
        for ghost in &mut self.ghosts {
            ghost.kind = kind;
        }
        self
    }
}

#[derive(Clone, Debug, Default)]
struct RunStats {
    pellets: u32,
    power_pellets: u32,
    ghosts: u32,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,
    options: GameEngineOptions,
    geometry: Geometry,

    maze: Maze,
    player: Mover,
    ghosts: Vec<Ghost>,
    rng: Rng,

    score: u32,
    power_remaining: f64,
    outcome: Outcome,
    tick_counter: u64,
    events: Vec<RuntimeEvent>,
    stats: RunStats,
}

impl GameEngine {
    /// Validates the configuration once; a built engine never fails afterwards.
    pub fn new(options: GameEngineOptions) -> Result<Self> {
        spawn_system::validate_spawns(&options)?;
        let geometry = Geometry::fit(options.screen, options.layout.cols(), options.layout.rows());
        let config = GameConfig {
            tick_rate: TICK_RATE,
            power_duration_secs: options.power_duration_secs,
            pellet_points: PELLET_POINTS,
            power_pellet_points: POWER_PELLET_POINTS,
            ghost_points: GHOST_POINTS,
            seed: options.seed,
        };
        let (player, ghosts) = spawn_system::spawn_actors(&options, &geometry);

        Ok(Self {
            config,
            maze: options.layout.clone(),
            rng: Rng::new(options.seed),
            options,
            geometry,
            player,
            ghosts,
            score: 0,
            power_remaining: 0.0,
            outcome: Outcome::Playing,
            tick_counter: 0,
            events: Vec::new(),
            stats: RunStats::default(),
        })
    }

    pub fn is_ended(&self) -> bool {
        self.outcome != Outcome::Playing
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn maze_init(&self) -> MazeInit {
        MazeInit {
            cols: self.maze.cols(),
            rows: self.maze.rows(),
            tile_size: self.geometry.tile_size,
            offset_x: self.geometry.offset_x,
            offset_y: self.geometry.offset_y,
            tiles: self.maze.tiles(),
        }
    }

    /// Advances one fixed step. `Some(dir)` replaces the buffered turn; `None` keeps it.
    pub fn step(&mut self, input: Option<Direction>) {
        if self.is_ended() {
            return;
        }
        self.tick_counter += 1;

        if let Some(dir) = input {
            self.player.set_dir(dir);
        }
        self.player.step(&self.maze, &self.geometry);
        self.apply_player_pickups();
        self.update_ghosts();
        self.update_power_timer(TICK_SECONDS);

        if self.maze.remaining_collectibles() == 0 {
            self.finish(Outcome::Won);
        }
        self.resolve_ghost_collisions();
    }

    /// Discards every piece of state and rebuilds it from the starting configuration.
    pub fn reset(&mut self) {
        self.reset_with_seed(self.options.seed);
    }

    pub fn reset_with_seed(&mut self, seed: u64) {
        let (player, ghosts) = spawn_system::spawn_actors(&self.options, &self.geometry);
        self.maze = self.options.layout.clone();
        self.player = player;
        self.ghosts = ghosts;
        self.rng = Rng::new(seed);
        self.config.seed = seed;
        self.score = 0;
        self.power_remaining = 0.0;
        self.outcome = Outcome::Playing;
        self.tick_counter = 0;
        self.stats = RunStats::default();
        self.events.clear();
        self.events.push(RuntimeEvent::Reset { seed });
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            score: self.score,
            power_remaining: self.power_remaining,
            outcome: self.outcome,
            collectibles_remaining: self.maze.remaining_collectibles(),
            tiles: self.maze.tiles(),
            player: PlayerView {
                cell: self.player.cell,
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.dir,
                next_dir: self.player.next_dir,
                radius: self.player.radius,
            },
            ghosts: self.ghosts.iter().map(Ghost::view).collect(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            outcome: self.outcome,
            score: self.score,
            ticks: self.tick_counter,
            duration_secs: self.tick_counter as f64 * TICK_SECONDS,
            pellets_eaten: self.stats.pellets,
            power_pellets_eaten: self.stats.power_pellets,
            ghosts_eaten: self.stats.ghosts,
            collectibles_remaining: self.maze.remaining_collectibles(),
        }
    }

    fn apply_player_pickups(&mut self) {
        let cell = self.player.cell;
        let points = self.maze.consume(cell.col, cell.row);
        if points == 0 {
            return;
        }
        self.score += points;
        if points == POWER_PELLET_POINTS {
            self.stats.power_pellets += 1;
            self.events.push(RuntimeEvent::PowerPelletEaten { cell });
            self.power_remaining = self.options.power_duration_secs;
            for ghost in &mut self.ghosts {
                ghost.scare(self.options.power_duration_secs);
            }
        } else {
            self.stats.pellets += 1;
            self.events.push(RuntimeEvent::PelletEaten { cell });
        }
    }

    fn update_ghosts(&mut self) {
        let target = self.player.cell;
        for ghost in &mut self.ghosts {
            ghost.tick_fright(TICK_SECONDS);
            ghost.choose_direction(&self.maze, &self.geometry, target, &mut self.rng);
            ghost.mover.step(&self.maze, &self.geometry);
        }
    }

    /// Records the first terminal outcome of the game; later ones are ignored.
    fn finish(&mut self, outcome: Outcome) {
        if self.outcome != Outcome::Playing || outcome == Outcome::Playing {
            return;
        }
        self.outcome = outcome;
        if outcome == Outcome::Won {
            self.events.push(RuntimeEvent::MazeCleared);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::TICK_SECONDS;
    use crate::engine::{GameEngine, GameEngineOptions, GhostSpawn};
    use crate::error::LayoutError;
    use crate::geometry::ScreenConfig;
    use crate::maze::Maze;
    use crate::rng::Rng;
    use crate::types::{Cell, Direction, GhostColor, GhostKind, Outcome, RuntimeEvent};

    fn options(rows: &[Vec<u8>], player: Cell, ghosts: &[Cell]) -> GameEngineOptions {
        GameEngineOptions {
            layout: Maze::from_rows(rows).expect("valid layout"),
            player_spawn: player,
            ghosts: ghosts
                .iter()
                .map(|home| GhostSpawn {
                    home: *home,
                    color: GhostColor::Red,
                    kind: GhostKind::Wander,
                })
                .collect(),
            screen: ScreenConfig::default(),
            seed: 17,
            power_duration_secs: 8.0,
        }
    }

    fn classic(seed: u64) -> GameEngine {
        GameEngine::new(GameEngineOptions::classic(seed).expect("classic layout"))
            .expect("classic engine")
    }

    fn random_input(rng: &mut Rng) -> Option<Direction> {
        match rng.pick_index(12) {
            0 => Some(Direction::Left),
            1 => Some(Direction::Right),
            2 => Some(Direction::Up),
            3 => Some(Direction::Down),
            _ => None,
        }
    }

    #[test]
    fn single_pellet_is_eaten_and_wins() {
        let rows = vec![vec![1, 1, 1], vec![1, 2, 1], vec![1, 1, 1]];
        let mut engine = GameEngine::new(options(&rows, Cell::new(1, 1), &[])).expect("engine");
        engine.step(None);

        assert_eq!(engine.score(), 10);
        assert_eq!(engine.maze().remaining_collectibles(), 0);
        assert_eq!(engine.outcome(), Outcome::Won);
        let events = engine.drain_events();
        assert!(events.contains(&RuntimeEvent::MazeCleared));

        engine.step(Some(Direction::Right));
        assert_eq!(engine.snapshot().tick, 1);
    }

    #[test]
    fn normal_ghost_contact_loses() {
        let mut engine = classic(1);
        engine.ghosts[0].mover.pos = engine.player.pos;
        engine.resolve_ghost_collisions();

        assert_eq!(engine.outcome(), Outcome::Lost);
        let caught = RuntimeEvent::PlayerCaught {
            ghost_id: "ghost_1".to_string(),
        };
        assert!(engine.drain_events().contains(&caught));

        let frozen = engine.snapshot();
        engine.step(Some(Direction::Right));
        let after = engine.snapshot();
        assert_eq!(frozen.tick, after.tick);
        assert_eq!(frozen.player.x, after.player.x);
        assert_eq!(frozen.player.y, after.player.y);
    }

    #[test]
    fn frightened_ghost_contact_awards_points_and_sends_it_home() {
        let mut engine = classic(2);
        engine.ghosts[1].scare(8.0);
        engine.ghosts[1].mover.pos = engine.player.pos;
        engine.ghosts[1].mover.sync_cell(&engine.geometry);
        let before = engine.score();

        engine.resolve_ghost_collisions();
        assert_eq!(engine.score(), before + 200);
        assert_eq!(engine.outcome(), Outcome::Playing);
        assert_eq!(engine.ghosts[1].mover.cell, engine.ghosts[1].home);
        assert!(!engine.ghosts[1].is_frightened());
        assert_eq!(engine.build_summary().ghosts_eaten, 1);
    }

    #[test]
    fn win_is_kept_over_a_same_tick_loss() {
        let rows = vec![vec![1, 1, 1], vec![1, 2, 1], vec![1, 1, 1]];
        let mut engine =
            GameEngine::new(options(&rows, Cell::new(1, 1), &[Cell::new(1, 1)])).expect("engine");
        engine.step(None);
        assert_eq!(engine.outcome(), Outcome::Won);
    }

    #[test]
    fn power_pellet_frightens_for_its_full_duration() {
        let rows = vec![
            vec![1, 1, 1, 1, 1, 1, 1],
            vec![1, 3, 0, 1, 0, 2, 1],
            vec![1, 1, 1, 1, 1, 1, 1],
        ];
        let mut engine = GameEngine::new(options(&rows, Cell::new(1, 1), &[Cell::new(4, 1)]))
            .expect("engine");
        let base_speed = engine.geometry.ghost_speed();

        engine.step(None);
        assert_eq!(engine.score(), 50);
        assert!(engine.ghosts[0].is_frightened());
        assert_eq!(
            engine.ghosts[0].mover.speed,
            engine.geometry.frightened_speed()
        );

        for _ in 1..479 {
            engine.step(None);
        }
        assert!(engine.ghosts[0].is_frightened());
        assert!(engine.snapshot().power_remaining > 0.0);

        engine.step(None);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.tick, 480);
        assert_eq!(snapshot.power_remaining, 0.0);
        assert!(!snapshot.ghosts[0].frightened);
        assert_eq!(snapshot.ghosts[0].color, GhostColor::Red);
        assert_eq!(engine.ghosts[0].mover.speed, base_speed);
        assert!(engine.drain_events().contains(&RuntimeEvent::PowerEnded));
        assert_eq!(engine.outcome(), Outcome::Playing);
    }

    #[test]
    fn shared_power_timer_calms_every_ghost() {
        let mut engine = classic(3);
        engine.power_remaining = TICK_SECONDS;
        engine.ghosts[0].scare(5.0);
        engine.ghosts[1].scare(5.0);

        engine.update_power_timer(TICK_SECONDS);
        assert_eq!(engine.power_remaining, 0.0);
        assert!(engine.ghosts.iter().all(|ghost| !ghost.is_frightened()));
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = classic(424_242);
        let mut b = classic(424_242);
        let mut inputs = Rng::new(9);

        for _ in 0..2_000 {
            let input = random_input(&mut inputs);
            a.step(input);
            b.step(input);
            let sa = a.snapshot();
            let sb = b.snapshot();
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.outcome, sb.outcome);
            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.y.to_bits(), sb.player.y.to_bits());
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!(ga.x.to_bits(), gb.x.to_bits());
                assert_eq!(ga.y.to_bits(), gb.y.to_bits());
                assert_eq!(ga.frightened, gb.frightened);
            }
            if a.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn long_run_keeps_motion_invariants() {
        let mut engine = classic(77);
        let mut inputs = Rng::new(78);

        for _ in 0..20_000 {
            if engine.is_ended() {
                engine.reset();
                continue;
            }
            let player_before = engine.player.pos;
            let ghosts_before: Vec<_> = engine.ghosts.iter().map(|g| g.mover.pos).collect();
            let score_before = engine.score();

            engine.step(random_input(&mut inputs));
            let eaten: Vec<String> = engine
                .drain_events()
                .into_iter()
                .filter_map(|event| match event {
                    RuntimeEvent::GhostEaten { ghost_id } => Some(ghost_id),
                    _ => None,
                })
                .collect();

            assert!(engine.score() >= score_before);
            let player = engine.player.pos;
            assert!(player.x == player_before.x || player.y == player_before.y);
            assert!(!engine
                .maze
                .is_wall(engine.player.cell.col, engine.player.cell.row));

            for (ghost, before) in engine.ghosts.iter().zip(ghosts_before) {
                assert!(!engine
                    .maze
                    .is_wall(ghost.mover.cell.col, ghost.mover.cell.row));
                assert_eq!(ghost.mover.cell, engine.geometry.cell_at(ghost.mover.pos));
                if !eaten.contains(&ghost.id) {
                    let pos = ghost.mover.pos;
                    assert!(pos.x == before.x || pos.y == before.y);
                }
            }
        }
    }

    #[test]
    fn ghosts_only_reverse_in_dead_ends() {
        // two loops plus dead-end stubs at (2,4) and (4,4); the player never moves
        let rows = vec![
            vec![1, 1, 1, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 0, 0, 1],
            vec![1, 0, 1, 0, 1, 0, 1],
            vec![1, 0, 0, 0, 0, 2, 1],
            vec![1, 1, 0, 1, 0, 1, 1],
            vec![1, 1, 1, 1, 1, 1, 1],
        ];
        let mut engine = GameEngine::new(options(
            &rows,
            Cell::new(1, 1),
            &[Cell::new(5, 1), Cell::new(3, 3)],
        ))
        .expect("engine");
        let mut reversals_checked = 0;

        for _ in 0..20_000 {
            if engine.is_ended() {
                engine.reset_with_seed(engine.config.seed + 1);
            }
            let before: Vec<_> = engine
                .ghosts
                .iter()
                .map(|ghost| {
                    let reverse = ghost.mover.dir.opposite();
                    let has_forward = Direction::MOVES
                        .into_iter()
                        .any(|dir| dir != reverse && ghost.mover.is_open(&engine.maze, dir));
                    (ghost.mover.dir, has_forward)
                })
                .collect();

            engine.step(None);

            for (ghost, (dir_before, has_forward)) in engine.ghosts.iter().zip(before) {
                if dir_before != Direction::None && ghost.mover.dir == dir_before.opposite() {
                    reversals_checked += 1;
                    assert!(!has_forward, "{} reversed with a forward option", ghost.id);
                }
            }
        }
        assert!(reversals_checked > 0);
    }

    #[test]
    fn held_intent_survives_ticks_without_input() {
        let mut engine = classic(8);
        engine.step(Some(Direction::Down));
        for _ in 0..5 {
            engine.step(None);
        }
        assert_eq!(engine.player.next_dir, Direction::Down);
        assert_eq!(engine.player.dir, Direction::Down);

        engine.step(Some(Direction::None));
        assert_eq!(engine.player.next_dir, Direction::None);
    }

    #[test]
    fn reset_restores_starting_configuration() {
        let mut engine = classic(12);
        let fresh = engine.snapshot();
        for _ in 0..300 {
            engine.step(Some(Direction::Right));
        }
        assert!(engine.score() > 0);

        engine.reset();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.outcome, Outcome::Playing);
        assert_eq!(snapshot.tiles, fresh.tiles);
        assert_eq!(
            snapshot.collectibles_remaining,
            fresh.collectibles_remaining
        );
        assert_eq!(snapshot.player.cell, fresh.player.cell);
        for (ghost, home) in snapshot.ghosts.iter().zip(fresh.ghosts.iter()) {
            assert_eq!(ghost.cell, home.cell);
        }
        assert_eq!(engine.drain_events(), vec![RuntimeEvent::Reset { seed: 12 }]);
    }

    #[test]
    fn blocked_spawn_is_a_configuration_error() {
        let rows = vec![vec![1, 1, 1], vec![1, 2, 1], vec![1, 1, 1]];
        let result = GameEngine::new(options(&rows, Cell::new(0, 0), &[]));
        assert!(matches!(
            result,
            Err(LayoutError::BlockedSpawn { col: 0, row: 0, .. })
        ));

        let result = GameEngine::new(options(&rows, Cell::new(1, 1), &[Cell::new(5, 5)]));
        assert!(matches!(result, Err(LayoutError::BlockedSpawn { .. })));
    }

    #[test]
    fn invalid_power_duration_is_a_configuration_error() {
        let rows = vec![vec![1, 1, 1], vec![1, 2, 1], vec![1, 1, 1]];
        for duration in [-1.0, f64::NAN, f64::INFINITY] {
            let mut opts = options(&rows, Cell::new(1, 1), &[]);
            opts.power_duration_secs = duration;
            assert!(matches!(
                GameEngine::new(opts),
                Err(LayoutError::InvalidPowerDuration(_))
            ));
        }

        let mut opts = options(&rows, Cell::new(1, 1), &[]);
        opts.power_duration_secs = 0.0;
        assert!(GameEngine::new(opts).is_ok());
    }
}
