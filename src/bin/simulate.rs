use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase::autopilot;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::geometry::Geometry;
use maze_chase::logging::{emit_log, LogContext, LogLevel};
use maze_chase::maze::Maze;
use maze_chase::types::{GameConfig, GhostKind, Outcome, Point, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 1)]
    runs: usize,
    #[arg(long, default_value_t = 60 * 60 * 3)]
    max_ticks: u64,
    #[arg(long)]
    maze: Option<PathBuf>,
    #[arg(long)]
    ghost_kind: Option<String>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: usize,
    seed: u64,
    outcome: Outcome,
    score: u32,
    ticks: u64,
    #[serde(rename = "durationSecs")]
    duration_secs: f64,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "collectiblesRemaining")]
    collectibles_remaining: usize,
    #[serde(rename = "timedOut")]
    timed_out: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunReport {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: f64,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

fn main() {
    let cli = Cli::parse();
    let started_at = now_rfc3339();
    let seed = cli
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs());
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, Utc::now().timestamp_millis()));
    let context = LogContext::for_match(&match_id);

    let options = match resolve_options(&cli, seed) {
        Ok(options) => options,
        Err(message) => {
            emit_log(
                LogLevel::Error,
                "config_invalid",
                &context,
                json!({ "error": message }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for run in 0..cli.runs {
        let run_seed = seed.wrapping_add(run as u64);
        let run_context = context.with_run(run + 1, run_seed);
        let mut run_options = options.clone();
        run_options.seed = run_seed;
        let engine = match GameEngine::new(run_options) {
            Ok(engine) => engine,
            Err(error) => {
                emit_log(
                    LogLevel::Error,
                    "config_invalid",
                    &run_context,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };
        emit_log(
            LogLevel::Info,
            "run_started",
            &run_context,
            json!({
                "maxTicks": cli.max_ticks,
                "ghosts": engine.snapshot().ghosts.len(),
                "collectibles": engine.maze().remaining_collectibles(),
            }),
        );

        let report = run_simulation(engine, run + 1, cli.max_ticks);
        for anomaly in &report.anomaly_records {
            emit_log(
                LogLevel::Warn,
                "anomaly_detected",
                &run_context.at_tick(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !report.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += report.anomaly_records.len();
        *outcome_counts
            .entry(outcome_key(report.result.outcome, report.result.timed_out))
            .or_insert(0) += 1;

        emit_log(
            LogLevel::Info,
            "run_finished",
            &run_context.at_tick(report.result.ticks),
            json!({
                "outcome": report.result.outcome,
                "score": report.result.score,
                "timedOut": report.result.timed_out,
                "anomalyCount": report.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&report.result).expect("run result should serialize")
        );
        results.push(report.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at,
        now_rfc3339(),
        results,
        outcome_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                LogLevel::Error,
                "summary_write_failed",
                &context,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        LogLevel::Info,
        "simulation_finished",
        &context,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_options(cli: &Cli, seed: u64) -> Result<GameEngineOptions, String> {
    let mut options = GameEngineOptions::classic(seed).map_err(|error| error.to_string())?;
    if let Some(path) = cli.maze.as_ref() {
        let layout =
            Maze::load(path).map_err(|error| format!("{}: {error}", path.to_string_lossy()))?;
        options = options.with_layout(layout);
    }
    if let Some(raw) = cli.ghost_kind.as_deref() {
        let kind = GhostKind::parse(raw).ok_or_else(|| format!("unknown ghost kind: {raw}"))?;
        options = options.with_ghost_kind(kind);
    }
    Ok(options)
}

fn run_simulation(mut engine: GameEngine, run: usize, max_ticks: u64) -> RunReport {
    let config = engine.config.clone();
    let geometry = *engine.geometry();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous = engine.snapshot();

    while !engine.is_ended() && previous.tick < max_ticks {
        let input = autopilot::choose_input(engine.maze(), &previous);
        engine.step(input);
        let events = engine.drain_events();
        let snapshot = engine.snapshot();
        for message in collect_snapshot_anomalies(
            engine.maze(),
            &geometry,
            &config,
            &previous,
            &snapshot,
            &events,
        ) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        previous = snapshot;
    }

    let summary = engine.build_summary();
    RunReport {
        result: RunResultLine {
            run,
            seed: config.seed,
            outcome: summary.outcome,
            score: summary.score,
            ticks: summary.ticks,
            duration_secs: summary.duration_secs,
            pellets_eaten: summary.pellets_eaten,
            power_pellets_eaten: summary.power_pellets_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            collectibles_remaining: summary.collectibles_remaining,
            timed_out: !engine.is_ended(),
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(
    maze: &Maze,
    geometry: &Geometry,
    config: &GameConfig,
    previous: &Snapshot,
    current: &Snapshot,
    events: &[RuntimeEvent],
) -> Vec<String> {
    let mut anomalies = Vec::new();

    if current.score < previous.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            previous.score, current.score
        ));
    } else {
        let earned: u32 = events
            .iter()
            .map(|event| match event {
                RuntimeEvent::PelletEaten { .. } => config.pellet_points,
                RuntimeEvent::PowerPelletEaten { .. } => config.power_pellet_points,
                RuntimeEvent::GhostEaten { .. } => config.ghost_points,
                _ => 0,
            })
            .sum();
        if current.score - previous.score != earned {
            anomalies.push(format!(
                "score grew by {} but events account for {earned}",
                current.score - previous.score
            ));
        }
    }

    if current.collectibles_remaining > previous.collectibles_remaining {
        anomalies.push(format!(
            "collectibles grew: {} -> {}",
            previous.collectibles_remaining, current.collectibles_remaining
        ));
    }
    if current.outcome == Outcome::Won && current.collectibles_remaining > 0 {
        anomalies.push(format!(
            "won with {} collectibles left",
            current.collectibles_remaining
        ));
    }
    if current.power_remaining < 0.0 {
        anomalies.push(format!("negative power timer: {}", current.power_remaining));
    }

    let player = &current.player;
    if maze.is_wall(player.cell.col, player.cell.row) {
        anomalies.push(format!(
            "player inside wall at ({},{})",
            player.cell.col, player.cell.row
        ));
    }
    let player_pos = Point {
        x: player.x,
        y: player.y,
    };
    if geometry.cell_at(player_pos) != player.cell {
        anomalies.push("player cell out of sync with position".to_string());
    }

    for ghost in &current.ghosts {
        if maze.is_wall(ghost.cell.col, ghost.cell.row) {
            anomalies.push(format!(
                "{} inside wall at ({},{})",
                ghost.id, ghost.cell.col, ghost.cell.row
            ));
        }
        let ghost_pos = Point {
            x: ghost.x,
            y: ghost.y,
        };
        if geometry.cell_at(ghost_pos) != ghost.cell {
            anomalies.push(format!("{} cell out of sync with position", ghost.id));
        }
        if ghost.frightened && current.power_remaining <= 0.0 {
            anomalies.push(format!("{} frightened without power", ghost.id));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn outcome_key(outcome: Outcome, timed_out: bool) -> String {
    if timed_out {
        return "timeout".to_string();
    }
    match outcome {
        Outcome::Playing => "playing",
        Outcome::Lost => "lost",
        Outcome::Won => "won",
    }
    .to_string()
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let (average_score, average_ticks) = if run_count == 0 {
        (0.0, 0)
    } else {
        let total_score: u64 = runs.iter().map(|run| u64::from(run.score)).sum();
        let total_ticks: u64 = runs.iter().map(|run| run.ticks).sum();
        (
            total_score as f64 / run_count as f64,
            total_ticks / run_count as u64,
        )
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_score,
        average_ticks,
        outcome_counts,
        runs,
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
