use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase::constants::TICK_US;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::logging::{emit_log, LogContext, LogLevel};
use maze_chase::maze::Maze;
use maze_chase::server_protocol::{parse_client_message, ParsedClientMessage, ServerMessage};
use maze_chase::server_utils::{client_order_key, parse_maze_path, parse_seed, resolve_port};
use maze_chase::types::Direction;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

const CLIENT_QUEUE_SIZE: usize = 256;

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    game: GameEngine,
    /// Latest direction received since the previous tick; the last message wins.
    pending_input: Option<Direction>,
    game_over_sent: bool,
    fixed_seed: Option<u64>,
}

impl ServerState {
    fn new(game: GameEngine, fixed_seed: Option<u64>) -> Self {
        Self {
            clients: HashMap::new(),
            game,
            pending_input: None,
            game_over_sent: false,
            fixed_seed,
        }
    }

    fn log_context(&self) -> LogContext {
        LogContext {
            seed: Some(self.game.config.seed),
            tick: Some(self.game.tick()),
            ..LogContext::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let port = resolve_port(std::env::var("PORT").ok().as_deref());
    let fixed_seed = parse_seed(std::env::var("SEED").ok().as_deref());
    let maze_path = parse_maze_path(std::env::var("MAZE_PATH").ok().as_deref());
    let seed = fixed_seed.unwrap_or_else(rand::random);

    let game = match build_game(maze_path.as_deref(), seed) {
        Ok(game) => game,
        Err(message) => {
            emit_log(
                LogLevel::Error,
                "config_invalid",
                &LogContext::default(),
                json!({ "error": message }),
            );
            std::process::exit(2);
        }
    };

    let state = Arc::new(Mutex::new(ServerState::new(game, fixed_seed)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "bind_failed",
                &LogContext::default(),
                json!({ "addr": bind_addr, "error": error.to_string() }),
            );
            std::process::exit(1);
        }
    };

    emit_log(
        LogLevel::Info,
        "server_started",
        &LogContext {
            seed: Some(seed),
            ..LogContext::default()
        },
        json!({
            "port": port,
            "mazePath": maze_path.as_ref().map(|path| path.to_string_lossy().to_string()),
            "fixedSeed": fixed_seed.is_some(),
        }),
    );
    if let Err(error) = axum::serve(listener, app).await {
        emit_log(
            LogLevel::Error,
            "server_failed",
            &LogContext::default(),
            json!({ "error": error.to_string() }),
        );
        std::process::exit(1);
    }
}

fn build_game(maze_path: Option<&std::path::Path>, seed: u64) -> Result<GameEngine, String> {
    let mut options = GameEngineOptions::classic(seed).map_err(|error| error.to_string())?;
    if let Some(path) = maze_path {
        let layout =
            Maze::load(path).map_err(|error| format!("{}: {error}", path.to_string_lossy()))?;
        options = options.with_layout(layout);
    }
    GameEngine::new(options).map_err(|error| error.to_string())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(CLIENT_QUEUE_SIZE);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        emit_log(
            LogLevel::Info,
            "client_connected",
            &guard.log_context(),
            json!({ "clientId": client_id, "clients": guard.clients.len() }),
        );
        send_welcome(&mut guard, &client_id);
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(&state, &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(&state, &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handle_disconnect(&state, &client_id).await;
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: &SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    apply_client_message(&mut guard, client_id, message);
}

fn apply_client_message(state: &mut ServerState, client_id: &str, message: ParsedClientMessage) {
    // a client dropped by a full queue may still have frames in flight
    if !state.clients.contains_key(client_id) {
        return;
    }
    match message {
        ParsedClientMessage::Input { dir } => {
            state.pending_input = Some(dir);
        }
        ParsedClientMessage::Reset => {
            if !state.game.is_ended() {
                send_to_client(
                    state,
                    client_id,
                    &ServerMessage::error("game is still running"),
                    QueuePolicy::DisconnectOnFull,
                );
                return;
            }
            reset_game(state, client_id);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &ServerMessage::Pong { t },
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn reset_game(state: &mut ServerState, requested_by: &str) {
    let seed = state.fixed_seed.unwrap_or_else(rand::random);
    state.game.reset_with_seed(seed);
    state.pending_input = None;
    state.game_over_sent = false;
    emit_log(
        LogLevel::Info,
        "game_reset",
        &state.log_context(),
        json!({ "requestedBy": requested_by }),
    );

    let welcome = ServerMessage::Welcome {
        config: state.game.config.clone(),
        maze: state.game.maze_init(),
    };
    broadcast(state, &welcome, QueuePolicy::DisconnectOnFull);
}

async fn handle_disconnect(state: &SharedState, client_id: &str) {
    let mut guard = state.lock().await;
    disconnect_client_internal(&mut guard, client_id, None);
}

fn disconnect_client_internal(state: &mut ServerState, client_id: &str, reason: Option<&str>) {
    let Some(context) = state.clients.remove(client_id) else {
        return;
    };
    if let Some(reason) = reason {
        let _ = context.tx.try_send(OutboundMessage::Close {
            code: 1008,
            reason: reason.to_string(),
        });
    }
    emit_log(
        LogLevel::Info,
        "client_disconnected",
        &state.log_context(),
        json!({
            "clientId": client_id,
            "reason": reason,
            "clients": state.clients.len(),
        }),
    );
}

fn send_welcome(state: &mut ServerState, client_id: &str) {
    let welcome = ServerMessage::Welcome {
        config: state.game.config.clone(),
        maze: state.game.maze_init(),
    };
    send_to_client(state, client_id, &welcome, QueuePolicy::DisconnectOnFull);

    let current = ServerMessage::State {
        snapshot: state.game.snapshot(),
        events: Vec::new(),
    };
    send_to_client(state, client_id, &current, QueuePolicy::DropOnFull);
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_micros(TICK_US));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    // nobody watching, or the finished game was already reported
    if state.clients.is_empty() || state.game_over_sent {
        return;
    }

    let input = state.pending_input.take();
    state.game.step(input);
    let message = ServerMessage::State {
        snapshot: state.game.snapshot(),
        events: state.game.drain_events(),
    };
    broadcast(state, &message, QueuePolicy::DropOnFull);

    if !state.game.is_ended() {
        return;
    }
    let summary = state.game.build_summary();
    emit_log(
        LogLevel::Info,
        "game_over",
        &state.log_context(),
        json!({
            "outcome": summary.outcome,
            "score": summary.score,
            "ghostsEaten": summary.ghosts_eaten,
        }),
    );
    broadcast(
        state,
        &ServerMessage::GameOver { summary },
        QueuePolicy::DisconnectOnFull,
    );
    state.game_over_sent = true;
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(error) => {
            emit_log(
                LogLevel::Error,
                "encode_failed",
                &LogContext::default(),
                json!({ "error": error.to_string() }),
            );
            None
        }
    }
}

fn send_to_client(
    state: &mut ServerState,
    client_id: &str,
    message: &ServerMessage,
    policy: QueuePolicy,
) {
    let Some(payload) = encode(message) else {
        return;
    };
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client.tx.try_send(OutboundMessage::Text(payload)).is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client_internal(state, client_id, Some("outbound queue full"));
    }
}

fn broadcast(state: &mut ServerState, message: &ServerMessage, policy: QueuePolicy) {
    let Some(payload) = encode(message) else {
        return;
    };
    let mut client_ids: Vec<String> = state.clients.keys().cloned().collect();
    client_ids.sort_by_key(|id| client_order_key(id));

    let mut failed_clients = Vec::new();
    for client_id in client_ids {
        let Some(client) = state.clients.get(&client_id) else {
            continue;
        };
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id);
        }
    }
    for client_id in failed_clients {
        disconnect_client_internal(state, &client_id, Some("outbound queue full"));
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    emit_log(
        LogLevel::Warn,
        "client_message_rejected",
        &guard.log_context(),
        json!({ "clientId": client_id, "reason": message }),
    );
    send_to_client(
        &mut guard,
        client_id,
        &ServerMessage::error(message),
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase::geometry::ScreenConfig;
    use maze_chase::types::{Cell, Outcome};

    fn state_with_client(seed: u64) -> (ServerState, mpsc::Receiver<OutboundMessage>) {
        let game = build_game(None, seed).expect("classic game");
        let mut state = ServerState::new(game, Some(seed));
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_SIZE);
        state
            .clients
            .insert("client_1".to_string(), ClientContext { tx });
        (state, rx)
    }

    fn drain_types(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<String> {
        let mut types = Vec::new();
        while let Ok(OutboundMessage::Text(payload)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&payload).expect("json payload");
            types.push(value["type"].as_str().unwrap_or_default().to_string());
        }
        types
    }

    #[test]
    fn make_id_is_prefixed_and_unique() {
        let first = make_id("client");
        let second = make_id("client");
        assert!(first.starts_with("client_"));
        assert_ne!(first, second);
    }

    #[test]
    fn welcome_is_followed_by_current_state() {
        let (mut state, mut rx) = state_with_client(4);
        send_welcome(&mut state, "client_1");
        assert_eq!(drain_types(&mut rx), vec!["welcome", "state"]);
    }

    #[test]
    fn tick_consumes_pending_input_and_broadcasts_state() {
        let (mut state, mut rx) = state_with_client(4);
        state.pending_input = Some(Direction::Right);
        tick_game(&mut state);

        assert_eq!(state.pending_input, None);
        assert_eq!(state.game.snapshot().player.dir, Direction::Right);
        assert_eq!(drain_types(&mut rx), vec!["state"]);
    }

    #[test]
    fn game_over_is_sent_once_and_ticks_stop() {
        let options = GameEngineOptions {
            layout: Maze::parse("###\n#.#\n###").expect("valid layout"),
            player_spawn: Cell::new(1, 1),
            ghosts: Vec::new(),
            screen: ScreenConfig::default(),
            seed: 4,
            power_duration_secs: 8.0,
        };
        let game = GameEngine::new(options).expect("engine");
        let mut state = ServerState::new(game, Some(4));
        let (tx, mut rx) = mpsc::channel(CLIENT_QUEUE_SIZE);
        state
            .clients
            .insert("client_1".to_string(), ClientContext { tx });

        tick_game(&mut state);
        assert_eq!(state.game.outcome(), Outcome::Won);
        assert!(state.game_over_sent);
        assert_eq!(drain_types(&mut rx), vec!["state", "game_over"]);

        tick_game(&mut state);
        assert_eq!(state.game.tick(), 1);
        assert!(drain_types(&mut rx).is_empty());
    }

    #[test]
    fn reset_restarts_the_finished_game() {
        let (mut state, mut rx) = state_with_client(4);
        for _ in 0..5 {
            tick_game(&mut state);
        }
        state.game_over_sent = true;
        reset_game(&mut state, "client_1");

        assert_eq!(state.game.outcome(), Outcome::Playing);
        assert_eq!(state.game.tick(), 0);
        assert!(!state.game_over_sent);
        assert_eq!(drain_types(&mut rx).last().map(String::as_str), Some("welcome"));
    }

    #[test]
    fn messages_from_disconnected_clients_are_ignored() {
        let (mut state, _rx) = state_with_client(4);
        apply_client_message(
            &mut state,
            "client_1",
            ParsedClientMessage::Input {
                dir: Direction::Down,
            },
        );
        assert_eq!(state.pending_input, Some(Direction::Down));

        state.pending_input = None;
        disconnect_client_internal(&mut state, "client_1", Some("slow consumer"));
        apply_client_message(
            &mut state,
            "client_1",
            ParsedClientMessage::Input {
                dir: Direction::Left,
            },
        );
        assert_eq!(state.pending_input, None);
    }

    #[test]
    fn ticks_pause_without_clients() {
        let game = build_game(None, 4).expect("classic game");
        let mut state = ServerState::new(game, None);
        tick_game(&mut state);
        assert_eq!(state.game.tick(), 0);
    }
}
