use serde::Serialize;
use serde_json::Value;

use crate::types::{Direction, GameConfig, GameSummary, MazeInit, RuntimeEvent, Snapshot};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    Reset,
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "reset" => Some(ParsedClientMessage::Reset),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        config: GameConfig,
        maze: MazeInit,
    },
    State {
        snapshot: Snapshot,
        events: Vec<RuntimeEvent>,
    },
    GameOver {
        summary: GameSummary,
    },
    Pong {
        t: f64,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
