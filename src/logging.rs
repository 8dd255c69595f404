use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Optional identifiers attached to every log line of a run.
#[derive(Clone, Debug, Default)]
pub struct LogContext {
    pub match_id: Option<String>,
    pub run: Option<usize>,
    pub seed: Option<u64>,
    pub tick: Option<u64>,
}

impl LogContext {
    pub fn for_match(match_id: &str) -> Self {
        Self {
            match_id: Some(match_id.to_string()),
            ..Self::default()
        }
    }

    pub fn with_run(&self, run: usize, seed: u64) -> Self {
        Self {
            run: Some(run),
            seed: Some(seed),
            ..self.clone()
        }
    }

    pub fn at_tick(&self, tick: u64) -> Self {
        Self {
            tick: Some(tick),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    pub timestamp: String,
    pub level: LogLevel,
    pub event: String,
    #[serde(rename = "matchId", skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

impl StructuredLogLine {
    pub fn new(level: LogLevel, event: &str, context: &LogContext, details: Value) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event: event.to_string(),
            match_id: context.match_id.clone(),
            run: context.run,
            seed: context.seed,
            tick: context.tick,
            details,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"level":"error","event":"log_serialize_failed","source":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Writes one JSON log line to stderr.
pub fn emit_log(level: LogLevel, event: &str, context: &LogContext, details: Value) {
    eprintln!(
        "{}",
        StructuredLogLine::new(level, event, context, details).to_json()
    );
}
