//! `STREAM:` sub-protocol spoken by workers on stdout
//!
//! A protocol line is the marker followed by a JSON object whose `type` field
//! names the event. Unknown types and malformed payloads are surfaced as
//! [`WorkerLine`] variants so callers can log and drop them; they never abort
//! a stream.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Prefix that marks a protocol line on worker stdout
pub const STREAM_MARKER: &str = "STREAM:";

/// Event emitted by a worker through the `STREAM:` sub-protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// Single-pipeline progress step, e.g. `loading_bundle` / `in_progress`
    Step {
        #[serde(default)]
        step: Option<JsonValue>,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },

    /// A recipe step has started
    #[serde(rename_all = "camelCase")]
    StepStart {
        #[serde(default)]
        step: Option<JsonValue>,
        #[serde(default)]
        step_id: Option<String>,
        #[serde(default)]
        step_name: Option<String>,
        #[serde(default)]
        bundle_id: Option<String>,
        #[serde(default)]
        total_steps: Option<u64>,
    },

    /// Incremental output text
    Chunk {
        #[serde(default)]
        content: String,
    },

    /// A recipe step has finished
    #[serde(rename_all = "camelCase")]
    StepComplete {
        #[serde(default)]
        step: Option<JsonValue>,
        #[serde(default)]
        step_id: Option<String>,
        #[serde(default)]
        step_name: Option<String>,
        #[serde(default)]
        timing: Option<f64>,
        #[serde(default)]
        output: Option<JsonValue>,
    },

    /// The worker reports a failure
    Error {
        error: String,
        #[serde(default)]
        step: Option<JsonValue>,
        #[serde(default)]
        details: Option<String>,
    },
}

impl WorkerEvent {
    /// Wire name of the event type
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Step { .. } => "step",
            WorkerEvent::StepStart { .. } => "step_start",
            WorkerEvent::Chunk { .. } => "chunk",
            WorkerEvent::StepComplete { .. } => "step_complete",
            WorkerEvent::Error { .. } => "error",
        }
    }

    /// Render as a protocol line, as a worker would print it
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{}{}", STREAM_MARKER, serde_json::to_string(self)?))
    }
}

const KNOWN_TYPES: [&str; 5] = ["step", "step_start", "chunk", "step_complete", "error"];

/// Classification of one line of worker stdout
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerLine {
    /// Recognized protocol event
    Event(WorkerEvent),
    /// Protocol line with a `type` this bridge does not know
    Unrecognized { kind: String },
    /// Protocol line whose payload could not be decoded
    Malformed { error: String },
    /// Free text, returned untrimmed
    Plain(String),
    /// Whitespace only
    Blank,
}

/// Classify a single line of worker stdout
pub fn parse_line(line: &str) -> WorkerLine {
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        return WorkerLine::Blank;
    }

    let Some(payload) = trimmed.strip_prefix(STREAM_MARKER) else {
        return WorkerLine::Plain(line.to_string());
    };

    let value: JsonValue = match serde_json::from_str(payload.trim()) {
        Ok(value) => value,
        Err(e) => return WorkerLine::Malformed { error: e.to_string() },
    };

    let kind = match value.get("type").and_then(JsonValue::as_str) {
        Some(kind) => kind.to_string(),
        None => {
            return WorkerLine::Malformed {
                error: "missing string field `type`".to_string(),
            }
        }
    };

    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return WorkerLine::Unrecognized { kind };
    }

    match serde_json::from_value::<WorkerEvent>(value) {
        Ok(event) => WorkerLine::Event(event),
        Err(e) => WorkerLine::Malformed {
            error: format!("invalid {} event: {}", kind, e),
        },
    }
}

/// True when a line carries the protocol marker, ignoring leading whitespace
pub fn is_protocol_line(line: &str) -> bool {
    line.trim_start().starts_with(STREAM_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chunk() {
        let line = parse_line(r#"STREAM:{"type":"chunk","content":"Hi"}"#);
        assert_eq!(line, WorkerLine::Event(WorkerEvent::Chunk { content: "Hi".to_string() }));
    }

    #[test]
    fn test_parse_step_start_camel_case() {
        let line = parse_line(
            r#"STREAM:{"type":"step_start","step":1,"stepId":"research","stepName":"Research","bundleId":"researcher","totalSteps":3}"#,
        );
        match line {
            WorkerLine::Event(WorkerEvent::StepStart {
                step,
                step_id,
                step_name,
                bundle_id,
                total_steps,
            }) => {
                assert_eq!(step, Some(json!(1)));
                assert_eq!(step_id.as_deref(), Some("research"));
                assert_eq!(step_name.as_deref(), Some("Research"));
                assert_eq!(bundle_id.as_deref(), Some("researcher"));
                assert_eq!(total_steps, Some(3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_step_with_string_step() {
        let line = parse_line(
            r#"STREAM:{"type":"step","step":"loading_bundle","status":"in_progress","message":"Loading bundle configuration..."}"#,
        );
        assert!(matches!(
            line,
            WorkerLine::Event(WorkerEvent::Step { step: Some(JsonValue::String(ref s)), .. }) if s == "loading_bundle"
        ));
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let line = parse_line(r#"STREAM:{"type":"unknown_future_type","x":1}"#);
        assert_eq!(
            line,
            WorkerLine::Unrecognized {
                kind: "unknown_future_type".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(parse_line("STREAM:{not json"), WorkerLine::Malformed { .. }));
        assert!(matches!(parse_line(r#"STREAM:{"content":"x"}"#), WorkerLine::Malformed { .. }));
        assert!(matches!(parse_line(r#"STREAM:{"type":"error"}"#), WorkerLine::Malformed { .. }));
    }

    #[test]
    fn test_plain_and_blank_lines() {
        assert_eq!(parse_line("hello world"), WorkerLine::Plain("hello world".to_string()));
        assert_eq!(parse_line("   "), WorkerLine::Blank);
        assert!(matches!(parse_line(r#"  STREAM:{"type":"chunk","content":"x"}"#), WorkerLine::Event(_)));
    }

    #[test]
    fn test_to_line_parses_back() {
        let event = WorkerEvent::Error {
            error: "Step 2 failed".to_string(),
            step: Some(json!(2)),
            details: None,
        };
        let line = event.to_line().unwrap();
        assert!(is_protocol_line(&line));
        assert_eq!(parse_line(&line), WorkerLine::Event(event));
    }
}
