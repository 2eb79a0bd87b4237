//! Typed events relayed to the browser over SSE

use amplifier_ipc::WorkerEvent;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// One outbound stream event. Serializes to its `data` payload; the event
/// name comes from [`StreamEvent::name`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Status(StatusData),
    Step(StepData),
    StepStart(StepStartData),
    Chunk(ChunkData),
    StepComplete(StepCompleteData),
    Progress(ProgressData),
    Error(ErrorData),
    Complete(CompleteData),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusData {
    pub phase: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStartData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkData {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCompleteData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressData {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteData {
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StreamEvent {
    pub fn status(phase: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent::Status(StatusData {
            phase: phase.into(),
            message: message.into(),
        })
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        StreamEvent::Chunk(ChunkData { content: content.into() })
    }

    pub fn progress(message: impl Into<String>) -> Self {
        StreamEvent::Progress(ProgressData {
            message: message.into(),
        })
    }

    pub fn error(error: impl Into<String>, details: Option<String>, execution_time_ms: Option<u64>) -> Self {
        StreamEvent::Error(ErrorData {
            error: error.into(),
            step: None,
            details,
            execution_time_ms,
        })
    }

    pub fn complete(execution_time_ms: u64) -> Self {
        StreamEvent::Complete(CompleteData {
            execution_time_ms,
            output: None,
            metadata: None,
            message: None,
        })
    }

    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Status(_) => "status",
            StreamEvent::Step(_) => "step",
            StreamEvent::StepStart(_) => "step_start",
            StreamEvent::Chunk(_) => "chunk",
            StreamEvent::StepComplete(_) => "step_complete",
            StreamEvent::Progress(_) => "progress",
            StreamEvent::Error(_) => "error",
            StreamEvent::Complete(_) => "complete",
        }
    }

    /// The `data` payload as JSON
    pub fn data(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }

    /// `error` and `complete` end a stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error(_) | StreamEvent::Complete(_))
    }

    /// Stamp elapsed time on terminal events that lack it
    pub(crate) fn with_execution_time(mut self, elapsed_ms: u64) -> Self {
        if let StreamEvent::Error(data) = &mut self {
            data.execution_time_ms.get_or_insert(elapsed_ms);
        }
        self
    }
}

impl From<WorkerEvent> for StreamEvent {
    fn from(event: WorkerEvent) -> Self {
        match event {
            WorkerEvent::Step { step, status, message } => StreamEvent::Step(StepData { step, status, message }),
            WorkerEvent::StepStart {
                step,
                step_id,
                step_name,
                bundle_id,
                total_steps,
            } => StreamEvent::StepStart(StepStartData {
                step,
                step_name: step_name.or(step_id),
                bundle_id,
                total_steps,
            }),
            WorkerEvent::Chunk { content } => StreamEvent::Chunk(ChunkData { content }),
            WorkerEvent::StepComplete {
                step,
                step_id,
                step_name,
                timing,
                output,
            } => StreamEvent::StepComplete(StepCompleteData {
                step,
                step_name: step_name.or(step_id),
                timing,
                output,
            }),
            WorkerEvent::Error { error, step, details } => StreamEvent::Error(ErrorData {
                error,
                step,
                details,
                execution_time_ms: None,
            }),
        }
    }
}
