//! Captured worker output and its interpretation

use serde_json::Value as JsonValue;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

/// Final output a worker printed on stdout
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutput {
    /// Valid JSON, normally `{output, metadata}` or `{error, traceback}`
    Json(JsonValue),
    /// Anything else, trimmed
    Text(String),
    /// Nothing but whitespace
    Empty,
}

/// Failure a worker reported in its own output
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationError {
    pub error: String,
    pub details: Option<String>,
}

impl WorkerOutput {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return WorkerOutput::Empty;
        }
        match serde_json::from_str(trimmed) {
            Ok(value) => WorkerOutput::Json(value),
            Err(_) => WorkerOutput::Text(trimmed.to_string()),
        }
    }

    /// Top-level `error` key of a JSON result, with `traceback` (or `details`) as details
    pub fn application_error(&self) -> Option<ApplicationError> {
        let WorkerOutput::Json(JsonValue::Object(map)) = self else {
            return None;
        };

        let error = match map.get("error")? {
            JsonValue::Null => return None,
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };

        let details = map
            .get("traceback")
            .or_else(|| map.get("details"))
            .and_then(|value| match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });

        Some(ApplicationError { error, details })
    }

    /// The result value: the `output` field of a JSON object, otherwise the whole document
    pub fn output(&self) -> JsonValue {
        match self {
            WorkerOutput::Json(JsonValue::Object(map)) if map.contains_key("output") => {
                map.get("output").cloned().unwrap_or(JsonValue::Null)
            }
            WorkerOutput::Json(value) => value.clone(),
            WorkerOutput::Text(text) => JsonValue::String(text.clone()),
            WorkerOutput::Empty => JsonValue::Null,
        }
    }

    pub fn metadata(&self) -> Option<JsonValue> {
        match self {
            WorkerOutput::Json(JsonValue::Object(map)) => map.get("metadata").filter(|m| !m.is_null()).cloned(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, WorkerOutput::Empty)
    }
}

/// Text accumulator with a byte cap; content past the cap is dropped
#[derive(Debug)]
pub struct OutputBuffer {
    text: String,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
            truncated: false,
        }
    }

    /// Append one line plus a newline terminator
    pub fn push_line(&mut self, line: &str) {
        if self.truncated {
            return;
        }

        let needed = line.len() + 1;
        if self.text.len() + needed > self.limit {
            let room = self.limit.saturating_sub(self.text.len());
            let mut cut = room.min(line.len());
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            self.text.push_str(&line[..cut]);
            self.truncated = true;
            warn!(limit = self.limit, "Worker output exceeded buffer limit, truncating");
            return;
        }

        self.text.push_str(line);
        self.text.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Read a pipe to EOF, keeping at most `limit` bytes.
///
/// Reading continues past the cap so the worker never blocks on a full pipe.
pub async fn capture<R>(reader: Option<R>, limit: usize) -> std::io::Result<(String, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok((String::new(), false));
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&buf[..n.min(room)]);
    }

    if truncated {
        warn!(limit, "Worker output exceeded buffer limit, truncating");
    }

    Ok((String::from_utf8_lossy(&kept).into_owned(), truncated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_variants() {
        assert_eq!(WorkerOutput::parse("  hello world\n"), WorkerOutput::Text("hello world".to_string()));
        assert_eq!(WorkerOutput::parse("\n \n"), WorkerOutput::Empty);
        assert_eq!(
            WorkerOutput::parse(r#"{"output":"done","metadata":{"model":"m"}}"#),
            WorkerOutput::Json(json!({"output": "done", "metadata": {"model": "m"}}))
        );
    }

    #[test]
    fn test_output_and_metadata() {
        let parsed = WorkerOutput::parse(r#"{"output":"done","metadata":{"tokens":12}}"#);
        assert_eq!(parsed.output(), json!("done"));
        assert_eq!(parsed.metadata(), Some(json!({"tokens": 12})));
        assert!(parsed.application_error().is_none());

        let text = WorkerOutput::parse("hello world");
        assert_eq!(text.output(), json!("hello world"));
        assert!(text.metadata().is_none());

        let chat = WorkerOutput::parse(r#"{"response":"hi","session_id":"s1"}"#);
        assert_eq!(chat.output(), json!({"response": "hi", "session_id": "s1"}));
    }

    #[test]
    fn test_application_error_uses_traceback() {
        let parsed = WorkerOutput::parse(r#"{"error":"Bundle not found","traceback":"Traceback ..."}"#);
        assert_eq!(
            parsed.application_error(),
            Some(ApplicationError {
                error: "Bundle not found".to_string(),
                details: Some("Traceback ...".to_string()),
            })
        );

        assert!(WorkerOutput::parse(r#"{"error":null,"output":1}"#).application_error().is_none());
    }

    #[test]
    fn test_buffer_truncates_at_limit() {
        let mut buffer = OutputBuffer::new(8);
        buffer.push_line("abc");
        buffer.push_line("defghij");
        buffer.push_line("ignored");
        assert_eq!(buffer.as_str(), "abc\ndefg");
        assert!(buffer.is_truncated());
    }

    #[tokio::test]
    async fn test_capture_bounds_output() {
        let data: &[u8] = b"0123456789";
        let (text, truncated) = capture(Some(data), 4).await.unwrap();
        assert_eq!(text, "0123");
        assert!(truncated);

        let (text, truncated) = capture(None::<&[u8]>, 4).await.unwrap();
        assert!(text.is_empty());
        assert!(!truncated);
    }
}
