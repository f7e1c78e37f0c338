use crate::error::LogError;
use crate::event::EventDict;
use serde_json::Value;
use std::fmt::Write;

/// Final event rendering. Selected once at configuration time, never
/// per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// One JSON object per line.
    Json,
    /// Human-readable console line.
    Console,
}

impl Renderer {
    pub fn from_config(json_logs: bool) -> Self {
        if json_logs { Self::Json } else { Self::Console }
    }

    /// Render an enriched event dict to its final line (no trailing newline).
    pub fn render(&self, dict: &EventDict) -> Result<String, LogError> {
        match self {
            Self::Json => serde_json::to_string(dict).map_err(|e| LogError::Enrich {
                stage: "render",
                message: e.to_string(),
            }),
            Self::Console => Ok(render_console(dict)),
        }
    }
}

fn render_console(dict: &EventDict) -> String {
    let timestamp = dict.get("timestamp").and_then(Value::as_str).unwrap_or("-");
    let level = dict.get("level").and_then(Value::as_str).unwrap_or("-");
    let logger = dict.get("logger").and_then(Value::as_str).unwrap_or("-");
    let event = dict.get("event").and_then(Value::as_str).unwrap_or("-");

    let mut line = format!("{timestamp} [{level:>7}] {logger}: {event}");
    for (key, value) in dict {
        if matches!(key.as_str(), "timestamp" | "level" | "logger" | "event") {
            continue;
        }
        match value {
            Value::String(s) => {
                let _ = write!(line, " {key}={s}");
            }
            other => {
                let _ = write!(line, " {key}={other}");
            }
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EventDict {
        let mut dict = EventDict::new();
        dict.insert("event".into(), json!("request_started"));
        dict.insert("timestamp".into(), json!("2026-01-01T00:00:00.000Z"));
        dict.insert("level".into(), json!("info"));
        dict.insert("logger".into(), json!("request"));
        dict.insert("method".into(), json!("GET"));
        dict.insert("attempt".into(), json!(2));
        dict
    }

    #[test]
    fn test_json_renders_valid_object() {
        let line = Renderer::Json.render(&sample()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "request_started");
        assert_eq!(parsed["attempt"], 2);
    }

    #[test]
    fn test_console_leads_with_header_fields() {
        let line = Renderer::Console.render(&sample()).unwrap();
        assert!(line.starts_with("2026-01-01T00:00:00.000Z ["));
        assert!(line.contains("request: request_started"));
        assert!(line.contains(" method=GET"));
        assert!(line.contains(" attempt=2"));
        assert!(!line.contains('\n'));
    }
}
