//! Ordered log-event enrichment pipeline.
//!
//! Every emitted event runs through a fixed chain of stages: static-context
//! merge → correlation id → timestamp → level → logger name → stack
//! rendering → exception formatting → string sanitization, then rendering
//! and the sink write. Events below the configured minimum severity are
//! dropped before any stage runs.

use crate::config::LogConfig;
use crate::context;
use crate::error::LogError;
use crate::event::{EVENT_KEY, EXC_KEY, EventDict, Fields, STACK_FLAG_KEY};
use crate::level::Level;
use crate::render::Renderer;
use crate::sink::Sink;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::sync::Arc;

/// One enrichment stage. Receives the logger name, the call severity, and
/// the event dict accumulated so far.
pub type Processor =
    Box<dyn Fn(&str, Level, &mut EventDict) -> Result<(), LogError> + Send + Sync>;

pub struct Pipeline {
    min_level: Level,
    processors: Vec<(&'static str, Processor)>,
    renderer: Renderer,
    sink: Arc<dyn Sink>,
}

impl Pipeline {
    /// Build the standard stage chain from config. Stage order is fixed;
    /// renderer selection happens here, once, not per call.
    pub fn new(config: &LogConfig, sink: Arc<dyn Sink>) -> Result<Arc<Self>, LogError> {
        let min_level = config.min_level()?;
        let renderer = Renderer::from_config(config.json_logs);

        let service = config.service_name.clone();
        let environment = config.environment.clone();

        let merge_context: Processor = Box::new(move |_, _, dict: &mut EventDict| {
            insert_if_absent(dict, "service", Value::String(service.clone()));
            insert_if_absent(dict, "environment", Value::String(environment.clone()));
            Ok(())
        });

        let processors: Vec<(&'static str, Processor)> = vec![
            ("merge_context", merge_context),
            (
                "correlation_id",
                Box::new(|_, _, dict| {
                    insert_if_absent(
                        dict,
                        "correlation_id",
                        Value::String(context::get_correlation_id()),
                    );
                    Ok(())
                }),
            ),
            (
                "timestamp",
                Box::new(|_, _, dict| {
                    let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                    insert_if_absent(dict, "timestamp", Value::String(ts));
                    Ok(())
                }),
            ),
            (
                "level",
                Box::new(|_, level, dict| {
                    insert_if_absent(dict, "level", Value::String(level.as_str().to_string()));
                    Ok(())
                }),
            ),
            (
                "logger",
                Box::new(|logger, _, dict| {
                    insert_if_absent(dict, "logger", Value::String(logger.to_string()));
                    Ok(())
                }),
            ),
            ("stack", Box::new(render_stack)),
            ("exception", Box::new(format_exception)),
            ("sanitize", Box::new(sanitize_strings)),
        ];

        Ok(Arc::new(Self {
            min_level,
            processors,
            renderer,
            sink,
        }))
    }

    /// Named logger handle backed by this pipeline.
    pub fn logger(self: &Arc<Self>, name: &str) -> Logger {
        Logger {
            name: name.to_string(),
            bound: EventDict::new(),
            pipeline: Arc::clone(self),
        }
    }

    /// Run an event through every stage and write it to the sink.
    ///
    /// Enrichment failures degrade rather than abort: the event still
    /// renders, carrying an `enrich_error` field naming the failed stage.
    /// Sink failures are swallowed; logging is best-effort from the
    /// caller's perspective.
    fn emit(&self, logger: &str, level: Level, mut dict: EventDict) {
        for (stage, processor) in &self.processors {
            if let Err(e) = processor(logger, level, &mut dict) {
                dict.insert(
                    "enrich_error".to_string(),
                    Value::String(format!("{stage}: {e}")),
                );
                break;
            }
        }

        let line = match self.renderer.render(&dict) {
            Ok(line) => line,
            Err(e) => json!({ "event": "log_render_failed", "error": e.to_string() }).to_string(),
        };
        let _ = self.sink.write_line(&line);
    }
}

/// Named logger handle. Cheap to clone; all emission goes through the
/// shared pipeline.
#[derive(Clone)]
pub struct Logger {
    name: String,
    bound: EventDict,
    pipeline: Arc<Pipeline>,
}

impl Logger {
    /// Child logger with `fields` merged into every event it emits. Bound
    /// fields sit between static context and call-site fields: call-site
    /// values win over bound ones, bound ones win over injected ones.
    pub fn bind(&self, fields: Fields<'_>) -> Logger {
        let mut bound = self.bound.clone();
        for (key, value) in fields {
            bound.insert((*key).to_string(), value.clone());
        }
        Logger {
            name: self.name.clone(),
            bound,
            pipeline: Arc::clone(&self.pipeline),
        }
    }

    pub fn debug(&self, event: &str, fields: Fields<'_>) {
        self.log(Level::Debug, event, fields);
    }

    pub fn info(&self, event: &str, fields: Fields<'_>) {
        self.log(Level::Info, event, fields);
    }

    pub fn warning(&self, event: &str, fields: Fields<'_>) {
        self.log(Level::Warning, event, fields);
    }

    pub fn error(&self, event: &str, fields: Fields<'_>) {
        self.log(Level::Error, event, fields);
    }

    /// Leveled emission that additionally captures a stack trace.
    pub fn with_stack(&self, level: Level, event: &str, fields: Fields<'_>) {
        let mut dict = EventDict::new();
        dict.insert(STACK_FLAG_KEY.to_string(), Value::Bool(true));
        self.log_with(level, event, fields, dict);
    }

    /// Error-level event carrying the full source chain of `err` as an
    /// `exception` field, plus a stack trace.
    pub fn exception(
        &self,
        event: &str,
        err: &(dyn std::error::Error + 'static),
        fields: Fields<'_>,
    ) {
        let mut dict = EventDict::new();
        dict.insert(EXC_KEY.to_string(), Value::String(error_chain(err)));
        dict.insert(STACK_FLAG_KEY.to_string(), Value::Bool(true));
        self.log_with(Level::Error, event, fields, dict);
    }

    pub fn log(&self, level: Level, event: &str, fields: Fields<'_>) {
        self.log_with(level, event, fields, EventDict::new());
    }

    fn log_with(&self, level: Level, event: &str, fields: Fields<'_>, mut dict: EventDict) {
        // Severity filter short-circuits before any enrichment work.
        if level < self.pipeline.min_level {
            return;
        }
        for (key, value) in fields {
            dict.insert((*key).to_string(), value.clone());
        }
        for (key, value) in &self.bound {
            if !dict.contains_key(key) {
                dict.insert(key.clone(), value.clone());
            }
        }
        if !dict.contains_key(EVENT_KEY) {
            dict.insert(EVENT_KEY.to_string(), Value::String(event.to_string()));
        }
        self.pipeline.emit(&self.name, level, dict);
    }
}

fn insert_if_absent(dict: &mut EventDict, key: &str, value: Value) {
    // Caller-supplied fields always win on key collision.
    if !dict.contains_key(key) {
        dict.insert(key.to_string(), value);
    }
}

/// Replace the opt-in stack flag with a captured backtrace.
fn render_stack(_logger: &str, _level: Level, dict: &mut EventDict) -> Result<(), LogError> {
    if dict.remove(STACK_FLAG_KEY) == Some(Value::Bool(true)) {
        let backtrace = std::backtrace::Backtrace::force_capture().to_string();
        insert_if_absent(dict, "stack", Value::String(backtrace));
    }
    Ok(())
}

/// Move the preformatted exception chain into its public field.
fn format_exception(_logger: &str, _level: Level, dict: &mut EventDict) -> Result<(), LogError> {
    if let Some(exc) = dict.remove(EXC_KEY) {
        insert_if_absent(dict, "exception", exc);
    }
    Ok(())
}

/// Strip control characters from string values so every event stays on one
/// line regardless of renderer.
fn sanitize_strings(_logger: &str, _level: Level, dict: &mut EventDict) -> Result<(), LogError> {
    for value in dict.values_mut() {
        if let Value::String(s) = value {
            if s.chars().any(char::is_control) {
                *s = s
                    .chars()
                    .map(|c| if c.is_control() { ' ' } else { c })
                    .collect();
            }
        }
    }
    Ok(())
}

/// Format an error and its source chain, outermost first.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
