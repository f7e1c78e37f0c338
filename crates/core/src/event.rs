use serde_json::{Map, Value};

/// A log event under construction: field name → value. Field order is the
/// order fields were inserted in.
pub type EventDict = Map<String, Value>;

/// Call-site fields for a single log call, the most specific context an
/// event carries. On key collision with injected fields, these win.
pub type Fields<'a> = &'a [(&'a str, Value)];

/// The event/message name itself.
pub(crate) const EVENT_KEY: &str = "event";

/// Marker: caller asked for a stack trace. Consumed by the stack stage.
pub(crate) const STACK_FLAG_KEY: &str = "stack_info";

/// Marker: preformatted exception chain. Consumed by the exception stage.
pub(crate) const EXC_KEY: &str = "exc_info";
