use std::io::Write;
use std::sync::Mutex;

/// Destination for rendered log lines. Each line must land as one atomic
/// append so concurrent emitters never interleave partial lines.
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &str) -> std::io::Result<()>;
}

/// Default sink: standard output, one locked write per line.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        std::io::stdout().lock().write_all(buf.as_bytes())
    }
}

/// Capturing sink: stores every rendered line in memory. Used by tests to
/// assert on emitted events.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}
