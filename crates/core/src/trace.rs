//! Append-only records of what the loops did.
//!
//! Trace events are written as a side effect of running tools and are never
//! read back into a run. They exist for inspecting runs afterwards.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single trace record.
///
/// Serialized flat, as `{"ts": ..., "event": ..., <attributes>}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// When the event was appended.
    pub ts: DateTime<Utc>,
    /// The kind of event, such as `tool_call`.
    pub event: String,
    /// Free-form attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl TraceEvent {
    /// Creates an event of the given kind with no attributes.
    ///
    /// The timestamp is replaced when the event is appended to a sink.
    pub fn new<S: Into<String>>(event: S) -> Self {
        Self {
            ts: Utc::now(),
            event: event.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute.
    #[inline]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A destination of trace events.
///
/// Appending must be safe from concurrent runs and must not fail the
/// caller.
pub trait TraceSink: Send + Sync {
    /// Stamps the event with the current time and records it.
    fn append(&self, event: TraceEvent);

    /// Returns up to `limit` of the most recent events, oldest first.
    fn tail(&self, limit: usize) -> Vec<TraceEvent>;
}

/// A sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    #[inline]
    fn append(&self, _event: TraceEvent) {}

    #[inline]
    fn tail(&self, _limit: usize) -> Vec<TraceEvent> {
        vec![]
    }
}

/// A sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemoryTraceSink {
    /// Creates an empty sink.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all events recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TraceSink for MemoryTraceSink {
    fn append(&self, mut event: TraceEvent) {
        event.ts = Utc::now();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn tail(&self, limit: usize) -> Vec<TraceEvent> {
        let events =
            self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let start = events.len().saturating_sub(limit);
        events[start..].to_vec()
    }
}

/// A sink writing one JSON object per line to a file.
///
/// Every record is written with a single `write_all` while holding a lock,
/// so lines from concurrent runs never interleave. Readers may still see a
/// partially written last line, which [`tail`](TraceSink::tail) skips.
#[derive(Debug)]
pub struct JsonlTraceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlTraceStore {
    /// Creates a store appending to `path`. The file and its parent
    /// directories are created on the first append.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the path of the trace file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line)
    }
}

impl TraceSink for JsonlTraceStore {
    fn append(&self, mut event: TraceEvent) {
        event.ts = Utc::now();
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(err) => {
                warn!("failed to encode trace event: {err}");
                return;
            }
        };
        line.push(b'\n');

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = self.write_line(&line) {
            warn!(
                "failed to append trace to {}: {err}",
                self.path.display()
            );
        }
    }

    fn tail(&self, limit: usize) -> Vec<TraceEvent> {
        if limit == 0 {
            return vec![];
        }
        // Read as bytes: a torn last line may end inside a UTF-8 sequence.
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return vec![];
            }
            Err(err) => {
                warn!("failed to read trace {}: {err}", self.path.display());
                return vec![];
            }
        };

        let mut events = VecDeque::with_capacity(limit);
        let lines = content
            .split(|&b| b == b'\n')
            .filter(|line| !line.trim_ascii().is_empty());
        for line in lines {
            match serde_json::from_slice::<TraceEvent>(line) {
                Ok(event) => {
                    if events.len() == limit {
                        events.pop_front();
                    }
                    events.push_back(event);
                }
                Err(err) => debug!("skipping undecodable trace line: {err}"),
            }
        }
        events.into()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = TraceEvent::new("tool_call")
            .with("tool", "add")
            .with("arguments", json!({ "a": 1, "b": 2 }));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "tool_call");
        assert_eq!(value["tool"], "add");
        assert_eq!(value["arguments"], json!({ "a": 1, "b": 2 }));
        assert!(value["ts"].is_string());
    }

    #[test]
    fn test_jsonl_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlTraceStore::new(dir.path().join("logs/trace.jsonl"));
        assert!(store.tail(10).is_empty());

        for n in 0..5 {
            store.append(TraceEvent::new("tool_call").with("n", n));
        }
        let events = store.tail(3);
        let ns: Vec<_> =
            events.iter().map(|e| e.attributes["n"].clone()).collect();
        assert_eq!(ns, [json!(2), json!(3), json!(4)]);
        assert!(store.tail(0).is_empty());
    }

    #[test]
    fn test_tail_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let store = JsonlTraceStore::new(&path);
        store.append(TraceEvent::new("tool_call").with("tool", "a"));
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"not json at all\n").unwrap();
        }
        store.append(TraceEvent::new("tool_call").with("tool", "b"));
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            let truncated = br#"{"ts": "2024-01-01T00:00:00Z", "event": "to"#;
            file.write_all(truncated).unwrap();
        }

        let tools: Vec<_> = store
            .tail(10)
            .into_iter()
            .map(|e| e.attributes["tool"].clone())
            .collect();
        assert_eq!(tools, [json!("a"), json!("b")]);
    }

    #[test]
    fn test_tail_survives_torn_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.jsonl");
        let store = JsonlTraceStore::new(&path);
        store.append(TraceEvent::new("tool_call").with("result", "营业额500万"));
        store.append(TraceEvent::new("tool_call").with("result", "ok"));

        let line = serde_json::to_vec(
            &TraceEvent::new("tool_call").with("result", "利润率12%"),
        )
        .unwrap();
        let first_multibyte = line.iter().position(|b| !b.is_ascii()).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&line[..first_multibyte + 1]).unwrap();
        }
        assert!(fs::read_to_string(&path).is_err());

        let results: Vec<_> = store
            .tail(10)
            .into_iter()
            .map(|e| e.attributes["result"].clone())
            .collect();
        assert_eq!(results, [json!("营业额500万"), json!("ok")]);
    }

    #[test]
    fn test_concurrent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonlTraceStore::new(dir.path().join("t.jsonl")));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for n in 0..25 {
                        store.append(
                            TraceEvent::new("tool_call")
                                .with("thread", t)
                                .with("n", n),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.tail(1000).len(), 100);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemoryTraceSink::new();
        sink.append(TraceEvent::new("a"));
        sink.append(TraceEvent::new("b"));
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.tail(1)[0].event, "b");
    }
}
