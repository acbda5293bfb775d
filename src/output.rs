//! Decoded records and the sink interface they are emitted through.
//!
//! Every decoded group produces at most one [`Record`]: an ordered key-value
//! tree rendered as one JSON object. Stations build records incrementally
//! during dispatch; the pipeline hands finished records to a [`RecordSink`].

use std::io::Write;

use serde_json::{json, Map, Value};

/// One decoded record, an ordered JSON object under the hood.
#[derive(Clone, Debug, Default)]
pub struct Record {
    root: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Set a top-level field.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.root.insert(key.to_string(), value.into());
    }

    /// Set a field nested one level down, creating the object if needed.
    pub fn set_nested(&mut self, outer: &str, key: &str, value: impl Into<Value>) {
        let entry = self
            .root
            .entry(outer.to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), value.into());
        }
    }

    /// Set a field nested two levels down.
    pub fn set_nested2(&mut self, outer: &str, inner: &str, key: &str, value: impl Into<Value>) {
        let entry = self
            .root
            .entry(outer.to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(map) = entry {
            let inner_entry = map.entry(inner.to_string()).or_insert_with(|| json!({}));
            if let Value::Object(inner_map) = inner_entry {
                inner_map.insert(key.to_string(), value.into());
            }
        }
    }

    /// Append to a top-level array field, creating it if needed.
    pub fn append(&mut self, key: &str, value: impl Into<Value>) {
        let entry = self
            .root
            .entry(key.to_string())
            .or_insert_with(|| json!([]));
        if let Value::Array(items) = entry {
            items.push(value.into());
        }
    }

    /// Append to an array nested inside an object field.
    pub fn append_nested(&mut self, outer: &str, key: &str, value: impl Into<Value>) {
        let entry = self
            .root
            .entry(outer.to_string())
            .or_insert_with(|| json!({}));
        if let Value::Object(map) = entry {
            let array = map.entry(key.to_string()).or_insert_with(|| json!([]));
            if let Value::Array(items) = array {
                items.push(value.into());
            }
        }
    }

    /// Append a note to the `debug` array. Field-level rejections and
    /// unimplemented variants are reported this way rather than as errors.
    pub fn debug(&mut self, note: impl Into<String>) {
        self.append("debug", note.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Render as a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.root).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Where finished records go. Called synchronously, once per decoded group.
pub trait RecordSink {
    fn emit(&mut self, record: &Record);
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: &Record) {
        // A broken pipe on stdout is the consumer hanging up, not our error
        let _ = writeln!(self.writer, "{}", record.to_json());
        let _ = self.writer.flush();
    }
}

/// Collects records in memory; the sink used by tests.
#[derive(Default)]
pub struct VecSink {
    pub records: Vec<Record>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: &Record) {
        self.records.push(record.clone());
    }
}
