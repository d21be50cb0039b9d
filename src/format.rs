// src/format.rs
use serde::Serialize;
use serde_json::Value;

use crate::error::PipelineError;

/// Splice nested arrays into one flat sequence, at any depth.
pub fn flatten(records: Vec<Value>) -> Vec<Value> {
    let mut out = Vec::with_capacity(records.len());
    push_flat(&mut out, records);
    out
}

fn push_flat(out: &mut Vec<Value>, records: Vec<Value>) {
    for r in records {
        match r {
            Value::Array(inner) => push_flat(out, inner),
            other => out.push(other),
        }
    }
}

/// Serialize records as a flat, 2-space indented JSON array with sorted keys.
pub fn format_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>, PipelineError> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(format_error)?;
    let flat: Vec<Value> = flatten(values).into_iter().map(sort_keys).collect();
    serde_json::to_vec_pretty(&flat).map_err(format_error)
}

fn format_error(e: serde_json::Error) -> PipelineError {
    PipelineError::Format {
        message: e.to_string(),
    }
}

// Key order must not depend on whether serde_json's `preserve_order` is enabled.
fn sort_keys(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
