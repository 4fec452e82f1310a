//! Serialized form of history records
//!
//! Records are stored as JSON objects:
//!
//! ```json
//! {"id": "...", "timestamp": "2024-01-01T00:00:00+00:00",
//!  "request": {"lat": 0.0, "lng": 0.0, "radius": 3000.0, ...},
//!  "winners": {"attractor": {"circle_id": "center", "result": {...}}},
//!  "name": "...", "notes": "...", "favorite": false}
//! ```
//!
//! `name` and `notes` are omitted when unset; `favorite` defaults to false.
//!
//! Server responses carry the timestamp under `metadata.timestamp` and an
//! extra `circles` list; both decode into the same record, circles dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::history::record::{GenerationRequest, HistoryRecord, ResultType, WinnerResult};

#[derive(Serialize)]
struct EncodedRecord<'a> {
    id: &'a str,
    timestamp: String,
    request: &'a GenerationRequest,
    winners: &'a BTreeMap<ResultType, WinnerResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    favorite: bool,
}

/// Outcome of decoding a batch of records
#[derive(Debug, Default)]
pub struct DecodeBatch {
    pub records: Vec<HistoryRecord>,
    /// Records dropped because they failed to decode
    pub malformed: usize,
}

/// Encode a record into its stored JSON form
pub fn encode(record: &HistoryRecord) -> Result<Value> {
    let encoded = EncodedRecord {
        id: record.id(),
        timestamp: record.timestamp().to_rfc3339(),
        request: record.request(),
        winners: record.winners(),
        name: record.name(),
        notes: record.notes(),
        favorite: record.is_favorite(),
    };
    Ok(serde_json::to_value(encoded)?)
}

/// Encode records as a JSON array, preserving order
pub fn encode_all<'a, I>(records: I) -> Result<Value>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    records
        .into_iter()
        .map(encode)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::MalformedRecord(msg.into())
}

/// Decode one stored or server-supplied record
pub fn decode(value: &Value) -> Result<HistoryRecord> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("record is not an object"))?;

    let id = match obj.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(_) => return Err(malformed("`id` is not a non-empty string")),
        None => return Err(malformed("missing `id`")),
    };

    let timestamp = decode_timestamp(obj).map_err(|e| with_id(&id, e))?;
    let request = decode_request(obj.get("request")).map_err(|e| with_id(&id, e))?;
    let winners = decode_winners(obj.get("winners")).map_err(|e| with_id(&id, e))?;
    let name = optional_text(obj, "name").map_err(|e| with_id(&id, e))?;
    let notes = optional_text(obj, "notes").map_err(|e| with_id(&id, e))?;
    let favorite = match obj.get("favorite") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(favorite)) => *favorite,
        Some(_) => return Err(malformed(format!("{}: `favorite` is not a boolean", id))),
    };

    let mut record = HistoryRecord::new(id, timestamp, request, winners).with_favorite(favorite);
    if let Some(name) = name {
        record = record.with_name(name);
    }
    if let Some(notes) = notes {
        record = record.with_notes(notes);
    }
    Ok(record)
}

fn optional_text(obj: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(malformed(format!("`{}` is not a string", field))),
    }
}

fn with_id(id: &str, err: Error) -> Error {
    match err {
        Error::MalformedRecord(msg) => malformed(format!("{}: {}", id, msg)),
        other => other,
    }
}

fn decode_timestamp(obj: &Map<String, Value>) -> Result<DateTime<Utc>> {
    let raw = match obj.get("timestamp") {
        Some(value) => value,
        None => obj
            .get("metadata")
            .and_then(|m| m.get("timestamp"))
            .ok_or_else(|| malformed("missing `timestamp`"))?,
    };
    let text = raw
        .as_str()
        .ok_or_else(|| malformed("`timestamp` is not a string"))?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| malformed(format!("invalid timestamp {:?}: {}", text, e)))
}

fn decode_request(value: Option<&Value>) -> Result<GenerationRequest> {
    let value = value.ok_or_else(|| malformed("missing `request`"))?;
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("`request` is not an object"))?;
    for field in ["lat", "lng", "radius"] {
        if !obj.get(field).is_some_and(Value::is_number) {
            return Err(malformed(format!("`request.{}` is not a number", field)));
        }
    }
    let request: GenerationRequest = serde_json::from_value(value.clone())
        .map_err(|e| malformed(format!("invalid `request`: {}", e)))?;
    request
        .validate()
        .map_err(|e| malformed(format!("invalid `request`: {}", e)))?;
    Ok(request)
}

fn decode_winners(value: Option<&Value>) -> Result<BTreeMap<ResultType, WinnerResult>> {
    let map = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(malformed("`winners` is not an object")),
    };

    let mut winners = BTreeMap::new();
    for (key, raw) in map {
        let Ok(result_type) = key.parse::<ResultType>() else {
            tracing::debug!(result_type = %key, "Skipping winner with unknown result type");
            continue;
        };
        let winner: WinnerResult = serde_json::from_value(raw.clone())
            .map_err(|e| malformed(format!("invalid winner `{}`: {}", key, e)))?;
        winners.insert(result_type, winner);
    }
    Ok(winners)
}

/// Decode every value, dropping the ones that fail.
pub fn decode_batch(values: &[Value]) -> DecodeBatch {
    let mut batch = DecodeBatch::default();
    for value in values {
        match decode(value) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping undecodable history record");
                batch.malformed += 1;
            }
        }
    }
    batch
}
