//! File export of history records
//!
//! JSON export is the native format and imports back unchanged. GPX export
//! carries one waypoint per record and cannot be imported.

use crate::error::Result;
use crate::history::{codec, HistoryRecord};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Gpx,
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "gpx" => Ok(Self::Gpx),
            _ => Err(crate::error::Error::Config(format!(
                "Unknown export format: {}",
                s
            ))),
        }
    }
}

/// Export `records` in `format`
pub fn export<'a, I>(records: I, format: ExportFormat) -> Result<String>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    match format {
        ExportFormat::Json => export_json(records),
        ExportFormat::Gpx => Ok(export_gpx(records)),
    }
}

/// Pretty-printed JSON array of encoded records
pub fn export_json<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    Ok(serde_json::to_string_pretty(&codec::encode_all(records)?)?)
}

/// GPX 1.1 waypoint list, one waypoint per record
pub fn export_gpx<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    let mut gpx = String::new();
    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="q-explore" xmlns="http://www.topografix.com/GPX/1/1">"#);
    gpx.push('\n');

    for record in records {
        write_waypoint(&mut gpx, record);
    }

    gpx.push_str("</gpx>\n");
    gpx
}

fn write_waypoint(gpx: &mut String, record: &HistoryRecord) {
    let request = record.request();
    let result_type = request.result_type.unwrap_or_default();
    let coords = record
        .winner(result_type)
        .map(|w| w.result.coords)
        .unwrap_or_else(|| request.center());
    let name = match record.name() {
        Some(name) => escape_xml(name),
        None => {
            let short_id: String = record.id().chars().take(8).collect();
            format!("q-explore {}", escape_xml(&short_id))
        }
    };

    gpx.push_str(&format!(
        "  <wpt lat=\"{}\" lon=\"{}\">\n",
        coords.lat, coords.lng
    ));
    gpx.push_str(&format!("    <time>{}</time>\n", record.timestamp().to_rfc3339()));
    gpx.push_str(&format!("    <name>{}</name>\n", name));
    gpx.push_str(&format!(
        "    <desc>{}, radius {}m, {}</desc>\n",
        result_type, request.radius, request.mode
    ));
    gpx.push_str("  </wpt>\n");
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
