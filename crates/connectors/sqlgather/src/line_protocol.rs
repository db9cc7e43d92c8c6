//! An accumulator that writes InfluxDB line protocol.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use query_engine_execution::accumulator::Accumulator;
use query_engine_execution::value::{FieldValue, Fields, Tags};

/// Writes one line per row to `W`.
pub struct LineProtocolAccumulator<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineProtocolAccumulator<W> {
    pub fn new(writer: W) -> Self {
        LineProtocolAccumulator {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Accumulator for LineProtocolAccumulator<W> {
    fn add_fields(&self, measurement: &str, fields: Fields, tags: Tags) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since_epoch| since_epoch.as_nanos());

        let Some(line) = render_line(measurement, &fields, &tags, timestamp) else {
            tracing::debug!(measurement, "row has no fields, skipping");
            return;
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            tracing::warn!(%error, "unable to write metric");
        }
    }
}

/// Render one row, or `None` if nothing representable is left in `fields`.
///
/// Empty tags and non-finite floats cannot be written and are left out.
pub fn render_line(
    measurement: &str,
    fields: &Fields,
    tags: &Tags,
    timestamp_nanos: u128,
) -> Option<String> {
    let rendered_fields: Vec<String> = fields
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                FieldValue::Integer(integer) => format!("{integer}i"),
                FieldValue::Float(float) if float.is_finite() => format!("{float}"),
                FieldValue::Float(_) => return None,
            };
            Some(format!("{}={value}", escape_key(key)))
        })
        .collect();

    if rendered_fields.is_empty() {
        return None;
    }

    let mut line = escape_measurement(measurement);
    for (key, value) in tags {
        let (key, value) = (escape_key(key), escape_key(value));
        if key.is_empty() || value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&key);
        line.push('=');
        line.push_str(&value);
    }
    line.push(' ');
    line.push_str(&rendered_fields.join(","));
    line.push(' ');
    line.push_str(&timestamp_nanos.to_string());
    Some(line)
}

fn escape_measurement(measurement: &str) -> String {
    escape(measurement, &[',', ' '])
}

fn escape_key(key: &str) -> String {
    escape(key, &[',', '=', ' '])
}

/// Escape `special` with a backslash and write control characters as `\n`-style escapes.
/// A trailing backslash would escape the following delimiter, so it is dropped.
fn escape(input: &str, special: &[char]) -> String {
    let input = input.trim_end_matches('\\');
    let mut escaped = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{c}' => escaped.push_str("\\f"),
            _ => {
                if special.contains(&character) {
                    escaped.push('\\');
                }
                escaped.push(character);
            }
        }
    }
    escaped
}
