//! Decoding of raw trace event lines.
//!
//! The input is one JSON object per line, as written by the storage
//! engine's tracer (or by the thread extractor, which appends a trailing
//! comma). Only a handful of fields matter for correlation; everything
//! else on the line is ignored.

use crate::utils::config::{
    ARGS_FIELD_NAME, CATEGORY_FIELD_NAMES, CATEGORY_FLUSH, CATEGORY_MERGE, NAME_FIELD_NAMES,
    PHASE_BEGIN, PHASE_END, PHASE_FIELD_NAMES, PHASE_INSTANT, SIZE_FIELD_NAME,
    TIMESTAMP_FIELD_NAMES,
};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fmt;

/// Maintenance operation category that takes part in lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Flush,
    Merge,
}

impl Category {
    /// Map a raw category label to a lineage category
    ///
    /// Returns None for categories that do not participate in lineage.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            CATEGORY_FLUSH => Some(Category::Flush),
            CATEGORY_MERGE => Some(Category::Merge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flush => CATEGORY_FLUSH,
            Category::Merge => CATEGORY_MERGE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Begin,
    End,
    Instant,
    Other(String),
}

impl Phase {
    pub fn from_label(label: &str) -> Self {
        match label {
            PHASE_BEGIN => Phase::Begin,
            PHASE_END => Phase::End,
            l if PHASE_INSTANT.contains(&l) => Phase::Instant,
            other => Phase::Other(other.to_string()),
        }
    }

    /// Whether this phase opens or closes a duration
    pub fn is_duration(&self) -> bool {
        matches!(self, Phase::Begin | Phase::End)
    }
}

/// One decoded trace record
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Operation label; for flush/merge this ends with the component time range
    pub name: String,

    /// Raw category label (see `lineage_category`)
    pub category: String,

    pub phase: Phase,

    /// Event timestamp in microseconds, if present
    pub timestamp_micros: Option<i64>,

    /// `args.size` in bytes, if present
    pub size: Option<i64>,

    /// Whether the record carried an `args` object at all
    pub has_args: bool,
}

impl RawEvent {
    /// Lineage category of this event, None for unrelated categories
    pub fn lineage_category(&self) -> Option<Category> {
        Category::from_label(&self.category)
    }
}

/// Outcome of decoding a single input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A structured event with all required fields
    Event(RawEvent),

    /// Not an event (array brackets, log noise, broken JSON)
    Noise,
}

/// Decode one input line into an event
///
/// **Public** - main entry point for event decoding
///
/// # Arguments
/// * `line_no` - 1-based line number, used in diagnostics
/// * `line` - Raw line text
///
/// # Returns
/// `LineOutcome::Event` for structured records, `LineOutcome::Noise` for
/// lines that are skipped
///
/// # Errors
/// * `ParseError::MissingField` - A JSON object lacks `name`, category or phase
pub fn decode_line(line_no: usize, line: &str) -> Result<LineOutcome, ParseError> {
    let Some(obj) = parse_json_object(line_no, line) else {
        return Ok(LineOutcome::Noise);
    };

    let name = required_str(&obj, NAME_FIELD_NAMES, line_no, "name")?;
    let category = required_str(&obj, CATEGORY_FIELD_NAMES, line_no, "category")?;
    let phase = required_str(&obj, PHASE_FIELD_NAMES, line_no, "phase")?;

    let timestamp_micros = find_field(&obj, TIMESTAMP_FIELD_NAMES).and_then(json_i64);
    let args = obj.get(ARGS_FIELD_NAME);
    let size = args
        .and_then(|args| args.get(SIZE_FIELD_NAME))
        .and_then(json_i64);

    Ok(LineOutcome::Event(RawEvent {
        name,
        category,
        phase: Phase::from_label(&phase),
        timestamp_micros,
        size,
        has_args: args.is_some(),
    }))
}

/// Parse a line into a JSON object, or None if it is not one
///
/// **Public** - shared by the thread tools
///
/// Leading/trailing whitespace is ignored and anything after the last `}`
/// (typically a separating comma) is dropped.
pub fn parse_json_object(line_no: usize, line: &str) -> Option<Map<String, Value>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        debug!("line {}: not a json object, skipping", line_no);
        return None;
    }

    let end = trimmed.rfind('}')?;
    match serde_json::from_str::<Value>(&trimmed[..=end]) {
        Ok(Value::Object(obj)) => Some(obj),
        Ok(_) => None,
        Err(e) => {
            warn!("line {}: failed to parse json ({}), skipping", line_no, e);
            None
        }
    }
}

/// Find the first present field among aliases
pub fn find_field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(*name))
}

/// Read a required, non-empty string field
///
/// **Private** - internal helper for decode_line
fn required_str(
    obj: &Map<String, Value>,
    names: &[&str],
    line_no: usize,
    field: &'static str,
) -> Result<String, ParseError> {
    find_field(obj, names)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ParseError::MissingField {
            line: line_no,
            field,
        })
}

/// Read an integer from a JSON number or numeric string
pub fn json_i64(val: &Value) -> Option<i64> {
    if let Some(n) = val.as_i64() {
        Some(n)
    } else if let Some(f) = val.as_f64() {
        Some(f as i64)
    } else {
        val.as_str().and_then(|s| s.trim().parse().ok())
    }
}
