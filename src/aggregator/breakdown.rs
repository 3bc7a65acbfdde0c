//! Per-name time breakdown of a single thread's events.
//!
//! Begin/end pairs are matched on one stack, whatever their category, and
//! their durations are accumulated under the begin event's name. Instant
//! events that carry `args.count` and `args.avg-duration-ns` contribute
//! `count * avg` nanoseconds under their own name.

use crate::parser::event::{find_field, json_i64, parse_json_object, Phase};
use crate::parser::threads::ThreadKey;
use crate::utils::config::{
    ARGS_FIELD_NAME, AVG_DURATION_NANOS_FIELD_NAME, COUNT_FIELD_NAME, NAME_FIELD_NAMES,
    PHASE_FIELD_NAMES, TIMESTAMP_FIELD_NAMES,
};
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::PathBuf;

/// Sum, min, max and count of the durations recorded under one name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationStats {
    pub total_micros: i64,
    pub min_micros: i64,
    pub max_micros: i64,
    pub count: u64,
}

impl DurationStats {
    fn first(duration: i64) -> Self {
        Self {
            total_micros: duration,
            min_micros: duration,
            max_micros: duration,
            count: 1,
        }
    }

    fn record(&mut self, duration: i64) {
        self.total_micros = self.total_micros.saturating_add(duration);
        self.min_micros = self.min_micros.min(duration);
        self.max_micros = self.max_micros.max(duration);
        self.count += 1;
    }
}

/// Where the time of one thread went
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeBreakdown {
    /// Earliest timestamp seen, in microseconds
    pub start_micros: Option<i64>,

    /// Latest timestamp seen, in microseconds
    pub end_micros: Option<i64>,

    /// Begin/end durations by name, ordered by name
    pub durations: BTreeMap<String, DurationStats>,

    /// Aggregated instant-event time by name, in microseconds
    pub instant_micros: BTreeMap<String, i64>,

    pub unmatched_ends: usize,
    pub unclosed_begins: usize,
}

impl TimeBreakdown {
    /// Wall time covered by the events, 0 when nothing was timed
    pub fn total_micros(&self) -> i64 {
        match (self.start_micros, self.end_micros) {
            (Some(start), Some(end)) => end.saturating_sub(start),
            _ => 0,
        }
    }

    /// Fraction of the covered wall time that `micros` represents
    pub fn share(&self, micros: i64) -> f64 {
        let total = self.total_micros();
        if total > 0 {
            micros as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and CLI output
    pub fn summary(&self) -> String {
        format!(
            "Total time: {}us | Named durations: {} | Instant totals: {} | Unmatched ends: {} | Unclosed begins: {}",
            self.total_micros(),
            self.durations.len(),
            self.instant_micros.len(),
            self.unmatched_ends,
            self.unclosed_begins
        )
    }

    fn observe(&mut self, timestamp: i64) {
        self.start_micros = Some(self.start_micros.map_or(timestamp, |s| s.min(timestamp)));
        self.end_micros = Some(self.end_micros.map_or(timestamp, |e| e.max(timestamp)));
    }
}

/// Breakdown of one extracted thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadBreakdown {
    pub thread: ThreadKey,

    /// File the thread's events were extracted to
    pub source: PathBuf,

    pub breakdown: TimeBreakdown,
}

/// Compute the time breakdown of one thread's event stream
///
/// **Public** - main entry point for time breakdown
///
/// Lines that are not JSON objects or have no timestamp are skipped. An
/// end event without an open begin is counted and skipped.
///
/// # Errors
/// * `ParseError::IoError` - The reader failed
pub fn compute_breakdown<R: BufRead>(reader: R) -> Result<TimeBreakdown, ParseError> {
    let mut breakdown = TimeBreakdown::default();
    let mut starts: Vec<(String, i64)> = Vec::new();
    let mut instant_nanos: BTreeMap<String, i64> = BTreeMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let Some(obj) = parse_json_object(line_no, &line) else {
            continue;
        };
        let Some(timestamp) = find_field(&obj, TIMESTAMP_FIELD_NAMES).and_then(json_i64) else {
            debug!("line {}: no timestamp, skipping", line_no);
            continue;
        };
        breakdown.observe(timestamp);

        let name = find_field(&obj, NAME_FIELD_NAMES)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let phase = find_field(&obj, PHASE_FIELD_NAMES)
            .and_then(Value::as_str)
            .map(Phase::from_label);

        match phase {
            Some(Phase::Begin) => starts.push((name.to_string(), timestamp)),
            Some(Phase::End) => {
                let Some((begin_name, begin)) = starts.pop() else {
                    warn!("line {}: end event has no begin event", line_no);
                    breakdown.unmatched_ends += 1;
                    continue;
                };
                match timestamp.checked_sub(begin) {
                    Some(duration) => {
                        breakdown
                            .durations
                            .entry(begin_name)
                            .and_modify(|stats| stats.record(duration))
                            .or_insert_with(|| DurationStats::first(duration));
                    }
                    None => warn!(
                        "line {}: duration of '{}' overflows, skipping",
                        line_no, begin_name
                    ),
                }
            }
            Some(Phase::Instant) => {
                let args = obj.get(ARGS_FIELD_NAME);
                let count = args
                    .and_then(|a| a.get(COUNT_FIELD_NAME))
                    .and_then(json_i64);
                let avg_nanos = args
                    .and_then(|a| a.get(AVG_DURATION_NANOS_FIELD_NAME))
                    .and_then(json_i64);
                if let (Some(count), Some(avg_nanos)) = (count, avg_nanos) {
                    let total = instant_nanos.entry(name.to_string()).or_insert(0);
                    *total = total.saturating_add(count.saturating_mul(avg_nanos));
                }
            }
            Some(Phase::Other(label)) => {
                warn!("line {}: unknown phase '{}', skipping", line_no, label)
            }
            None => debug!("line {}: no phase, skipping", line_no),
        }
    }

    breakdown.unclosed_begins = starts.len();
    breakdown.instant_micros = instant_nanos
        .into_iter()
        .map(|(name, nanos)| (name, nanos / 1_000))
        .collect();

    debug!("Time breakdown: {}", breakdown.summary());
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREAD: &str = r#"[
{"name":"Ingestion-Store","ph":"i","ts":100},
{"name":"flush","cat":"flush","ph":"B","ts":200},
{"name":"flush","cat":"flush","ph":"E","ts":260,"args":{"size":1}},
{"name":"merge","cat":"merge","ph":"B","ts":300},
{"name":"flush","cat":"flush","ph":"B","ts":310},
{"name":"flush","cat":"flush","ph":"E","ts":330},
{"name":"merge","cat":"merge","ph":"E","ts":500},
{"name":"frames","ph":"i","ts":600,"args":{"count":3,"avg-duration-ns":"1500"}},
{"name":"frames","ph":"i","ts":700,"args":{"count":1,"avg-duration-ns":500}},
"#;

    #[test]
    fn test_durations_by_name() {
        let breakdown = compute_breakdown(THREAD.as_bytes()).unwrap();

        assert_eq!(breakdown.start_micros, Some(100));
        assert_eq!(breakdown.end_micros, Some(700));
        assert_eq!(breakdown.total_micros(), 600);
        assert_eq!(
            breakdown.durations["flush"],
            DurationStats {
                total_micros: 80,
                min_micros: 20,
                max_micros: 60,
                count: 2
            }
        );
        assert_eq!(breakdown.durations["merge"].total_micros, 200);
        assert_eq!(breakdown.durations["merge"].count, 1);
    }

    #[test]
    fn test_instant_totals_in_micros() {
        let breakdown = compute_breakdown(THREAD.as_bytes()).unwrap();
        // 3 * 1500ns + 1 * 500ns
        assert_eq!(breakdown.instant_micros["frames"], 5);
        assert!(!breakdown.instant_micros.contains_key("Ingestion-Store"));
    }

    #[test]
    fn test_unbalanced_stream_counted() {
        let input = r#"{"name":"a","ph":"E","ts":1}
{"name":"b","ph":"B","ts":2}
{"name":"c","ph":"X","ts":3}"#;
        let breakdown = compute_breakdown(input.as_bytes()).unwrap();

        assert_eq!(breakdown.unmatched_ends, 1);
        assert_eq!(breakdown.unclosed_begins, 1);
        assert!(breakdown.durations.is_empty());
        assert_eq!(breakdown.total_micros(), 2);
    }

    #[test]
    fn test_empty_stream() {
        let breakdown = compute_breakdown("[\n".as_bytes()).unwrap();
        assert_eq!(breakdown.total_micros(), 0);
        assert_eq!(breakdown.share(10), 0.0);
    }

    #[test]
    fn test_overflowing_duration_skipped() {
        let input = format!(
            "{{\"name\":\"a\",\"ph\":\"B\",\"ts\":{}}}\n{{\"name\":\"a\",\"ph\":\"E\",\"ts\":{}}}",
            i64::MIN,
            i64::MAX
        );
        let breakdown = compute_breakdown(input.as_bytes()).unwrap();
        assert!(breakdown.durations.is_empty());
        assert_eq!(breakdown.total_micros(), i64::MAX);
    }
}
