//! Thread discovery and thread-scoped extraction.
//!
//! A full trace interleaves events from every thread of every process.
//! Lineage needs the events of a single maintenance thread, so these
//! helpers find the threads that emitted some marker event and copy
//! their events into a separate file, preserving order.

use super::event::parse_json_object;
use crate::utils::config::{PROCESS_FIELD_NAME, THREAD_FIELD_NAME};
use crate::utils::error::ParseError;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

/// A (process, thread) identifier
///
/// A key without a process id matches the thread in any process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadKey {
    pub pid: Option<String>,
    pub tid: u64,
}

impl ThreadKey {
    pub fn new(pid: Option<String>, tid: u64) -> Self {
        Self { pid, tid }
    }

    /// Whether an event with this pid/tid belongs to the thread
    pub fn matches(&self, pid: Option<&str>, tid: u64) -> bool {
        self.tid == tid && self.pid.as_deref().map_or(true, |p| Some(p) == pid)
    }

    /// File name fragment, `<pid>.<tid>` or `<tid>`
    pub fn file_tag(&self) -> String {
        match &self.pid {
            Some(pid) => format!("{}.{}", pid, self.tid),
            None => self.tid.to_string(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pid {
            Some(pid) => write!(f, "{}:{}", pid, self.tid),
            None => write!(f, "{}", self.tid),
        }
    }
}

impl FromStr for ThreadKey {
    type Err = ParseError;

    /// Parse `[<pid>:]<tid>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidThread(s.to_string());
        let (pid, tid) = match s.rsplit_once(':') {
            Some((pid, tid)) if !pid.is_empty() => (Some(pid.to_string()), tid),
            Some(_) => return Err(invalid()),
            None => (None, s),
        };
        let tid = tid.trim().parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { pid, tid })
    }
}

/// Per-thread counts from an extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Lines read from the input
    pub total_in: usize,

    /// Events written, indexed like the requested threads
    pub per_thread: Vec<usize>,
}

impl ExtractStats {
    pub fn total_out(&self) -> usize {
        self.per_thread.iter().sum()
    }
}

/// Find threads that emitted an event whose `field` equals one of `values`
///
/// **Public** - thread discovery entry point
///
/// Only string fields are compared, exactly. Lines without a thread id
/// are skipped.
///
/// # Returns
/// Matching threads, de-duplicated and ordered
pub fn find_threads<R: BufRead>(
    reader: R,
    field: &str,
    values: &[String],
) -> Result<Vec<ThreadKey>, ParseError> {
    let mut found = BTreeSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(obj) = parse_json_object(index + 1, &line) else {
            continue;
        };
        let Some((pid, tid)) = thread_of(&obj) else {
            debug!("line {}: no {} field, skipping", index + 1, THREAD_FIELD_NAME);
            continue;
        };

        let matched = obj
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| values.iter().any(|want| want == v));
        if matched {
            found.insert(ThreadKey::new(pid, tid));
        }
    }

    let threads: Vec<ThreadKey> = found.into_iter().collect();
    info!(
        "Found {} matching thread(s): {}",
        threads.len(),
        threads
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(threads)
}

/// Copy the events of the given threads into `writer`
///
/// **Public** - thread-scoped extraction entry point
///
/// Output starts with `[` and every event is written as compact JSON
/// followed by a comma, one per line, in input order. This is the layout
/// the lineage decoder expects.
pub fn extract_threads<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    threads: &[ThreadKey],
) -> Result<ExtractStats, ParseError> {
    let mut stats = ExtractStats {
        total_in: 0,
        per_thread: vec![0; threads.len()],
    };

    writeln!(writer, "[")?;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        stats.total_in += 1;

        let Some(obj) = parse_json_object(index + 1, &line) else {
            continue;
        };
        let Some((pid, tid)) = thread_of(&obj) else {
            continue;
        };

        if let Some(slot) = threads.iter().position(|t| t.matches(pid.as_deref(), tid)) {
            stats.per_thread[slot] += 1;
            writeln!(writer, "{},", Value::Object(obj))?;
        }
    }
    writer.flush()?;

    info!("Total in: {}. Total out: {}", stats.total_in, stats.total_out());
    for (thread, count) in threads.iter().zip(&stats.per_thread) {
        debug!("Thread {}: {}", thread, count);
    }

    Ok(stats)
}

/// Pull (pid, tid) out of an event; pid may be a string or a number
///
/// **Private** - shared by find_threads and extract_threads
fn thread_of(obj: &Map<String, Value>) -> Option<(Option<String>, u64)> {
    let tid = obj.get(THREAD_FIELD_NAME)?.as_u64()?;
    let pid = obj.get(PROCESS_FIELD_NAME).and_then(|p| match p {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    Some((pid, tid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"[
{"name":"Ingestion-Store","cat":"thread","ph":"i","ts":1,"pid":"nc1","tid":7},
{"name":"flush","cat":"flush","ph":"B","ts":2,"pid":"nc1","tid":7},
{"name":"other","cat":"x","ph":"B","ts":3,"pid":"nc1","tid":8},
{"name":"Ingestion-Store","cat":"thread","ph":"i","ts":4,"pid":"nc2","tid":7},
not json
{"name":"flush","cat":"flush","ph":"E","ts":5,"pid":"nc1","tid":7}
"#;

    #[test]
    fn test_thread_key_parse() {
        assert_eq!(
            "nc1:7".parse::<ThreadKey>().unwrap(),
            ThreadKey::new(Some("nc1".to_string()), 7)
        );
        assert_eq!("7".parse::<ThreadKey>().unwrap(), ThreadKey::new(None, 7));
        assert!("nc1:".parse::<ThreadKey>().is_err());
        assert!(":7".parse::<ThreadKey>().is_err());
    }

    #[test]
    fn test_find_threads() {
        let threads = find_threads(
            TRACE.as_bytes(),
            "name",
            &["Ingestion-Store".to_string()],
        )
        .unwrap();

        assert_eq!(
            threads,
            vec![
                ThreadKey::new(Some("nc1".to_string()), 7),
                ThreadKey::new(Some("nc2".to_string()), 7),
            ]
        );
    }

    #[test]
    fn test_extract_single_thread() {
        let mut out = Vec::new();
        let threads = [ThreadKey::new(Some("nc1".to_string()), 7)];
        let stats = extract_threads(TRACE.as_bytes(), &mut out, &threads).unwrap();

        assert_eq!(stats.total_in, 7);
        assert_eq!(stats.per_thread, vec![3]);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[");
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().skip(1).all(|l| l.ends_with("},")));
    }

    #[test]
    fn test_extract_without_pid_matches_any_process() {
        let mut out = Vec::new();
        let stats = extract_threads(TRACE.as_bytes(), &mut out, &[ThreadKey::new(None, 7)]).unwrap();
        assert_eq!(stats.total_out(), 4);
    }
}
