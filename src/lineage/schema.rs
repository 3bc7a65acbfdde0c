//! Lineage record definitions.
//!
//! This module defines the completed operations produced by the
//! correlator and the JSON records we write to the lineage file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a completed maintenance operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Flush,
    Merge,
}

/// Identity of a completed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpId {
    /// Leaf component, numbered in completion order from 0
    Flush(u64),

    /// Composite component covering flush ids `begin..=end`
    Merge { begin: u64, end: u64 },
}

impl OpId {
    pub fn kind(&self) -> OpKind {
        match self {
            OpId::Flush(_) => OpKind::Flush,
            OpId::Merge { .. } => OpKind::Merge,
        }
    }

    /// Rebuild an id from the `op`/`id` pair of a lineage record
    ///
    /// Returns None if `id` does not fit the kind (`<n>` or `<b>-<e>`).
    pub fn from_record(kind: OpKind, id: &str) -> Option<Self> {
        match kind {
            OpKind::Flush => id.trim().parse().ok().map(OpId::Flush),
            OpKind::Merge => {
                let (begin, end) = id.trim().split_once('-')?;
                Some(OpId::Merge {
                    begin: begin.parse().ok()?,
                    end: end.parse().ok()?,
                })
            }
        }
    }
}

impl fmt::Display for OpId {
    /// `<n>` for flushes, `<b>-<e>` for merges
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpId::Flush(n) => write!(f, "{}", n),
            OpId::Merge { begin, end } => write!(f, "{}-{}", begin, end),
        }
    }
}

/// A matched begin/end pair with derived identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedOp {
    pub id: OpId,

    /// End timestamp minus begin timestamp
    pub duration_micros: i64,

    /// `args.size` of the end event; None only under the keep-unsized policy
    pub size_bytes: Option<i64>,
}

impl CompletedOp {
    pub fn kind(&self) -> OpKind {
        self.id.kind()
    }

    pub fn to_record(&self) -> LineageRecord {
        LineageRecord {
            op: self.kind(),
            id: self.id.to_string(),
            duration: self.duration_micros,
            size: self.size_bytes,
        }
    }
}

/// One entry of the lineage file
///
/// `{"op":"merge","id":"0-4","duration":40,"size":150}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageRecord {
    pub op: OpKind,
    pub id: String,
    pub duration: i64,
    pub size: Option<i64>,
}

impl LineageRecord {
    pub fn op_id(&self) -> Option<OpId> {
        OpId::from_record(self.op, &self.id)
    }
}

/// Counters collected during one correlation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageStats {
    pub lines_read: usize,
    pub events: usize,
    pub skipped_lines: usize,
    pub flushes: usize,
    pub merges: usize,

    /// Completed ops that had no `args.size`
    pub unsized_ops: usize,
}

impl LineageStats {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and reports
    pub fn summary(&self) -> String {
        format!(
            "Lines: {} | Events: {} | Skipped: {} | Flushes: {} | Merges: {} | Unsized: {}",
            self.lines_read,
            self.events,
            self.skipped_lines,
            self.flushes,
            self.merges,
            self.unsized_ops
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let op = CompletedOp {
            id: OpId::Merge { begin: 0, end: 4 },
            duration_micros: 40,
            size_bytes: Some(150),
        };
        let json = serde_json::to_string(&op.to_record()).unwrap();
        assert_eq!(json, r#"{"op":"merge","id":"0-4","duration":40,"size":150}"#);
    }

    #[test]
    fn test_unsized_record_has_null_size() {
        let op = CompletedOp {
            id: OpId::Flush(3),
            duration_micros: 5,
            size_bytes: None,
        };
        let json = serde_json::to_string(&op.to_record()).unwrap();
        assert_eq!(json, r#"{"op":"flush","id":"3","duration":5,"size":null}"#);
    }

    #[test]
    fn test_id_from_record() {
        assert_eq!(OpId::from_record(OpKind::Flush, "12"), Some(OpId::Flush(12)));
        assert_eq!(
            OpId::from_record(OpKind::Merge, "3-9"),
            Some(OpId::Merge { begin: 3, end: 9 })
        );
        assert_eq!(OpId::from_record(OpKind::Merge, "3"), None);
        assert_eq!(OpId::from_record(OpKind::Flush, "null"), None);
    }
}
