//! Pair begin/end events into completed flush and merge operations.
//!
//! Each category keeps its own stack of open begin events; an end event
//! always closes the most recent open begin of the same category. Flushes
//! are numbered in completion order, and the oldest timestamp of each
//! flushed component is remembered so that merges, whose component name
//! spans the stamps of their first and last inputs, can be resolved back
//! to a range of flush ids.

use super::schema::{CompletedOp, LineageStats, OpId};
use crate::parser::event::{decode_line, Category, LineOutcome, Phase, RawEvent};
use crate::parser::time_range::{decode_time_range, TimeRange};
use crate::utils::error::{LineageError, ParseError};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::BufRead;

/// What to do with a completed operation whose end event has no size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSizePolicy {
    /// Emit nothing and consume no id
    #[default]
    Drop,

    /// Emit the operation with no size, keeping ids contiguous
    Keep,
}

/// Identity bookkeeping for one correlation pass
#[derive(Debug, Clone, Default)]
pub struct LineageState {
    counter: u64,

    /// Component begin time (epoch ms) -> flush id
    time_to_id: HashMap<i64, u64>,
}

impl LineageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flush ids handed out so far
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Flush id whose component starts at `millis`
    pub fn resolve(&self, millis: i64) -> Option<u64> {
        self.time_to_id.get(&millis).copied()
    }

    fn assign_flush(&mut self, begin_millis: i64) -> u64 {
        let id = self.counter;
        if let Some(previous) = self.time_to_id.insert(begin_millis, id) {
            warn!(
                "flushes {} and {} share component time {}, merges will resolve to {}",
                previous, id, begin_millis, id
            );
        }
        self.counter += 1;
        id
    }
}

/// An open begin event waiting for its end
#[derive(Debug, Clone, Copy)]
struct OpenOp {
    line: usize,
    timestamp_micros: i64,
}

/// Result of a full correlation pass
#[derive(Debug, Clone)]
pub struct Lineage {
    /// Completed operations, in completion order
    pub ops: Vec<CompletedOp>,
    pub stats: LineageStats,
}

/// Stateful event correlator for a single thread's stream
#[derive(Debug, Default)]
pub struct LineageBuilder {
    state: LineageState,
    policy: MissingSizePolicy,
    flush_starts: Vec<OpenOp>,
    merge_starts: Vec<OpenOp>,
    stats: LineageStats,
}

impl LineageBuilder {
    pub fn new(policy: MissingSizePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &LineageState {
        &self.state
    }

    pub fn stats(&self) -> &LineageStats {
        &self.stats
    }

    /// Decode and process one raw input line
    ///
    /// **Public** - line-level entry point
    ///
    /// # Returns
    /// The operation completed by this line, if any
    ///
    /// # Errors
    /// Any `LineageError`; the pass should be abandoned
    pub fn process_line(
        &mut self,
        line_no: usize,
        line: &str,
    ) -> Result<Option<CompletedOp>, LineageError> {
        self.stats.lines_read += 1;
        match decode_line(line_no, line)? {
            LineOutcome::Noise => {
                self.stats.skipped_lines += 1;
                Ok(None)
            }
            LineOutcome::Event(event) => self.process_event(line_no, &event),
        }
    }

    /// Process one decoded event
    ///
    /// **Public** - event-level entry point
    pub fn process_event(
        &mut self,
        line_no: usize,
        event: &RawEvent,
    ) -> Result<Option<CompletedOp>, LineageError> {
        self.stats.events += 1;

        if !event.phase.is_duration() {
            debug!("line {}: not a begin/end event, skipping", line_no);
            return Ok(None);
        }
        let category = event
            .lineage_category()
            .ok_or_else(|| LineageError::UnexpectedCategory {
                line: line_no,
                category: event.category.clone(),
            })?;

        let range = decode_time_range(&event.name)?;
        let timestamp_micros = event.timestamp_micros.ok_or(ParseError::MissingField {
            line: line_no,
            field: "timestamp",
        })?;

        if event.phase == Phase::Begin {
            self.stack_mut(category).push(OpenOp {
                line: line_no,
                timestamp_micros,
            });
            return Ok(None);
        }

        if !event.has_args {
            return Err(ParseError::MissingField {
                line: line_no,
                field: "args",
            }
            .into());
        }
        self.complete(category, line_no, timestamp_micros, range, event.size)
    }

    /// Close the innermost open operation of `category`
    ///
    /// **Private** - end-event handling for process_event
    fn complete(
        &mut self,
        category: Category,
        line_no: usize,
        timestamp_micros: i64,
        range: TimeRange,
        size: Option<i64>,
    ) -> Result<Option<CompletedOp>, LineageError> {
        let start = self
            .stack_mut(category)
            .pop()
            .ok_or(LineageError::UnmatchedEndEvent {
                line: line_no,
                category: category.as_str(),
            })?;
        let duration_micros = timestamp_micros
            .checked_sub(start.timestamp_micros)
            .ok_or(LineageError::InvalidDuration {
                line: line_no,
                begin: start.timestamp_micros,
                end: timestamp_micros,
            })?;

        if size.is_none() {
            self.stats.unsized_ops += 1;
            if self.policy == MissingSizePolicy::Drop {
                debug!("line {}: {} has no size, dropping", line_no, category);
                return Ok(None);
            }
        }

        let id = match category {
            Category::Flush => {
                self.stats.flushes += 1;
                OpId::Flush(self.state.assign_flush(range.begin_millis))
            }
            Category::Merge => {
                let begin = self.resolve(line_no, range.begin_millis)?;
                let end = self.resolve(line_no, range.end_millis)?;
                self.stats.merges += 1;
                OpId::Merge { begin, end }
            }
        };

        Ok(Some(CompletedOp {
            id,
            duration_micros,
            size_bytes: size,
        }))
    }

    fn resolve(&self, line_no: usize, millis: i64) -> Result<u64, LineageError> {
        self.state
            .resolve(millis)
            .ok_or(LineageError::UnresolvedTimeReference {
                line: line_no,
                timestamp: millis,
            })
    }

    fn stack_mut(&mut self, category: Category) -> &mut Vec<OpenOp> {
        match category {
            Category::Flush => &mut self.flush_starts,
            Category::Merge => &mut self.merge_starts,
        }
    }

    /// End the pass, checking that no operation was left open
    ///
    /// **Public** - must be called once the stream is exhausted
    ///
    /// # Errors
    /// * `LineageError::UnterminatedOperation` - A begin event never ended
    pub fn finish(self) -> Result<LineageStats, LineageError> {
        for (category, stack) in [
            (Category::Flush, &self.flush_starts),
            (Category::Merge, &self.merge_starts),
        ] {
            if let Some(first) = stack.first() {
                return Err(LineageError::UnterminatedOperation {
                    category: category.as_str(),
                    open: stack.len(),
                    first_line: first.line,
                });
            }
        }
        Ok(self.stats)
    }
}

/// Run a full correlation pass over a reader
///
/// **Public** - main entry point for lineage computation
///
/// # Arguments
/// * `reader` - Events of a single maintenance thread, one per line
/// * `policy` - Handling of operations without a size
///
/// # Returns
/// Completed operations in completion order, with pass statistics
///
/// # Errors
/// * `LineageError::Parse` - Missing required fields or bad component names
/// * `LineageError::UnmatchedEndEvent` - End event with an empty stack
/// * `LineageError::UnresolvedTimeReference` - Merge over unseen flushes
/// * `LineageError::UnterminatedOperation` - Begin events left open
pub fn compute_lineage<R: BufRead>(
    reader: R,
    policy: MissingSizePolicy,
) -> Result<Lineage, LineageError> {
    let mut builder = LineageBuilder::new(policy);
    let mut ops = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(op) = builder.process_line(index + 1, &line)? {
            ops.push(op);
        }
    }

    let stats = builder.finish()?;
    debug!("Lineage pass: {}", stats.summary());

    Ok(Lineage { ops, stats })
}
