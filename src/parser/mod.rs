//! Trace log decoding.
//!
//! This module handles:
//! - Decoding raw JSON event lines
//! - Extracting component time ranges from event names
//! - Finding and extracting per-thread event streams

pub mod event;
pub mod threads;
pub mod time_range;

// Re-export main types
pub use event::{decode_line, Category, LineOutcome, Phase, RawEvent};
pub use threads::{extract_threads, find_threads, ExtractStats, ThreadKey};
pub use time_range::{decode_time_range, TimeRange};
