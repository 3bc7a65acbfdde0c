//! Lineage computation: from raw begin/end events to completed operations.

pub mod correlator;
pub mod schema;

// Re-export main types and functions
pub use correlator::{compute_lineage, Lineage, LineageBuilder, LineageState, MissingSizePolicy};
pub use schema::{CompletedOp, LineageRecord, LineageStats, OpId, OpKind};
