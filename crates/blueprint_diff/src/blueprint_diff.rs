//! Blueprint Diff - Structural comparison of blueprint documents
//!
//! Compares two versions of a blueprint asset by keyed-set reconciliation
//! over its collections (variables, functions, components, graphs,
//! interfaces) and produces a change report: counts plus the ordered list
//! of change lines. Never mutates its inputs; never emits a partial diff
//! when an input cannot be read.

mod diff;
mod report;

pub use diff::{diff_json, diff_values, DiffError};
pub use report::{ChangeKind, DiffDetails, DiffFailure, DiffLine, DiffOutcome, DiffReport};
