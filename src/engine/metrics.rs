//! Evaluation metrics.
//!
//! The plain [`Expression::evaluate`](crate::Expression::evaluate) path only
//! produces a number. [`Expression::evaluate_verbose`](crate::Expression::evaluate_verbose)
//! additionally returns the trace and the counters below, which is what rule
//! debugging and profiling need.
//!
//! Metrics are opt-in: the hot path does not time anything or allocate a
//! trace.

use super::arena::Atom;
use std::time::Duration;

/// Counters for one evaluation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvalMetrics {
    /// Wall time spent in the walk, atom callbacks included.
    pub elapsed: Duration,
    /// Atoms whose callback was invoked.
    pub invoked: usize,
    /// Atoms never invoked because an operator short-circuited.
    pub skipped: usize,
    /// Invoked atoms whose callback failed (counted as `0`).
    pub failed: usize,
}

/// Result of [`Expression::evaluate_verbose`](crate::Expression::evaluate_verbose).
#[derive(Debug, Clone)]
pub struct Evaluation<'e, D = ()> {
    pub value: f64,
    /// Atoms in the order they were invoked.
    pub trace: Vec<Atom<'e, D>>,
    pub metrics: EvalMetrics,
}

impl<'e, D> Evaluation<'e, D> {
    /// Texts of the traced atoms, in invocation order.
    pub fn trace_texts(&self) -> Vec<&'e str> {
        self.trace.iter().map(|atom| atom.text()).collect()
    }
}
