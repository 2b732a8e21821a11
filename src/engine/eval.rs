//! Tree evaluation.
//!
//! The evaluator walks a built tree against one context and turns it into a
//! number. Atoms are resolved through [`AtomProvider::process_atom`]; operators
//! combine their operands according to the selected mode:
//!
//! ```text
//!            boolean (default)            weighted (EvalFlags::WEIGHTED)
//! !x         x == 0 ? 1 : 0               -x
//! x & y      x != 0 && y != 0 ? 1 : 0     x == 0 ? 0 : Weighting::and (min magnitude)
//! x | y      x != 0 || y != 0 ? 1 : 0     x != 0 ? x : Weighting::or  (sum)
//! (x)        x                            x
//! ```
//!
//! Operands run in the order chosen by the planner. A zero first operand
//! decides `&` (result `0`) and a nonzero one decides `|` (result `1`, or the
//! operand itself in weighted mode); the second operand is then skipped.
//! `EvalFlags::NO_SHORTCIRCUIT` still runs it but never lets it change the
//! result.
//!
//! A failing atom callback never aborts the walk: the atom counts as `0`, the
//! failure is logged and counted, and evaluation carries on.

use super::arena::{AtomId, Binary, ExprArena, Node, NodeId};
use crate::AtomProvider;

bitflags::bitflags! {
    /// Per-evaluation switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EvalFlags: u32 {
        /// Combine operand magnitudes instead of booleanizing them.
        const WEIGHTED        = 1 << 0;
        /// Evaluate every atom, even when the result is already known.
        const NO_SHORTCIRCUIT = 1 << 1;
    }
}

/// How `&` combines operands in weighted mode once the first one is nonzero.
///
/// A zero first operand always decides `&` as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AndRule {
    /// The operand with the smaller absolute value; the smaller value on ties.
    #[default]
    MinMagnitude,
    /// The smaller operand.
    Min,
    /// The product of both operands.
    Product,
}

impl AndRule {
    pub fn combine(self, a: f64, b: f64) -> f64 {
        match self {
            AndRule::MinMagnitude => {
                if a.abs() < b.abs() {
                    a
                } else if b.abs() < a.abs() {
                    b
                } else {
                    a.min(b)
                }
            }
            AndRule::Min => a.min(b),
            AndRule::Product => a * b,
        }
    }
}

/// How `|` combines operands in weighted mode once the first one is zero.
///
/// A nonzero first operand always decides `|` and is returned as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrRule {
    /// Accumulate both operands.
    #[default]
    Sum,
    /// The larger operand.
    Max,
}

impl OrRule {
    /// Combine operands given in evaluation order.
    pub fn combine(self, first: f64, second: f64) -> f64 {
        match self {
            OrRule::Sum => first + second,
            OrRule::Max => first.max(second),
        }
    }
}

/// Weighted-mode combination rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Weighting {
    pub and: AndRule,
    pub or: OrRule,
}

/// Raw result of one evaluation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Outcome {
    pub value: f64,
    /// Atoms in invocation order (only filled when tracing).
    pub trace: Vec<AtomId>,
    pub invoked: usize,
    pub failed: usize,
}

pub(crate) struct Evaluator<'e, P: AtomProvider + ?Sized> {
    arena: &'e ExprArena<P::Data>,
    provider: &'e P,
    context: &'e P::Context,
    weighted: bool,
    short_circuit: bool,
    weighting: Weighting,
    tracing: bool,
    outcome: Outcome,
}

impl<'e, P: AtomProvider + ?Sized> Evaluator<'e, P> {
    pub fn new(
        arena: &'e ExprArena<P::Data>,
        provider: &'e P,
        context: &'e P::Context,
        flags: EvalFlags,
        weighting: Weighting,
    ) -> Self {
        Evaluator {
            arena,
            provider,
            context,
            weighted: flags.contains(EvalFlags::WEIGHTED),
            short_circuit: !flags.contains(EvalFlags::NO_SHORTCIRCUIT),
            weighting,
            tracing: false,
            outcome: Outcome::default(),
        }
    }

    /// Record invoked atoms.
    pub fn traced(mut self) -> Self {
        self.tracing = true;
        self
    }

    pub fn run(mut self, root: NodeId) -> Outcome {
        self.outcome.value = self.eval(root);
        self.outcome
    }

    fn eval(&mut self, id: NodeId) -> f64 {
        match *self.arena.node(id) {
            Node::Atom(atom) => self.eval_atom(atom),
            Node::Not(child) => {
                let value = self.eval(child);
                if !self.weighted {
                    truth(value == 0.0)
                } else if value == 0.0 {
                    0.0
                } else {
                    -value
                }
            }
            Node::Group(child) => self.eval(child),
            Node::And(bin) => self.eval_and(bin),
            Node::Or(bin) => self.eval_or(bin),
        }
    }

    fn eval_and(&mut self, bin: Binary) -> f64 {
        let (first, second) = bin.ordered();
        let a = self.eval(first);
        if a == 0.0 && bin.short_circuit {
            self.skip(second);
            return 0.0;
        }
        let b = self.eval(second);
        if self.weighted { self.weighting.and.combine(a, b) } else { truth(a != 0.0 && b != 0.0) }
    }

    fn eval_or(&mut self, bin: Binary) -> f64 {
        let (first, second) = bin.ordered();
        let a = self.eval(first);
        if a != 0.0 && bin.short_circuit {
            self.skip(second);
            return if self.weighted { a } else { 1.0 };
        }
        let b = self.eval(second);
        if self.weighted { self.weighting.or.combine(a, b) } else { truth(a != 0.0 || b != 0.0) }
    }

    /// An operand whose value cannot change the result. It only runs under
    /// `NO_SHORTCIRCUIT`, and its value is discarded.
    fn skip(&mut self, id: NodeId) {
        if !self.short_circuit {
            self.eval(id);
        }
    }

    fn eval_atom(&mut self, id: AtomId) -> f64 {
        let arena = self.arena;
        let atom = arena.atom(id);

        let value = match self.provider.process_atom(atom, self.context) {
            Ok(value) if value.is_nan() => {
                tracing::warn!(atom = atom.text(), "atom returned NaN; counting it as 0");
                self.outcome.failed += 1;
                0.0
            }
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(atom = atom.text(), error = %err, "atom callback failed; counting it as 0");
                self.outcome.failed += 1;
                0.0
            }
        };

        self.outcome.invoked += 1;
        if self.tracing {
            self.outcome.trace.push(id);
        }
        tracing::trace!(atom = atom.text(), value, "atom processed");

        value
    }
}

fn truth(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}
