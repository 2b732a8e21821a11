use crate::engine::{
    self, Atom, EvalFlags, EvalMetrics, Evaluation, Evaluator, ExprArena, NodeId, Parsed, Parser, Span,
    Weighting,
};
use crate::{AtomProvider, ParseError};
use std::fmt;
use std::time::Instant;

/// Default cap on tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options that affect how an expression is built and combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Evaluate cheaper operands of `&`/`|` first, based on atom priorities.
    pub reorder: bool,
    /// Maximum tree depth accepted by the parser.
    pub max_depth: usize,
    /// Combination rules used with [`EvalFlags::WEIGHTED`].
    pub weighting: Weighting,
}

impl Default for Options {
    fn default() -> Self {
        Self { reorder: true, max_depth: DEFAULT_MAX_DEPTH, weighting: Weighting::default() }
    }
}

/// A compiled rule expression.
///
/// The tree, its atoms and a copy of the source text live in one arena owned
/// by the expression; dropping the expression releases all of it. Evaluation
/// takes `&self` and never mutates the tree, so a single expression can be
/// shared between threads whenever the provider allows it.
///
/// # Example
/// ```
/// use atomexpr::{AtomError, EvalFlags, Expression, FnProvider, parse_word};
///
/// let provider = FnProvider::new(parse_word, |atom: &str, hits: &Vec<String>| {
///     Ok(if hits.iter().any(|h| h == atom) { 1.0 } else { 0.0 })
/// });
/// let expr = Expression::parse("A & B | !C", provider).unwrap();
///
/// let hits = vec!["C".to_string()];
/// let (value, trace) = expr.evaluate_traced(&hits, EvalFlags::empty());
/// assert_eq!(value, 0.0);
/// assert_eq!(trace, vec!["A", "C"]);
/// assert_eq!(expr.to_string(), "A & B | !C");
/// ```
pub struct Expression<P: AtomProvider> {
    arena: ExprArena<P::Data>,
    root: NodeId,
    source: Span,
    consumed: usize,
    depth: usize,
    swaps: usize,
    weighting: Weighting,
    provider: P,
}

impl<P: AtomProvider> Expression<P> {
    /// Parse `text` with default [`Options`].
    pub fn parse(text: &str, provider: P) -> Result<Self, ParseError> {
        Self::parse_with(text, provider, &Options::default())
    }

    /// Parse `text`, then plan the evaluation order when `options.reorder`
    /// is set.
    pub fn parse_with(text: &str, provider: P, options: &Options) -> Result<Self, ParseError> {
        let Parsed { mut arena, root, source, depth, consumed } =
            Parser::new(text, &provider, options.max_depth).parse()?;

        let swaps = if options.reorder { engine::plan(&mut arena, root) } else { 0 };

        tracing::debug!(expression = text, atoms = arena.atom_count(), depth, swaps, "expression built");

        Ok(Expression { arena, root, source, consumed, depth, swaps, weighting: options.weighting, provider })
    }

    /// Evaluate against `context`.
    pub fn evaluate(&self, context: &P::Context, flags: EvalFlags) -> f64 {
        self.evaluator(context, flags).run(self.root).value
    }

    /// Evaluate against `context` and return the texts of the atoms whose
    /// callbacks ran, in invocation order.
    pub fn evaluate_traced(&self, context: &P::Context, flags: EvalFlags) -> (f64, Vec<&str>) {
        let outcome = self.evaluator(context, flags).traced().run(self.root);
        let trace = outcome.trace.iter().map(|&id| self.arena.atom(id).text()).collect();
        (outcome.value, trace)
    }

    /// Evaluate with tracing and timing.
    pub fn evaluate_verbose(&self, context: &P::Context, flags: EvalFlags) -> Evaluation<'_, P::Data> {
        let start = Instant::now();
        let outcome = self.evaluator(context, flags).traced().run(self.root);
        let elapsed = start.elapsed();

        Evaluation {
            value: outcome.value,
            trace: outcome.trace.iter().map(|&id| self.arena.atom(id)).collect(),
            metrics: EvalMetrics {
                elapsed,
                invoked: outcome.invoked,
                skipped: self.arena.atom_count() - outcome.invoked,
                failed: outcome.failed,
            },
        }
    }

    fn evaluator<'e>(&'e self, context: &'e P::Context, flags: EvalFlags) -> Evaluator<'e, P> {
        Evaluator::new(&self.arena, &self.provider, context, flags, self.weighting)
    }

    /// Call `visitor` once per atom, in textual order, without evaluating.
    pub fn foreach_atom<'e, F>(&'e self, mut visitor: F)
    where
        F: FnMut(Atom<'e, P::Data>),
    {
        for atom in self.arena.atoms() {
            visitor(atom);
        }
    }

    /// All atoms in textual order.
    pub fn atoms(&self) -> impl ExactSizeIterator<Item = Atom<'_, P::Data>> + '_ {
        self.arena.atoms()
    }

    /// Atom texts in textual order.
    pub fn atom_texts(&self) -> Vec<&str> {
        self.arena.atoms().map(|atom| atom.text()).collect()
    }

    pub fn atom_count(&self) -> usize {
        self.arena.atom_count()
    }

    /// Depth of the tree (a single atom has depth 1).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of operators whose operands the planner reordered.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// The text this expression was parsed from.
    pub fn source(&self) -> &str {
        self.arena.str(self.source)
    }

    /// Bytes of the source consumed by the parser (always the whole source).
    pub fn source_len(&self) -> usize {
        self.consumed
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn arena(&self) -> &ExprArena<P::Data> {
        &self.arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl<P: AtomProvider> fmt::Display for Expression<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        engine::write_node(&self.arena, self.root, f)
    }
}

impl<P: AtomProvider> fmt::Debug for Expression<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source())
            .field("atoms", &self.atom_count())
            .field("depth", &self.depth)
            .field("swaps", &self.swaps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AtomError, FnProvider, parse_word};

    fn lookup(atom: &str, values: &Vec<(String, f64)>) -> Result<f64, AtomError> {
        values
            .iter()
            .find(|(name, _)| name == atom)
            .map(|(_, v)| *v)
            .ok_or_else(|| AtomError::new(format!("unknown atom {atom}")))
    }

    fn values(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn parse_with_exposes_metadata() {
        let expr = Expression::parse("  A && (B || !C)  ", FnProvider::new(parse_word, lookup)).unwrap();

        assert_eq!(expr.source(), "  A && (B || !C)  ");
        assert_eq!(expr.source_len(), 18);
        assert_eq!(expr.atom_count(), 3);
        assert_eq!(expr.depth(), 5);
        assert_eq!(expr.to_string(), "A & (B | !C)");
        assert_eq!(expr.atom_texts(), vec!["A", "B", "C"]);
        assert_eq!(format!("{expr:?}"), "Expression { source: \"  A && (B || !C)  \", atoms: 3, depth: 5, swaps: 0 }");
    }

    #[test]
    fn reorder_can_be_disabled() {
        let provider = || {
            FnProvider::new(parse_word, lookup).with_priority(|atom: &str| if atom == "CHEAP" { 0 } else { 10 })
        };
        let ctx = values(&[("SLOW", 0.0), ("CHEAP", 0.0)]);

        let planned = Expression::parse("SLOW & CHEAP", provider()).unwrap();
        assert_eq!(planned.swaps(), 1);
        assert_eq!(planned.evaluate_traced(&ctx, EvalFlags::empty()).1, vec!["CHEAP"]);

        let options = Options { reorder: false, ..Options::default() };
        let textual = Expression::parse_with("SLOW & CHEAP", provider(), &options).unwrap();
        assert_eq!(textual.swaps(), 0);
        assert_eq!(textual.evaluate_traced(&ctx, EvalFlags::empty()).1, vec!["SLOW"]);
    }

    #[test]
    fn verbose_evaluation_reports_metrics() {
        let expr = Expression::parse("A & MISSING | B & C", FnProvider::new(parse_word, lookup)).unwrap();
        let ctx = values(&[("A", 1.0), ("B", 0.0), ("C", 1.0)]);

        let run = expr.evaluate_verbose(&ctx, EvalFlags::empty());
        assert_eq!(run.value, 0.0);
        assert_eq!(run.trace_texts(), vec!["A", "MISSING", "B"]);
        assert_eq!(run.metrics.invoked, 3);
        assert_eq!(run.metrics.failed, 1);
        assert_eq!(run.metrics.skipped, 1);

        let all = expr.evaluate_verbose(&ctx, EvalFlags::NO_SHORTCIRCUIT);
        assert_eq!(all.metrics.invoked, 4);
        assert_eq!(all.metrics.skipped, 0);
    }
}
