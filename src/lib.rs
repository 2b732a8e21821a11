//! Boolean rule expressions over host-defined atoms.
//!
//! An expression such as `R_SPF_ALLOW & !(BAYES_SPAM | header_exists(X-Spam))`
//! combines *atoms* with `!` (not), `&` (and), `|` (or) and parentheses. The
//! crate owns the grammar; what an atom looks like and what it evaluates to is
//! decided by the host through an [`AtomProvider`].
//!
//! ```
//! use atomexpr::{AtomError, EvalFlags, Expression, FnProvider, parse_word};
//! use std::collections::HashMap;
//!
//! let provider = FnProvider::new(parse_word, |atom: &str, msg: &HashMap<String, f64>| {
//!     Ok(msg.get(atom).copied().unwrap_or(0.0))
//! });
//! let expr = Expression::parse("A & (B || !C)", provider)?;
//!
//! let msg = HashMap::from([("A".to_string(), 1.0), ("C".to_string(), 1.0)]);
//! let (value, trace) = expr.evaluate_traced(&msg, EvalFlags::empty());
//! assert_eq!(value, 0.0);
//! assert_eq!(trace, vec!["A", "B", "C"]);
//! assert_eq!(expr.to_string(), "A & (B | !C)");
//! # Ok::<(), atomexpr::ParseError>(())
//! ```
//!
//! Expressions are parsed once and evaluated many times. Evaluation never
//! mutates the tree; atom failures during evaluation count as `0` and are
//! reported through `tracing`.

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod provider;
mod rules;

pub use api::{DEFAULT_MAX_DEPTH, Expression, Options};
pub use engine::{
    AndRule, Atom, AtomId, Binary, EvalFlags, EvalMetrics, Evaluation, ExprArena, Node, NodeId, OrRule, Weighting,
};
pub use error::{AtomError, EvalError, ParseError, Side};
pub use provider::{AtomProvider, FnProvider, ParsedAtom, WithPriority, parse_word};
pub use rules::{RuleScore, RuleSet};
