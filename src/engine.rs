//! Expression engine.
//!
//! Building and evaluating an expression is a short pipeline:
//!
//! ```text
//! text ── Parser::parse (parser.rs) ──────────────┐
//!          - operator lexing (lexer.rs)           │
//!          - atom spans from the AtomProvider     │
//!          - nodes + atom text into ExprArena     │
//!            (arena.rs)                           v
//!                                       plan (planner.rs)
//!                                         - cheap operands first
//!                                                 │
//!                     ┌───────────────────────────┤
//!                     v                           v
//!        Evaluator::run (eval.rs)          write_node (render.rs)
//!          - short-circuit walk              - canonical text
//!          - optional trace
//!                     │
//!                     v
//!          value / Evaluation (metrics.rs)
//! ```
//!
//! Parsing and planning happen once per rule; evaluation happens once per
//! message and never mutates the tree.
//!
//! ## Responsibilities by module
//!
//! - `arena.rs`: index-based node and atom storage with a shared string
//!   buffer; one arena per expression.
//! - `lexer.rs`: recognizes operator characters, reports atom starts.
//! - `parser.rs`: recursive-descent grammar, error reporting, depth limit.
//! - `planner.rs`: priority-driven operand ordering for `&` and `|`.
//! - `eval.rs`: boolean and weighted evaluation, flags, tracing.
//! - `render.rs`: tree to canonical text.
//! - `metrics.rs`: per-evaluation counters and the verbose result type.
//!
//! ## Logging
//!
//! The engine logs through `tracing`: `debug` when an expression is built,
//! `trace` per atom invocation, `warn` when an atom callback fails.

#[path = "engine/arena.rs"]
mod arena;
#[path = "engine/eval.rs"]
mod eval;
#[path = "engine/lexer.rs"]
mod lexer;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/planner.rs"]
mod planner;
#[path = "engine/render.rs"]
mod render;

pub use arena::{Atom, AtomId, Binary, ExprArena, Node, NodeId};
pub use eval::{AndRule, EvalFlags, OrRule, Weighting};
pub use metrics::{EvalMetrics, Evaluation};

pub(crate) use arena::Span;
pub(crate) use eval::Evaluator;
pub(crate) use parser::{Parsed, Parser};
pub(crate) use planner::plan;
pub(crate) use render::write_node;
