//! Canonical rendering (tree to text).
//!
//! The output is semantically equivalent to the parsed text but normalized:
//!
//! - atoms render as the exact span the provider claimed,
//! - `&&`/`||` become `&`/`|`, with one space on each side,
//! - groups keep their parentheses, with no inner padding,
//! - `!` is written directly before its operand.
//!
//! Parentheses only come from `Group` nodes. A parsed tree never needs extra
//! ones: an `Or` can only sit below an `And` or a `Not` through a group.
//! Rendering follows textual order and ignores the planner's swaps.

use super::arena::{ExprArena, Node, NodeId};
use std::fmt;

pub(crate) fn write_node<D, W: fmt::Write>(arena: &ExprArena<D>, id: NodeId, out: &mut W) -> fmt::Result {
    match *arena.node(id) {
        Node::Atom(atom) => out.write_str(arena.atom(atom).source()),
        Node::Not(child) => {
            out.write_char('!')?;
            write_node(arena, child, out)
        }
        Node::Group(child) => {
            out.write_char('(')?;
            write_node(arena, child, out)?;
            out.write_char(')')
        }
        Node::And(bin) => {
            write_node(arena, bin.lhs, out)?;
            out.write_str(" & ")?;
            write_node(arena, bin.rhs, out)
        }
        Node::Or(bin) => {
            write_node(arena, bin.lhs, out)?;
            out.write_str(" | ")?;
            write_node(arena, bin.rhs, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::Binary;

    #[test]
    fn renders_groups_and_operators() {
        let mut arena: ExprArena<()> = ExprArena::new();
        fn leaf(arena: &mut ExprArena<()>, text: &str) -> NodeId {
            let atom = arena.alloc_atom(text, text, 0, 0, ());
            arena.alloc_node(Node::Atom(atom))
        }

        let a = leaf(&mut arena, "A");
        let b = leaf(&mut arena, "B");
        let c = leaf(&mut arena, "C");
        let not_b = arena.alloc_node(Node::Not(b));
        let or = arena.alloc_node(Node::Or(Binary::new(not_b, c)));
        let group = arena.alloc_node(Node::Group(or));
        let mut and = Binary::new(a, group);
        and.swapped = true;
        let root = arena.alloc_node(Node::And(and));

        let mut out = String::new();
        write_node(&arena, root, &mut out).unwrap();
        assert_eq!(out, "A & (!B | C)");
    }
}
