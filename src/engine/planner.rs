//! Build-time evaluation planning.
//!
//! After parsing, the planner walks the tree once and decides, for every
//! `And`/`Or` node, which operand runs first. Cheap operands go first so that
//! they get the chance to short-circuit expensive ones.
//!
//! ```text
//! (A & B) | C        priorities: A=5 B=5 C=0
//!
//!     Or  cost 10 vs 0 -> swapped, C runs first
//!    /  \
//! Group   C
//!   |
//!  And    cost 5 vs 5 -> tie, textual order kept
//!  / \
//! A   B
//! ```
//!
//! ## Invariants
//!
//! - The cost of a subtree is the saturating sum of its atoms' priorities.
//! - An operand is promoted only when its cost is strictly lower, so ties keep
//!   textual order and the plan is deterministic for the same priorities.
//! - Only the `swapped` flag changes; tree shape, rendering and atom order are
//!   untouched.

use super::arena::{ExprArena, Node, NodeId};

/// Mark `swapped` on binary nodes whose right operand is cheaper. Returns the
/// number of swapped nodes.
pub(crate) fn plan<D>(arena: &mut ExprArena<D>, root: NodeId) -> usize {
    let mut swaps = 0;
    cost(arena, root, &mut swaps);
    swaps
}

fn cost<D>(arena: &mut ExprArena<D>, id: NodeId, swaps: &mut usize) -> i64 {
    match *arena.node(id) {
        Node::Atom(atom) => i64::from(arena.atom(atom).priority()),
        Node::Not(child) | Node::Group(child) => cost(arena, child, swaps),
        Node::And(bin) | Node::Or(bin) => {
            let lhs = cost(arena, bin.lhs, swaps);
            let rhs = cost(arena, bin.rhs, swaps);
            if rhs < lhs {
                if let Node::And(b) | Node::Or(b) = arena.node_mut(id) {
                    b.swapped = true;
                }
                *swaps += 1;
            }
            lhs.saturating_add(rhs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arena::Binary;

    fn atom(arena: &mut ExprArena<()>, name: &str, priority: i32) -> NodeId {
        let id = arena.alloc_atom(name, name, 0, priority, ());
        arena.alloc_node(Node::Atom(id))
    }

    fn swapped(arena: &ExprArena<()>, id: NodeId) -> bool {
        match arena.node(id) {
            Node::And(b) | Node::Or(b) => b.swapped,
            _ => false,
        }
    }

    #[test]
    fn cheaper_operand_is_promoted() {
        let mut arena = ExprArena::new();
        let a = atom(&mut arena, "A", 5);
        let b = atom(&mut arena, "B", 5);
        let and = arena.alloc_node(Node::And(Binary::new(a, b)));
        let group = arena.alloc_node(Node::Group(and));
        let c = atom(&mut arena, "C", 0);
        let or = arena.alloc_node(Node::Or(Binary::new(group, c)));

        assert_eq!(plan(&mut arena, or), 1);
        assert!(swapped(&arena, or));
        assert!(!swapped(&arena, and));
    }

    #[test]
    fn ties_and_default_priorities_keep_textual_order() {
        let mut arena = ExprArena::new();
        let a = atom(&mut arena, "A", 0);
        let b = atom(&mut arena, "B", 0);
        let not_b = arena.alloc_node(Node::Not(b));
        let and = arena.alloc_node(Node::And(Binary::new(a, not_b)));

        assert_eq!(plan(&mut arena, and), 0);
        assert!(!swapped(&arena, and));
    }

    #[test]
    fn extreme_priorities_saturate() {
        let mut arena = ExprArena::new();
        let a = atom(&mut arena, "A", i32::MAX);
        let b = atom(&mut arena, "B", i32::MAX);
        let c = atom(&mut arena, "C", i32::MIN);
        let ab = arena.alloc_node(Node::Or(Binary::new(a, b)));
        let root = arena.alloc_node(Node::And(Binary::new(ab, c)));

        assert_eq!(plan(&mut arena, root), 1);
        assert!(swapped(&arena, root));
    }
}
