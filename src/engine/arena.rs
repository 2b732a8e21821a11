//! Arena storage for expression trees.
//!
//! Every node, every atom and every byte of atom text belonging to one
//! expression lives in a single [`ExprArena`]. Nodes refer to each other by
//! index ([`NodeId`], [`AtomId`]), never by pointer, so the tree cannot
//! contain shared subtrees or cycles and is released in one go when the arena
//! is dropped.
//!
//! ```text
//! "A & !B"
//!
//! nodes:   [0] Atom(a0)  [1] Atom(a1)  [2] Not(1)  [3] And(0, 2)
//! atoms:   a0 -> text 0..1   a1 -> text 1..2
//! strings: "A & !B" "A" "B"    (source first, then atom texts)
//! ```
//!
//! ## Invariants
//!
//! - Ids handed out by an arena are only ever resolved against that arena.
//! - Atoms are appended in the order the parser meets them, which is textual
//!   left-to-right order.

use std::fmt;

/// Index of a node inside its [`ExprArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Index of an atom inside its [`ExprArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl AtomId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl fmt::Debug for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.0)
    }
}

/// Byte range into the arena string buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

/// Operands of an `And`/`Or` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binary {
    pub lhs: NodeId,
    pub rhs: NodeId,
    /// Whether the operator may skip its second operand once the first one
    /// decides the result.
    pub short_circuit: bool,
    /// Set by the planner: evaluate `rhs` before `lhs`.
    pub swapped: bool,
}

impl Binary {
    pub(crate) fn new(lhs: NodeId, rhs: NodeId) -> Self {
        Self { lhs, rhs, short_circuit: true, swapped: false }
    }

    /// Operands in evaluation order.
    pub fn ordered(&self) -> (NodeId, NodeId) {
        if self.swapped { (self.rhs, self.lhs) } else { (self.lhs, self.rhs) }
    }
}

/// A node of the expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Atom(AtomId),
    Not(NodeId),
    And(Binary),
    Or(Binary),
    /// Parenthesized subtree. Transparent for evaluation, kept for rendering.
    Group(NodeId),
}

#[derive(Debug)]
struct AtomSlot<D> {
    text: Span,
    source: Span,
    offset: usize,
    priority: i32,
    data: D,
}

/// Read-only view of an atom stored in an arena.
pub struct Atom<'e, D = ()> {
    text: &'e str,
    source: &'e str,
    offset: usize,
    priority: i32,
    data: &'e D,
    index: usize,
}

impl<D> Clone for Atom<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Atom<'_, D> {}

impl<'e, D> Atom<'e, D> {
    /// Atom text as returned by the provider.
    pub fn text(&self) -> &'e str {
        self.text
    }

    /// The exact span of the expression the provider claimed for this atom.
    pub fn source(&self) -> &'e str {
        self.source
    }

    /// Byte offset of [`Atom::source`] in the expression text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// User data returned by the provider when the atom was parsed.
    pub fn data(&self) -> &'e D {
        self.data
    }

    /// Position of the atom in textual order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<D> fmt::Debug for Atom<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("text", &self.text)
            .field("offset", &self.offset)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Bulk storage for one expression tree.
#[derive(Debug)]
pub struct ExprArena<D> {
    nodes: Vec<Node>,
    atoms: Vec<AtomSlot<D>>,
    strings: String,
}

impl<D> Default for ExprArena<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> ExprArena<D> {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), atoms: Vec::new(), strings: String::new() }
    }

    /// Pre-size the arena for an expression of `source_len` bytes.
    ///
    /// Every atom consumes at least one byte, so the byte length bounds the
    /// atom count; text is stored twice at most (source copy plus atom text).
    pub fn with_capacity(source_len: usize) -> Self {
        let atoms = source_len / 2 + 1;
        Self {
            nodes: Vec::with_capacity(atoms * 2),
            atoms: Vec::with_capacity(atoms),
            strings: String::with_capacity(source_len * 2),
        }
    }

    pub(crate) fn alloc_str(&mut self, s: &str) -> Span {
        let start = self.strings.len();
        self.strings.push_str(s);
        Span { start, end: self.strings.len() }
    }

    pub(crate) fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn alloc_atom(&mut self, text: &str, source: &str, offset: usize, priority: i32, data: D) -> AtomId {
        let text = self.alloc_str(text);
        let source = self.alloc_str(source);
        let id = AtomId(self.atoms.len());
        self.atoms.push(AtomSlot { text, source, offset, priority, data });
        id
    }

    pub(crate) fn str(&self, span: Span) -> &str {
        &self.strings[span.start..span.end]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn atom(&self, id: AtomId) -> Atom<'_, D> {
        let slot = &self.atoms[id.0];
        Atom {
            text: self.str(slot.text),
            source: self.str(slot.source),
            offset: slot.offset,
            priority: slot.priority,
            data: &slot.data,
            index: id.0,
        }
    }

    /// All atoms in textual order.
    pub fn atoms(&self) -> impl ExactSizeIterator<Item = Atom<'_, D>> + '_ {
        (0..self.atoms.len()).map(move |i| self.atom(AtomId(i)))
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_keep_allocation_order_and_text() {
        let mut arena: ExprArena<u8> = ExprArena::with_capacity(8);
        let a = arena.alloc_atom("A", "A", 0, 3, 7);
        let b = arena.alloc_atom("b c", "\"b c\"", 4, -1, 9);
        let na = arena.alloc_node(Node::Atom(a));
        let nb = arena.alloc_node(Node::Atom(b));
        let root = arena.alloc_node(Node::And(Binary::new(na, nb)));

        assert_eq!(arena.atom_count(), 2);
        assert_eq!(arena.node_count(), 3);

        let texts: Vec<&str> = arena.atoms().map(|atom| atom.text()).collect();
        assert_eq!(texts, vec!["A", "b c"]);

        let second = arena.atom(b);
        assert_eq!(second.source(), "\"b c\"");
        assert_eq!(second.offset(), 4);
        assert_eq!(second.priority(), -1);
        assert_eq!(*second.data(), 9);
        assert_eq!(second.index(), 1);

        match arena.node(root) {
            Node::And(bin) => assert_eq!(bin.ordered(), (na, nb)),
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn swapped_binary_reverses_evaluation_order() {
        let lhs = NodeId(0);
        let rhs = NodeId(1);
        let mut bin = Binary::new(lhs, rhs);
        bin.swapped = true;
        assert_eq!(bin.ordered(), (rhs, lhs));
    }
}
