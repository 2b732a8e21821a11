//! Recursive-descent expression parser.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! Or      := And ('|' And)*
//! And     := Unary ('&' Unary)*
//! Unary   := '!' Unary | Primary
//! Primary := '(' Or ')' | Atom
//! ```
//!
//! The parser never looks inside atoms. When the lexer reports an atom start,
//! the remaining input goes to [`AtomProvider::parse_atom`], which returns the
//! span it claims; the parser checks that span, copies the atom into the arena
//! and moves on.
//!
//! ## Error reporting
//!
//! Missing operands are detected where an operand is expected. The parser
//! tracks *why* it expects one ([`Expect`]) so the error can name the operator
//! that is short of an operand, or the group that is empty or unclosed.
//!
//! ## Depth
//!
//! `Not` and `Group` recurse and each add one level. A chain such as
//! `A | B | C | D` is read iteratively and stored as a balanced subtree, so its
//! length adds only a logarithmic number of levels: a rule made of hundreds
//! of alternatives stays shallow. The resulting tree depth is capped by
//! `max_depth`, which bounds every later recursive walk (planner, evaluator,
//! renderer).

use super::arena::{Binary, ExprArena, Node, NodeId, Span};
use super::lexer::{Cursor, Lexeme, Tok};
use crate::error::{ParseError, Side};
use crate::{AtomError, AtomProvider};

/// Why the parser is looking for an operand.
#[derive(Debug, Clone, Copy)]
enum Expect {
    /// Start of the whole expression.
    Start,
    /// Right after `(` at this offset.
    Group(usize),
    /// Right after a binary or unary operator.
    Operand(Lexeme),
}

/// A subtree and its depth.
#[derive(Debug, Clone, Copy)]
struct Built {
    id: NodeId,
    depth: usize,
}

/// Output of a successful parse.
#[derive(Debug)]
pub(crate) struct Parsed<D> {
    pub arena: ExprArena<D>,
    /// The expression text, copied into the arena.
    pub source: Span,
    pub root: NodeId,
    pub depth: usize,
    pub consumed: usize,
}

pub(crate) struct Parser<'s, 'p, P: AtomProvider + ?Sized> {
    cursor: Cursor<'s>,
    provider: &'p P,
    arena: ExprArena<P::Data>,
    source: Span,
    max_depth: usize,
    /// Current `!`/`(` recursion depth.
    nesting: usize,
}

impl<'s, 'p, P: AtomProvider + ?Sized> Parser<'s, 'p, P> {
    pub fn new(input: &'s str, provider: &'p P, max_depth: usize) -> Self {
        let mut arena = ExprArena::with_capacity(input.len());
        let source = arena.alloc_str(input);
        Parser { cursor: Cursor::new(input), provider, arena, source, max_depth, nesting: 0 }
    }

    /// Parse the whole input into a tree.
    pub fn parse(mut self) -> Result<Parsed<P::Data>, ParseError> {
        let root = self.parse_or(Expect::Start)?;

        if let Some(lexeme) = self.cursor.peek() {
            return Err(match lexeme.tok {
                Tok::Close => ParseError::UnexpectedClose { offset: lexeme.offset },
                _ => ParseError::TrailingInput { offset: lexeme.offset, rest: self.cursor.rest().to_string() },
            });
        }

        Ok(Parsed {
            consumed: self.cursor.pos(),
            arena: self.arena,
            source: self.source,
            root: root.id,
            depth: root.depth,
        })
    }

    fn parse_or(&mut self, expect: Expect) -> Result<Built, ParseError> {
        let mut operands = vec![self.parse_and(expect)?];
        let mut ops = Vec::new();
        while let Some(op) = self.cursor.eat(Tok::Or) {
            operands.push(self.parse_and(Expect::Operand(op))?);
            ops.push(op);
        }
        self.chain(Node::Or, &operands, &ops)
    }

    fn parse_and(&mut self, expect: Expect) -> Result<Built, ParseError> {
        let mut operands = vec![self.parse_unary(expect)?];
        let mut ops = Vec::new();
        while let Some(op) = self.cursor.eat(Tok::And) {
            operands.push(self.parse_unary(Expect::Operand(op))?);
            ops.push(op);
        }
        self.chain(Node::And, &operands, &ops)
    }

    /// Join `x op y op z ...` into a balanced subtree that keeps the operands
    /// in textual order. `ops[i]` sits between `operands[i]` and
    /// `operands[i + 1]`.
    fn chain(&mut self, make: fn(Binary) -> Node, operands: &[Built], ops: &[Lexeme]) -> Result<Built, ParseError> {
        if let [single] = operands {
            return Ok(*single);
        }
        let mid = operands.len().div_ceil(2);
        let lhs = self.chain(make, &operands[..mid], &ops[..mid - 1])?;
        let rhs = self.chain(make, &operands[mid..], &ops[mid..])?;
        self.binary(make, lhs, rhs, ops[mid - 1].offset)
    }

    fn parse_unary(&mut self, expect: Expect) -> Result<Built, ParseError> {
        let Some(lexeme) = self.cursor.peek() else {
            return Err(match expect {
                Expect::Start => ParseError::Empty,
                Expect::Group(offset) => ParseError::UnclosedGroup { offset },
                Expect::Operand(op) => missing_right(op),
            });
        };

        match lexeme.tok {
            Tok::Atom => self.parse_atom(),
            Tok::Not => {
                self.cursor.bump(lexeme);
                self.enter(lexeme.offset)?;
                let child = self.parse_unary(Expect::Operand(lexeme))?;
                self.nesting -= 1;
                self.wrap(Node::Not(child.id), child, lexeme.offset)
            }
            Tok::Open => {
                self.cursor.bump(lexeme);
                self.enter(lexeme.offset)?;
                let inner = self.parse_or(Expect::Group(lexeme.offset))?;
                match self.cursor.peek() {
                    Some(close) if close.tok == Tok::Close => self.cursor.bump(close),
                    Some(other) => {
                        return Err(ParseError::TrailingInput {
                            offset: other.offset,
                            rest: self.cursor.rest().to_string(),
                        });
                    }
                    None => return Err(ParseError::UnclosedGroup { offset: lexeme.offset }),
                }
                self.nesting -= 1;
                self.wrap(Node::Group(inner.id), inner, lexeme.offset)
            }
            Tok::And | Tok::Or => Err(match expect {
                Expect::Operand(op) => missing_right(op),
                Expect::Start | Expect::Group(_) => {
                    ParseError::MissingOperand { offset: lexeme.offset, op: lexeme.symbol(), side: Side::Left }
                }
            }),
            Tok::Close => Err(match expect {
                Expect::Operand(op) => missing_right(op),
                Expect::Group(offset) => ParseError::EmptyGroup { offset },
                Expect::Start => ParseError::UnexpectedClose { offset: lexeme.offset },
            }),
        }
    }

    fn parse_atom(&mut self) -> Result<Built, ParseError> {
        let offset = self.cursor.pos();
        let rest = self.cursor.rest();
        let rejected = |source: AtomError| ParseError::AtomRejected { offset, source };

        let parsed = self.provider.parse_atom(rest).map_err(rejected)?;

        if parsed.consumed == 0 || parsed.consumed > rest.len() {
            return Err(rejected(AtomError::new(format!(
                "provider claimed {} bytes of {} remaining",
                parsed.consumed,
                rest.len()
            ))));
        }
        let Some(source) = rest.get(..parsed.consumed) else {
            return Err(rejected(AtomError::new(format!(
                "atom span of {} bytes ends inside a character",
                parsed.consumed
            ))));
        };
        if parsed.text.is_empty() {
            return Err(rejected(AtomError::new("provider returned an empty atom")));
        }

        let priority = self.provider.priority(&parsed.text, &parsed.data);
        let atom = self.arena.alloc_atom(&parsed.text, source, offset, priority, parsed.data);
        self.cursor.advance(parsed.consumed);

        Ok(Built { id: self.arena.alloc_node(Node::Atom(atom)), depth: 1 })
    }

    fn enter(&mut self, offset: usize) -> Result<(), ParseError> {
        self.nesting += 1;
        if self.nesting >= self.max_depth {
            return Err(ParseError::TooDeep { offset, limit: self.max_depth });
        }
        Ok(())
    }

    fn wrap(&mut self, node: Node, child: Built, offset: usize) -> Result<Built, ParseError> {
        self.check_depth(child.depth + 1, offset)?;
        Ok(Built { id: self.arena.alloc_node(node), depth: child.depth + 1 })
    }

    fn binary(
        &mut self,
        make: fn(Binary) -> Node,
        lhs: Built,
        rhs: Built,
        offset: usize,
    ) -> Result<Built, ParseError> {
        let depth = lhs.depth.max(rhs.depth) + 1;
        self.check_depth(depth, offset)?;
        Ok(Built { id: self.arena.alloc_node(make(Binary::new(lhs.id, rhs.id))), depth })
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<(), ParseError> {
        if depth > self.max_depth {
            return Err(ParseError::TooDeep { offset, limit: self.max_depth });
        }
        Ok(())
    }
}

fn missing_right(op: Lexeme) -> ParseError {
    ParseError::MissingOperand { offset: op.offset, op: op.symbol(), side: Side::Right }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ParsedAtom, parse_word};
    use crate::{Atom, AtomError};

    struct Words;

    impl AtomProvider for Words {
        type Context = ();
        type Data = ();

        fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a>, AtomError> {
            if input.starts_with('#') {
                return Err(AtomError::new("comments are not atoms"));
            }
            parse_word(input)
        }

        fn process_atom(&self, _atom: Atom<'_>, _context: &()) -> Result<f64, AtomError> {
            Ok(0.0)
        }
    }

    fn parse(input: &str) -> Result<Parsed<()>, ParseError> {
        Parser::new(input, &Words, 64).parse()
    }

    fn shape(parsed: &Parsed<()>, id: NodeId) -> String {
        match *parsed.arena.node(id) {
            Node::Atom(atom) => parsed.arena.atom(atom).text().to_string(),
            Node::Not(child) => format!("not({})", shape(parsed, child)),
            Node::Group(child) => format!("group({})", shape(parsed, child)),
            Node::And(bin) => format!("and({}, {})", shape(parsed, bin.lhs), shape(parsed, bin.rhs)),
            Node::Or(bin) => format!("or({}, {})", shape(parsed, bin.lhs), shape(parsed, bin.rhs)),
        }
    }

    #[test]
    fn precedence_and_associativity() {
        let cases: Vec<(&str, &str)> = vec![
            ("A", "A"),
            ("A & B | !C", "or(and(A, B), not(C))"),
            ("A | B & C", "or(A, and(B, C))"),
            ("A & B & C", "and(and(A, B), C)"),
            ("A | B | C | D", "or(or(A, B), or(C, D))"),
            ("A | B & C | D & E", "or(or(A, and(B, C)), and(D, E))"),
            ("A || B && C", "or(A, and(B, C))"),
            ("!(A | B) & C", "and(not(group(or(A, B))), C)"),
            ("!!A", "not(not(A))"),
            ("  ( ( A ) )  ", "group(group(A))"),
            ("f(x, y) & /a|b/i", "and(f(x, y), /a|b/i)"),
        ];

        for (input, expected) in cases {
            let parsed = parse(input).unwrap_or_else(|e| panic!("{input}: {e}"));
            assert_eq!(shape(&parsed, parsed.root), expected, "input: {input}");
            assert_eq!(parsed.consumed, input.len(), "input: {input}");
        }
    }

    #[test]
    fn atoms_are_recorded_in_textual_order() {
        let parsed = parse("C | (A & !B) | A").unwrap();
        let texts: Vec<&str> = parsed.arena.atoms().map(|a| a.text()).collect();
        let offsets: Vec<usize> = parsed.arena.atoms().map(|a| a.offset()).collect();
        assert_eq!(texts, vec!["C", "A", "B", "A"]);
        assert_eq!(offsets, vec![0, 5, 10, 15]);
    }

    #[test]
    fn syntax_errors() {
        let cases: Vec<(&str, ParseError)> = vec![
            ("", ParseError::Empty),
            ("   ", ParseError::Empty),
            ("A &", ParseError::MissingOperand { offset: 2, op: "&", side: Side::Right }),
            ("A || ", ParseError::MissingOperand { offset: 2, op: "||", side: Side::Right }),
            ("A & | B", ParseError::MissingOperand { offset: 2, op: "&", side: Side::Right }),
            ("& A", ParseError::MissingOperand { offset: 0, op: "&", side: Side::Left }),
            ("(| A)", ParseError::MissingOperand { offset: 1, op: "|", side: Side::Left }),
            ("!", ParseError::MissingOperand { offset: 0, op: "!", side: Side::Right }),
            ("A & ()", ParseError::EmptyGroup { offset: 4 }),
            ("(A & B", ParseError::UnclosedGroup { offset: 0 }),
            ("(", ParseError::UnclosedGroup { offset: 0 }),
            ("A)", ParseError::UnexpectedClose { offset: 1 }),
            (")", ParseError::UnexpectedClose { offset: 0 }),
            ("A B", ParseError::TrailingInput { offset: 2, rest: "B".to_string() }),
            ("(A B)", ParseError::TrailingInput { offset: 3, rest: "B)".to_string() }),
        ];

        for (input, expected) in cases {
            let err = parse(input).err().unwrap_or_else(|| panic!("{input} should not parse"));
            assert_eq!(err, expected, "input: {input}");
            assert!(err.is_syntax());
        }
    }

    #[test]
    fn provider_rejection_is_not_a_syntax_error() {
        let err = parse("A & #B").unwrap_err();
        assert_eq!(err, ParseError::AtomRejected { offset: 4, source: AtomError::new("comments are not atoms") });
        assert!(!err.is_syntax());
    }

    #[test]
    fn invalid_provider_spans_are_rejected() {
        struct Greedy(usize);

        impl AtomProvider for Greedy {
            type Context = ();
            type Data = ();

            fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a>, AtomError> {
                Ok(ParsedAtom::with_text("x", self.0.min(input.len() + 1)))
            }

            fn process_atom(&self, _atom: Atom<'_>, _context: &()) -> Result<f64, AtomError> {
                Ok(1.0)
            }
        }

        for (provider, input) in [(Greedy(0), "abc"), (Greedy(10), "abc"), (Greedy(1), "éa")] {
            let err = Parser::new(input, &provider, 16).parse().unwrap_err();
            assert!(matches!(err, ParseError::AtomRejected { offset: 0, .. }), "{input}: {err}");
        }
    }

    #[test]
    fn depth_is_capped() {
        let nested = format!("{}A{}", "(".repeat(40), ")".repeat(40));
        assert!(Parser::new(&nested, &Words, 64).parse().is_ok());
        assert!(matches!(Parser::new(&nested, &Words, 16).parse(), Err(ParseError::TooDeep { limit: 16, .. })));

        // chains grow logarithmically
        let chain = vec!["A"; 40].join(" & ");
        let parsed = Parser::new(&chain, &Words, 16).parse().unwrap();
        assert_eq!(parsed.depth, 7);
        assert_eq!(parsed.arena.atom_count(), 40);

        let alternatives = (0..300).map(|i| format!("R{i}")).collect::<Vec<_>>().join(" | ");
        let parsed = parse(&alternatives).unwrap();
        assert_eq!(parsed.depth, 10);

        let bangs = format!("{}A", "!".repeat(100_000));
        assert!(matches!(Parser::new(&bangs, &Words, 64).parse(), Err(ParseError::TooDeep { .. })));
    }
}
