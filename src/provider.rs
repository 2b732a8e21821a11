//! Atom providers.
//!
//! The engine knows the boolean grammar but nothing about atoms. Whenever the
//! parser meets a byte that is not an operator, it hands the rest of the input
//! to an [`AtomProvider`], which decides how much of it forms one atom. At
//! evaluation time the same provider resolves each atom against a
//! caller-supplied context.
//!
//! ```text
//! "R_SPF_ALLOW & !header_exists(X-Spam)"
//!  ^ parse_atom("R_SPF_ALLOW & !header_exists(X-Spam)") -> consumed 11
//!                  ^ parse_atom("header_exists(X-Spam)") -> consumed 21
//! ```
//!
//! Hosts usually implement the trait on their own type. For small embeddings
//! [`FnProvider`] wraps two closures, [`WithPriority`] adds cost hints to any
//! provider, and [`parse_word`] is a ready-made atom lexer.

use crate::{Atom, AtomError};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

/// Result of [`AtomProvider::parse_atom`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAtom<'a, D = ()> {
    /// Atom text handed back to `process_atom`. May differ from the consumed
    /// span (for example a quoted atom with its quotes stripped).
    pub text: Cow<'a, str>,
    /// Number of input bytes claimed by the atom.
    pub consumed: usize,
    /// Opaque user data stored with the atom.
    pub data: D,
}

impl<'a> ParsedAtom<'a> {
    /// Claim the first `len` bytes of `input`; the atom text is that span.
    pub fn span(input: &'a str, len: usize) -> Self {
        Self { text: Cow::Borrowed(input.get(..len).unwrap_or(input)), consumed: len, data: () }
    }

    /// Claim `consumed` bytes but report a different atom text.
    pub fn with_text(text: impl Into<Cow<'a, str>>, consumed: usize) -> Self {
        Self { text: text.into(), consumed, data: () }
    }
}

impl<'a, D> ParsedAtom<'a, D> {
    /// Attach user data to the atom.
    pub fn with_data<E>(self, data: E) -> ParsedAtom<'a, E> {
        ParsedAtom { text: self.text, consumed: self.consumed, data }
    }
}

/// Host capability that parses and resolves atoms.
pub trait AtomProvider {
    /// Per-evaluation state, e.g. the message being scored.
    type Context: ?Sized;
    /// User data stored with each atom.
    type Data;

    /// Claim one atom at the start of `input`.
    fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a, Self::Data>, AtomError>;

    /// Resolve an atom against `context`. Zero is falsy, anything else truthy.
    fn process_atom(&self, atom: Atom<'_, Self::Data>, context: &Self::Context) -> Result<f64, AtomError>;

    /// Relative cost of an atom; lower values are evaluated earlier.
    fn priority(&self, _text: &str, _data: &Self::Data) -> i32 {
        0
    }

    /// Wrap this provider with a priority function.
    fn with_priority<F>(self, priority: F) -> WithPriority<Self, F>
    where
        Self: Sized,
        F: Fn(&str) -> i32,
    {
        WithPriority::new(self, priority)
    }
}

macro_rules! forward_provider {
    ($($ptr:ident)::+) => {
        impl<P: AtomProvider + ?Sized> AtomProvider for $($ptr)::+<P> {
            type Context = P::Context;
            type Data = P::Data;

            fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a, Self::Data>, AtomError> {
                (**self).parse_atom(input)
            }

            fn process_atom(&self, atom: Atom<'_, Self::Data>, context: &Self::Context) -> Result<f64, AtomError> {
                (**self).process_atom(atom, context)
            }

            fn priority(&self, text: &str, data: &Self::Data) -> i32 {
                (**self).priority(text, data)
            }
        }
    };
}

forward_provider!(Box);
forward_provider!(Arc);
forward_provider!(Rc);

impl<P: AtomProvider + ?Sized> AtomProvider for &P {
    type Context = P::Context;
    type Data = P::Data;

    fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a, Self::Data>, AtomError> {
        (**self).parse_atom(input)
    }

    fn process_atom(&self, atom: Atom<'_, Self::Data>, context: &Self::Context) -> Result<f64, AtomError> {
        (**self).process_atom(atom, context)
    }

    fn priority(&self, text: &str, data: &Self::Data) -> i32 {
        (**self).priority(text, data)
    }
}

/// Provider built from two closures.
///
/// ```
/// use atomexpr::{AtomError, EvalFlags, Expression, FnProvider, parse_word};
/// use std::collections::HashMap;
///
/// let provider = FnProvider::new(parse_word, |atom: &str, msg: &HashMap<String, f64>| {
///     msg.get(atom).copied().ok_or_else(|| AtomError::new(format!("unknown atom {atom}")))
/// });
/// let expr = Expression::parse("SPF_FAIL & !DKIM_ALLOW", provider).unwrap();
///
/// let msg = HashMap::from([("SPF_FAIL".to_string(), 1.0), ("DKIM_ALLOW".to_string(), 0.0)]);
/// assert_eq!(expr.evaluate(&msg, EvalFlags::empty()), 1.0);
/// ```
pub struct FnProvider<C: ?Sized, P, E> {
    parse: P,
    process: E,
    _context: PhantomData<fn(&C)>,
}

impl<C: ?Sized, P, E> FnProvider<C, P, E>
where
    P: for<'a> Fn(&'a str) -> Result<ParsedAtom<'a>, AtomError>,
    E: Fn(&str, &C) -> Result<f64, AtomError>,
{
    pub fn new(parse: P, process: E) -> Self {
        Self { parse, process, _context: PhantomData }
    }
}

impl<C: ?Sized, P, E> AtomProvider for FnProvider<C, P, E>
where
    P: for<'a> Fn(&'a str) -> Result<ParsedAtom<'a>, AtomError>,
    E: Fn(&str, &C) -> Result<f64, AtomError>,
{
    type Context = C;
    type Data = ();

    fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a>, AtomError> {
        (self.parse)(input)
    }

    fn process_atom(&self, atom: Atom<'_>, context: &C) -> Result<f64, AtomError> {
        (self.process)(atom.text(), context)
    }
}

/// Adds a priority function to another provider.
pub struct WithPriority<P, F> {
    inner: P,
    priority: F,
}

impl<P, F> WithPriority<P, F>
where
    P: AtomProvider,
    F: Fn(&str) -> i32,
{
    pub fn new(inner: P, priority: F) -> Self {
        Self { inner, priority }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P, F> AtomProvider for WithPriority<P, F>
where
    P: AtomProvider,
    F: Fn(&str) -> i32,
{
    type Context = P::Context;
    type Data = P::Data;

    fn parse_atom<'a>(&self, input: &'a str) -> Result<ParsedAtom<'a, P::Data>, AtomError> {
        self.inner.parse_atom(input)
    }

    fn process_atom(&self, atom: Atom<'_, P::Data>, context: &P::Context) -> Result<f64, AtomError> {
        self.inner.process_atom(atom, context)
    }

    fn priority(&self, text: &str, _data: &P::Data) -> i32 {
        (self.priority)(text)
    }
}

/// Atom lexer for the common rule dialect.
///
/// Accepts, in this order:
///
/// - function calls: `header_exists(Subject)`, `has_flag(a, b)`
/// - regexp literals: `/^spam|ham$/i`
/// - bare words: any run of bytes up to whitespace or an operator character
pub fn parse_word(input: &str) -> Result<ParsedAtom<'_>, AtomError> {
    let re = regex!(r"^(?:[A-Za-z_][A-Za-z0-9_.]*\([^()]*\)|/(?:[^/\\\n]|\\.)+/[A-Za-z]*|[^\s!&|()]+)");
    match re.find(input) {
        Some(m) if !m.is_empty() => Ok(ParsedAtom::span(input, m.end())),
        _ => {
            let preview: String = input.chars().take(16).collect();
            Err(AtomError::new(format!("cannot parse atom at '{preview}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_dialects() {
        let cases: Vec<(&str, &str)> = vec![
            ("A & B", "A"),
            ("R_SPF_ALLOW|x", "R_SPF_ALLOW"),
            ("header_exists(X-Spam) & A", "header_exists(X-Spam)"),
            ("has_flag(a, b)", "has_flag(a, b)"),
            ("/^spam|ham$/i & A", "/^spam|ham$/i"),
            ("/a\\/b/ B", "/a\\/b/"),
            ("BAYES_SPAM)", "BAYES_SPAM"),
            ("émoji!", "émoji"),
        ];

        for (input, expected) in cases {
            let parsed = parse_word(input).unwrap();
            assert_eq!(parsed.text, expected, "input: {input}");
            assert_eq!(parsed.consumed, expected.len(), "input: {input}");
        }
    }

    #[test]
    fn parse_word_rejects_operator_start() {
        let err = parse_word("& A").unwrap_err();
        assert_eq!(err.message(), "cannot parse atom at '& A'");
        assert!(parse_word("").is_err());
    }

    #[test]
    fn parsed_atom_helpers() {
        let quoted = ParsedAtom::with_text("a b", 5).with_data(42u8);
        assert_eq!(quoted.text, "a b");
        assert_eq!(quoted.consumed, 5);
        assert_eq!(quoted.data, 42);

        let span = ParsedAtom::span("abc def", 3);
        assert_eq!(span.text, "abc");
    }
}
