//! Operator lexer.
//!
//! The lexer only recognizes the reserved operator characters. Everything else
//! is reported as [`Tok::Atom`] with zero length: the parser then asks the atom
//! provider how many bytes the atom spans and advances the cursor itself.
//!
//! ```text
//! input:  "!A && (B | C)"
//! peek:    Not Atom And Open Atom Or Atom Close
//! ```
//!
//! `&&` and `||` are accepted as spellings of `&` and `|`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tok {
    Not,
    And,
    Or,
    Open,
    Close,
    Atom,
}

/// A token found by [`Cursor::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub tok: Tok,
    pub offset: usize,
    pub len: usize,
}

impl Lexeme {
    /// Operator spelling, used in error messages.
    pub fn symbol(&self) -> &'static str {
        match (self.tok, self.len) {
            (Tok::Not, _) => "!",
            (Tok::And, 2) => "&&",
            (Tok::And, _) => "&",
            (Tok::Or, 2) => "||",
            (Tok::Or, _) => "|",
            (Tok::Open, _) => "(",
            (Tok::Close, _) => ")",
            (Tok::Atom, _) => "atom",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Cursor<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub fn new(input: &'s str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'s str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Skip whitespace and classify the next token without consuming it.
    pub fn peek(&mut self) -> Option<Lexeme> {
        self.skip_whitespace();
        let bytes = self.rest().as_bytes();
        let first = *bytes.first()?;
        let doubled = bytes.get(1) == Some(&first);

        let (tok, len) = match first {
            b'!' => (Tok::Not, 1),
            b'&' => (Tok::And, if doubled { 2 } else { 1 }),
            b'|' => (Tok::Or, if doubled { 2 } else { 1 }),
            b'(' => (Tok::Open, 1),
            b')' => (Tok::Close, 1),
            _ => (Tok::Atom, 0),
        };

        Some(Lexeme { tok, offset: self.pos, len })
    }

    /// Peek and consume the next token if it is `tok`.
    pub fn eat(&mut self, tok: Tok) -> Option<Lexeme> {
        let lexeme = self.peek().filter(|l| l.tok == tok)?;
        self.bump(lexeme);
        Some(lexeme)
    }

    /// Consume a lexeme returned by [`Cursor::peek`].
    pub fn bump(&mut self, lexeme: Lexeme) {
        self.pos = lexeme.offset + lexeme.len;
    }

    /// Consume `n` bytes (an atom span).
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(input: &str) -> Vec<(Tok, &'static str, usize)> {
        let mut cursor = Cursor::new(input);
        let mut out = Vec::new();
        while let Some(lexeme) = cursor.peek() {
            out.push((lexeme.tok, lexeme.symbol(), lexeme.offset));
            if lexeme.tok == Tok::Atom {
                // Single-byte atoms for lexer tests.
                cursor.advance(1);
            } else {
                cursor.bump(lexeme);
            }
        }
        out
    }

    #[test]
    fn classifies_operators_and_aliases() {
        let toks = drain("!A && (B | C)||D&E");
        let expected = vec![
            (Tok::Not, "!", 0),
            (Tok::Atom, "atom", 1),
            (Tok::And, "&&", 3),
            (Tok::Open, "(", 6),
            (Tok::Atom, "atom", 7),
            (Tok::Or, "|", 9),
            (Tok::Atom, "atom", 11),
            (Tok::Close, ")", 12),
            (Tok::Or, "||", 13),
            (Tok::Atom, "atom", 15),
            (Tok::And, "&", 16),
            (Tok::Atom, "atom", 17),
        ];
        assert_eq!(toks, expected);
    }

    #[test]
    fn whitespace_only_input_has_no_tokens() {
        let mut cursor = Cursor::new(" \t\n ");
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.pos(), 4);
        assert_eq!(cursor.rest(), "");
    }

    #[test]
    fn eat_only_consumes_matching_token() {
        let mut cursor = Cursor::new(" ) A");
        assert!(cursor.eat(Tok::Open).is_none());
        assert_eq!(cursor.eat(Tok::Close).map(|l| l.offset), Some(1));
        assert_eq!(cursor.rest(), " A");
    }
}
