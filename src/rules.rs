//! Named rule collections.
//!
//! A [`RuleSet`] is what a filter builds at rule-load time: every rule text is
//! parsed once against a shared provider, and each incoming message is then
//! scored against all of them. Rules whose text fails to parse stay in the
//! set with their error, so a bad rule is reported instead of silently
//! dropped, and asking to evaluate it yields [`EvalError::NotBuilt`].

use crate::{AtomProvider, EvalError, EvalFlags, Expression, Options, ParseError};
use std::collections::HashMap;
use std::sync::Arc;

struct Entry<P: AtomProvider> {
    name: String,
    built: Result<Expression<Arc<P>>, ParseError>,
}

/// Score of one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleScore<'r> {
    pub name: &'r str,
    pub value: f64,
}

/// Expressions sharing one provider, kept in insertion order.
///
/// ```
/// use atomexpr::{EvalFlags, FnProvider, RuleSet, parse_word};
///
/// let provider = FnProvider::new(parse_word, |atom: &str, hits: &[&str]| {
///     Ok(if hits.iter().any(|h| *h == atom) { 1.0 } else { 0.0 })
/// });
/// let mut rules = RuleSet::new(provider);
/// rules.insert("PHISH", "SPF_FAIL & URL_IP").unwrap();
/// assert!(rules.insert("BROKEN", "A &").is_err());
///
/// let hits: &[&str] = &["SPF_FAIL", "URL_IP"];
/// assert_eq!(rules.evaluate("PHISH", hits, EvalFlags::empty()), Ok(1.0));
/// assert!(rules.evaluate("BROKEN", hits, EvalFlags::empty()).is_err());
/// ```
pub struct RuleSet<P: AtomProvider> {
    provider: Arc<P>,
    options: Options,
    entries: Vec<Entry<P>>,
    index: HashMap<String, usize>,
}

impl<P: AtomProvider> RuleSet<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, Options::default())
    }

    pub fn with_options(provider: P, options: Options) -> Self {
        RuleSet { provider: Arc::new(provider), options, entries: Vec::new(), index: HashMap::new() }
    }

    /// Parse `text` and store it under `name`, replacing any previous rule
    /// with that name. A parse failure is stored too and returned.
    pub fn insert(&mut self, name: &str, text: &str) -> Result<&Expression<Arc<P>>, ParseError> {
        let built = Expression::parse_with(text, Arc::clone(&self.provider), &self.options);
        if let Err(err) = &built {
            tracing::warn!(rule = name, error = %err, "rule failed to parse");
        }

        let slot = match self.index.get(name) {
            Some(&slot) => {
                self.entries[slot].built = built;
                slot
            }
            None => {
                self.entries.push(Entry { name: name.to_string(), built });
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        self.entries[slot].built.as_ref().map_err(Clone::clone)
    }

    /// The built expression for `name`, if it parsed.
    pub fn get(&self, name: &str) -> Option<&Expression<Arc<P>>> {
        self.entry(name).and_then(|entry| entry.built.as_ref().ok())
    }

    /// The parse error recorded for `name`, if its text failed to parse.
    pub fn error(&self, name: &str) -> Option<&ParseError> {
        self.entry(name).and_then(|entry| entry.built.as_ref().err())
    }

    pub fn evaluate(&self, name: &str, context: &P::Context, flags: EvalFlags) -> Result<f64, EvalError> {
        let expr = self.get(name).ok_or_else(|| EvalError::NotBuilt { rule: name.to_string() })?;
        Ok(expr.evaluate(context, flags))
    }

    /// Scores of every built rule, in insertion order. Rules that failed to
    /// parse are skipped.
    pub fn evaluate_all(&self, context: &P::Context, flags: EvalFlags) -> Vec<RuleScore<'_>> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let expr = entry.built.as_ref().ok()?;
                Some(RuleScore { name: &entry.name, value: expr.evaluate(context, flags) })
            })
            .collect()
    }

    /// Rule names in insertion order, broken rules included.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn entry(&self, name: &str) -> Option<&Entry<P>> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }
}
