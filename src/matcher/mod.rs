//! Evaluation of a [`CompiledPredicate`] against JSON documents.

pub mod compare;
mod document;

use crate::error::Result;
use crate::predicate::{ClauseId, CompiledPredicate, Term, TermId, eval_term};
use crate::predicate::Clause;
use compare::Value;
use document::Capture;

/// Reusable evaluator bound to one predicate.
///
/// Holds only per-document scratch, one capture per field slot. Fields are
/// read lazily: a slot is resolved the first time a clause needs it and the
/// result is reused by every later reference in the same document. Clauses
/// that short-circuiting skips never read the document.
///
/// ```
/// use docsieve::Filter;
///
/// let filter = Filter::new("fieldpath.path >= ABS(CEIL(PI()))").unwrap();
/// let mut matcher = filter.matcher();
/// assert!(matcher.matches(br#"{"fieldpath": {"path": 10}}"#).unwrap());
/// assert!(!matcher.matches(br#"{"fieldpath": {"path": 3}}"#).unwrap());
/// ```
#[derive(Debug)]
pub struct Matcher<'p> {
    predicate: &'p CompiledPredicate,
    captures: Vec<Capture>,
    /// Whether any pass over the current document has run.
    scanned: bool,
}

impl<'p> Matcher<'p> {
    pub fn new(predicate: &'p CompiledPredicate) -> Self {
        let captures = predicate.slots().iter().map(|_| Capture::default()).collect();
        Matcher {
            predicate,
            captures,
            scanned: false,
        }
    }

    /// Clear per-document state. Buffers are kept.
    pub fn reset(&mut self) {
        for capture in &mut self.captures {
            capture.clear();
        }
        self.scanned = false;
    }

    /// Evaluate the predicate against one JSON document.
    ///
    /// Fails with [`FilterError::Decode`](crate::FilterError::Decode) when the
    /// document is not well-formed JSON, even if the verdict did not need any
    /// field from it.
    pub fn matches(&mut self, document: &[u8]) -> Result<bool> {
        self.reset();
        let verdict = self.evaluate(document);
        if let Err(err) = &verdict {
            tracing::debug!(error = %err, "document rejected");
        }
        verdict
    }

    fn evaluate(&mut self, document: &[u8]) -> Result<bool> {
        document::check_utf8(document)?;
        let verdict = self.eval(self.predicate.root(), document)?;
        if !self.scanned {
            document::validate(document)?;
        }
        Ok(verdict)
    }

    fn eval(&mut self, id: ClauseId, document: &[u8]) -> Result<bool> {
        let predicate = self.predicate;
        match predicate.clause(id) {
            Clause::Const(value) => Ok(*value),
            Clause::Compare { lhs, op, rhs, kind } => {
                self.resolve(*lhs, document)?;
                self.resolve(*rhs, document)?;
                Ok(compare::compare_as(*kind, self.value(*lhs), *op, self.value(*rhs)))
            }
            Clause::Check { term, check } => {
                self.resolve(*term, document)?;
                Ok(compare::check(self.value(*term), *check))
            }
            Clause::Regex { subject, regex } => {
                self.resolve(*subject, document)?;
                let regex = predicate.regex(*regex);
                Ok(self.value(*subject).as_str().is_some_and(|s| regex.is_match(s)))
            }
            Clause::Not(inner) => Ok(!self.eval(*inner, document)?),
            Clause::All(members) => {
                for member in members {
                    if !self.eval(*member, document)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Clause::Any(members) => {
                for member in members {
                    if self.eval(*member, document)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// Make sure every slot under `term` is resolved for this document.
    fn resolve(&mut self, term: TermId, document: &[u8]) -> Result<()> {
        let predicate = self.predicate;
        match predicate.term(term) {
            Term::Field(slot) => {
                let capture = &mut self.captures[*slot];
                if !capture.is_resolved() {
                    self.scanned = true;
                    document::resolve(document, predicate.slot(*slot).steps(), capture)?;
                }
            }
            Term::Numeric1 { arg, .. } | Term::Date(arg) => self.resolve(*arg, document)?,
            Term::Numeric2 { lhs, rhs, .. } => {
                self.resolve(*lhs, document)?;
                self.resolve(*rhs, document)?;
            }
            Term::Const(_) | Term::Absent => {}
        }
        Ok(())
    }

    fn value(&self, term: TermId) -> Value<'_> {
        eval_term(self.predicate.terms(), term, &|slot| self.captures[slot].value())
    }
}
