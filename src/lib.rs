//! Filter JSON documents with a small SQL-like boolean language.
//!
//! Source text goes through three stages:
//!
//! 1. [`dsl::parse_filter`] builds a [`dsl::FilterTree`],
//! 2. [`dsl::FilterTree::output`] validates it into a normalized [`dsl::Expr`],
//! 3. [`predicate::compile`] lowers that into a [`CompiledPredicate`].
//!
//! A compiled predicate is immutable and shared; each thread evaluates it
//! through its own [`Matcher`]. [`Filter`] runs all three stages at once.
//!
//! ```
//! use docsieve::Filter;
//!
//! let filter = Filter::new(r#"type = "order" AND total >= 100"#).unwrap();
//! assert!(filter.matches(br#"{"type": "order", "total": 250}"#).unwrap());
//! assert!(!filter.matches(br#"{"type": "order", "total": 20}"#).unwrap());
//! ```

pub mod dsl;
pub mod error;
pub mod matcher;
pub mod predicate;

pub use error::{FilterError, Result};
pub use matcher::Matcher;
pub use predicate::{CompiledPredicate, compile};

/// A filter expression compiled from source text.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    expr: dsl::Expr,
    predicate: CompiledPredicate,
}

impl Filter {
    /// Parse, validate and compile `source`.
    pub fn new(source: &str) -> Result<Self> {
        let tree = dsl::parse_filter(source)?;
        let expr = tree.output()?;
        let predicate = compile(&expr)?;
        Ok(Filter {
            source: source.to_string(),
            expr,
            predicate,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The normalized expression the predicate was compiled from.
    pub fn expr(&self) -> &dsl::Expr {
        &self.expr
    }

    pub fn predicate(&self) -> &CompiledPredicate {
        &self.predicate
    }

    pub fn matcher(&self) -> Matcher<'_> {
        self.predicate.matcher()
    }

    /// Evaluate a single document with a throwaway matcher.
    pub fn matches(&self, document: &[u8]) -> Result<bool> {
        self.matcher().matches(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_report_their_errors() {
        assert!(Filter::new("a = ").unwrap_err().is_syntax());
        assert_eq!(
            Filter::new("(TRUE) OR FALSE)").unwrap_err(),
            FilterError::MalformedParenthesis
        );
        assert!(matches!(
            Filter::new("REGEXP_CONTAINS(a, \"[\")").unwrap_err(),
            FilterError::Compile(_)
        ));
    }

    #[test]
    fn keeps_source() {
        let filter = Filter::new("`field.Path` = \"value\"").unwrap();
        assert_eq!(filter.source(), "`field.Path` = \"value\"");
        assert_eq!(filter.expr().to_string(), "`field.Path` = \"value\"");
    }
}
