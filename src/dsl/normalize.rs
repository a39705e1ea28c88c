//! Output stage: parenthesis validation and the normalized expression.

use super::ast::{FilterTree, Node, NodeId};
use super::value::{BoolCall, CheckOp, Operand, RelOp};
use crate::error::FilterError;
use std::fmt;

/// Semantics-only form of a filter, ready for [`crate::predicate::compile`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(bool),
    Compare {
        lhs: Operand,
        op: RelOp,
        rhs: Operand,
    },
    Check {
        operand: Operand,
        check: CheckOp,
    },
    Call(BoolCall),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Simplify the expression by flattening nested And/Or.
    pub fn simplify(self) -> Self {
        match self {
            Expr::And(exprs) => {
                let mut flat = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    match expr.simplify() {
                        Expr::And(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                Expr::And(flat)
            }
            Expr::Or(exprs) => {
                let mut flat = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    match expr.simplify() {
                        Expr::Or(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                Expr::Or(flat)
            }
            Expr::Not(inner) => Expr::Not(Box::new(inner.simplify())),
            other => other,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn joined(f: &mut fmt::Formatter<'_>, exprs: &[Expr], sep: &str) -> fmt::Result {
            for (i, expr) in exprs.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{expr}")?;
            }
            Ok(())
        }

        match self {
            Expr::Const(true) => f.write_str("TRUE"),
            Expr::Const(false) => f.write_str("FALSE"),
            Expr::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Expr::Check { operand, check } => write!(f, "{operand} {check}"),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Not(inner) => write!(f, "NOT {inner}"),
            Expr::And(exprs) => {
                f.write_str("(")?;
                joined(f, exprs, " AND ")?;
                f.write_str(")")
            }
            Expr::Or(exprs) => {
                f.write_str("(")?;
                joined(f, exprs, " OR ")?;
                f.write_str(")")
            }
        }
    }
}

impl FilterTree {
    /// Validate parenthesis balance and produce the normalized expression.
    ///
    /// Fails with [`FilterError::MalformedParenthesis`] when a `)` had nothing
    /// to close or input ended inside a group. The parser only leaves either
    /// marker behind when the source is unbalanced, whatever the order.
    pub fn output(&self) -> Result<Expr, FilterError> {
        let unclosed = self
            .nodes()
            .iter()
            .any(|node| matches!(node, Node::Paren { closed: false, .. }));
        if unclosed || !self.stray_closers().is_empty() {
            tracing::debug!(%self, "unbalanced parenthesis");
            return Err(FilterError::MalformedParenthesis);
        }

        Ok(self.lower(self.root()).simplify())
    }

    fn lower(&self, id: NodeId) -> Expr {
        match self.node(id) {
            Node::Bool(value) => Expr::Const(*value),
            Node::Compare { lhs, op, rhs } => Expr::Compare {
                lhs: lhs.clone(),
                op: *op,
                rhs: rhs.clone(),
            },
            Node::Check { operand, check } => Expr::Check {
                operand: operand.clone(),
                check: *check,
            },
            Node::BoolCall(call) => Expr::Call(call.clone()),
            Node::Not(inner) => Expr::Not(Box::new(self.lower(*inner))),
            Node::And(members) => Expr::And(members.iter().map(|m| self.lower(*m)).collect()),
            Node::Or(members) => Expr::Or(members.iter().map(|m| self.lower(*m)).collect()),
            Node::Paren { inner, .. } => self.lower(*inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_filter;

    fn output(source: &str) -> Result<Expr, FilterError> {
        parse_filter(source).unwrap().output()
    }

    #[test]
    fn test_balanced_outputs() {
        for source in [
            "`field` = TRUE",
            "((TRUE OR FALSE))",
            "(TRUE AND FALSE)",
            "(TRUE OR FALSE) AND (FALSE OR TRUE)",
            "(TRUE OR FALSE) AND (FALSE OR TRUE) AND TRUE",
            "((TRUE OR FALSE)) OR (TRUE)",
            "(TRUE AND FALSE) OR (FALSE)",
            "TRUE AND (TRUE OR FALSE) AND FALSE",
            "NOT NOT NOT TRUE",
        ] {
            assert!(output(source).is_ok(), "{source}");
        }
    }

    #[test]
    fn test_unbalanced_outputs() {
        for source in [
            "(TRUE) OR FALSE)",
            "(((TRUE) OR FALSE) OR FALSE))",
            "((TRUE)",
            "TRUE)",
            "(TRUE OR FALSE",
            "TRUE) AND (FALSE",
            "a = 1) OR (b = 2",
            "(a = 1)) OR ((b = 2)",
        ] {
            assert_eq!(output(source), Err(FilterError::MalformedParenthesis), "{source}");
        }
    }

    #[test]
    fn test_parens_erased_and_flattened() {
        let expr = output("(TRUE AND (FALSE AND TRUE)) AND ((FALSE))").unwrap();
        assert_eq!(
            expr,
            Expr::And(vec![
                Expr::Const(true),
                Expr::Const(false),
                Expr::Const(true),
                Expr::Const(false),
            ])
        );
    }

    #[test]
    fn test_or_under_and_kept() {
        let expr = output("(TRUE OR FALSE) AND FALSE").unwrap();
        assert_eq!(
            expr,
            Expr::And(vec![
                Expr::Or(vec![Expr::Const(true), Expr::Const(false)]),
                Expr::Const(false),
            ])
        );
    }

    #[test]
    fn test_negations_survive() {
        let expr = output("NOT NOT TRUE").unwrap();
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Not(Box::new(Expr::Const(true)))))
        );
    }

    #[test]
    fn test_display() {
        let expr = output("a = 1 OR NOT (b EXISTS AND c < 2)").unwrap();
        assert_eq!(expr.to_string(), "(a = 1 OR NOT (b EXISTS AND c < 2))");
    }
}
