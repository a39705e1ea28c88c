//! Runtime values and comparison semantics.
//!
//! A resolved operand is a [`Value`]: either one of the JSON scalar kinds, a
//! marker for an object/array, or [`Value::Missing`] when the path did not
//! resolve. Absence is not an error; it only changes what the operators
//! return.

use crate::dsl::{CheckOp, Literal, RelOp};
use crate::predicate::CompareKind;
use std::cmp::Ordering;

/// A JSON number as read from a document or a literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    /// Two integers compare exactly, anything else through `f64`.
    /// `None` when a NaN is involved.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// A resolved operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Missing,
    Null,
    Bool(bool),
    Number(Number),
    Str(&'a str),
    /// An object or array; only its presence is observable.
    Composite,
}

impl<'a> Value<'a> {
    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl<'a> From<&'a Literal> for Value<'a> {
    fn from(lit: &'a Literal) -> Self {
        match lit {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Number(Number::Int(*n)),
            Literal::Float(n) => Value::Number(Number::Float(*n)),
            Literal::Str(s) => Value::Str(s),
        }
    }
}

/// Apply `op` to two resolved operands.
///
/// With an absent side only `<>` holds. Values of different kinds are never
/// equal and never ordered, so `<>` is the only operator they satisfy.
/// Booleans and nulls support equality only.
pub fn compare(lhs: Value<'_>, op: RelOp, rhs: Value<'_>) -> bool {
    if !lhs.is_present() || !rhs.is_present() {
        return op == RelOp::Ne;
    }

    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match a.compare(b) {
            Some(ordering) => op.accepts(ordering),
            None => op == RelOp::Ne,
        },
        (Value::Str(a), Value::Str(b)) => op.accepts(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) if op.is_equality() => op.accepts(a.cmp(&b)),
        (Value::Null, Value::Null) if op.is_equality() => op == RelOp::Eq,
        _ => op == RelOp::Ne,
    }
}

/// [`compare`] with the operand kinds already narrowed at compile time.
pub fn compare_as(kind: CompareKind, lhs: Value<'_>, op: RelOp, rhs: Value<'_>) -> bool {
    match (kind, lhs, rhs) {
        (CompareKind::Numeric, Value::Number(a), Value::Number(b)) => match a.compare(b) {
            Some(ordering) => op.accepts(ordering),
            None => op == RelOp::Ne,
        },
        (CompareKind::Text, Value::Str(a), Value::Str(b)) => op.accepts(a.cmp(b)),
        (CompareKind::Dynamic, lhs, rhs) => compare(lhs, op, rhs),
        _ => op == RelOp::Ne,
    }
}

/// Apply a presence check. An absent value counts as null.
pub fn check(value: Value<'_>, check: CheckOp) -> bool {
    match check {
        CheckOp::IsNull => matches!(value, Value::Missing | Value::Null),
        CheckOp::IsNotNull => !matches!(value, Value::Missing | Value::Null),
        CheckOp::Exists => value.is_present(),
        CheckOp::NotExists => !value.is_present(),
    }
}
