//! Literals, operators, operands and the built-in function registries.

use super::path::FieldPath;
use std::cmp::Ordering;
use std::fmt;

/// A typed constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(true) => f.write_str("TRUE"),
            Literal::Bool(false) => f.write_str("FALSE"),
            Literal::Int(n) => write!(f, "{n}"),
            // Keep a fraction so the text lexes back as a float.
            Literal::Float(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{n:.1}"),
            Literal::Float(n) => write!(f, "{n}"),
            Literal::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

/// Relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq, // =
    Ne, // <>
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl RelOp {
    pub fn is_equality(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Ne)
    }

    /// Whether an established ordering satisfies the operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            RelOp::Eq => ordering == Ordering::Equal,
            RelOp::Ne => ordering != Ordering::Equal,
            RelOp::Lt => ordering == Ordering::Less,
            RelOp::Le => ordering != Ordering::Greater,
            RelOp::Gt => ordering == Ordering::Greater,
            RelOp::Ge => ordering != Ordering::Less,
        }
    }

    /// Operator with its operands swapped: `a < b` is `b > a`.
    pub fn flipped(self) -> Self {
        match self {
            RelOp::Lt => RelOp::Gt,
            RelOp::Le => RelOp::Ge,
            RelOp::Gt => RelOp::Lt,
            RelOp::Ge => RelOp::Le,
            other => other,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelOp::Eq => write!(f, "="),
            RelOp::Ne => write!(f, "<>"),
            RelOp::Lt => write!(f, "<"),
            RelOp::Le => write!(f, "<="),
            RelOp::Gt => write!(f, ">"),
            RelOp::Ge => write!(f, ">="),
        }
    }
}

/// Unary presence checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOp {
    IsNull,
    IsNotNull,
    Exists,
    NotExists,
}

impl fmt::Display for CheckOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOp::IsNull => write!(f, "IS NULL"),
            CheckOp::IsNotNull => write!(f, "IS NOT NULL"),
            CheckOp::Exists => write!(f, "EXISTS"),
            CheckOp::NotExists => write!(f, "NOT EXISTS"),
        }
    }
}

/// Value-returning built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFunction {
    Pi,
    E,
    Abs,
    Acos,
    Asin,
    Atan,
    Ceil,
    Cos,
    Degrees,
    Exp,
    Floor,
    Ln,
    Log,
    Radians,
    Round,
    Sign,
    Sin,
    Sqrt,
    Tan,
    Trunc,
    Date,
    Atan2,
    Pow,
}

impl ValueFunction {
    pub const ALL: [ValueFunction; 23] = [
        ValueFunction::Pi,
        ValueFunction::E,
        ValueFunction::Abs,
        ValueFunction::Acos,
        ValueFunction::Asin,
        ValueFunction::Atan,
        ValueFunction::Ceil,
        ValueFunction::Cos,
        ValueFunction::Degrees,
        ValueFunction::Exp,
        ValueFunction::Floor,
        ValueFunction::Ln,
        ValueFunction::Log,
        ValueFunction::Radians,
        ValueFunction::Round,
        ValueFunction::Sign,
        ValueFunction::Sin,
        ValueFunction::Sqrt,
        ValueFunction::Tan,
        ValueFunction::Trunc,
        ValueFunction::Date,
        ValueFunction::Atan2,
        ValueFunction::Pow,
    ];

    /// Case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|func| func.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueFunction::Pi => "PI",
            ValueFunction::E => "E",
            ValueFunction::Abs => "ABS",
            ValueFunction::Acos => "ACOS",
            ValueFunction::Asin => "ASIN",
            ValueFunction::Atan => "ATAN",
            ValueFunction::Ceil => "CEIL",
            ValueFunction::Cos => "COS",
            ValueFunction::Degrees => "DEGREES",
            ValueFunction::Exp => "EXP",
            ValueFunction::Floor => "FLOOR",
            ValueFunction::Ln => "LN",
            ValueFunction::Log => "LOG",
            ValueFunction::Radians => "RADIANS",
            ValueFunction::Round => "ROUND",
            ValueFunction::Sign => "SIGN",
            ValueFunction::Sin => "SIN",
            ValueFunction::Sqrt => "SQRT",
            ValueFunction::Tan => "TAN",
            ValueFunction::Trunc => "TRUNC",
            ValueFunction::Date => "DATE",
            ValueFunction::Atan2 => "ATAN2",
            ValueFunction::Pow => "POW",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            ValueFunction::Pi | ValueFunction::E => 0,
            ValueFunction::Atan2 | ValueFunction::Pow => 2,
            _ => 1,
        }
    }
}

/// Predicate-valued built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolFunction {
    RegexpContains,
}

impl BoolFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "REGEXP_CONTAINS" => Some(BoolFunction::RegexpContains),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoolFunction::RegexpContains => "REGEXP_CONTAINS",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            BoolFunction::RegexpContains => 2,
        }
    }
}

/// A call to a value function; `args.len()` always equals the arity.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub func: ValueFunction,
    pub args: Vec<Operand>,
}

/// A call to a boolean function; `args.len()` always equals the arity.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolCall {
    pub func: BoolFunction,
    pub args: Vec<Operand>,
}

/// Anything that produces a value to compare.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldPath),
    Literal(Literal),
    Func(FuncCall),
}

impl Operand {
    pub fn as_field(&self) -> Option<&FieldPath> {
        match self {
            Operand::Field(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Operand::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncCall> {
        match self {
            Operand::Func(call) => Some(call),
            _ => None,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, name: &str, args: &[Operand]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_args(f, self.func.name(), &self.args)
    }
}

impl fmt::Display for BoolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_args(f, self.func.name(), &self.args)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Field(path) => write!(f, "{path}"),
            Operand::Literal(lit) => write!(f, "{lit}"),
            Operand::Func(call) => write!(f, "{call}"),
        }
    }
}
