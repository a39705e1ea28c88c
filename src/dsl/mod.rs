//! SQL-like filter language for JSON documents.
//!
//! Syntax:
//!   a.b.c = "text"            - comparison (=, <>, !=, <, <=, >, >=)
//!   `odd.name`[2] > 10        - quoted segment, array index
//!   META().key = 1            - path under the META() pseudo-segment
//!   a IS NULL, a IS NOT NULL  - null checks (absent counts as null)
//!   a EXISTS, a NOT EXISTS    - presence checks
//!   ABS(CEIL(PI())) < x       - value functions, nested
//!   REGEXP_CONTAINS(a, "re")  - boolean function
//!   expr1 AND expr2           - AND
//!   expr1 OR expr2            - OR (lower precedence than AND)
//!   NOT expr                  - NOT
//!   (expr)                    - grouping
//!
//! Keywords are case-insensitive; function names are not.

mod ast;
mod lexer;
mod normalize;
mod parser;
mod path;
mod value;

pub use ast::*;
pub use lexer::{Spanned, Token, tokenize};
pub use normalize::Expr;
pub use parser::{MAX_NESTING, parse_filter};
pub use path::{FieldPath, META_SEGMENT, PathSegment};
pub use value::*;
