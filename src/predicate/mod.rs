//! Compilation of a normalized [`Expr`] into a [`CompiledPredicate`].
//!
//! The compiled form is a pair of arenas: clauses (boolean nodes) and terms
//! (value producers). Field paths are interned into slots so a matcher can
//! resolve each distinct path at most once per document. Constant parts are
//! folded away here, so evaluation only ever sees work that depends on the
//! document.

mod functions;

pub use functions::parse_date;

use crate::dsl::{BoolCall, BoolFunction, CheckOp, Expr, FieldPath, FuncCall, Literal, Operand, RelOp, ValueFunction};
use crate::error::{FilterError, Result};
use crate::matcher::Matcher;
use crate::matcher::compare::{self, Number, Value};
use regex::Regex;
use std::collections::HashMap;

pub(crate) type ClauseId = usize;
pub(crate) type TermId = usize;

/// One step of a pre-split field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(Box<str>),
    Index(usize),
}

/// A distinct field path referenced by the predicate.
#[derive(Debug, Clone)]
pub struct Slot {
    path: FieldPath,
    steps: Vec<Step>,
}

impl Slot {
    fn new(path: &FieldPath) -> Self {
        let mut steps = Vec::new();
        for segment in path.segments() {
            steps.push(Step::Key(segment.name().into()));
            steps.extend(segment.indices().iter().copied().map(Step::Index));
        }
        Slot {
            path: path.clone(),
            steps,
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// How a comparison's operands are matched at runtime, decided from the
/// operand types known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    /// One side is a number literal or a function result.
    Numeric,
    /// One side is a string literal.
    Text,
    /// Both sides come from the document.
    Dynamic,
}

#[derive(Debug, Clone)]
pub(crate) enum Term {
    Const(Literal),
    /// A constant that folded to no value, e.g. `SQRT(-1)`.
    Absent,
    Field(usize),
    Numeric1 {
        f: fn(f64) -> f64,
        arg: TermId,
    },
    Numeric2 {
        f: fn(f64, f64) -> f64,
        lhs: TermId,
        rhs: TermId,
    },
    Date(TermId),
}

impl Term {
    fn is_constant(&self) -> bool {
        matches!(self, Term::Const(_) | Term::Absent)
    }

    fn from_value(value: Value<'_>) -> Self {
        match value {
            Value::Bool(b) => Term::Const(Literal::Bool(b)),
            Value::Number(Number::Int(n)) => Term::Const(Literal::Int(n)),
            Value::Number(Number::Float(n)) => Term::Const(Literal::Float(n)),
            Value::Str(s) => Term::Const(Literal::Str(s.to_string())),
            Value::Missing | Value::Null | Value::Composite => Term::Absent,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Clause {
    Const(bool),
    Compare {
        lhs: TermId,
        op: RelOp,
        rhs: TermId,
        kind: CompareKind,
    },
    Check {
        term: TermId,
        check: CheckOp,
    },
    Regex {
        subject: TermId,
        regex: usize,
    },
    Not(ClauseId),
    All(Vec<ClauseId>),
    Any(Vec<ClauseId>),
}

/// Evaluate a term, looking field slots up through `field`.
///
/// Functions yield [`Value::Missing`] when an input is missing or of the
/// wrong kind, or when the result is not finite.
pub(crate) fn eval_term<'a, F>(terms: &'a [Term], id: TermId, field: &F) -> Value<'a>
where
    F: Fn(usize) -> Value<'a>,
{
    match &terms[id] {
        Term::Const(lit) => Value::from(lit),
        Term::Absent => Value::Missing,
        Term::Field(slot) => field(*slot),
        Term::Numeric1 { f, arg } => numeric(eval_term(terms, *arg, field).as_f64().map(*f)),
        Term::Numeric2 { f, lhs, rhs } => {
            let lhs = eval_term(terms, *lhs, field).as_f64();
            let rhs = eval_term(terms, *rhs, field).as_f64();
            numeric(lhs.zip(rhs).map(|(a, b)| f(a, b)))
        }
        Term::Date(arg) => match eval_term(terms, *arg, field).as_str().and_then(parse_date) {
            Some(nanos) => Value::Number(Number::Int(nanos)),
            None => Value::Missing,
        },
    }
}

fn numeric(result: Option<f64>) -> Value<'static> {
    match result {
        Some(n) if n.is_finite() => Value::Number(Number::Float(n)),
        _ => Value::Missing,
    }
}

/// Immutable, evaluation-ready form of a filter.
///
/// Shared read-only between any number of [`Matcher`]s, across threads.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    clauses: Vec<Clause>,
    terms: Vec<Term>,
    slots: Vec<Slot>,
    regexes: Vec<Regex>,
    root: ClauseId,
}

impl CompiledPredicate {
    /// A fresh matcher bound to this predicate.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(self)
    }

    /// Distinct field paths the predicate may read.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The verdict when it does not depend on the document.
    pub fn constant(&self) -> Option<bool> {
        match self.clauses[self.root] {
            Clause::Const(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn root(&self) -> ClauseId {
        self.root
    }

    pub(crate) fn clause(&self, id: ClauseId) -> &Clause {
        &self.clauses[id]
    }

    pub(crate) fn term(&self, id: TermId) -> &Term {
        &self.terms[id]
    }

    pub(crate) fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub(crate) fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub(crate) fn regex(&self, index: usize) -> &Regex {
        &self.regexes[index]
    }
}

/// Compile a normalized expression.
pub fn compile(expr: &Expr) -> Result<CompiledPredicate> {
    let mut compiler = Compiler::default();
    let root = match compiler.lower_clause(expr)? {
        Lowered::Const(value) => compiler.push_clause(Clause::Const(value)),
        Lowered::Clause(id) => id,
    };

    tracing::debug!(
        clauses = compiler.clauses.len(),
        terms = compiler.terms.len(),
        slots = compiler.slots.len(),
        regexes = compiler.regexes.len(),
        "compiled filter"
    );

    Ok(CompiledPredicate {
        clauses: compiler.clauses,
        terms: compiler.terms,
        slots: compiler.slots,
        regexes: compiler.regexes,
        root,
    })
}

enum Lowered {
    Const(bool),
    Clause(ClauseId),
}

#[derive(Clone, Copy)]
struct Mark {
    clauses: usize,
    terms: usize,
    slots: usize,
    regexes: usize,
}

/// Static type of a term, where known.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Known {
    Number,
    Text,
    Bool,
}

#[derive(Default)]
struct Compiler {
    clauses: Vec<Clause>,
    terms: Vec<Term>,
    slots: Vec<Slot>,
    slot_index: HashMap<FieldPath, usize>,
    regexes: Vec<Regex>,
}

impl Compiler {
    fn push_clause(&mut self, clause: Clause) -> ClauseId {
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    fn push_term(&mut self, term: Term) -> TermId {
        self.terms.push(term);
        self.terms.len() - 1
    }

    fn intern(&mut self, path: &FieldPath) -> usize {
        if let Some(slot) = self.slot_index.get(path) {
            return *slot;
        }
        let slot = self.slots.len();
        self.slots.push(Slot::new(path));
        self.slot_index.insert(path.clone(), slot);
        slot
    }

    fn mark(&self) -> Mark {
        Mark {
            clauses: self.clauses.len(),
            terms: self.terms.len(),
            slots: self.slots.len(),
            regexes: self.regexes.len(),
        }
    }

    /// Drop everything built since `mark`.
    fn rewind(&mut self, mark: Mark) {
        self.clauses.truncate(mark.clauses);
        self.terms.truncate(mark.terms);
        self.slots.truncate(mark.slots);
        self.slot_index.retain(|_, slot| *slot < mark.slots);
        self.regexes.truncate(mark.regexes);
    }

    fn lower_clause(&mut self, expr: &Expr) -> Result<Lowered> {
        let mark = self.mark();
        let lowered = match expr {
            Expr::Const(value) => Lowered::Const(*value),
            Expr::Compare { lhs, op, rhs } => self.lower_compare(lhs, *op, rhs)?,
            Expr::Check { operand, check } => {
                let term = self.lower_term(operand)?;
                if self.terms[term].is_constant() {
                    let value = eval_term(&self.terms, term, &|_| Value::Missing);
                    Lowered::Const(compare::check(value, *check))
                } else {
                    Lowered::Clause(self.push_clause(Clause::Check { term, check: *check }))
                }
            }
            Expr::Call(call) => self.lower_bool_call(call)?,
            Expr::Not(inner) => match self.lower_clause(inner)? {
                Lowered::Const(value) => Lowered::Const(!value),
                Lowered::Clause(id) => {
                    if let Clause::Not(twice) = self.clauses[id] {
                        Lowered::Clause(twice)
                    } else {
                        Lowered::Clause(self.push_clause(Clause::Not(id)))
                    }
                }
            },
            Expr::And(members) => self.lower_junction(members, true)?,
            Expr::Or(members) => self.lower_junction(members, false)?,
        };

        if let Lowered::Const(_) = lowered {
            self.rewind(mark);
        }
        Ok(lowered)
    }

    /// `AND` when `all` is set, `OR` otherwise.
    fn lower_junction(&mut self, members: &[Expr], all: bool) -> Result<Lowered> {
        let mut ids = Vec::with_capacity(members.len());
        for member in members {
            match self.lower_clause(member)? {
                // TRUE in AND, FALSE in OR
                Lowered::Const(value) if value == all => {}
                Lowered::Const(value) => return Ok(Lowered::Const(value)),
                Lowered::Clause(id) => ids.push(id),
            }
        }

        Ok(match ids.len() {
            0 => Lowered::Const(all),
            1 => Lowered::Clause(ids[0]),
            _ if all => Lowered::Clause(self.push_clause(Clause::All(ids))),
            _ => Lowered::Clause(self.push_clause(Clause::Any(ids))),
        })
    }

    fn lower_compare(&mut self, lhs: &Operand, op: RelOp, rhs: &Operand) -> Result<Lowered> {
        if !op.is_equality() {
            for side in [lhs, rhs] {
                if let Operand::Literal(lit @ Literal::Bool(_)) = side {
                    return Err(FilterError::Compile(format!(
                        "operator {op} cannot order boolean {lit}"
                    )));
                }
            }
        }

        let lhs = self.lower_term(lhs)?;
        let rhs = self.lower_term(rhs)?;
        if self.terms[lhs].is_constant() && self.terms[rhs].is_constant() {
            let l = eval_term(&self.terms, lhs, &|_| Value::Missing);
            let r = eval_term(&self.terms, rhs, &|_| Value::Missing);
            return Ok(Lowered::Const(compare::compare(l, op, r)));
        }
        if matches!(self.terms[lhs], Term::Absent) || matches!(self.terms[rhs], Term::Absent) {
            return Ok(Lowered::Const(op == RelOp::Ne));
        }

        let kind = match (self.known(lhs), self.known(rhs)) {
            (Some(a), Some(b)) if a != b => return Ok(Lowered::Const(op == RelOp::Ne)),
            (Some(Known::Number), _) | (_, Some(Known::Number)) => CompareKind::Numeric,
            (Some(Known::Text), _) | (_, Some(Known::Text)) => CompareKind::Text,
            _ => CompareKind::Dynamic,
        };
        Ok(Lowered::Clause(self.push_clause(Clause::Compare { lhs, op, rhs, kind })))
    }

    fn known(&self, term: TermId) -> Option<Known> {
        match &self.terms[term] {
            Term::Const(Literal::Int(_) | Literal::Float(_)) => Some(Known::Number),
            Term::Const(Literal::Str(_)) => Some(Known::Text),
            Term::Const(Literal::Bool(_)) => Some(Known::Bool),
            Term::Numeric1 { .. } | Term::Numeric2 { .. } | Term::Date(_) => Some(Known::Number),
            Term::Absent | Term::Field(_) => None,
        }
    }

    fn lower_term(&mut self, operand: &Operand) -> Result<TermId> {
        match operand {
            Operand::Literal(lit) => Ok(self.push_term(Term::Const(lit.clone()))),
            Operand::Field(path) => {
                let slot = self.intern(path);
                Ok(self.push_term(Term::Field(slot)))
            }
            Operand::Func(call) => self.lower_call(call),
        }
    }

    fn lower_call(&mut self, call: &FuncCall) -> Result<TermId> {
        let name = call.func.name();
        if call.func != ValueFunction::Date {
            for arg in &call.args {
                if let Operand::Literal(lit @ (Literal::Str(_) | Literal::Bool(_))) = arg {
                    return Err(FilterError::Compile(format!(
                        "{name} expects a number, got {lit}"
                    )));
                }
            }
        }

        let mark = self.terms.len();
        let args = call
            .args
            .iter()
            .map(|arg| self.lower_term(arg))
            .collect::<Result<Vec<_>>>()?;
        let no_evaluator = || FilterError::Compile(format!("no evaluator for {name}"));

        let term = match (call.func, args.as_slice()) {
            (ValueFunction::Date, [arg]) => Term::Date(*arg),
            (func, []) => Term::Const(Literal::Float(functions::constant(func).ok_or_else(no_evaluator)?)),
            (func, [arg]) => Term::Numeric1 {
                f: functions::unary(func).ok_or_else(no_evaluator)?,
                arg: *arg,
            },
            (func, [lhs, rhs]) => Term::Numeric2 {
                f: functions::binary(func).ok_or_else(no_evaluator)?,
                lhs: *lhs,
                rhs: *rhs,
            },
            _ => return Err(no_evaluator()),
        };

        let constant = args.iter().all(|arg| self.terms[*arg].is_constant());
        let id = self.push_term(term);
        if !constant {
            return Ok(id);
        }

        let folded = Term::from_value(eval_term(&self.terms, id, &|_| Value::Missing));
        self.terms.truncate(mark);
        Ok(self.push_term(folded))
    }

    fn lower_bool_call(&mut self, call: &BoolCall) -> Result<Lowered> {
        match call.func {
            BoolFunction::RegexpContains => {
                let [subject, pattern] = call.args.as_slice() else {
                    return Err(FilterError::Compile(format!(
                        "{} takes 2 arguments",
                        call.func.name()
                    )));
                };
                let Operand::Literal(Literal::Str(pattern)) = pattern else {
                    return Err(FilterError::Compile(format!(
                        "{} pattern must be a string literal, got {pattern}",
                        call.func.name()
                    )));
                };
                let regex = Regex::new(pattern).map_err(|err| {
                    FilterError::Compile(format!("invalid pattern {pattern:?}: {err}"))
                })?;

                let subject = self.lower_term(subject)?;
                if self.terms[subject].is_constant() {
                    let value = eval_term(&self.terms, subject, &|_| Value::Missing);
                    return Ok(Lowered::Const(value.as_str().is_some_and(|s| regex.is_match(s))));
                }

                self.regexes.push(regex);
                let regex = self.regexes.len() - 1;
                Ok(Lowered::Clause(self.push_clause(Clause::Regex { subject, regex })))
            }
        }
    }
}
