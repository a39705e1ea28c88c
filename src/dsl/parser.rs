//! Parser for the filter language.
//!
//! Grammar (in rough EBNF, lowest precedence first):
//!
//! expr      = disjunct ("OR" disjunct)*
//! disjunct  = conjunct ("AND" conjunct)*
//! conjunct  = "NOT"* (atom | "(" expr ")")
//! atom      = BOOL | operand relop operand | operand checkop | boolfunc
//! checkop   = "IS" ["NOT"] "NULL" | "EXISTS" | "NOT" "EXISTS"
//! operand   = fieldpath | literal | NAME "(" [operand ("," operand)*] ")"
//! fieldpath = segment ("." segment)*
//! segment   = (IDENT | QUOTED | "META" "(" ")") ("[" DIGITS "]")*
//!
//! Parentheses are parsed leniently: a `)` with nothing to close at the top
//! level is recorded on the tree, and running out of input inside a group
//! leaves the group unclosed. [`FilterTree::output`] rejects both.

use super::ast::{FilterTree, Node, NodeId};
use super::lexer::{Spanned, Token, tokenize};
use super::path::{FieldPath, META_SEGMENT, PathSegment, is_keyword};
use super::value::{BoolCall, BoolFunction, CheckOp, FuncCall, Literal, Operand, RelOp, ValueFunction};
use crate::error::FilterError;

/// Deepest allowed nesting of groups, `NOT`s and function calls combined.
pub const MAX_NESTING: usize = 256;

/// Parser state.
struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    nodes: Vec<Node>,
    stray_closers: Vec<NodeId>,
    /// Open groups, negations and calls around the current position.
    nesting: usize,
}

type Result<T> = std::result::Result<T, FilterError>;

fn relop(token: &Token) -> Option<RelOp> {
    match token {
        Token::Eq => Some(RelOp::Eq),
        Token::Ne => Some(RelOp::Ne),
        Token::Lt => Some(RelOp::Lt),
        Token::Le => Some(RelOp::Le),
        Token::Gt => Some(RelOp::Gt),
        Token::Ge => Some(RelOp::Ge),
        _ => None,
    }
}

fn is_word(token: &Token, word: &str) -> bool {
    matches!(token, Token::Ident(name) if name.eq_ignore_ascii_case(word))
}

fn bool_word(token: &Token) -> Option<bool> {
    if is_word(token, "TRUE") {
        Some(true)
    } else if is_word(token, "FALSE") {
        Some(false)
    } else {
        None
    }
}

/// Whether `token` can follow an operand to form a condition.
fn starts_predicate(token: &Token) -> bool {
    relop(token).is_some()
        || is_word(token, "IS")
        || is_word(token, "EXISTS")
        || is_word(token, "NOT")
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            nodes: Vec::new(),
            stray_closers: Vec::new(),
            nesting: 0,
        }
    }

    /// Go `levels` deeper, failing once past [`MAX_NESTING`].
    fn enter(&mut self, levels: usize) -> Result<()> {
        self.nesting += levels;
        if self.nesting > MAX_NESTING {
            let offset = self.peek().offset;
            return Err(FilterError::syntax(
                offset,
                format!("expression nested deeper than {MAX_NESTING} levels"),
            ));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.nesting -= levels;
    }

    // The token list always ends with Eof and `advance` never moves past it.
    fn peek(&self) -> &Spanned {
        &self.tokens[self.pos]
    }

    fn peek_token(&self) -> &Token {
        &self.peek().token
    }

    fn peek_at(&self, ahead: usize) -> &Token {
        self.tokens
            .get(self.pos + ahead)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let Spanned { token, offset } = self.advance();
        if token == expected {
            Ok(())
        } else {
            Err(FilterError::syntax(
                offset,
                format!("expected {expected}, got {token}"),
            ))
        }
    }

    fn unexpected<T>(&self, what: &str) -> Result<T> {
        let Spanned { token, offset } = self.peek();
        Err(FilterError::syntax(*offset, format!("expected {what}, got {token}")))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Parse OR expression: disjunct ("OR" disjunct)*
    fn parse_expr(&mut self, depth: usize) -> Result<NodeId> {
        let first = self.parse_disjunct(depth)?;
        if !is_word(self.peek_token(), "OR") {
            return Ok(first);
        }

        let mut members = vec![first];
        while is_word(self.peek_token(), "OR") {
            self.advance(); // consume OR
            members.push(self.parse_disjunct(depth)?);
        }
        Ok(self.push(Node::Or(members)))
    }

    /// Parse AND expression: conjunct ("AND" conjunct)*
    fn parse_disjunct(&mut self, depth: usize) -> Result<NodeId> {
        let first = self.parse_conjunct(depth)?;
        if !is_word(self.peek_token(), "AND") {
            return Ok(first);
        }

        let mut members = vec![first];
        while is_word(self.peek_token(), "AND") {
            self.advance(); // consume AND
            members.push(self.parse_conjunct(depth)?);
        }
        Ok(self.push(Node::And(members)))
    }

    /// Parse negated or grouped condition: "NOT"* (atom | "(" expr ")")
    fn parse_conjunct(&mut self, depth: usize) -> Result<NodeId> {
        let mut negations = 0;
        while is_word(self.peek_token(), "NOT") {
            self.advance(); // consume NOT
            negations += 1;
        }

        self.enter(negations)?;
        let mut id = if *self.peek_token() == Token::LParen {
            self.parse_group(depth)?
        } else {
            self.parse_atom()?
        };
        self.leave(negations);
        for _ in 0..negations {
            id = self.push(Node::Not(id));
        }

        if depth == 0 {
            while *self.peek_token() == Token::RParen {
                self.advance();
                self.stray_closers.push(id);
            }
        }
        Ok(id)
    }

    /// Parse parenthesized group: "(" expr ")"
    fn parse_group(&mut self, depth: usize) -> Result<NodeId> {
        self.advance(); // consume (
        self.enter(1)?;
        let inner = self.parse_expr(depth + 1)?;
        self.leave(1);
        let closed = match self.peek_token() {
            Token::RParen => {
                self.advance();
                true
            }
            Token::Eof => false,
            _ => return self.unexpected("')'"),
        };
        Ok(self.push(Node::Paren { inner, closed }))
    }

    /// Parse a single condition.
    fn parse_atom(&mut self) -> Result<NodeId> {
        let token = self.peek_token().clone();

        if let Token::Ident(name) = &token
            && *self.peek_at(1) == Token::LParen
            && let Some(func) = BoolFunction::from_name(name)
        {
            let call = self.parse_bool_call(func)?;
            return Ok(self.push(Node::BoolCall(call)));
        }

        if let Some(value) = bool_word(&token)
            && !starts_predicate(self.peek_at(1))
        {
            self.advance();
            return Ok(self.push(Node::Bool(value)));
        }

        let lhs = self.parse_operand()?;
        let node = self.parse_predicate(lhs)?;
        Ok(self.push(node))
    }

    /// Parse what follows an operand: a comparison or a presence check.
    fn parse_predicate(&mut self, operand: Operand) -> Result<Node> {
        if let Some(op) = relop(self.peek_token()) {
            self.advance();
            let rhs = self.parse_operand()?;
            return Ok(Node::Compare {
                lhs: operand,
                op,
                rhs,
            });
        }

        let check = if is_word(self.peek_token(), "IS") {
            self.advance();
            let negated = is_word(self.peek_token(), "NOT");
            if negated {
                self.advance();
            }
            if !is_word(self.peek_token(), "NULL") {
                return self.unexpected("NULL");
            }
            self.advance();
            if negated { CheckOp::IsNotNull } else { CheckOp::IsNull }
        } else if is_word(self.peek_token(), "EXISTS") {
            self.advance();
            CheckOp::Exists
        } else if is_word(self.peek_token(), "NOT") && is_word(self.peek_at(1), "EXISTS") {
            self.advance();
            self.advance();
            CheckOp::NotExists
        } else {
            return self.unexpected("comparison operator, IS or EXISTS");
        };

        Ok(Node::Check { operand, check })
    }

    /// Parse operand: field path, literal or value function call.
    fn parse_operand(&mut self) -> Result<Operand> {
        let Spanned { token, offset } = self.peek().clone();
        match &token {
            Token::Str(s) => {
                let lit = Literal::Str(s.clone());
                self.advance();
                Ok(Operand::Literal(lit))
            }
            Token::Int(n) => {
                let lit = Literal::Int(*n);
                self.advance();
                Ok(Operand::Literal(lit))
            }
            Token::Float(n) => {
                let lit = Literal::Float(*n);
                self.advance();
                Ok(Operand::Literal(lit))
            }
            Token::Ident(_) if bool_word(&token).is_some() => {
                let value = bool_word(&token) == Some(true);
                self.advance();
                Ok(Operand::Literal(Literal::Bool(value)))
            }
            Token::Ident(word) if is_keyword(word) => Err(FilterError::syntax(
                offset,
                format!("expected operand, got keyword {token}"),
            )),
            Token::Ident(name) if name != "META" && *self.peek_at(1) == Token::LParen => {
                self.parse_func_call(name, offset).map(Operand::Func)
            }
            Token::Ident(_) | Token::Quoted(_) => self.parse_field_path().map(Operand::Field),
            _ => self.unexpected("operand"),
        }
    }

    fn parse_func_call(&mut self, name: &str, offset: usize) -> Result<FuncCall> {
        if BoolFunction::from_name(name).is_some() {
            return Err(FilterError::syntax(
                offset,
                format!("{name} is a condition and cannot be used as a value"),
            ));
        }
        let Some(func) = ValueFunction::from_name(name) else {
            return Err(FilterError::UnknownFunction {
                name: name.to_string(),
                offset,
            });
        };

        self.advance(); // consume name
        let args = self.parse_args(func.name(), func.arity())?;
        Ok(FuncCall { func, args })
    }

    fn parse_bool_call(&mut self, func: BoolFunction) -> Result<BoolCall> {
        self.advance(); // consume name
        let args = self.parse_args(func.name(), func.arity())?;
        Ok(BoolCall { func, args })
    }

    /// Parse "(" [operand ("," operand)*] ")" and check the count.
    fn parse_args(&mut self, name: &'static str, arity: usize) -> Result<Vec<Operand>> {
        self.expect(Token::LParen)?;
        self.enter(1)?;
        let mut args = Vec::with_capacity(arity);
        if *self.peek_token() != Token::RParen {
            args.push(self.parse_operand()?);
            while *self.peek_token() == Token::Comma {
                self.advance(); // consume ,
                args.push(self.parse_operand()?);
            }
        }
        self.expect(Token::RParen)?;
        self.leave(1);

        if args.len() != arity {
            return Err(FilterError::Arity {
                name,
                expected: arity,
                found: args.len(),
            });
        }
        Ok(args)
    }

    /// Parse field path: segment ("." segment)*
    fn parse_field_path(&mut self) -> Result<FieldPath> {
        let offset = self.peek().offset;
        let mut segments = vec![self.parse_segment(true)?];
        while *self.peek_token() == Token::Dot {
            self.advance(); // consume .
            segments.push(self.parse_segment(false)?);
        }
        FieldPath::new(segments).ok_or_else(|| FilterError::syntax(offset, "empty field path"))
    }

    /// Parse one segment and its array indices.
    fn parse_segment(&mut self, first: bool) -> Result<PathSegment> {
        let Spanned { token, offset } = self.advance();
        let mut segment = match token {
            Token::Ident(name) if first && name == "META" && *self.peek_token() == Token::LParen => {
                self.advance(); // consume (
                self.expect(Token::RParen)?;
                PathSegment::new(META_SEGMENT)
            }
            Token::Ident(name) | Token::Quoted(name) => PathSegment::new(name),
            other => {
                return Err(FilterError::syntax(
                    offset,
                    format!("expected field name, got {other}"),
                ));
            }
        };

        while *self.peek_token() == Token::LBracket {
            self.advance(); // consume [
            let Spanned { token, offset } = self.advance();
            match token {
                Token::Int(n) if n >= 0 => {
                    let index = usize::try_from(n)
                        .map_err(|_| FilterError::syntax(offset, "array index too large"))?;
                    segment.push_index(index);
                }
                Token::Int(_) => return Err(FilterError::NegativeIndex { offset }),
                other => {
                    return Err(FilterError::syntax(
                        offset,
                        format!("expected array index, got {other}"),
                    ));
                }
            }
            self.expect(Token::RBracket)?;
        }
        Ok(segment)
    }
}

/// Parse filter source text into a [`FilterTree`].
///
/// Empty (or whitespace-only) source parses as `TRUE`.
pub fn parse_filter(source: &str) -> Result<FilterTree> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);

    if *parser.peek_token() == Token::Eof {
        let root = parser.push(Node::Bool(true));
        return Ok(FilterTree::new(parser.nodes, root, Vec::new()));
    }

    let root = parser.parse_expr(0)?;

    // Ensure we consumed all tokens
    if *parser.peek_token() != Token::Eof {
        return parser.unexpected("AND, OR or end of input");
    }

    Ok(FilterTree::new(parser.nodes, root, parser.stray_closers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare_parts(tree: &FilterTree) -> (&Operand, RelOp, &Operand) {
        match tree.root_node() {
            Node::Compare { lhs, op, rhs } => (lhs, *op, rhs),
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    fn segment_names(operand: &Operand) -> Vec<String> {
        operand
            .as_field()
            .unwrap()
            .segments()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    #[test]
    fn test_single_bool() {
        let tree = parse_filter("TRUE").unwrap();
        assert_eq!(tree.root_node(), &Node::Bool(true));
        let tree = parse_filter("false").unwrap();
        assert_eq!(tree.root_node(), &Node::Bool(false));
    }

    #[test]
    fn test_empty_filter() {
        let tree = parse_filter("   ").unwrap();
        assert_eq!(tree.root_node(), &Node::Bool(true));
    }

    #[test]
    fn test_precedence() {
        let tree = parse_filter("TRUE OR FALSE AND NOT FALSE").unwrap();
        let Node::Or(members) = tree.root_node() else {
            panic!("expected OR at the root");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(tree.node(members[0]), &Node::Bool(true));

        let Node::And(conjuncts) = tree.node(members[1]) else {
            panic!("expected AND under OR");
        };
        assert_eq!(tree.node(conjuncts[0]), &Node::Bool(false));
        let Node::Not(inner) = tree.node(conjuncts[1]) else {
            panic!("expected NOT");
        };
        assert_eq!(tree.node(*inner), &Node::Bool(false));
    }

    #[test]
    fn test_groups_are_kept() {
        let tree = parse_filter("((TRUE OR FALSE))").unwrap();
        let Node::Paren { inner, closed } = tree.root_node() else {
            panic!("expected group");
        };
        assert!(closed);
        assert!(matches!(tree.node(*inner), Node::Paren { closed: true, .. }));
        assert!(matches!(tree.node(tree.unparen(tree.root())), Node::Or(_)));
    }

    #[test]
    fn test_and_between_groups() {
        let tree = parse_filter("TRUE AND (TRUE OR FALSE) AND FALSE").unwrap();
        let Node::And(members) = tree.root_node() else {
            panic!("expected AND");
        };
        assert_eq!(members.len(), 3);
        assert!(matches!(tree.node(members[1]), Node::Paren { .. }));
    }

    #[test]
    fn test_not_stacks() {
        let tree = parse_filter("NOT NOT NOT TRUE").unwrap();
        let mut id = tree.root();
        for _ in 0..3 {
            let Node::Not(inner) = tree.node(id) else {
                panic!("expected NOT");
            };
            id = *inner;
        }
        assert_eq!(tree.node(id), &Node::Bool(true));
    }

    #[test]
    fn test_dotted_path_comparison() {
        let tree = parse_filter("fieldpath.path >= field2").unwrap();
        let (lhs, op, rhs) = compare_parts(&tree);
        assert_eq!(segment_names(lhs), vec!["fieldpath", "path"]);
        assert_eq!(op, RelOp::Ge);
        assert_eq!(rhs.as_field().unwrap().to_string(), "field2");
    }

    #[test]
    fn test_checks() {
        let cases = [
            ("a IS NULL", CheckOp::IsNull),
            ("a is not null", CheckOp::IsNotNull),
            ("a EXISTS", CheckOp::Exists),
            ("a NOT EXISTS", CheckOp::NotExists),
        ];
        for (source, expected) in cases {
            let tree = parse_filter(source).unwrap();
            match tree.root_node() {
                Node::Check { check, .. } => assert_eq!(*check, expected, "{source}"),
                other => panic!("expected check for {source}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_string_literal_rhs() {
        let tree = parse_filter("fieldpath.path = \"value\"").unwrap();
        let (_, op, rhs) = compare_parts(&tree);
        assert_eq!(op, RelOp::Eq);
        assert_eq!(rhs.as_literal(), Some(&Literal::Str("value".into())));
    }

    #[test]
    fn test_bool_literal_operand() {
        let tree = parse_filter("Testdoc = true").unwrap();
        let (lhs, _, rhs) = compare_parts(&tree);
        assert_eq!(segment_names(lhs), vec!["Testdoc"]);
        assert_eq!(rhs.as_literal(), Some(&Literal::Bool(true)));
    }

    #[test]
    fn test_quoted_segment_is_single() {
        let tree = parse_filter("`onePath.Only` < field2").unwrap();
        let (lhs, _, _) = compare_parts(&tree);
        assert_eq!(segment_names(lhs), vec!["onePath.Only"]);
    }

    #[test]
    fn test_meta_prefix() {
        let tree = parse_filter("META().`onePath.Only` = \"value\"").unwrap();
        let (lhs, _, _) = compare_parts(&tree);
        assert_eq!(segment_names(lhs), vec!["META()", "onePath.Only"]);
    }

    #[test]
    fn test_array_indices() {
        let tree =
            parse_filter("arrayPath[1].path2.arrayPath3[10].`multiword array`[20] = fieldpath2.path2")
                .unwrap();
        let (lhs, _, _) = compare_parts(&tree);
        let segments = lhs.as_field().unwrap().segments();
        assert_eq!(segments[0].name(), "arrayPath");
        assert_eq!(segments[0].indices(), &[1]);
        assert!(segments[1].indices().is_empty());
        assert_eq!(segments[2].to_string(), "arrayPath3[10]");
        assert_eq!(segments[3].name(), "multiword array");
        assert_eq!(segments[3].indices(), &[20]);
    }

    #[test]
    fn test_negative_index_rejected() {
        let err = parse_filter("`2DarrayPath`[1][-2] = fieldpath2.path2").unwrap_err();
        assert!(matches!(err, FilterError::NegativeIndex { .. }));
        let err =
            parse_filter("arrayPath[1].path2.arrayPath3[-10].`multiword array`[20] = x").unwrap_err();
        assert!(matches!(err, FilterError::NegativeIndex { .. }));
    }

    #[test]
    fn test_leading_digit_needs_quotes() {
        assert!(parse_filter("1DarrayPath[1] = \"a\"").unwrap_err().is_syntax());
        assert!(parse_filter("`1DarrayPath`[1] = \"a\"").is_ok());
    }

    #[test]
    fn test_nested_functions() {
        let tree = parse_filter("fieldpath.path >= ABS(CEIL(PI()))").unwrap();
        let (_, _, rhs) = compare_parts(&tree);
        let abs = rhs.as_func().unwrap();
        assert_eq!(abs.func, ValueFunction::Abs);
        let ceil = abs.args[0].as_func().unwrap();
        assert_eq!(ceil.func, ValueFunction::Ceil);
        let pi = ceil.args[0].as_func().unwrap();
        assert_eq!(pi.func, ValueFunction::Pi);
        assert!(pi.args.is_empty());
    }

    #[test]
    fn test_binary_function() {
        let tree = parse_filter("fieldpath.path <> POW(ABS(CEIL(PI())),2)").unwrap();
        let (_, op, rhs) = compare_parts(&tree);
        assert_eq!(op, RelOp::Ne);
        let pow = rhs.as_func().unwrap();
        assert_eq!(pow.func, ValueFunction::Pow);
        assert_eq!(pow.args[0].as_func().unwrap().func, ValueFunction::Abs);
        assert_eq!(pow.args[1].as_literal(), Some(&Literal::Int(2)));
    }

    #[test]
    fn test_function_with_quoted_field() {
        let tree = parse_filter("fieldpath.path = DATE(`field with spaces`)").unwrap();
        let (_, _, rhs) = compare_parts(&tree);
        let date = rhs.as_func().unwrap();
        assert_eq!(date.func, ValueFunction::Date);
        assert_eq!(segment_names(&date.args[0]), vec!["field with spaces"]);
    }

    #[test]
    fn test_bool_function() {
        let tree = parse_filter("REGEXP_CONTAINS(`[$%XDCRInternalKey*%$]`, \"^xyz*\")").unwrap();
        let Node::BoolCall(call) = tree.root_node() else {
            panic!("expected boolean call");
        };
        assert_eq!(call.func, BoolFunction::RegexpContains);
        assert_eq!(segment_names(&call.args[0]), vec!["[$%XDCRInternalKey*%$]"]);
        assert_eq!(call.args[1].as_literal(), Some(&Literal::Str("^xyz*".into())));
    }

    #[test]
    fn test_bool_function_in_and() {
        let tree = parse_filter(
            "fieldpath.path = POW(ABS(CEIL(PI())),2) AND REGEXP_CONTAINS(fieldPath2, \"^abc*$\")",
        )
        .unwrap();
        let Node::And(members) = tree.root_node() else {
            panic!("expected AND");
        };
        assert_eq!(members.len(), 2);
        assert!(matches!(tree.node(members[1]), Node::BoolCall(_)));
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(
            parse_filter("a = ABS(1, 2)").unwrap_err(),
            FilterError::Arity {
                name: "ABS",
                expected: 1,
                found: 2
            }
        );
        assert!(matches!(
            parse_filter("a = abs(1)").unwrap_err(),
            FilterError::UnknownFunction { .. }
        ));
        assert!(matches!(
            parse_filter("REGEXP_CONTAINS(a)").unwrap_err(),
            FilterError::Arity { expected: 2, found: 1, .. }
        ));
        assert!(parse_filter("a = REGEXP_CONTAINS(b, \"x\")").unwrap_err().is_syntax());
    }

    #[test]
    fn test_malformed_streams() {
        for source in ["a =", "AND TRUE", "TRUE OR", "a = = b", "()", "a.", "a[x] = 1", "TRUE FALSE"] {
            let err = parse_filter(source).unwrap_err();
            assert!(err.is_syntax(), "{source}: {err:?}");
        }
    }

    #[test]
    fn test_lenient_parenthesis() {
        let tree = parse_filter("(TRUE) OR FALSE)").unwrap();
        assert_eq!(tree.stray_closers().len(), 1);

        let tree = parse_filter("((TRUE)").unwrap();
        assert!(matches!(tree.root_node(), Node::Paren { closed: false, .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let deep_not = format!("{}TRUE", "NOT ".repeat(200_000));
        assert!(parse_filter(&deep_not).unwrap_err().is_syntax());

        let deep_parens = format!("{}TRUE{}", "(".repeat(50_000), ")".repeat(50_000));
        assert!(parse_filter(&deep_parens).unwrap_err().is_syntax());

        let deep_calls = format!("a = {}1{}", "ABS(".repeat(1_000), ")".repeat(1_000));
        assert!(parse_filter(&deep_calls).unwrap_err().is_syntax());

        let at_limit = format!("{}TRUE{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parse_filter(&at_limit).unwrap().output().is_ok());

        let mixed = format!("{}(TRUE)", "NOT ".repeat(MAX_NESTING));
        assert!(parse_filter(&mixed).unwrap_err().is_syntax());
    }

    #[test]
    fn test_display_round_trip() {
        let sources = [
            "TRUE OR FALSE AND NOT FALSE",
            "(TRUE OR FALSE) AND (FALSE OR TRUE) AND TRUE",
            "NOT NOT NOT TRUE",
            "fieldpath.path >= ABS(CEIL(PI()))",
            "`onePath.Only` <> \"value\" OR `onePath.Only` <> \"value2\"",
            "`[$%XDCRInternalMeta*%$]`.metaKey EXISTS AND `[$%XDCRInternalMeta*%$]`.metaKey = \"value\"",
            "META().`onePath.Only` = \"value\"",
            "a.`META()` = 1 AND `META()`.b.`META()`[0] EXISTS",
            "arrayPath[1].path2.`multiword array`[20] = -2.5",
            "a IS NOT NULL AND b NOT EXISTS",
            "REGEXP_CONTAINS(`[$%XDCRInternalKey*%$]`, \"^xyz*\")",
            "(TRUE) OR FALSE)",
        ];
        for source in sources {
            let tree = parse_filter(source).unwrap();
            let text = tree.to_string();
            let reparsed = parse_filter(&text).unwrap();
            assert_eq!(tree, reparsed, "{source} -> {text}");
        }
    }

    #[test]
    fn test_canonical_spelling() {
        let tree = parse_filter("a != 1 and not b is null").unwrap();
        assert_eq!(tree.to_string(), "a <> 1 AND NOT b IS NULL");
    }
}
