//! Lexer/tokenizer for the filter language.

use crate::error::FilterError;
use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

/// Token types for the filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Names and values
    Ident(String),  // bare identifier, keyword or function name
    Quoted(String), // `backtick quoted` identifier
    Int(i64),
    Float(f64),
    Str(String), // "double quoted"

    // Relational operators
    Eq, // =
    Ne, // <> or !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=

    // Punctuation
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Comma,    // ,
    Dot,      // .

    // End of input
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "'{name}'"),
            Token::Quoted(name) => write!(f, "`{name}`"),
            Token::Int(n) => write!(f, "{n}"),
            Token::Float(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "{s:?}"),
            Token::Eq => f.write_str("'='"),
            Token::Ne => f.write_str("'<>'"),
            Token::Lt => f.write_str("'<'"),
            Token::Le => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Ge => f.write_str("'>='"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Dot => f.write_str("'.'"),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn skip_space(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}

/// Lex a bare identifier: `[A-Za-z_][A-Za-z0-9_]*`.
fn lex_ident(input: &mut &str) -> PResult<Token> {
    let ident = (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(Token::Ident(ident.to_string()))
}

/// Lex a number (integer or float), with an optional leading minus.
fn lex_number(input: &mut &str) -> PResult<Token> {
    let text = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)?;

    if !text.contains('.')
        && let Ok(n) = text.parse::<i64>()
    {
        return Ok(Token::Int(n));
    }
    let n: f64 = text
        .parse()
        .map_err(|_| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::default()))?;
    Ok(Token::Float(n))
}

/// Lex text between `delim` characters, resolving backslash escapes.
///
/// Inside backticks only `` \` `` and `\\` are escapes; string literals also
/// understand `\/`, `\n`, `\t` and `\r`. Unknown escapes are kept verbatim.
fn lex_delimited(input: &mut &str, delim: char) -> PResult<String> {
    one_of(delim).void().parse_next(input)?;
    let mut text = String::new();
    loop {
        let chunk = take_till(0.., (delim, '\\')).parse_next(input)?;
        text.push_str(chunk);
        let c = any.parse_next(input)?;
        if c == delim {
            return Ok(text);
        }
        let escaped = any.parse_next(input)?;
        match escaped {
            c if c == delim || c == '\\' => text.push(c),
            '/' if delim == '"' => text.push('/'),
            'n' if delim == '"' => text.push('\n'),
            't' if delim == '"' => text.push('\t'),
            'r' if delim == '"' => text.push('\r'),
            other => {
                text.push('\\');
                text.push(other);
            }
        }
    }
}

/// Lex a single token that is not quoted.
fn lex_token(input: &mut &str) -> PResult<Token> {
    alt((
        // Multi-char operators first
        "<>".value(Token::Ne),
        "!=".value(Token::Ne),
        "<=".value(Token::Le),
        ">=".value(Token::Ge),
        // Single-char operators
        "=".value(Token::Eq),
        "<".value(Token::Lt),
        ">".value(Token::Gt),
        "(".value(Token::LParen),
        ")".value(Token::RParen),
        "[".value(Token::LBracket),
        "]".value(Token::RBracket),
        ",".value(Token::Comma),
        ".".value(Token::Dot),
        // Number (before ident to catch negative numbers)
        lex_number,
        lex_ident,
    ))
    .parse_next(input)
}

/// Tokenize the entire input.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FilterError> {
    let mut remaining = source;
    let mut tokens = Vec::new();

    loop {
        skip_space(&mut remaining).map_err(|_| FilterError::syntax(0, "lexer failure"))?;
        let offset = source.len() - remaining.len();
        let Some(first) = remaining.chars().next() else {
            break;
        };

        let token = match first {
            '`' => lex_delimited(&mut remaining, '`')
                .map(Token::Quoted)
                .map_err(|_| FilterError::UnterminatedIdentifier { offset })?,
            '"' => lex_delimited(&mut remaining, '"')
                .map(Token::Str)
                .map_err(|_| FilterError::UnterminatedString { offset })?,
            _ => lex_token(&mut remaining).map_err(|_| {
                FilterError::syntax(offset, format!("unexpected character '{first}'"))
            })?,
        };
        if let Token::Float(n) = token
            && !n.is_finite()
        {
            return Err(FilterError::syntax(offset, "number out of range"));
        }
        tokens.push(Spanned { token, offset });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}
