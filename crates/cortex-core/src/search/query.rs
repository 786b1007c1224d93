//! # Match Query Syntax
//!
//! The query language of the indexed backend, a small subset of the usual
//! full-text "match" syntax:
//!
//! ```text
//! rust async            both terms (implicit AND)
//! rust AND async        same, explicit
//! rust OR go            either term
//! rust NOT unsafe       first without the second
//! "graph database"      adjacent terms, in order
//! graph*                any term with this prefix
//! (rust OR go) NOT c    grouping
//! ```
//!
//! Operators are recognised only in upper case. Terms are normalised with the
//! same tokenizer the index uses, so `foo-bar` is the phrase `"foo bar"`.

use thiserror::Error;

/// Why a query could not be parsed under the match syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    #[error("empty query")]
    Empty,
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("unbalanced parenthesis")]
    UnbalancedParen,
    #[error("operator '{0}' is missing an operand")]
    MissingOperand(&'static str),
    #[error("term '{0}' has no searchable characters")]
    EmptyTerm(String),
    #[error("prefix '{0}' must be a single word")]
    InvalidPrefix(String),
}

/// Parsed query tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    Term(String),
    Prefix(String),
    Phrase(Vec<String>),
    And(Vec<QueryExpr>),
    Or(Vec<QueryExpr>),
    Not(Box<QueryExpr>),
}

/// Split text into lower-cased alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Parse a match query.
pub fn parse(query: &str) -> Result<QueryExpr, QueryParseError> {
    let tokens = lex(query)?;
    if tokens.is_empty() {
        return Err(QueryParseError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::RParen) => Err(QueryParseError::UnbalancedParen),
        Some(_) => Err(QueryParseError::MissingOperand("AND")),
    }
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    LParen,
    RParen,
    And,
    Or,
    Not,
}

fn lex(query: &str) -> Result<Vec<Token>, QueryParseError> {
    let mut tokens = Vec::new();
    let mut chars = query.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' => {
                chars.next();
                let mut phrase = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    phrase.push(c);
                }
                if !closed {
                    return Err(QueryParseError::UnterminatedQuote);
                }
                tokens.push(Token::Quoted(phrase));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Word(word),
                });
            }
        }
    }

    Ok(tokens)
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<QueryExpr, QueryParseError> {
        let mut branches = vec![self.and_expr()?];
        while self.peek() == Some(&Token::Or) {
            self.advance();
            if !self.starts_operand() {
                return Err(QueryParseError::MissingOperand("OR"));
            }
            branches.push(self.and_expr()?);
        }
        Ok(collapse(branches, QueryExpr::Or))
    }

    fn and_expr(&mut self) -> Result<QueryExpr, QueryParseError> {
        let mut parts = vec![self.unary()?];
        loop {
            if self.peek() == Some(&Token::And) {
                self.advance();
                if !self.starts_operand() {
                    return Err(QueryParseError::MissingOperand("AND"));
                }
            } else if !self.starts_operand() {
                break;
            }
            parts.push(self.unary()?);
        }
        Ok(collapse(parts, QueryExpr::And))
    }

    fn unary(&mut self) -> Result<QueryExpr, QueryParseError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            if !self.starts_operand() {
                return Err(QueryParseError::MissingOperand("NOT"));
            }
            return Ok(QueryExpr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<QueryExpr, QueryParseError> {
        match self.advance() {
            Some(Token::Word(word)) => word_expr(&word),
            Some(Token::Quoted(text)) => {
                let terms = tokenize(&text);
                if terms.is_empty() {
                    return Err(QueryParseError::EmptyTerm(text));
                }
                Ok(phrase(terms))
            }
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                if self.advance() != Some(Token::RParen) {
                    return Err(QueryParseError::UnbalancedParen);
                }
                Ok(inner)
            }
            Some(Token::RParen) => Err(QueryParseError::UnbalancedParen),
            Some(Token::And) => Err(QueryParseError::MissingOperand("AND")),
            Some(Token::Or) => Err(QueryParseError::MissingOperand("OR")),
            Some(Token::Not) => Err(QueryParseError::MissingOperand("NOT")),
            None => Err(QueryParseError::Empty),
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Word(_) | Token::Quoted(_) | Token::LParen | Token::Not)
        )
    }
}

fn word_expr(word: &str) -> Result<QueryExpr, QueryParseError> {
    if let Some(stem) = word.strip_suffix('*') {
        let terms = tokenize(stem);
        return match terms.as_slice() {
            [single] => Ok(QueryExpr::Prefix(single.clone())),
            _ => Err(QueryParseError::InvalidPrefix(word.to_string())),
        };
    }

    let terms = tokenize(word);
    if terms.is_empty() {
        return Err(QueryParseError::EmptyTerm(word.to_string()));
    }
    Ok(phrase(terms))
}

fn phrase(mut terms: Vec<String>) -> QueryExpr {
    if terms.len() == 1 {
        if let Some(term) = terms.pop() {
            return QueryExpr::Term(term);
        }
    }
    QueryExpr::Phrase(terms)
}

fn collapse(mut items: Vec<QueryExpr>, wrap: fn(Vec<QueryExpr>) -> QueryExpr) -> QueryExpr {
    if items.len() == 1 {
        if let Some(item) = items.pop() {
            return item;
        }
    }
    wrap(items)
}

// =============================================================================
// TESTS
// =============================================================================
