//! Query lexer and recursive-descent parser.
//!
//! Keywords are matched case-insensitively, as the grammar requires.
//! Prefixed names are resolved against the query's own `PREFIX`
//! declarations at parse time, so the evaluator only ever sees full
//! IRIs.

use crate::SparqlError;
use bibgraph_core::{vocab, Iri, Literal};
use logos::Logos;
use std::collections::HashMap;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
enum Token<'a> {
    /// Bare word: keywords, the `a` shorthand, aggregate function names.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'a str),

    #[regex(r"\?[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Variable(&'a str),

    #[regex(r"<[^<>\x00-\x20]*>", |lex| lex.slice())]
    IriRef(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*:[A-Za-z_][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*", |lex| lex.slice())]
    PrefixedName(&'a str),

    /// A prefix with an empty local part, as written in declarations.
    #[regex(r"[A-Za-z_][A-Za-z0-9_-]*:", |lex| lex.slice())]
    PrefixNs(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    StringLiteral(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*", |lex| lex.slice())]
    LangTag(&'a str),

    #[token("^^")]
    DoubleCaret,

    #[regex(r"[+-]?[0-9]+", |lex| lex.slice())]
    Integer(&'a str),

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[token("*")]
    Star,
}

/// A parsed `SELECT` query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub distinct: bool,
    pub projection: Projection,
    pub patterns: Vec<TriplePattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    All,
    /// `SELECT ?a ?b`
    Variables(Vec<String>),
    /// `SELECT (count(DISTINCT ?s) as ?n) ...`
    Aggregates(Vec<Aggregate>),
}

/// One `(fn(...) as ?alias)` projection element. The function name is
/// kept verbatim; the evaluator decides whether it is supported.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: String,
    pub distinct: bool,
    /// `None` means `count(*)`.
    pub var: Option<String>,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TermPattern {
    Variable(String),
    Iri(Iri),
    Literal(Literal),
}

impl TermPattern {
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            TermPattern::Variable(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: TermPattern,
    pub predicate: TermPattern,
    pub object: TermPattern,
}

pub fn parse_query(text: &str) -> Result<Query, SparqlError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(text);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(SparqlError::Syntax {
                    message: format!("unexpected character {:?}", &text[span.clone()]),
                    position: span.start,
                })
            }
        }
    }
    Parser {
        tokens,
        pos: 0,
        end: text.len(),
        prefixes: HashMap::new(),
    }
    .parse()
}

struct Parser<'a> {
    tokens: Vec<(Token<'a>, Range<usize>)>,
    pos: usize,
    end: usize,
    prefixes: HashMap<String, String>,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<Query, SparqlError> {
        while self.peek_keyword("PREFIX") {
            self.advance();
            self.parse_prefix_decl()?;
        }
        self.expect_keyword("SELECT")?;

        let distinct = if self.peek_keyword("DISTINCT") {
            self.advance();
            true
        } else {
            false
        };

        let projection = self.parse_projection()?;
        self.expect_keyword("WHERE")?;
        self.expect(Token::LBrace, "'{'")?;

        let mut patterns = Vec::new();
        while !matches!(self.peek(), Some(Token::RBrace)) {
            patterns.push(self.parse_pattern()?);
        }
        self.expect(Token::RBrace, "'}'")?;

        if let Some((_, span)) = self.tokens.get(self.pos) {
            return Err(self.error_at("trailing input after query", span.start));
        }
        if patterns.is_empty() {
            return Err(self.error("at least one triple pattern"));
        }
        Ok(Query {
            distinct,
            projection,
            patterns,
        })
    }

    fn parse_prefix_decl(&mut self) -> Result<(), SparqlError> {
        let prefix = match self.next() {
            Some((Token::PrefixNs(text), _)) => text.trim_end_matches(':').to_string(),
            _ => return Err(self.error("a prefix name before its IRI")),
        };
        match self.next() {
            Some((Token::IriRef(text), _)) => {
                let iri = text[1..text.len() - 1].to_string();
                self.prefixes.insert(prefix, iri);
                Ok(())
            }
            _ => Err(self.error("an IRI in the PREFIX declaration")),
        }
    }

    fn parse_projection(&mut self) -> Result<Projection, SparqlError> {
        match self.peek() {
            Some(Token::Star) => {
                self.advance();
                Ok(Projection::All)
            }
            Some(Token::Variable(_)) => {
                let mut variables = Vec::new();
                while let Some(Token::Variable(name)) = self.peek() {
                    variables.push(name[1..].to_string());
                    self.advance();
                }
                Ok(Projection::Variables(variables))
            }
            Some(Token::LParen) => {
                let mut aggregates = Vec::new();
                while matches!(self.peek(), Some(Token::LParen)) {
                    aggregates.push(self.parse_aggregate()?);
                }
                Ok(Projection::Aggregates(aggregates))
            }
            _ => Err(self.error("'*', a variable list, or an aggregate expression")),
        }
    }

    /// `( fn ( [DISTINCT] ?var | * ) as ?alias )`
    fn parse_aggregate(&mut self) -> Result<Aggregate, SparqlError> {
        self.expect(Token::LParen, "'('")?;
        let function = match self.next() {
            Some((Token::Ident(name), _)) => name.to_string(),
            _ => return Err(self.error("an aggregate function name")),
        };
        self.expect(Token::LParen, "'(' after the function name")?;
        let distinct = if self.peek_keyword("DISTINCT") {
            self.advance();
            true
        } else {
            false
        };
        let var = match self.next() {
            Some((Token::Variable(name), _)) => Some(name[1..].to_string()),
            Some((Token::Star, _)) => None,
            _ => return Err(self.error("a variable or '*' in the aggregate")),
        };
        self.expect(Token::RParen, "')' after the aggregate argument")?;
        self.expect_keyword("AS")?;
        let alias = match self.next() {
            Some((Token::Variable(name), _)) => name[1..].to_string(),
            _ => return Err(self.error("an alias variable after AS")),
        };
        self.expect(Token::RParen, "')' closing the aggregate")?;
        Ok(Aggregate {
            function,
            distinct,
            var,
            alias,
        })
    }

    fn parse_pattern(&mut self) -> Result<TriplePattern, SparqlError> {
        let subject = self.parse_term(false)?;
        let predicate = self.parse_predicate()?;
        let object = self.parse_term(true)?;
        // The final pattern's dot is optional, as in the grammar.
        if matches!(self.peek(), Some(Token::Dot)) {
            self.advance();
        }
        Ok(TriplePattern {
            subject,
            predicate,
            object,
        })
    }

    fn parse_predicate(&mut self) -> Result<TermPattern, SparqlError> {
        if let Some(Token::Ident("a")) = self.peek() {
            self.advance();
            return Ok(TermPattern::Iri(vocab::rdf_type()));
        }
        match self.parse_term(false)? {
            TermPattern::Literal(_) => Err(self.error("an IRI or variable as predicate")),
            term => Ok(term),
        }
    }

    fn parse_term(&mut self, allow_literal: bool) -> Result<TermPattern, SparqlError> {
        match self.next() {
            Some((Token::Variable(name), _)) => Ok(TermPattern::Variable(name[1..].to_string())),
            Some((Token::IriRef(text), _)) => {
                Ok(TermPattern::Iri(Iri::new(&text[1..text.len() - 1])))
            }
            Some((Token::PrefixedName(text), span)) => {
                let iri = self.resolve_prefixed(text, span.start)?;
                Ok(TermPattern::Iri(iri))
            }
            Some((Token::StringLiteral(text), span)) if allow_literal => {
                let value = unescape(&text[1..text.len() - 1], span.start)?;
                self.parse_literal_suffix(value)
            }
            Some((Token::Integer(text), _)) if allow_literal => Ok(TermPattern::Literal(
                Literal::typed(text, vocab::xsd_integer()),
            )),
            Some((_, span)) => {
                let position = span.start;
                Err(self.error_at("a term in the triple pattern", position))
            }
            None => Err(self.error("a term in the triple pattern")),
        }
    }

    fn parse_literal_suffix(&mut self, value: String) -> Result<TermPattern, SparqlError> {
        match self.peek() {
            Some(Token::LangTag(tag)) => {
                let tag = tag[1..].to_string();
                self.advance();
                Ok(TermPattern::Literal(Literal::lang(value, tag)))
            }
            Some(Token::DoubleCaret) => {
                self.advance();
                match self.next() {
                    Some((Token::IriRef(text), _)) => Ok(TermPattern::Literal(Literal::typed(
                        value,
                        Iri::new(&text[1..text.len() - 1]),
                    ))),
                    Some((Token::PrefixedName(text), span)) => {
                        let datatype = self.resolve_prefixed(text, span.start)?;
                        Ok(TermPattern::Literal(Literal::typed(value, datatype)))
                    }
                    _ => Err(self.error("a datatype IRI after '^^'")),
                }
            }
            _ => Ok(TermPattern::Literal(Literal::plain(value))),
        }
    }

    fn resolve_prefixed(&self, text: &str, position: usize) -> Result<Iri, SparqlError> {
        let (prefix, local) = match text.split_once(':') {
            Some(parts) => parts,
            None => return Err(self.error_at("a prefixed name", position)),
        };
        match self.prefixes.get(prefix) {
            Some(namespace) => Ok(Iri::new(format!("{}{}", namespace, local))),
            None => Err(SparqlError::Syntax {
                message: format!("undeclared prefix '{}'", prefix),
                position,
            }),
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(text)) if text.eq_ignore_ascii_case(keyword))
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SparqlError> {
        if self.peek_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("the {} keyword", keyword)))
        }
    }

    fn next(&mut self) -> Option<(Token<'a>, Range<usize>)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, expected: Token<'a>, label: &str) -> Result<(), SparqlError> {
        match self.next() {
            Some((token, _)) if token == expected => Ok(()),
            _ => Err(self.error(label)),
        }
    }

    fn error(&self, expected: &str) -> SparqlError {
        let position = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|(_, span)| span.start)
            .unwrap_or(self.end);
        self.error_at(expected, position)
    }

    fn error_at(&self, expected: &str, position: usize) -> SparqlError {
        SparqlError::Syntax {
            message: format!("expected {}", expected),
            position,
        }
    }
}

fn unescape(raw: &str, position: usize) -> Result<String, SparqlError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = (&mut chars).take(4).collect();
                let code = u32::from_str_radix(&hex, 16).map_err(|_| SparqlError::Syntax {
                    message: format!("invalid \\u escape '{}'", hex),
                    position,
                })?;
                match char::from_u32(code) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        return Err(SparqlError::Syntax {
                            message: format!("invalid codepoint U+{:04X}", code),
                            position,
                        })
                    }
                }
            }
            other => {
                return Err(SparqlError::Syntax {
                    message: format!("unknown string escape {:?}", other),
                    position,
                })
            }
        }
    }
    Ok(out)
}
