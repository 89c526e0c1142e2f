//! Turtle reader and writer
//!
//! The reader covers the Turtle the toolkit itself emits plus the common
//! constructs found in CBD uploads and shapes files: prefix and base
//! declarations, `a`, predicate lists with `;`, object lists with `,`,
//! labelled blank nodes, typed and language-tagged literals, and bare
//! integers. Collections and anonymous blank node property lists are not
//! supported.

use crate::model::{Graph, Iri, Literal, Term, Triple};
use crate::{vocab, RdfError};
use logos::Logos;
use std::collections::HashMap;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\r\n]*")]
pub enum Token<'a> {
    #[token("@prefix")]
    PrefixDecl,

    #[token("@base")]
    BaseDecl,

    #[token("a")]
    A,

    #[regex(r"<[^<>\x00-\x20]*>", |lex| lex.slice())]
    IriRef(&'a str),

    #[regex(r"_:[A-Za-z0-9_][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*", |lex| lex.slice())]
    BlankNode(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    StringLiteral(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*", |lex| lex.slice())]
    LangTag(&'a str),

    #[token("^^")]
    DoubleCaret,

    #[regex(r"[A-Za-z][A-Za-z0-9_-]*:[A-Za-z_][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)*", |lex| lex.slice())]
    PrefixedName(&'a str),

    #[regex(r"[A-Za-z][A-Za-z0-9_-]*:", |lex| lex.slice())]
    PrefixNs(&'a str),

    #[regex(r"[+-]?[0-9]+", |lex| lex.slice())]
    Integer(&'a str),

    #[token(".")]
    Dot,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

pub fn parse(data: &str) -> Result<Graph, RdfError> {
    parse_with(data, "Turtle")
}

/// Shared entry point for Turtle and its N-Triples subset; `syntax` only
/// changes the error label.
pub(crate) fn parse_with(data: &str, syntax: &'static str) -> Result<Graph, RdfError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(data);
    while let Some(item) = lexer.next() {
        match item {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(RdfError::parse(
                    syntax,
                    format!("unexpected character at byte {}", lexer.span().start),
                ))
            }
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        prefixes: HashMap::new(),
        base: None,
        graph: Graph::new(),
        syntax,
    };
    parser.parse_document()?;
    Ok(parser.graph)
}

struct Parser<'a> {
    tokens: Vec<(Token<'a>, Range<usize>)>,
    pos: usize,
    prefixes: HashMap<String, String>,
    base: Option<String>,
    graph: Graph,
    syntax: &'static str,
}

impl<'a> Parser<'a> {
    fn parse_document(&mut self) -> Result<(), RdfError> {
        while self.pos < self.tokens.len() {
            match self.peek() {
                Some(Token::PrefixDecl) => self.parse_prefix()?,
                Some(Token::BaseDecl) => self.parse_base()?,
                _ => self.parse_statement()?,
            }
        }
        Ok(())
    }

    fn parse_prefix(&mut self) -> Result<(), RdfError> {
        self.advance();
        let prefix = match self.next_token()? {
            (Token::PrefixNs(ns), _) => ns.trim_end_matches(':').to_string(),
            (_, span) => return Err(self.error("expected prefix name after @prefix", span)),
        };
        let iri = match self.next_token()? {
            (Token::IriRef(iri), _) => strip_angle(iri).to_string(),
            (_, span) => return Err(self.error("expected IRI in prefix declaration", span)),
        };
        self.expect_dot()?;
        self.prefixes.insert(prefix.clone(), iri.clone());
        self.graph.bind_prefix(prefix, iri);
        Ok(())
    }

    fn parse_base(&mut self) -> Result<(), RdfError> {
        self.advance();
        match self.next_token()? {
            (Token::IriRef(iri), _) => self.base = Some(strip_angle(iri).to_string()),
            (_, span) => return Err(self.error("expected IRI in base declaration", span)),
        }
        self.expect_dot()
    }

    fn parse_statement(&mut self) -> Result<(), RdfError> {
        let subject = self.parse_subject()?;
        loop {
            let predicate = self.parse_predicate()?;
            loop {
                let object = self.parse_object()?;
                self.graph
                    .insert(Triple::new(subject.clone(), predicate.clone(), object));
                match self.peek() {
                    Some(Token::Comma) => {
                        self.advance();
                    }
                    _ => break,
                }
            }
            match self.next_token()? {
                (Token::Semicolon, _) => {
                    // Trailing semicolon before the final dot is legal
                    if matches!(self.peek(), Some(Token::Dot)) {
                        self.advance();
                        return Ok(());
                    }
                }
                (Token::Dot, _) => return Ok(()),
                (_, span) => return Err(self.error("expected ';' or '.'", span)),
            }
        }
    }

    fn parse_subject(&mut self) -> Result<Term, RdfError> {
        match self.next_token()? {
            (Token::IriRef(iri), _) => Ok(Term::Iri(self.resolve(strip_angle(iri)))),
            (Token::PrefixedName(name), span) => {
                let span = span.clone();
                self.expand(name).map(Term::Iri).ok_or_else(|| {
                    self.error(&format!("unknown prefix in '{}'", name), span)
                })
            }
            (Token::BlankNode(label), _) => Ok(Term::Blank(label[2..].to_string())),
            (_, span) => Err(self.error("expected subject", span)),
        }
    }

    fn parse_predicate(&mut self) -> Result<Iri, RdfError> {
        match self.next_token()? {
            (Token::A, _) => Ok(vocab::rdf_type()),
            (Token::IriRef(iri), _) => Ok(self.resolve(strip_angle(iri))),
            (Token::PrefixedName(name), span) => {
                let span = span.clone();
                self.expand(name)
                    .ok_or_else(|| self.error(&format!("unknown prefix in '{}'", name), span))
            }
            (_, span) => Err(self.error("expected predicate", span)),
        }
    }

    fn parse_object(&mut self) -> Result<Term, RdfError> {
        match self.next_token()? {
            (Token::IriRef(iri), _) => Ok(Term::Iri(self.resolve(strip_angle(iri)))),
            (Token::PrefixedName(name), span) => {
                let span = span.clone();
                self.expand(name).map(Term::Iri).ok_or_else(|| {
                    self.error(&format!("unknown prefix in '{}'", name), span)
                })
            }
            (Token::BlankNode(label), _) => Ok(Term::Blank(label[2..].to_string())),
            (Token::Integer(digits), _) => Ok(Term::Literal(Literal::typed(
                digits,
                vocab::xsd_integer(),
            ))),
            (Token::StringLiteral(quoted), span) => {
                let span = span.clone();
                let value = unescape(strip_quotes(quoted))
                    .map_err(|message| self.error(&message, span))?;
                match self.peek() {
                    Some(Token::LangTag(tag)) => {
                        let tag = tag[1..].to_string();
                        self.advance();
                        Ok(Term::Literal(Literal::lang(value, tag)))
                    }
                    Some(Token::DoubleCaret) => {
                        self.advance();
                        let datatype = self.parse_predicate()?;
                        Ok(Term::Literal(Literal::typed(value, datatype)))
                    }
                    _ => Ok(Term::Literal(Literal::plain(value))),
                }
            }
            (_, span) => Err(self.error("expected object", span)),
        }
    }

    fn expand(&self, name: &str) -> Option<Iri> {
        let (prefix, local) = name.split_once(':')?;
        let base = self.prefixes.get(prefix)?;
        Some(Iri::new(format!("{}{}", base, local)))
    }

    fn resolve(&self, iri: &str) -> Iri {
        if iri.contains(':') {
            Iri::new(iri)
        } else if let Some(base) = &self.base {
            Iri::new(format!("{}{}", base, iri))
        } else {
            Iri::new(iri)
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next_token(&mut self) -> Result<(Token<'a>, Range<usize>), RdfError> {
        let item = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        item.ok_or_else(|| RdfError::parse(self.syntax, "unexpected end of input"))
    }

    fn expect_dot(&mut self) -> Result<(), RdfError> {
        match self.next_token()? {
            (Token::Dot, _) => Ok(()),
            (_, span) => Err(self.error("expected '.'", span)),
        }
    }

    fn error(&self, message: &str, span: Range<usize>) -> RdfError {
        RdfError::parse(
            self.syntax,
            format!("{} at byte {}", message, span.start),
        )
    }
}

fn strip_angle(iri: &str) -> &str {
    &iri[1..iri.len() - 1]
}

fn strip_quotes(lit: &str) -> &str {
    &lit[1..lit.len() - 1]
}

/// Decode the string escapes Turtle and N-Triples share.
pub(crate) fn unescape(raw: &str) -> Result<String, String> {
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
            Some('u') => out.push(decode_codepoint(&mut chars, 4)?),
            Some('U') => out.push(decode_codepoint(&mut chars, 8)?),
            other => return Err(format!("invalid escape '\\{}'", other.unwrap_or(' '))),
        }
    }
    Ok(out)
}

fn decode_codepoint(chars: &mut std::str::Chars<'_>, len: usize) -> Result<char, String> {
    let hex: String = chars.take(len).collect();
    if hex.len() != len {
        return Err("truncated unicode escape".to_string());
    }
    let code = u32::from_str_radix(&hex, 16).map_err(|_| "invalid unicode escape".to_string())?;
    char::from_u32(code).ok_or_else(|| "invalid unicode codepoint".to_string())
}

/// Serialize a graph as Turtle, grouping predicates and objects by
/// subject in first-appearance order.
pub fn write(graph: &Graph) -> String {
    let mut out = String::new();
    for (prefix, iri) in graph.prefixes() {
        out.push_str(&format!("@prefix {}: <{}> .\n", prefix, iri));
    }
    if !graph.prefixes().is_empty() {
        out.push('\n');
    }

    let mut order: Vec<&Term> = Vec::new();
    let mut grouped: HashMap<&Term, Vec<&Triple>> = HashMap::new();
    for triple in graph.iter() {
        if !grouped.contains_key(&triple.subject) {
            order.push(&triple.subject);
        }
        grouped.entry(&triple.subject).or_default().push(triple);
    }

    for subject in order {
        let triples = &grouped[subject];
        out.push_str(&render_term(subject, graph));
        let mut first_predicate = true;
        let mut idx = 0;
        while idx < triples.len() {
            let predicate = &triples[idx].predicate;
            let mut objects = vec![&triples[idx].object];
            let mut next = idx + 1;
            while next < triples.len() && &triples[next].predicate == predicate {
                objects.push(&triples[next].object);
                next += 1;
            }
            idx = next;

            if first_predicate {
                out.push(' ');
                first_predicate = false;
            } else {
                out.push_str(" ;\n    ");
            }
            out.push_str(&render_predicate(predicate, graph));
            out.push(' ');
            let rendered: Vec<String> = objects.iter().map(|o| render_term(o, graph)).collect();
            out.push_str(&rendered.join(", "));
        }
        out.push_str(" .\n");
    }
    out
}

fn render_predicate(predicate: &Iri, graph: &Graph) -> String {
    if predicate.as_str() == format!("{}type", vocab::RDF) {
        return "a".to_string();
    }
    render_iri(predicate, graph)
}

fn render_iri(iri: &Iri, graph: &Graph) -> String {
    graph
        .qname(iri)
        .unwrap_or_else(|| format!("<{}>", iri.as_str()))
}

fn render_term(term: &Term, graph: &Graph) -> String {
    match term {
        Term::Iri(iri) => render_iri(iri, graph),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal(lit) => {
            let quoted = format!("\"{}\"", super::ntriples::escape(&lit.value));
            if let Some(tag) = &lit.language {
                format!("{}@{}", quoted, tag)
            } else if let Some(dt) = &lit.datatype {
                if dt.as_str() == format!("{}string", vocab::XSD) {
                    quoted
                } else {
                    format!("{}^^{}", quoted, render_iri(dt, graph))
                }
            } else {
                quoted
            }
        }
    }
}
