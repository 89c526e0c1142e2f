//! RDF data model and serialization codecs for bibgraph
//!
//! This crate provides the building blocks the rest of the workspace
//! shares:
//! - Terms and triples (`model`)
//! - The deduplicated, insertion-ordered `Graph`
//! - BIBFRAME and common vocabulary constants (`vocab`)
//! - Parsers and writers for Turtle, N-Triples, RDF/XML and JSON-LD
//!   (`syntax`)

pub mod model;
pub mod syntax;
pub mod vocab;

pub use model::{Graph, Iri, Literal, Term, Triple};
pub use syntax::Format;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RdfError {
    #[error("{syntax} parse error: {message}")]
    Parse {
        syntax: &'static str,
        message: String,
    },

    #[error("unsupported RDF syntax: {0}")]
    UnsupportedSyntax(String),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl RdfError {
    pub(crate) fn parse(syntax: &'static str, message: impl Into<String>) -> Self {
        RdfError::Parse {
            syntax,
            message: message.into(),
        }
    }
}
