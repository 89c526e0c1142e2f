//! Parsing and serialization across the supported RDF syntaxes

pub mod jsonld;
pub mod ntriples;
pub mod rdfxml;
pub mod turtle;

use crate::model::Graph;
use crate::RdfError;

/// The serialization syntaxes the toolkit reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Turtle,
    NTriples,
    RdfXml,
    JsonLd,
}

impl Format {
    /// Resolve a declared media type, e.g. from an HTTP response or an
    /// upload form.
    pub fn from_media_type(media_type: &str) -> Result<Self, RdfError> {
        // Parameters like "; charset=utf-8" are irrelevant here
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or(media_type)
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/turtle" | "application/x-turtle" => Ok(Format::Turtle),
            "application/n-triples" => Ok(Format::NTriples),
            "application/rdf+xml" => Ok(Format::RdfXml),
            "application/ld+json" | "application/json" => Ok(Format::JsonLd),
            other => Err(RdfError::UnsupportedSyntax(other.to_string())),
        }
    }

    /// Resolve the short download/export tokens the original toolkit used.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ttl" | "turtle" => Some(Format::Turtle),
            "nt" | "ntriples" => Some(Format::NTriples),
            "xml" | "rdf-xml" => Some(Format::RdfXml),
            "json-ld" | "jsonld" => Some(Format::JsonLd),
            _ => None,
        }
    }

    /// Guess the syntax from a file name, for uploads that do not declare
    /// a media type.
    pub fn guess_from_path(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "ttl" => Some(Format::Turtle),
            "nt" => Some(Format::NTriples),
            "xml" | "rdf" => Some(Format::RdfXml),
            "json" | "jsonld" => Some(Format::JsonLd),
            _ => None,
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Format::Turtle => "application/x-turtle",
            Format::NTriples => "application/n-triples",
            Format::RdfXml => "application/rdf+xml",
            Format::JsonLd => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Turtle => "ttl",
            Format::NTriples => "nt",
            Format::RdfXml => "xml",
            Format::JsonLd => "json-ld",
        }
    }
}

/// Parse a document in the given syntax.
pub fn parse(data: &str, format: Format) -> Result<Graph, RdfError> {
    match format {
        Format::Turtle => turtle::parse(data),
        Format::NTriples => ntriples::parse(data),
        Format::RdfXml => rdfxml::parse(data),
        Format::JsonLd => jsonld::parse(data),
    }
}

/// Serialize a graph in the given syntax.
pub fn serialize(graph: &Graph, format: Format) -> Result<String, RdfError> {
    match format {
        Format::Turtle => Ok(turtle::write(graph)),
        Format::NTriples => Ok(ntriples::write(graph)),
        Format::RdfXml => Ok(rdfxml::write(graph)),
        Format::JsonLd => jsonld::write(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_resolution() {
        assert_eq!(
            Format::from_media_type("application/ld+json; charset=utf-8").unwrap(),
            Format::JsonLd
        );
        assert_eq!(Format::from_media_type("text/turtle").unwrap(), Format::Turtle);
        assert!(matches!(
            Format::from_media_type("image/png"),
            Err(RdfError::UnsupportedSyntax(_))
        ));
    }

    #[test]
    fn extension_guessing() {
        assert_eq!(Format::guess_from_path("cbd.ttl"), Some(Format::Turtle));
        assert_eq!(Format::guess_from_path("export.rdf"), Some(Format::RdfXml));
        assert_eq!(Format::guess_from_path("data.jsonld"), Some(Format::JsonLd));
        assert_eq!(Format::guess_from_path("notes.txt"), None);
    }
}
