//! Namespaces and terms used across the toolkit

use crate::model::Iri;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SHACL: &str = "http://www.w3.org/ns/shacl#";

pub const BF: &str = "http://id.loc.gov/ontologies/bibframe/";
pub const BFLC: &str = "http://id.loc.gov/ontologies/bflc/";
pub const MADSRDF: &str = "http://www.loc.gov/mads/rdf/v1#";
pub const SINOPIA: &str = "http://sinopia.io/vocabulary/";

/// Prefixes bound on every new store (serialization readability only).
pub const DEFAULT_NAMESPACES: &[(&str, &str)] = &[
    ("bf", BF),
    ("bflc", BFLC),
    ("madsrdf", MADSRDF),
    ("sin", SINOPIA),
    ("rdf", RDF),
    ("rdfs", RDFS),
];

pub fn rdf_type() -> Iri {
    Iri::new(format!("{}type", RDF))
}

pub fn bf_work() -> Iri {
    Iri::new(format!("{}Work", BF))
}

pub fn bf_instance() -> Iri {
    Iri::new(format!("{}Instance", BF))
}

pub fn xsd_string() -> Iri {
    Iri::new(format!("{}string", XSD))
}

pub fn xsd_integer() -> Iri {
    Iri::new(format!("{}integer", XSD))
}

pub fn xsd_boolean() -> Iri {
    Iri::new(format!("{}boolean", XSD))
}

pub fn rdf_lang_string() -> Iri {
    Iri::new(format!("{}langString", RDF))
}
