//! Shapes graph loading.
//!
//! Shapes are read from a Turtle document into a flat table of node
//! shapes, each carrying its property shapes with constraints already
//! decoded (and patterns compiled), so validation itself cannot fail.

use crate::report::Severity;
use crate::ShaclError;
use bibgraph_core::syntax::{self, Format};
use bibgraph_core::{vocab, Graph, Iri, Term};
use regex::Regex;
use std::collections::HashSet;

/// The default shapes shipped with the toolkit: minimal cataloging
/// rules for BIBFRAME Works and Instances.
const BIBFRAME_SHAPES: &str = include_str!("../shapes/bibframe.ttl");

pub(crate) fn sh(local: &str) -> Iri {
    Iri::new(format!("{}{}", vocab::SHACL, local))
}

/// A loaded shapes document.
#[derive(Debug, Clone)]
pub struct ShapesGraph {
    pub shapes: Vec<NodeShape>,
}

/// A shape targeting every instance of a class.
#[derive(Debug, Clone)]
pub struct NodeShape {
    pub id: Term,
    pub target_class: Iri,
    pub properties: Vec<PropertyShape>,
}

/// Constraints on one predicate of the focus node.
#[derive(Debug, Clone)]
pub struct PropertyShape {
    pub id: Term,
    pub path: Iri,
    pub min_count: Option<u64>,
    pub max_count: Option<u64>,
    pub datatype: Option<Iri>,
    pub class: Option<Iri>,
    pub pattern: Option<Pattern>,
    pub severity: Severity,
    pub message: Option<String>,
}

/// An `sh:pattern`, kept with its source text for report messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
}

impl ShapesGraph {
    /// The bundled BIBFRAME shapes.
    pub fn bibframe() -> Result<ShapesGraph, ShaclError> {
        ShapesGraph::from_turtle(BIBFRAME_SHAPES)
    }

    pub fn from_turtle(text: &str) -> Result<ShapesGraph, ShaclError> {
        let graph = syntax::parse(text, Format::Turtle)?;
        ShapesGraph::from_graph(&graph)
    }

    pub fn from_graph(graph: &Graph) -> Result<ShapesGraph, ShaclError> {
        let target_class = sh("targetClass");
        let mut shapes = Vec::new();
        let mut seen = HashSet::new();
        for triple in graph.iter() {
            if triple.predicate != target_class {
                continue;
            }
            let class = match triple.object.as_iri() {
                Some(iri) => iri.clone(),
                None => {
                    return Err(ShaclError::InvalidShape {
                        shape: triple.subject.lexical().to_string(),
                        message: "sh:targetClass must be an IRI".to_string(),
                    })
                }
            };
            if !seen.insert((triple.subject.clone(), class.clone())) {
                continue;
            }
            shapes.push(load_node_shape(graph, &triple.subject, class)?);
        }
        Ok(ShapesGraph { shapes })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn load_node_shape(graph: &Graph, id: &Term, target_class: Iri) -> Result<NodeShape, ShaclError> {
    let mut properties = Vec::new();
    for object in objects_of(graph, id, &sh("property")) {
        properties.push(load_property_shape(graph, object)?);
    }
    Ok(NodeShape {
        id: id.clone(),
        target_class,
        properties,
    })
}

fn load_property_shape(graph: &Graph, id: &Term) -> Result<PropertyShape, ShaclError> {
    let path = match object_of(graph, id, &sh("path")).and_then(Term::as_iri) {
        Some(iri) => iri.clone(),
        None => return Err(ShaclError::MissingPath(id.lexical().to_string())),
    };
    let min_count = count_constraint(graph, id, "minCount")?;
    let max_count = count_constraint(graph, id, "maxCount")?;
    let datatype = object_of(graph, id, &sh("datatype"))
        .and_then(Term::as_iri)
        .cloned();
    let class = object_of(graph, id, &sh("class"))
        .and_then(Term::as_iri)
        .cloned();
    let pattern = match object_of(graph, id, &sh("pattern")) {
        Some(Term::Literal(literal)) => {
            let regex = Regex::new(&literal.value).map_err(|source| ShaclError::InvalidPattern {
                pattern: literal.value.clone(),
                source,
            })?;
            Some(Pattern {
                source: literal.value.clone(),
                regex,
            })
        }
        _ => None,
    };
    let severity = match object_of(graph, id, &sh("severity")).and_then(Term::as_iri) {
        Some(iri) if *iri == sh("Warning") => Severity::Warning,
        _ => Severity::Violation,
    };
    let message = match object_of(graph, id, &sh("message")) {
        Some(Term::Literal(literal)) => Some(literal.value.clone()),
        _ => None,
    };
    Ok(PropertyShape {
        id: id.clone(),
        path,
        min_count,
        max_count,
        datatype,
        class,
        pattern,
        severity,
        message,
    })
}

fn count_constraint(graph: &Graph, id: &Term, local: &str) -> Result<Option<u64>, ShaclError> {
    match object_of(graph, id, &sh(local)) {
        Some(Term::Literal(literal)) => {
            literal
                .value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ShaclError::InvalidShape {
                    shape: id.lexical().to_string(),
                    message: format!("sh:{} is not a non-negative integer: {}", local, literal.value),
                })
        }
        Some(_) => Err(ShaclError::InvalidShape {
            shape: id.lexical().to_string(),
            message: format!("sh:{} must be a literal", local),
        }),
        None => Ok(None),
    }
}

fn object_of<'g>(graph: &'g Graph, subject: &Term, predicate: &Iri) -> Option<&'g Term> {
    graph
        .match_pattern(Some(subject), Some(predicate), None)
        .first()
        .map(|t| &t.object)
}

fn objects_of<'g>(graph: &'g Graph, subject: &Term, predicate: &Iri) -> Vec<&'g Term> {
    graph
        .match_pattern(Some(subject), Some(predicate), None)
        .into_iter()
        .map(|t| &t.object)
        .collect()
}
