//! JSON-LD reader and writer over serde_json values
//!
//! Covers the constructs BIBFRAME resource payloads use: `@context`
//! prefix maps with `@vocab`, `@graph` arrays, node objects with `@id`
//! and `@type`, expanded value objects (`@value` / `@type` /
//! `@language`), nested node objects, and arrays. Keys outside a node's
//! reserved members are treated as predicate IRIs after expansion.

use crate::model::{Graph, Iri, Literal, Term, Triple};
use crate::{vocab, RdfError};
use serde_json::Value;
use std::collections::HashMap;

const SYNTAX: &str = "JSON-LD";

pub fn parse(data: &str) -> Result<Graph, RdfError> {
    let value: Value =
        serde_json::from_str(data).map_err(|err| RdfError::parse(SYNTAX, err.to_string()))?;
    parse_value(&value)
}

/// Parse an already-deserialized JSON-LD document, as delivered by the
/// bulk API.
pub fn parse_value(value: &Value) -> Result<Graph, RdfError> {
    let mut context = Context::default();
    if let Some(ctx) = value.get("@context") {
        context.load(ctx);
    }

    let mut graph = Graph::new();
    let mut blanks = 0usize;

    match value {
        Value::Array(nodes) => {
            for node in nodes {
                parse_node(node, &context, &mut graph, &mut blanks)?;
            }
        }
        Value::Object(map) => {
            if let Some(Value::Array(nodes)) = map.get("@graph") {
                for node in nodes {
                    parse_node(node, &context, &mut graph, &mut blanks)?;
                }
            } else {
                parse_node(value, &context, &mut graph, &mut blanks)?;
            }
        }
        _ => return Err(RdfError::parse(SYNTAX, "expected an object or array")),
    }

    for (prefix, iri) in &context.prefixes {
        graph.bind_prefix(prefix.clone(), iri.clone());
    }
    Ok(graph)
}

#[derive(Default)]
struct Context {
    prefixes: HashMap<String, String>,
    vocab: Option<String>,
}

impl Context {
    fn load(&mut self, ctx: &Value) {
        if let Value::Object(map) = ctx {
            for (key, value) in map {
                let Value::String(iri) = value else { continue };
                if key == "@vocab" {
                    self.vocab = Some(iri.clone());
                } else {
                    self.prefixes.insert(key.clone(), iri.clone());
                }
            }
        }
    }

    /// Expand a term or compact IRI to a full IRI.
    fn expand(&self, name: &str) -> String {
        if let Some(mapped) = self.prefixes.get(name) {
            return mapped.clone();
        }
        if let Some((prefix, local)) = name.split_once(':') {
            if let Some(base) = self.prefixes.get(prefix) {
                return format!("{}{}", base, local);
            }
            // Already absolute (http:, urn:, ...)
            return name.to_string();
        }
        match &self.vocab {
            Some(vocab) => format!("{}{}", vocab, name),
            None => name.to_string(),
        }
    }
}

fn parse_node(
    node: &Value,
    context: &Context,
    graph: &mut Graph,
    blanks: &mut usize,
) -> Result<Term, RdfError> {
    let Value::Object(map) = node else {
        return Err(RdfError::parse(SYNTAX, "node must be an object"));
    };

    let subject = match map.get("@id") {
        Some(Value::String(id)) => id_term(id, context),
        Some(_) => return Err(RdfError::parse(SYNTAX, "@id must be a string")),
        None => {
            *blanks += 1;
            Term::Blank(format!("jb{}", blanks))
        }
    };

    if let Some(types) = map.get("@type") {
        for ty in as_array(types) {
            if let Value::String(name) = ty {
                graph.insert(Triple::new(
                    subject.clone(),
                    vocab::rdf_type(),
                    Term::Iri(Iri::new(context.expand(name))),
                ));
            }
        }
    }

    for (key, value) in map {
        if key.starts_with('@') {
            continue;
        }
        let predicate = Iri::new(context.expand(key));
        for item in as_array(value) {
            if item.is_null() {
                continue;
            }
            let object = parse_object(item, context, graph, blanks)?;
            graph.insert(Triple::new(subject.clone(), predicate.clone(), object));
        }
    }

    Ok(subject)
}

fn parse_object(
    value: &Value,
    context: &Context,
    graph: &mut Graph,
    blanks: &mut usize,
) -> Result<Term, RdfError> {
    match value {
        Value::String(s) => Ok(Term::Literal(Literal::plain(s))),
        Value::Bool(b) => Ok(Term::Literal(Literal::typed(
            b.to_string(),
            Iri::new(format!("{}boolean", vocab::XSD)),
        ))),
        Value::Number(n) => {
            let datatype = if n.is_i64() || n.is_u64() {
                vocab::xsd_integer()
            } else {
                Iri::new(format!("{}double", vocab::XSD))
            };
            Ok(Term::Literal(Literal::typed(n.to_string(), datatype)))
        }
        Value::Object(map) => {
            if let Some(v) = map.get("@value") {
                let value = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err(RdfError::parse(SYNTAX, "unsupported @value")),
                };
                let datatype = match map.get("@type") {
                    Some(Value::String(dt)) => Some(Iri::new(context.expand(dt))),
                    _ => None,
                };
                let language = match map.get("@language") {
                    Some(Value::String(tag)) => Some(tag.clone()),
                    _ => None,
                };
                return Ok(Term::Literal(Literal {
                    value,
                    datatype,
                    language,
                }));
            }
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("@id") {
                    return Ok(id_term(id, context));
                }
            }
            // Nested node object: parse it and point at its subject
            parse_node(value, context, graph, blanks)
        }
        _ => Err(RdfError::parse(SYNTAX, "unsupported object value")),
    }
}

fn id_term(id: &str, context: &Context) -> Term {
    match id.strip_prefix("_:") {
        Some(label) => Term::Blank(label.to_string()),
        None => Term::Iri(Iri::new(context.expand(id))),
    }
}

fn as_array(value: &Value) -> std::slice::Iter<'_, Value> {
    match value {
        Value::Array(items) => items.iter(),
        other => std::slice::from_ref(other).iter(),
    }
}

/// Serialize a graph as JSON-LD with a `@context` built from the bound
/// prefixes and one `@graph` node object per subject.
pub fn write(graph: &Graph) -> Result<String, RdfError> {
    use serde_json::{json, Map};

    let mut context = Map::new();
    for (prefix, iri) in graph.prefixes() {
        context.insert(prefix.clone(), json!(iri));
    }

    let mut order: Vec<&Term> = Vec::new();
    let mut grouped: HashMap<&Term, Vec<&Triple>> = HashMap::new();
    for triple in graph.iter() {
        if !grouped.contains_key(&triple.subject) {
            order.push(&triple.subject);
        }
        grouped.entry(&triple.subject).or_default().push(triple);
    }

    let mut nodes = Vec::new();
    for subject in order {
        let mut node = Map::new();
        let id = match subject {
            Term::Iri(iri) => iri.as_str().to_string(),
            Term::Blank(label) => format!("_:{}", label),
            Term::Literal(_) => continue,
        };
        node.insert("@id".to_string(), json!(id));

        let rdf_type = vocab::rdf_type();
        let mut types = Vec::new();
        for triple in &grouped[subject] {
            if triple.predicate == rdf_type {
                if let Term::Iri(iri) = &triple.object {
                    types.push(json!(iri.as_str()));
                    continue;
                }
            }
            let object = match &triple.object {
                Term::Iri(iri) => json!({ "@id": iri.as_str() }),
                Term::Blank(label) => json!({ "@id": format!("_:{}", label) }),
                Term::Literal(lit) => {
                    let mut value = Map::new();
                    value.insert("@value".to_string(), json!(lit.value));
                    if let Some(tag) = &lit.language {
                        value.insert("@language".to_string(), json!(tag));
                    } else if let Some(dt) = &lit.datatype {
                        value.insert("@type".to_string(), json!(dt.as_str()));
                    }
                    Value::Object(value)
                }
            };
            let entry = node
                .entry(triple.predicate.as_str().to_string())
                .or_insert_with(|| json!([]));
            if let Value::Array(values) = entry {
                values.push(object);
            }
        }
        if !types.is_empty() {
            node.insert("@type".to_string(), Value::Array(types));
        }
        nodes.push(Value::Object(node));
    }

    let document = json!({
        "@context": Value::Object(context),
        "@graph": nodes,
    });
    serde_json::to_string_pretty(&document).map_err(|err| RdfError::Serialize(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bibframe_payload() {
        let data = r#"{
            "@context": {
                "bf": "http://id.loc.gov/ontologies/bibframe/"
            },
            "@graph": [
                {
                    "@id": "http://example.org/w/1",
                    "@type": "bf:Work",
                    "bf:title": { "@value": "Moby Dick", "@language": "en" },
                    "bf:hasInstance": { "@id": "_:inst" }
                },
                {
                    "@id": "_:inst",
                    "@type": "bf:Instance"
                }
            ]
        }"#;
        let graph = parse(data).unwrap();
        assert_eq!(graph.len(), 4);
        let work = Term::iri("http://example.org/w/1");
        assert_eq!(
            graph
                .match_pattern(Some(&work), Some(&vocab::rdf_type()), None)
                .len(),
            1
        );
        assert!(graph
            .iter()
            .any(|t| t.object == Term::Blank("inst".to_string())));
    }

    #[test]
    fn parses_nested_nodes_and_vocab() {
        let data = r#"{
            "@context": { "@vocab": "http://example.org/ns/" },
            "@id": "http://example.org/s",
            "label": "top",
            "child": { "name": "inner" }
        }"#;
        let graph = parse(data).unwrap();
        // label + child link + inner name
        assert_eq!(graph.len(), 3);
        let child_pred = Iri::new("http://example.org/ns/child");
        let links = graph.match_pattern(None, Some(&child_pred), None);
        assert_eq!(links.len(), 1);
        assert!(links[0].object.is_blank());
    }

    #[test]
    fn rejects_scalar_document() {
        assert!(parse("42").is_err());
    }

    #[test]
    fn round_trips_own_output() {
        let data = r#"{
            "@context": { "bf": "http://id.loc.gov/ontologies/bibframe/" },
            "@graph": [{
                "@id": "http://example.org/i/1",
                "@type": "bf:Instance",
                "bf:title": { "@value": "T" },
                "bf:extent": { "@value": "3", "@type": "http://www.w3.org/2001/XMLSchema#integer" }
            }]
        }"#;
        let graph = parse(data).unwrap();
        let reparsed = parse(&write(&graph).unwrap()).unwrap();
        assert_eq!(reparsed.len(), graph.len());
        for triple in graph.iter() {
            assert!(reparsed.contains(triple), "missing {:?}", triple);
        }
    }
}
