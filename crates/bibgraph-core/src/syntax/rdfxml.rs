//! RDF/XML reader and writer
//!
//! The reader is an event loop over `quick_xml` covering the flat
//! node/property structure this toolkit and its MARC converter emit:
//! `rdf:Description` and typed node elements with `rdf:about` or
//! `rdf:nodeID`, property elements carrying `rdf:resource`,
//! `rdf:nodeID`, `rdf:datatype`, `xml:lang`, or text content. Nested
//! node elements are rejected.

use crate::model::{Graph, Iri, Literal, Term, Triple};
use crate::{vocab, RdfError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

const SYNTAX: &str = "RDF/XML";

pub fn parse(data: &str) -> Result<Graph, RdfError> {
    let mut reader = Reader::from_str(data);
    let mut graph = Graph::new();

    let mut namespaces: HashMap<String, String> = HashMap::new();
    let mut subject: Option<Term> = None;
    let mut predicate: Option<Iri> = None;
    let mut object_resource: Option<Term> = None;
    let mut datatype: Option<Iri> = None;
    let mut language: Option<String> = None;
    let mut text = String::new();
    let mut in_property = false;
    let mut blank_counter = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                collect_namespaces(e, &mut namespaces);
                let (prefix, local) = split_qname(e.name().as_ref());

                if local == "RDF" && is_rdf_prefix(&prefix, &namespaces) {
                    continue;
                }
                if subject.is_none() {
                    subject = Some(node_subject(
                        e,
                        &prefix,
                        &local,
                        &namespaces,
                        &mut graph,
                        &mut blank_counter,
                    )?);
                } else if !in_property {
                    predicate = Some(resolve_qname(&prefix, &local, &namespaces)?);
                    object_resource = object_attr(e, &namespaces);
                    datatype = rdf_attr(e, "datatype", &namespaces).map(Iri::new);
                    language = lang_attr(e);
                    text.clear();
                    in_property = true;
                } else {
                    return Err(RdfError::parse(
                        SYNTAX,
                        "nested node elements are not supported",
                    ));
                }
            }
            Ok(Event::Empty(ref e)) => {
                collect_namespaces(e, &mut namespaces);
                let (prefix, local) = split_qname(e.name().as_ref());

                if let Some(subj) = &subject {
                    if !in_property {
                        // Self-closing property, e.g. <bf:instanceOf rdf:resource="..."/>
                        let pred = resolve_qname(&prefix, &local, &namespaces)?;
                        if let Some(object) = object_attr(e, &namespaces) {
                            graph.insert(Triple::new(subj.clone(), pred, object));
                        }
                    }
                } else {
                    // An empty node element asserts at most its type
                    node_subject(e, &prefix, &local, &namespaces, &mut graph, &mut blank_counter)?;
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_property {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| RdfError::parse(SYNTAX, err.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::End(ref e)) => {
                let (prefix, local) = split_qname(e.name().as_ref());
                if in_property {
                    let subj = subject.clone().ok_or_else(|| {
                        RdfError::parse(SYNTAX, "property element outside a node element")
                    })?;
                    let pred = predicate.take().ok_or_else(|| {
                        RdfError::parse(SYNTAX, "unmatched property close tag")
                    })?;
                    let object = if let Some(resource) = object_resource.take() {
                        resource
                    } else {
                        let literal = Literal {
                            value: std::mem::take(&mut text),
                            datatype: datatype.take(),
                            language: language.take(),
                        };
                        Term::Literal(literal)
                    };
                    graph.insert(Triple::new(subj, pred, object));
                    in_property = false;
                } else if !(local == "RDF" && is_rdf_prefix(&prefix, &namespaces)) {
                    subject = None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(RdfError::parse(SYNTAX, err.to_string())),
        }
    }

    Ok(graph)
}

/// Determine the subject of a node element and, for typed elements,
/// assert the rdf:type triple.
fn node_subject(
    e: &BytesStart<'_>,
    prefix: &str,
    local: &str,
    namespaces: &HashMap<String, String>,
    graph: &mut Graph,
    blank_counter: &mut usize,
) -> Result<Term, RdfError> {
    let subject = if let Some(about) = rdf_attr(e, "about", namespaces) {
        Term::Iri(Iri::new(about))
    } else if let Some(node_id) = rdf_attr(e, "nodeID", namespaces) {
        Term::Blank(node_id)
    } else {
        *blank_counter += 1;
        Term::Blank(format!("g{}", blank_counter))
    };

    let is_description = local == "Description" && is_rdf_prefix(prefix, namespaces);
    if !is_description {
        let type_iri = resolve_qname(prefix, local, namespaces)?;
        graph.insert(Triple::new(
            subject.clone(),
            vocab::rdf_type(),
            Term::Iri(type_iri),
        ));
    }
    Ok(subject)
}

fn object_attr(e: &BytesStart<'_>, namespaces: &HashMap<String, String>) -> Option<Term> {
    if let Some(resource) = rdf_attr(e, "resource", namespaces) {
        return Some(Term::Iri(Iri::new(resource)));
    }
    rdf_attr(e, "nodeID", namespaces).map(Term::Blank)
}

fn split_qname(name: &[u8]) -> (String, String) {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, local)) => (prefix.to_string(), local.to_string()),
        None => (String::new(), name.to_string()),
    }
}

fn is_rdf_prefix(prefix: &str, namespaces: &HashMap<String, String>) -> bool {
    namespaces.get(prefix).is_some_and(|ns| ns == vocab::RDF)
}

fn collect_namespaces(e: &BytesStart<'_>, namespaces: &mut HashMap<String, String>) {
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.0.as_ref()).to_string();
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            namespaces.insert(
                prefix.to_string(),
                String::from_utf8_lossy(&attr.value).to_string(),
            );
        }
    }
}

/// Look up an attribute in the RDF namespace, e.g. rdf:about.
fn rdf_attr(
    e: &BytesStart<'_>,
    local: &str,
    namespaces: &HashMap<String, String>,
) -> Option<String> {
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.0.as_ref()).to_string();
        let matches = match key.split_once(':') {
            Some((prefix, attr_local)) => {
                attr_local == local && is_rdf_prefix(prefix, namespaces)
            }
            None => false,
        };
        if matches {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

fn lang_attr(e: &BytesStart<'_>) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.0.as_ref() == b"xml:lang" {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

fn resolve_qname(
    prefix: &str,
    local: &str,
    namespaces: &HashMap<String, String>,
) -> Result<Iri, RdfError> {
    let base = namespaces.get(prefix).ok_or_else(|| {
        RdfError::parse(SYNTAX, format!("undeclared namespace prefix '{}'", prefix))
    })?;
    Ok(Iri::new(format!("{}{}", base, local)))
}

/// Serialize a graph as pretty RDF/XML grouped by subject.
pub fn write(graph: &Graph) -> String {
    // Every predicate (and literal datatype namespace is inline, so just
    // predicates) needs a namespace prefix on the root element.
    let mut ns_prefixes: Vec<(String, String)> = vec![("rdf".to_string(), vocab::RDF.to_string())];
    let mut generated = 0usize;
    let mut namespace_prefix: HashMap<String, String> = HashMap::new();
    namespace_prefix.insert(vocab::RDF.to_string(), "rdf".to_string());
    for triple in graph.iter() {
        let (ns, _) = split_iri(triple.predicate.as_str());
        if namespace_prefix.contains_key(&ns) {
            continue;
        }
        let prefix = graph
            .prefixes()
            .iter()
            .find(|(_, base)| *base == &ns)
            .map(|(p, _)| p.clone())
            .unwrap_or_else(|| {
                generated += 1;
                format!("ns{}", generated)
            });
        ns_prefixes.push((prefix.clone(), ns.clone()));
        namespace_prefix.insert(ns, prefix);
    }

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rdf:RDF");
    for (prefix, ns) in &ns_prefixes {
        out.push_str(&format!("\n    xmlns:{}=\"{}\"", prefix, escape_attr(ns)));
    }
    out.push_str(">\n");

    let mut order: Vec<&Term> = Vec::new();
    let mut grouped: HashMap<&Term, Vec<&Triple>> = HashMap::new();
    for triple in graph.iter() {
        if !grouped.contains_key(&triple.subject) {
            order.push(&triple.subject);
        }
        grouped.entry(&triple.subject).or_default().push(triple);
    }

    for subject in order {
        match subject {
            Term::Iri(iri) => out.push_str(&format!(
                "  <rdf:Description rdf:about=\"{}\">\n",
                escape_attr(iri.as_str())
            )),
            Term::Blank(label) => out.push_str(&format!(
                "  <rdf:Description rdf:nodeID=\"{}\">\n",
                escape_attr(label)
            )),
            Term::Literal(_) => continue,
        }
        for triple in &grouped[subject] {
            let (ns, local) = split_iri(triple.predicate.as_str());
            let prefix = &namespace_prefix[&ns];
            match &triple.object {
                Term::Iri(iri) => out.push_str(&format!(
                    "    <{p}:{l} rdf:resource=\"{o}\"/>\n",
                    p = prefix,
                    l = local,
                    o = escape_attr(iri.as_str())
                )),
                Term::Blank(label) => out.push_str(&format!(
                    "    <{p}:{l} rdf:nodeID=\"{o}\"/>\n",
                    p = prefix,
                    l = local,
                    o = escape_attr(label)
                )),
                Term::Literal(lit) => {
                    let mut attrs = String::new();
                    if let Some(tag) = &lit.language {
                        attrs.push_str(&format!(" xml:lang=\"{}\"", escape_attr(tag)));
                    } else if let Some(dt) = &lit.datatype {
                        attrs.push_str(&format!(
                            " rdf:datatype=\"{}\"",
                            escape_attr(dt.as_str())
                        ));
                    }
                    out.push_str(&format!(
                        "    <{p}:{l}{a}>{v}</{p}:{l}>\n",
                        p = prefix,
                        l = local,
                        a = attrs,
                        v = escape_text(&lit.value)
                    ));
                }
            }
        }
        out.push_str("  </rdf:Description>\n");
    }
    out.push_str("</rdf:RDF>\n");
    out
}

/// Split an IRI into (namespace, local name) at the last '#' or '/'.
pub(crate) fn split_iri(iri: &str) -> (String, String) {
    let split_at = iri
        .rfind('#')
        .or_else(|| iri.rfind('/'))
        .map(|i| i + 1)
        .unwrap_or(0);
    (iri[..split_at].to_string(), iri[split_at..].to_string())
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
