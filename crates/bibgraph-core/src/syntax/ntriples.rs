//! N-Triples reader and writer

use crate::model::{Graph, Iri, Term};
use crate::RdfError;

/// N-Triples is a subset of Turtle, so the Turtle parser handles it; only
/// the error label differs.
pub fn parse(data: &str) -> Result<Graph, RdfError> {
    super::turtle::parse_with(data, "N-Triples")
}

/// Serialize a graph as N-Triples, one statement per line.
pub fn write(graph: &Graph) -> String {
    let mut out = String::new();
    for triple in graph.iter() {
        out.push_str(&render_term(&triple.subject));
        out.push(' ');
        out.push_str(&render_iri(&triple.predicate));
        out.push(' ');
        out.push_str(&render_term(&triple.object));
        out.push_str(" .\n");
    }
    out
}

pub(crate) fn render_iri(iri: &Iri) -> String {
    format!("<{}>", iri.as_str())
}

pub(crate) fn render_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => render_iri(iri),
        Term::Blank(label) => format!("_:{}", label),
        Term::Literal(lit) => {
            let quoted = format!("\"{}\"", escape(&lit.value));
            if let Some(tag) = &lit.language {
                format!("{}@{}", quoted, tag)
            } else if let Some(dt) = &lit.datatype {
                format!("{}^^{}", quoted, render_iri(dt))
            } else {
                quoted
            }
        }
    }
}

/// Escape a literal value for N-Triples and Turtle output.
pub(crate) fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Literal, Triple};

    #[test]
    fn writes_one_line_per_triple() {
        let mut graph = Graph::new();
        graph.insert(Triple::new(
            Term::iri("http://a/s"),
            Iri::new("http://a/p"),
            Term::Literal(Literal::lang("caf\u{e9}", "fr")),
        ));
        let out = write(&graph);
        assert_eq!(out, "<http://a/s> <http://a/p> \"caf\u{e9}\"@fr .\n");
    }

    #[test]
    fn round_trips() {
        let data = "<http://a/s> <http://a/p> \"line\\nbreak\" .\n\
                    <http://a/s> <http://a/q> <http://a/o> .\n";
        let graph = parse(data).unwrap();
        assert_eq!(graph.len(), 2);
        let reparsed = parse(&write(&graph)).unwrap();
        assert_eq!(reparsed.len(), 2);
        for triple in graph.iter() {
            assert!(reparsed.contains(triple));
        }
    }
}
