//! Identifier reconciliation.
//!
//! Blank node labels are only meaningful inside one document. Before a
//! fragment may be merged it is skolemized: every blank node becomes an
//! IRI minted from the fragment's source URI and the original label.
//! The rewrite is deterministic, so re-ingesting the same document is
//! idempotent, and fragments from different sources can never unify
//! nodes by accident even when their labels coincide.

use bibgraph_core::syntax::{self, jsonld, Format};
use bibgraph_core::{Graph, Iri, RdfError, Term, Triple};
use serde_json::Value;

/// Parse and skolemize one document.
pub fn reconcile(source_uri: &str, raw: &str, format: Format) -> Result<Graph, RdfError> {
    let fragment = syntax::parse(raw, format)?;
    Ok(skolemize(source_uri, fragment))
}

/// Like [`reconcile`] for a JSON-LD body that is already parsed JSON,
/// the shape bulk API payloads arrive in.
pub fn reconcile_value(source_uri: &str, body: &Value) -> Result<Graph, RdfError> {
    let fragment = jsonld::parse_value(body)?;
    Ok(skolemize(source_uri, fragment))
}

/// Rewrite every blank node to a source-scoped IRI. Named IRIs and
/// literals pass through unchanged, as do the fragment's prefixes.
pub fn skolemize(source_uri: &str, fragment: Graph) -> Graph {
    let mut out = Graph::new();
    for (prefix, iri) in fragment.prefixes() {
        out.bind_prefix(prefix.clone(), iri.clone());
    }
    for triple in fragment.iter() {
        out.insert(Triple::new(
            rewrite(source_uri, &triple.subject),
            triple.predicate.clone(),
            rewrite(source_uri, &triple.object),
        ));
    }
    out
}

fn rewrite(source_uri: &str, term: &Term) -> Term {
    match term {
        Term::Blank(label) => Term::Iri(skolem_iri(source_uri, label)),
        other => other.clone(),
    }
}

fn skolem_iri(source_uri: &str, label: &str) -> Iri {
    Iri::new(format!(
        "{}#{}",
        source_uri.trim_end_matches(['#', '/']),
        label
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CBD: &str = r#"
        @prefix bf: <http://id.loc.gov/ontologies/bibframe/> .
        <http://share-vde.org/w/1> bf:title _:t .
        _:t bf:mainTitle "Moby Dick" .
    "#;

    #[test]
    fn blank_nodes_become_source_scoped_iris() {
        let graph = reconcile("http://a/1", CBD, Format::Turtle).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.iter().all(|t| !t.subject.is_blank() && !t.object.is_blank()));
        let minted: Vec<_> = graph
            .iter()
            .filter_map(|t| t.object.as_iri())
            .filter(|iri| iri.as_str().starts_with("http://a/1#"))
            .collect();
        assert!(!minted.is_empty());
    }

    #[test]
    fn same_source_and_content_is_idempotent() {
        let first = reconcile("http://a/1", CBD, Format::Turtle).unwrap();
        let second = reconcile("http://a/1", CBD, Format::Turtle).unwrap();
        let mut merged = Graph::new();
        merged.merge(first.clone());
        assert_eq!(merged.merge(second), 0);
        assert_eq!(merged.len(), first.len());
    }

    #[test]
    fn distinct_sources_never_collide() {
        let a = reconcile("http://a/1", CBD, Format::Turtle).unwrap();
        let b = reconcile("http://b/2", CBD, Format::Turtle).unwrap();
        let minted = |g: &Graph, prefix: &str| {
            g.iter()
                .filter_map(|t| t.object.as_iri())
                .any(|iri| iri.as_str().starts_with(prefix))
        };
        assert!(minted(&a, "http://a/1#"));
        assert!(minted(&b, "http://b/2#"));
        assert!(!minted(&a, "http://b/2#"));
    }

    #[test]
    fn named_iris_pass_through() {
        let graph = reconcile("http://a/1", CBD, Format::Turtle).unwrap();
        assert!(graph.iter().any(|t| t.subject
            == Term::iri("http://share-vde.org/w/1")));
    }

    proptest! {
        #[test]
        fn skolem_iris_from_different_sources_differ(label in "[a-z][a-z0-9]{0,8}") {
            let a = skolem_iri("http://a/1", &label);
            let b = skolem_iri("http://b/1", &label);
            prop_assert_ne!(a, b);
        }

        #[test]
        fn skolemization_is_deterministic(label in "[a-z][a-z0-9]{0,8}") {
            prop_assert_eq!(
                skolem_iri("http://a/1", &label),
                skolem_iri("http://a/1", &label)
            );
        }
    }
}
