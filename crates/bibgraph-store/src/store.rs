//! Graph store and summary statistics

use bibgraph_core::syntax::{self, Format};
use bibgraph_core::{vocab, Graph, Iri, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown serialization format: {0}")]
    UnknownFormat(String),

    #[error("cannot serialize an empty graph")]
    EmptyGraph,

    #[error(transparent)]
    Rdf(#[from] bibgraph_core::RdfError),
}

/// The shared mutable triple collection.
///
/// Created once with the default namespaces pre-bound, then grown by
/// merging reconciled fragments.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: Graph,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        let mut graph = Graph::new();
        for (prefix, iri) in vocab::DEFAULT_NAMESPACES {
            graph.bind_prefix(*prefix, *iri);
        }
        GraphStore { graph }
    }

    /// Merge a reconciled fragment in. Commutative, idempotent; returns
    /// the number of triples that were new.
    pub fn merge(&mut self, fragment: Graph) -> usize {
        self.graph.merge(fragment)
    }

    /// Register a display prefix; rebinding replaces the previous IRI.
    pub fn bind_namespace(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.graph.bind_prefix(prefix, iri);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn count(&self) -> usize {
        self.graph.len()
    }

    pub fn distinct_subjects(&self) -> usize {
        self.graph.distinct_subjects()
    }

    pub fn distinct_predicates(&self) -> usize {
        self.graph.distinct_predicates()
    }

    pub fn distinct_objects(&self) -> usize {
        self.graph.distinct_objects()
    }

    /// Distinct subjects carrying `rdf:type <type_iri>`.
    pub fn count_by_type(&self, type_iri: &Iri) -> usize {
        let object = Term::Iri(type_iri.clone());
        self.graph
            .match_pattern(None, Some(&vocab::rdf_type()), Some(&object))
            .into_iter()
            .map(|t| &t.subject)
            .collect::<HashSet<_>>()
            .len()
    }

    /// The summary panel counts: totals plus Work/Instance tallies.
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            triples: self.count(),
            subjects: self.distinct_subjects(),
            predicates: self.distinct_predicates(),
            objects: self.distinct_objects(),
            works: self.count_by_type(&vocab::bf_work()),
            instances: self.count_by_type(&vocab::bf_instance()),
        }
    }

    /// Serialize the store in the requested syntax. Serializing an empty
    /// store is a caller error, not an empty file.
    pub fn serialize(&self, format_token: &str) -> Result<String, StoreError> {
        let format = Format::from_token(format_token)
            .ok_or_else(|| StoreError::UnknownFormat(format_token.to_string()))?;
        if self.graph.is_empty() {
            return Err(StoreError::EmptyGraph);
        }
        Ok(syntax::serialize(&self.graph, format)?)
    }

    /// Copy of the current graph, for callers that need to restore the
    /// store around a batch.
    pub fn snapshot(&self) -> Graph {
        self.graph.clone()
    }

    pub fn restore(&mut self, snapshot: Graph) {
        self.graph = snapshot;
    }
}

/// Counts shown after every ingestion, mirroring the toolkit's summary
/// badges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub triples: usize,
    pub subjects: usize,
    pub predicates: usize,
    pub objects: usize,
    pub works: usize,
    pub instances: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibgraph_core::{Literal, Triple};

    fn work(n: usize) -> Graph {
        let mut g = Graph::new();
        let subject = Term::iri(format!("http://example.org/w/{}", n));
        g.insert(Triple::new(
            subject.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        g.insert(Triple::new(
            subject,
            Iri::new(format!("{}title", vocab::BF)),
            Term::Literal(Literal::plain(format!("Work {}", n))),
        ));
        g
    }

    #[test]
    fn new_store_has_default_namespaces() {
        let store = GraphStore::new();
        assert_eq!(
            store.graph().prefixes().get("bf").map(String::as_str),
            Some(vocab::BF)
        );
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut store = GraphStore::new();
        assert_eq!(store.merge(work(1)), 2);
        assert_eq!(store.merge(work(1)), 0);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn summary_counts_typed_entities() {
        let mut store = GraphStore::new();
        store.merge(work(1));
        store.merge(work(2));
        let mut instance = Graph::new();
        instance.insert(Triple::new(
            Term::iri("http://example.org/i/1"),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_instance()),
        ));
        store.merge(instance);

        let summary = store.summary();
        assert_eq!(summary.triples, 5);
        assert_eq!(summary.works, 2);
        assert_eq!(summary.instances, 1);
        assert_eq!(summary.subjects, 3);
    }

    #[test]
    fn serialize_empty_store_is_an_error() {
        let store = GraphStore::new();
        assert!(matches!(
            store.serialize("ttl"),
            Err(StoreError::EmptyGraph)
        ));
    }

    #[test]
    fn serialize_unknown_token_is_an_error() {
        let mut store = GraphStore::new();
        store.merge(work(1));
        assert!(matches!(
            store.serialize("pdf"),
            Err(StoreError::UnknownFormat(_))
        ));
        assert!(store.serialize("json-ld").is_ok());
    }

    #[test]
    fn snapshot_restores_prior_state() {
        let mut store = GraphStore::new();
        store.merge(work(1));
        let snapshot = store.snapshot();
        store.merge(work(2));
        assert_eq!(store.count(), 4);
        store.restore(snapshot);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn round_trips_every_export_syntax() {
        let mut store = GraphStore::new();
        store.merge(work(1));
        let mut instance = Graph::new();
        instance.insert(Triple::new(
            Term::iri("http://example.org/i/1"),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_instance()),
        ));
        store.merge(instance);

        for (token, format) in [
            ("ttl", Format::Turtle),
            ("nt", Format::NTriples),
            ("xml", Format::RdfXml),
            ("json-ld", Format::JsonLd),
        ] {
            let payload = store.serialize(token).unwrap();
            let reparsed = syntax::parse(&payload, format).unwrap();
            assert_eq!(reparsed.len(), store.count(), "format {}", token);
        }
    }
}
