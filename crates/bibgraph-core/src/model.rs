//! RDF terms, triples and the in-memory graph

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// An absolute IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Iri(pub String);

impl Iri {
    pub fn new(iri: impl Into<String>) -> Self {
        Iri(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An RDF literal: lexical value plus optional datatype or language tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<Iri>,
    pub language: Option<String>,
}

impl Literal {
    /// Plain string literal
    pub fn plain(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Typed literal
    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        Literal {
            value: value.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    /// Language-tagged string
    pub fn lang(value: impl Into<String>, tag: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: None,
            language: Some(tag.into()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// An RDF term. Blank nodes only exist in freshly parsed fragments;
/// reconciliation rewrites them to IRIs before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(Iri::new(iri))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Lexical form without any syntax decoration
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(iri) => iri.as_str(),
            Term::Blank(label) => label,
            Term::Literal(lit) => &lit.value,
        }
    }
}

/// A single RDF statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Iri, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }
}

/// A set of triples plus namespace prefixes for serialization.
///
/// Triples are deduplicated by value equality and iterated in insertion
/// order, so merges are idempotent and query results are stable.
/// Prefixes never affect triple identity.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    prefixes: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Insert a triple. Returns false if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    /// Merge another graph in, consuming it. Returns how many triples
    /// were actually new. Prefix bindings are carried over with
    /// last-writer-wins semantics.
    pub fn merge(&mut self, other: Graph) -> usize {
        let mut added = 0;
        for triple in other.triples {
            if self.insert(triple) {
                added += 1;
            }
        }
        for (prefix, iri) in other.prefixes {
            self.prefixes.insert(prefix, iri);
        }
        added
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Register a display prefix; rebinding replaces the old IRI.
    pub fn bind_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Triples matching an optional (s, p, o) pattern, in store order.
    pub fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Iri>,
        object: Option<&Term>,
    ) -> Vec<&Triple> {
        self.triples
            .iter()
            .filter(|t| {
                subject.map_or(true, |s| &t.subject == s)
                    && predicate.map_or(true, |p| &t.predicate == p)
                    && object.map_or(true, |o| &t.object == o)
            })
            .collect()
    }

    pub fn distinct_subjects(&self) -> usize {
        self.triples
            .iter()
            .map(|t| &t.subject)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn distinct_predicates(&self) -> usize {
        self.triples
            .iter()
            .map(|t| &t.predicate)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn distinct_objects(&self) -> usize {
        self.triples
            .iter()
            .map(|t| &t.object)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Compact an IRI to `prefix:local` using the bound prefixes, when
    /// the remainder is a name the compact syntaxes can carry.
    pub fn qname(&self, iri: &Iri) -> Option<String> {
        for (prefix, base) in &self.prefixes {
            if let Some(local) = iri.as_str().strip_prefix(base.as_str()) {
                if !local.is_empty() && is_local_name(local) {
                    return Some(format!("{}:{}", prefix, local));
                }
            }
        }
        None
    }
}

fn is_local_name(local: &str) -> bool {
    let mut chars = local.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::iri(s), Iri::new(p), Term::iri(o))
    }

    #[test]
    fn insert_deduplicates() {
        let mut graph = Graph::new();
        assert!(graph.insert(triple("http://a/s", "http://a/p", "http://a/o")));
        assert!(!graph.insert(triple("http://a/s", "http://a/p", "http://a/o")));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut fragment = Graph::new();
        fragment.insert(triple("http://a/s", "http://a/p", "http://a/o"));
        fragment.insert(triple("http://a/s", "http://a/p2", "http://a/o2"));

        let mut graph = Graph::new();
        assert_eq!(graph.merge(fragment.clone()), 2);
        assert_eq!(graph.merge(fragment), 0);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn match_pattern_filters_each_position() {
        let mut graph = Graph::new();
        graph.insert(triple("http://a/s1", "http://a/p", "http://a/o"));
        graph.insert(triple("http://a/s2", "http://a/p", "http://a/o"));

        let subject = Term::iri("http://a/s1");
        assert_eq!(graph.match_pattern(Some(&subject), None, None).len(), 1);
        let predicate = Iri::new("http://a/p");
        assert_eq!(graph.match_pattern(None, Some(&predicate), None).len(), 2);
        assert!(graph
            .match_pattern(None, Some(&Iri::new("http://a/missing")), None)
            .is_empty());
    }

    #[test]
    fn distinct_counts() {
        let mut graph = Graph::new();
        graph.insert(triple("http://a/s", "http://a/p1", "http://a/o1"));
        graph.insert(triple("http://a/s", "http://a/p2", "http://a/o2"));
        assert_eq!(graph.distinct_subjects(), 1);
        assert_eq!(graph.distinct_predicates(), 2);
        assert_eq!(graph.distinct_objects(), 2);
    }

    #[test]
    fn qname_uses_bound_prefixes() {
        let mut graph = Graph::new();
        graph.bind_prefix("bf", "http://id.loc.gov/ontologies/bibframe/");
        let iri = Iri::new("http://id.loc.gov/ontologies/bibframe/title");
        assert_eq!(graph.qname(&iri), Some("bf:title".to_string()));
        assert_eq!(graph.qname(&Iri::new("http://other/x y")), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_triple() -> impl Strategy<Value = Triple> {
            // A tiny universe so collisions actually happen.
            (0u8..4, 0u8..4, 0u8..4).prop_map(|(s, p, o)| {
                Triple::new(
                    Term::iri(format!("http://t/s{}", s)),
                    Iri::new(format!("http://t/p{}", p)),
                    Term::iri(format!("http://t/o{}", o)),
                )
            })
        }

        proptest! {
            #[test]
            fn merge_is_commutative(
                a in proptest::collection::vec(arb_triple(), 0..20),
                b in proptest::collection::vec(arb_triple(), 0..20),
            ) {
                let mut left_a = Graph::new();
                let mut left_b = Graph::new();
                for t in &a { left_a.insert(t.clone()); }
                for t in &b { left_b.insert(t.clone()); }

                let mut ab = left_a.clone();
                ab.merge(left_b.clone());
                let mut ba = left_b;
                ba.merge(left_a);

                prop_assert_eq!(ab.len(), ba.len());
                for t in ab.iter() {
                    prop_assert!(ba.contains(t));
                }
            }

            #[test]
            fn remerging_adds_nothing(
                triples in proptest::collection::vec(arb_triple(), 0..20),
            ) {
                let mut fragment = Graph::new();
                for t in &triples { fragment.insert(t.clone()); }
                let mut graph = Graph::new();
                graph.merge(fragment.clone());
                let before = graph.len();
                prop_assert_eq!(graph.merge(fragment), 0);
                prop_assert_eq!(graph.len(), before);
            }
        }
    }
}
