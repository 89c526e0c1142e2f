//! SPARQL-subset query engine
//!
//! Supports the query forms the toolkit actually issues: `SELECT` with
//! basic graph patterns, `DISTINCT` projection, and `COUNT` aggregates
//! with aliases. Parsing and evaluation are split the usual way:
//! - Lexing and parsing (`parser`)
//! - BGP evaluation and aggregation (`evaluator`)

pub mod evaluator;
pub mod parser;

pub use evaluator::{Binding, QueryResult};
pub use parser::{Aggregate, Projection, Query, TermPattern, TriplePattern};

use bibgraph_core::Graph;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SparqlError {
    #[error("query syntax error at byte {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("query execution error: {0}")]
    Execution(String),
}

/// Parse and evaluate a query against the current graph. An empty graph
/// is legal and yields zero rows.
pub fn execute(graph: &Graph, query_text: &str) -> Result<QueryResult, SparqlError> {
    let query = parser::parse_query(query_text)?;
    evaluator::evaluate(graph, &query)
}

/// The one-click summary queries. These are plain query text run through
/// `execute` so canned and ad hoc queries share one code path.
pub mod canned {
    pub const ALL_TRIPLES: &str =
        "SELECT ?subject ?predicate ?object WHERE { ?subject ?predicate ?object . }";
    pub const DISTINCT_SUBJECTS: &str = "SELECT DISTINCT ?subject WHERE { ?subject ?p ?o . }";
    pub const DISTINCT_PREDICATES: &str =
        "SELECT DISTINCT ?predicate WHERE { ?s ?predicate ?o . }";
    pub const DISTINCT_OBJECTS: &str = "SELECT DISTINCT ?object WHERE { ?s ?p ?object . }";
}

/// Render `PREFIX` lines for the given namespace bindings, the preamble
/// the toolkit seeds the query box with.
pub fn prefix_preamble<'a>(
    prefixes: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> String {
    let mut out = String::new();
    for (prefix, iri) in prefixes {
        out.push_str(&format!("PREFIX {}: <{}>\n", prefix, iri));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibgraph_core::{vocab, Term, Triple};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        for n in 0..3 {
            graph.insert(Triple::new(
                Term::iri(format!("http://example.org/w/{}", n)),
                vocab::rdf_type(),
                Term::Iri(vocab::bf_work()),
            ));
        }
        for n in 0..2 {
            graph.insert(Triple::new(
                Term::iri(format!("http://example.org/i/{}", n)),
                vocab::rdf_type(),
                Term::Iri(vocab::bf_instance()),
            ));
        }
        graph
    }

    #[test]
    fn typed_subject_query_binds_only_projected_variable() {
        let graph = sample_graph();
        let query = "PREFIX bf: <http://id.loc.gov/ontologies/bibframe/>\n\
                     PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
                     SELECT ?s WHERE { ?s rdf:type bf:Work . }";
        let result = execute(&graph, query).unwrap();
        assert_eq!(result.variables, vec!["s"]);
        assert_eq!(result.rows.len(), 3);
        for row in &result.rows {
            assert_eq!(row.len(), 1);
            assert!(!matches!(row[0], Binding::Unbound));
        }
    }

    #[test]
    fn canned_queries_parse_and_run() {
        let graph = sample_graph();
        for canned in [
            canned::ALL_TRIPLES,
            canned::DISTINCT_SUBJECTS,
            canned::DISTINCT_PREDICATES,
            canned::DISTINCT_OBJECTS,
        ] {
            let result = execute(&graph, canned).unwrap();
            assert!(!result.rows.is_empty());
        }
        let subjects = execute(&graph, canned::DISTINCT_SUBJECTS).unwrap();
        assert_eq!(subjects.rows.len(), 5);
        let predicates = execute(&graph, canned::DISTINCT_PREDICATES).unwrap();
        assert_eq!(predicates.rows.len(), 1);
    }

    #[test]
    fn empty_graph_yields_zero_rows() {
        let graph = Graph::new();
        let result = execute(&graph, canned::ALL_TRIPLES).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.variables.len(), 3);
    }

    #[test]
    fn count_aggregates_match_summary_semantics() {
        let graph = sample_graph();
        let query = "SELECT (count(DISTINCT ?s) as ?subjCount) (count(DISTINCT ?p) as ?predCount) \
                     (count(DISTINCT ?o) as ?objCount) WHERE { ?s ?p ?o . }";
        let result = execute(&graph, query).unwrap();
        assert_eq!(
            result.variables,
            vec!["subjCount", "predCount", "objCount"]
        );
        assert_eq!(result.rows.len(), 1);
        let row = &result.rows[0];
        assert_eq!(row[0].lexical(), "5");
        assert_eq!(row[1].lexical(), "1");
        assert_eq!(row[2].lexical(), "2");
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = execute(&Graph::new(), "SELECT ?s WHERE { ?s ").unwrap_err();
        match err {
            SparqlError::Syntax { .. } => {}
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_aggregate_is_an_execution_error() {
        let graph = sample_graph();
        let err = execute(&graph, "SELECT (SUM(?s) as ?x) WHERE { ?s ?p ?o . }").unwrap_err();
        assert!(matches!(err, SparqlError::Execution(_)));
    }

    #[test]
    fn preamble_renders_prefix_lines() {
        let mut graph = Graph::new();
        graph.bind_prefix("bf", vocab::BF);
        let preamble = prefix_preamble(graph.prefixes());
        assert!(preamble.contains("PREFIX bf: <http://id.loc.gov/ontologies/bibframe/>"));
    }
}
