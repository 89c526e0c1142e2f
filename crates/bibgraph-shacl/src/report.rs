//! Validation report model.

use crate::loader::sh;
use bibgraph_core::{vocab, Graph, Iri, Literal, Term, Triple};
use serde::{Deserialize, Serialize};

/// Result severity. Only violations affect conformance; warnings are
/// advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Violation,
    Warning,
}

impl Severity {
    pub fn iri(&self) -> Iri {
        match self {
            Severity::Violation => sh("Violation"),
            Severity::Warning => sh("Warning"),
        }
    }
}

/// One constraint failure against one focus node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub focus: Term,
    pub path: Option<Iri>,
    pub value: Option<Term>,
    pub source_shape: Term,
    pub component: Iri,
    pub message: String,
    pub severity: Severity,
}

/// The outcome of validating a data graph. The data graph itself is
/// never modified; the report graph is built on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub conforms: bool,
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    /// Warnings never fail conformance.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let conforms = results
            .iter()
            .all(|r| r.severity != Severity::Violation);
        ValidationReport { conforms, results }
    }

    pub fn violation_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Violation)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }

    /// The report as an RDF graph in the SHACL results vocabulary.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        graph.bind_prefix("sh", vocab::SHACL);
        graph.bind_prefix("rdf", vocab::RDF);
        let report = Term::Blank("report".to_string());
        graph.insert(Triple::new(
            report.clone(),
            vocab::rdf_type(),
            Term::Iri(sh("ValidationReport")),
        ));
        graph.insert(Triple::new(
            report.clone(),
            sh("conforms"),
            Term::Literal(Literal::typed(
                self.conforms.to_string(),
                vocab::xsd_boolean(),
            )),
        ));
        for (n, result) in self.results.iter().enumerate() {
            let node = Term::Blank(format!("result{}", n));
            graph.insert(Triple::new(report.clone(), sh("result"), node.clone()));
            graph.insert(Triple::new(
                node.clone(),
                vocab::rdf_type(),
                Term::Iri(sh("ValidationResult")),
            ));
            graph.insert(Triple::new(
                node.clone(),
                sh("focusNode"),
                result.focus.clone(),
            ));
            if let Some(path) = &result.path {
                graph.insert(Triple::new(
                    node.clone(),
                    sh("resultPath"),
                    Term::Iri(path.clone()),
                ));
            }
            if let Some(value) = &result.value {
                graph.insert(Triple::new(node.clone(), sh("value"), value.clone()));
            }
            graph.insert(Triple::new(
                node.clone(),
                sh("resultSeverity"),
                Term::Iri(result.severity.iri()),
            ));
            graph.insert(Triple::new(
                node.clone(),
                sh("sourceShape"),
                result.source_shape.clone(),
            ));
            graph.insert(Triple::new(
                node.clone(),
                sh("sourceConstraintComponent"),
                Term::Iri(result.component.clone()),
            ));
            graph.insert(Triple::new(
                node,
                sh("resultMessage"),
                Term::Literal(Literal::plain(result.message.clone())),
            ));
        }
        graph
    }
}
