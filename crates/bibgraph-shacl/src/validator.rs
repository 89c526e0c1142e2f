//! Constraint checking.

use crate::loader::{sh, NodeShape, PropertyShape, ShapesGraph};
use crate::report::{ValidationReport, ValidationResult};
use bibgraph_core::{vocab, Graph, Term};
use std::collections::HashSet;

/// Validate a data graph against a shapes table. The data graph is
/// read-only; the report carries every constraint failure found.
pub fn validate(data: &Graph, shapes: &ShapesGraph) -> ValidationReport {
    let mut results = Vec::new();
    for shape in &shapes.shapes {
        for focus in focus_nodes(data, shape) {
            for property in &shape.properties {
                check_property(data, property, &focus, &mut results);
            }
        }
    }
    ValidationReport::from_results(results)
}

/// Every subject typed with the shape's target class, in store order.
fn focus_nodes(data: &Graph, shape: &NodeShape) -> Vec<Term> {
    let class = Term::Iri(shape.target_class.clone());
    let mut seen = HashSet::new();
    data.match_pattern(None, Some(&vocab::rdf_type()), Some(&class))
        .into_iter()
        .map(|t| t.subject.clone())
        .filter(|subject| seen.insert(subject.clone()))
        .collect()
}

fn check_property(
    data: &Graph,
    property: &PropertyShape,
    focus: &Term,
    results: &mut Vec<ValidationResult>,
) {
    let values: Vec<&Term> = data
        .match_pattern(Some(focus), Some(&property.path), None)
        .into_iter()
        .map(|t| &t.object)
        .collect();

    if let Some(min) = property.min_count {
        if (values.len() as u64) < min {
            results.push(result(
                property,
                focus,
                None,
                "MinCountConstraintComponent",
                format!(
                    "expected at least {} value(s) for <{}>, found {}",
                    min,
                    property.path,
                    values.len()
                ),
            ));
        }
    }
    if let Some(max) = property.max_count {
        if (values.len() as u64) > max {
            results.push(result(
                property,
                focus,
                None,
                "MaxCountConstraintComponent",
                format!(
                    "expected at most {} value(s) for <{}>, found {}",
                    max,
                    property.path,
                    values.len()
                ),
            ));
        }
    }
    if let Some(datatype) = &property.datatype {
        for value in &values {
            let actual = match value {
                Term::Literal(literal) => match (&literal.datatype, &literal.language) {
                    (Some(dt), _) => dt.clone(),
                    (None, Some(_)) => vocab::rdf_lang_string(),
                    (None, None) => vocab::xsd_string(),
                },
                _ => {
                    results.push(result(
                        property,
                        focus,
                        Some(value),
                        "DatatypeConstraintComponent",
                        format!("value of <{}> is not a literal", property.path),
                    ));
                    continue;
                }
            };
            if actual != *datatype {
                results.push(result(
                    property,
                    focus,
                    Some(value),
                    "DatatypeConstraintComponent",
                    format!(
                        "value of <{}> has datatype <{}>, expected <{}>",
                        property.path, actual, datatype
                    ),
                ));
            }
        }
    }
    if let Some(class) = &property.class {
        let class_term = Term::Iri(class.clone());
        for value in &values {
            let typed = !matches!(value, Term::Literal(_))
                && !data
                    .match_pattern(Some(value), Some(&vocab::rdf_type()), Some(&class_term))
                    .is_empty();
            if !typed {
                results.push(result(
                    property,
                    focus,
                    Some(value),
                    "ClassConstraintComponent",
                    format!(
                        "value of <{}> is not an instance of <{}>",
                        property.path, class
                    ),
                ));
            }
        }
    }
    if let Some(pattern) = &property.pattern {
        for value in &values {
            if value.is_blank() {
                continue;
            }
            if !pattern.regex.is_match(value.lexical()) {
                results.push(result(
                    property,
                    focus,
                    Some(value),
                    "PatternConstraintComponent",
                    format!(
                        "value {:?} of <{}> does not match pattern {:?}",
                        value.lexical(),
                        property.path,
                        pattern.source
                    ),
                ));
            }
        }
    }
}

fn result(
    property: &PropertyShape,
    focus: &Term,
    value: Option<&&Term>,
    component: &str,
    default_message: String,
) -> ValidationResult {
    ValidationResult {
        focus: focus.clone(),
        path: Some(property.path.clone()),
        value: value.map(|v| (*v).clone()),
        source_shape: property.id.clone(),
        component: sh(component),
        message: property.message.clone().unwrap_or(default_message),
        severity: property.severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use bibgraph_core::{Iri, Literal, Triple};

    const SHAPES: &str = r#"
        @prefix sh: <http://www.w3.org/ns/shacl#> .
        @prefix bf: <http://id.loc.gov/ontologies/bibframe/> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        @prefix ex: <http://example.org/shapes/> .

        ex:WorkShape a sh:NodeShape ;
            sh:targetClass bf:Work ;
            sh:property ex:WorkTitle ;
            sh:property ex:WorkAdmin .

        ex:WorkTitle a sh:PropertyShape ;
            sh:path bf:title ;
            sh:minCount 1 ;
            sh:datatype xsd:string .

        ex:WorkAdmin a sh:PropertyShape ;
            sh:path bf:adminMetadata ;
            sh:minCount 1 ;
            sh:severity sh:Warning .

        ex:InstanceShape a sh:NodeShape ;
            sh:targetClass bf:Instance ;
            sh:property ex:InstanceOf .

        ex:InstanceOf a sh:PropertyShape ;
            sh:path bf:instanceOf ;
            sh:minCount 1 ;
            sh:class bf:Work .
    "#;

    fn bf(local: &str) -> Iri {
        Iri::new(format!("{}{}", vocab::BF, local))
    }

    fn shapes() -> ShapesGraph {
        ShapesGraph::from_turtle(SHAPES).unwrap()
    }

    fn work_with_title() -> Graph {
        let mut graph = Graph::new();
        let work = Term::iri("http://example.org/w/1");
        graph.insert(Triple::new(
            work.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        graph.insert(Triple::new(
            work.clone(),
            bf("title"),
            Term::Literal(Literal::plain("Moby Dick")),
        ));
        graph.insert(Triple::new(
            work,
            bf("adminMetadata"),
            Term::iri("http://example.org/admin/1"),
        ));
        graph
    }

    #[test]
    fn conforming_graph_produces_empty_report() {
        let report = validate(&work_with_title(), &shapes());
        assert!(report.conforms);
        assert!(report.results.is_empty());
    }

    #[test]
    fn missing_required_property_is_a_violation() {
        let mut graph = Graph::new();
        graph.insert(Triple::new(
            Term::iri("http://example.org/w/1"),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        let report = validate(&graph, &shapes());
        assert!(!report.conforms);
        assert_eq!(report.violation_count(), 1);
        assert_eq!(report.warning_count(), 1);
        let violation = report
            .results
            .iter()
            .find(|r| r.severity == Severity::Violation)
            .unwrap();
        assert_eq!(violation.path.as_ref().unwrap(), &bf("title"));
        assert_eq!(violation.component, sh("MinCountConstraintComponent"));
    }

    #[test]
    fn warning_alone_still_conforms() {
        let mut graph = work_with_title();
        // A second work without adminMetadata but with a title.
        let work = Term::iri("http://example.org/w/2");
        graph.insert(Triple::new(
            work.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        graph.insert(Triple::new(
            work,
            bf("title"),
            Term::Literal(Literal::plain("Pierre")),
        ));
        let report = validate(&graph, &shapes());
        assert!(report.conforms);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn datatype_mismatch_is_reported_per_value() {
        let mut graph = work_with_title();
        graph.insert(Triple::new(
            Term::iri("http://example.org/w/1"),
            bf("title"),
            Term::Literal(Literal::typed("42", vocab::xsd_integer())),
        ));
        let report = validate(&graph, &shapes());
        assert!(!report.conforms);
        let result = &report.results[0];
        assert_eq!(result.component, sh("DatatypeConstraintComponent"));
        assert_eq!(
            result.value,
            Some(Term::Literal(Literal::typed("42", vocab::xsd_integer())))
        );
    }

    #[test]
    fn class_constraint_requires_typed_target() {
        let mut graph = Graph::new();
        let instance = Term::iri("http://example.org/i/1");
        graph.insert(Triple::new(
            instance.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_instance()),
        ));
        // instanceOf points at an untyped node
        graph.insert(Triple::new(
            instance,
            bf("instanceOf"),
            Term::iri("http://example.org/w/1"),
        ));
        let report = validate(&graph, &shapes());
        assert!(!report.conforms);
        assert_eq!(report.results[0].component, sh("ClassConstraintComponent"));

        // Typing the target fixes it.
        let mut graph2 = graph_with_typed_work(graph.clone());
        graph2.insert(Triple::new(
            Term::iri("http://example.org/w/1"),
            bf("title"),
            Term::Literal(Literal::plain("Typee")),
        ));
        graph2.insert(Triple::new(
            Term::iri("http://example.org/w/1"),
            bf("adminMetadata"),
            Term::iri("http://example.org/admin/1"),
        ));
        assert!(validate(&graph2, &shapes()).conforms);
    }

    fn graph_with_typed_work(mut graph: Graph) -> Graph {
        graph.insert(Triple::new(
            Term::iri("http://example.org/w/1"),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        graph
    }

    #[test]
    fn pattern_constraint_matches_lexical_form() {
        let shapes = ShapesGraph::from_turtle(
            "@prefix sh: <http://www.w3.org/ns/shacl#> .\n\
             @prefix bf: <http://id.loc.gov/ontologies/bibframe/> .\n\
             @prefix ex: <http://example.org/shapes/> .\n\
             ex:S sh:targetClass bf:Work ; sh:property ex:P .\n\
             ex:P sh:path bf:identifiedBy ; sh:pattern \"^[0-9X-]+$\" .",
        )
        .unwrap();
        let mut graph = Graph::new();
        let work = Term::iri("http://example.org/w/1");
        graph.insert(Triple::new(
            work.clone(),
            vocab::rdf_type(),
            Term::Iri(vocab::bf_work()),
        ));
        graph.insert(Triple::new(
            work.clone(),
            bf("identifiedBy"),
            Term::Literal(Literal::plain("978-0-14-243724-7")),
        ));
        assert!(validate(&graph, &shapes).conforms);

        graph.insert(Triple::new(
            work,
            bf("identifiedBy"),
            Term::Literal(Literal::plain("not an isbn")),
        ));
        let report = validate(&graph, &shapes);
        assert!(!report.conforms);
        assert_eq!(report.results[0].component, sh("PatternConstraintComponent"));
    }

    #[test]
    fn validation_leaves_data_graph_untouched() {
        let graph = work_with_title();
        let before = graph.len();
        let _ = validate(&graph, &shapes());
        assert_eq!(graph.len(), before);
    }
}
