//! Basic graph pattern evaluation and aggregation.
//!
//! Evaluation is a straightforward nested-loop join: each triple
//! pattern filters and extends the solution set produced by the
//! previous ones. Graphs here are small enough that no index beyond
//! the store's own pattern matching is needed.

use crate::parser::{Aggregate, Projection, Query, TermPattern};
use crate::SparqlError;
use bibgraph_core::{vocab, Graph, Iri, Literal, Term};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// One cell of a result row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    Iri(Iri),
    Blank(String),
    Literal(Literal),
    Unbound,
}

impl Binding {
    /// The lexical form shown in result tables and exports. Unbound
    /// cells render as the empty string.
    pub fn lexical(&self) -> &str {
        match self {
            Binding::Iri(iri) => iri.as_str(),
            Binding::Blank(label) => label,
            Binding::Literal(literal) => &literal.value,
            Binding::Unbound => "",
        }
    }

    fn from_term(term: &Term) -> Binding {
        match term {
            Term::Iri(iri) => Binding::Iri(iri.clone()),
            Term::Blank(label) => Binding::Blank(label.clone()),
            Term::Literal(literal) => Binding::Literal(literal.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub variables: Vec<String>,
    pub rows: Vec<Vec<Binding>>,
}

type Solution = HashMap<String, Term>;

pub fn evaluate(graph: &Graph, query: &Query) -> Result<QueryResult, SparqlError> {
    let solutions = solve_bgp(graph, &query.patterns);
    let mut result = match &query.projection {
        Projection::All => project(&pattern_variables(query), &solutions),
        Projection::Variables(variables) => project(variables, &solutions),
        Projection::Aggregates(aggregates) => {
            return aggregate(aggregates, &solutions);
        }
    };
    if query.distinct {
        result.rows = result.rows.into_iter().unique().collect();
    }
    Ok(result)
}

fn solve_bgp(graph: &Graph, patterns: &[crate::parser::TriplePattern]) -> Vec<Solution> {
    let mut solutions: Vec<Solution> = vec![HashMap::new()];
    for pattern in patterns {
        let mut next = Vec::new();
        for solution in &solutions {
            for triple in graph.iter() {
                let mut candidate = solution.clone();
                let predicate = Term::Iri(triple.predicate.clone());
                if unify(&pattern.subject, &triple.subject, &mut candidate)
                    && unify(&pattern.predicate, &predicate, &mut candidate)
                    && unify(&pattern.object, &triple.object, &mut candidate)
                {
                    next.push(candidate);
                }
            }
        }
        solutions = next;
        if solutions.is_empty() {
            break;
        }
    }
    solutions
}

/// Try to match one pattern position against a concrete term,
/// extending the solution when the position is an unbound variable.
fn unify(pattern: &TermPattern, term: &Term, solution: &mut Solution) -> bool {
    match pattern {
        TermPattern::Variable(name) => match solution.get(name) {
            Some(bound) => bound == term,
            None => {
                solution.insert(name.clone(), term.clone());
                true
            }
        },
        TermPattern::Iri(iri) => matches!(term, Term::Iri(t) if t == iri),
        TermPattern::Literal(literal) => {
            matches!(term, Term::Literal(t) if t == literal)
        }
    }
}

/// Variables in order of first appearance, for `SELECT *`.
fn pattern_variables(query: &Query) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut variables = Vec::new();
    for pattern in &query.patterns {
        for term in [&pattern.subject, &pattern.predicate, &pattern.object] {
            if let Some(name) = term.as_variable() {
                if seen.insert(name.to_string()) {
                    variables.push(name.to_string());
                }
            }
        }
    }
    variables
}

fn project(variables: &[String], solutions: &[Solution]) -> QueryResult {
    let rows = solutions
        .iter()
        .map(|solution| {
            variables
                .iter()
                .map(|name| match solution.get(name) {
                    Some(term) => Binding::from_term(term),
                    None => Binding::Unbound,
                })
                .collect()
        })
        .collect();
    QueryResult {
        variables: variables.to_vec(),
        rows,
    }
}

/// Aggregates collapse the solution set to a single row. Only `COUNT`
/// is supported; anything else is an execution error so the caller can
/// distinguish it from a malformed query.
fn aggregate(
    aggregates: &[Aggregate],
    solutions: &[Solution],
) -> Result<QueryResult, SparqlError> {
    let mut variables = Vec::with_capacity(aggregates.len());
    let mut row = Vec::with_capacity(aggregates.len());
    for aggregate in aggregates {
        if !aggregate.function.eq_ignore_ascii_case("count") {
            return Err(SparqlError::Execution(format!(
                "unsupported aggregate function: {}",
                aggregate.function
            )));
        }
        let count = match &aggregate.var {
            Some(var) if aggregate.distinct => solutions
                .iter()
                .filter_map(|solution| solution.get(var))
                .collect::<HashSet<_>>()
                .len(),
            Some(var) => solutions
                .iter()
                .filter(|solution| solution.contains_key(var))
                .count(),
            None => solutions.len(),
        };
        variables.push(aggregate.alias.clone());
        row.push(Binding::Literal(Literal::typed(
            count.to_string(),
            vocab::xsd_integer(),
        )));
    }
    Ok(QueryResult {
        variables,
        rows: vec![row],
    })
}
