//! # bibgraph - BIBFRAME Graph Toolkit
//!
//! bibgraph assembles BIBFRAME descriptions from remote editors, files
//! and MARC records into one accumulating RDF graph, then lets you
//! query it with a SPARQL subset, validate it against SHACL shapes, and
//! serialize or export the results.
//!
//! ## Quick Start
//!
//! ```rust
//! use bibgraph::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut store = GraphStore::new();
//!     let fragment = bibgraph::core::syntax::parse(
//!         "@prefix bf: <http://id.loc.gov/ontologies/bibframe/> .\n\
//!          <http://example.org/w/1> a bf:Work ; bf:title \"Moby Dick\" .",
//!         Format::Turtle,
//!     )?;
//!     store.merge(fragment);
//!
//!     let result = bibgraph::sparql::execute(
//!         store.graph(),
//!         "PREFIX bf: <http://id.loc.gov/ontologies/bibframe/> \
//!          SELECT ?work WHERE { ?work a bf:Work . }",
//!     )?;
//!     println!("{} work(s)", result.rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! bibgraph consists of several specialized crates:
//!
//! - **`bibgraph-core`**: RDF model, vocabularies, four-syntax codecs
//! - **`bibgraph-store`**: accumulating graph store with summary counts
//! - **`bibgraph-sparql`**: SELECT/COUNT query parser and evaluator
//! - **`bibgraph-shacl`**: shape loading, validation, report graphs
//! - **`bibgraph-ingest`**: fetch, skolemize and merge remote/file RDF
//! - **`bibgraph-marc`**: rule-table driven MARC <-> BIBFRAME conversion
//! - **`bibgraph-export`**: CSV and JSON export of query results
//!
//! ## Feature Flags
//!
//! - `full` (default): all crates included
//! - `core`, `store`, `sparql`, `shacl`, `ingest`, `marc`, `export`:
//!   individual crates

// Re-export all public APIs from sub-crates (feature-gated)

#[cfg(feature = "bibgraph-core")]
pub use bibgraph_core as core;

#[cfg(feature = "bibgraph-store")]
pub use bibgraph_store as store;

#[cfg(feature = "bibgraph-sparql")]
pub use bibgraph_sparql as sparql;

#[cfg(feature = "bibgraph-shacl")]
pub use bibgraph_shacl as shacl;

#[cfg(feature = "bibgraph-ingest")]
pub use bibgraph_ingest as ingest;

#[cfg(feature = "bibgraph-marc")]
pub use bibgraph_marc as marc;

#[cfg(feature = "bibgraph-export")]
pub use bibgraph_export as export;

// Convenience re-exports for common types (feature-gated)
#[cfg(feature = "bibgraph-core")]
pub use bibgraph_core::{Format, Graph, Iri, Literal, Term, Triple};

#[cfg(feature = "bibgraph-store")]
pub use bibgraph_store::{GraphStore, GraphSummary};

#[cfg(feature = "bibgraph-sparql")]
pub use bibgraph_sparql::{Binding, QueryResult};

#[cfg(feature = "bibgraph-shacl")]
pub use bibgraph_shacl::{ShapesGraph, ValidationReport};

#[cfg(feature = "bibgraph-ingest")]
pub use bibgraph_ingest::{FetchClient, HttpClient, IngestReport};

// Commonly used external dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use tokio;

/// Prelude module for convenient imports
///
/// ```rust
/// use bibgraph::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "bibgraph-core")]
    pub use crate::{Format, Graph, Iri, Literal, Term, Triple};

    #[cfg(feature = "bibgraph-store")]
    pub use crate::{GraphStore, GraphSummary};

    #[cfg(feature = "bibgraph-sparql")]
    pub use crate::{Binding, QueryResult};

    #[cfg(feature = "bibgraph-shacl")]
    pub use crate::{ShapesGraph, ValidationReport};

    #[cfg(feature = "bibgraph-ingest")]
    pub use crate::{FetchClient, HttpClient, IngestReport};

    // Common external types
    pub use anyhow::Result;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::Value;
}

/// Current version of bibgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
