//! Resource ingestion pipeline
//!
//! Everything between a remote resource description (or an uploaded
//! file) and a merge into the graph store: fetching, identifier
//! reconciliation, and the three ingestion modes with their distinct
//! error policies.
//!
//! - Identifier reconciliation / skolemization (`reconcile`)
//! - Fetch seam and HTTP implementation (`client`)
//! - Ingestion modes and reports (`pipeline`)

pub mod client;
pub mod pipeline;
pub mod reconcile;

pub use client::{FetchClient, HttpClient};
pub use pipeline::{load_bulk, load_file, load_resources, IngestReport, SkippedResource};
pub use reconcile::{reconcile, reconcile_value, skolemize};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("resource {url}: {source}")]
    Resource {
        url: String,
        #[source]
        source: bibgraph_core::RdfError,
    },

    #[error("cannot determine RDF syntax for {0}")]
    UnknownExtension(String),

    #[error("unreadable archive: {0}")]
    Archive(String),

    #[error("http client setup failed: {0}")]
    Client(String),

    #[error(transparent)]
    Rdf(#[from] bibgraph_core::RdfError),
}
