//! Shape-based validation
//!
//! A small SHACL core subset, enough to express the cataloging rules
//! the toolkit ships with: class targets and per-property cardinality,
//! datatype, class and pattern constraints, with violation and warning
//! severities. Warnings are reported but never affect conformance.
//!
//! - Shapes loading (`loader`)
//! - Constraint checking (`validator`)
//! - Report model and report graph (`report`)

pub mod loader;
pub mod report;
pub mod validator;

pub use loader::{NodeShape, PropertyShape, ShapesGraph};
pub use report::{Severity, ValidationReport, ValidationResult};
pub use validator::validate;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShaclError {
    #[error("failed to parse shapes graph: {0}")]
    ShapesParse(#[from] bibgraph_core::RdfError),

    #[error("property shape {0} has no sh:path")]
    MissingPath(String),

    #[error("malformed shape {shape}: {message}")]
    InvalidShape { shape: String, message: String },

    #[error("invalid sh:pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}
