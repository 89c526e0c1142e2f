//! In-memory graph store
//!
//! One `GraphStore` is created at process start and owns the
//! accumulating BIBFRAME graph for the process lifetime. It is mutated
//! only through `merge`, which is idempotent and never rolls back
//! previously merged triples. Exclusive access (`&mut`) is the merge
//! critical section; callers that interleave ingestion tasks must hold
//! the store behind a single writer.

pub mod store;

pub use store::{GraphStore, GraphSummary, StoreError};
