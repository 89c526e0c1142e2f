//! # bibgraph CLI
//!
//! Command-line driver for the BIBFRAME graph toolkit. One store is
//! created per process; the interactive mode keeps it alive across
//! commands, which is how the accumulating-graph workflow is meant to
//! be used.

pub mod commands;
pub mod interactive;

pub use commands::*;
pub use interactive::*;
