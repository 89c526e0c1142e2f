//! MARC <-> BIBFRAME converter
//!
//! Both directions run off one declarative rule table (`rules`), so the
//! mapping can change without touching the codecs. Records exist only
//! as conversion intermediates; nothing here touches a store.
//!
//! - Record model (`record`)
//! - ISO 2709 binary codec (`binary`)
//! - MARCXML codec (`xml`)
//! - Versioned rule table (`rules`)
//! - Conversion entry points (`convert`)

pub mod binary;
pub mod convert;
pub mod record;
pub mod rules;
pub mod xml;

pub use convert::{bibframe_to_marc, marc_to_bibframe};
pub use record::{Field, MarcRecord, Subfield};
pub use rules::{Entity, FieldRule, RuleSet};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarcError {
    #[error("unsupported record format: {0}")]
    UnsupportedRecordFormat(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("graph contains no Instance entity")]
    NoInstance,

    #[error("unknown target format: {0}")]
    UnknownTargetFormat(String),
}
