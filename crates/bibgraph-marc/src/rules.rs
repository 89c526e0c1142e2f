//! The declarative conversion rule table.
//!
//! One versioned JSON document drives both directions: each rule binds
//! a MARC tag/subfield to a predicate on either the Work or the
//! Instance entity. Keeping the table external to the code means the
//! mapping can be revised without a rebuild.

use crate::MarcError;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const BUNDLED: &str = include_str!("../rules/bibframe.json");

static DEFAULT: OnceLock<RuleSet> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: u32,
    pub work_uri_template: String,
    pub instance_uri_template: String,
    pub rules: Vec<FieldRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub tag: String,
    pub subfield: char,
    pub entity: Entity,
    pub predicate: String,
}

/// Which entity of the converted pair a rule writes to / reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Work,
    Instance,
}

impl RuleSet {
    /// The bundled table, parsed once per process.
    pub fn bundled() -> Result<&'static RuleSet, MarcError> {
        if let Some(rules) = DEFAULT.get() {
            return Ok(rules);
        }
        let parsed = RuleSet::from_json(BUNDLED)?;
        Ok(DEFAULT.get_or_init(|| parsed))
    }

    pub fn from_json(text: &str) -> Result<RuleSet, MarcError> {
        serde_json::from_str(text)
            .map_err(|e| MarcError::Conversion(format!("rule table: {}", e)))
    }

    pub fn work_uri(&self, id: &str) -> String {
        self.work_uri_template.replace("{id}", id)
    }

    pub fn instance_uri(&self, id: &str) -> String {
        self.instance_uri_template.replace("{id}", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_table_parses() {
        let rules = RuleSet::bundled().unwrap();
        assert_eq!(rules.version, 1);
        assert!(rules
            .rules
            .iter()
            .any(|r| r.tag == "245" && r.subfield == 'a' && r.entity == Entity::Instance));
    }

    #[test]
    fn uri_templates_substitute_the_record_id() {
        let rules = RuleSet::bundled().unwrap();
        assert_eq!(
            rules.instance_uri("in001"),
            "http://bibgraph.example/instance/in001"
        );
        assert_ne!(rules.work_uri("in001"), rules.instance_uri("in001"));
    }

    #[test]
    fn malformed_table_is_a_conversion_error() {
        assert!(matches!(
            RuleSet::from_json("{\"version\": 1}"),
            Err(MarcError::Conversion(_))
        ));
    }
}
