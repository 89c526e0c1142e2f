//! The transient MARC record model shared by both codecs.

/// One bibliographic record: a leader plus ordered fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarcRecord {
    pub leader: String,
    pub fields: Vec<Field>,
}

/// A control field (tags 001-009) carries bare data; a data field
/// carries indicators and subfields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Control {
        tag: String,
        value: String,
    },
    Data {
        tag: String,
        ind1: char,
        ind2: char,
        subfields: Vec<Subfield>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Field {
    pub fn tag(&self) -> &str {
        match self {
            Field::Control { tag, .. } => tag,
            Field::Data { tag, .. } => tag,
        }
    }
}

impl MarcRecord {
    pub fn new(leader: impl Into<String>) -> Self {
        MarcRecord {
            leader: leader.into(),
            fields: Vec::new(),
        }
    }

    /// The value of the first control field with this tag.
    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            Field::Control { tag: t, value } if t == tag => Some(value.as_str()),
            _ => None,
        })
    }

    /// Every data field with this tag, in record order.
    pub fn data_fields(&self, tag: &str) -> Vec<(&char, &char, &[Subfield])> {
        self.fields
            .iter()
            .filter_map(|field| match field {
                Field::Data {
                    tag: t,
                    ind1,
                    ind2,
                    subfields,
                } if t == tag => Some((ind1, ind2, subfields.as_slice())),
                _ => None,
            })
            .collect()
    }

    /// Every value of `code` under data fields with `tag`.
    pub fn subfield_values(&self, tag: &str, code: char) -> Vec<&str> {
        self.data_fields(tag)
            .into_iter()
            .flat_map(|(_, _, subfields)| {
                subfields
                    .iter()
                    .filter(move |s| s.code == code)
                    .map(|s| s.value.as_str())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MarcRecord {
        MarcRecord {
            leader: "00000nam a2200000 a 4500".to_string(),
            fields: vec![
                Field::Control {
                    tag: "001".to_string(),
                    value: "12345".to_string(),
                },
                Field::Data {
                    tag: "245".to_string(),
                    ind1: '1',
                    ind2: '0',
                    subfields: vec![
                        Subfield {
                            code: 'a',
                            value: "Moby Dick :".to_string(),
                        },
                        Subfield {
                            code: 'b',
                            value: "or, the whale".to_string(),
                        },
                    ],
                },
            ],
        }
    }

    #[test]
    fn control_field_lookup() {
        assert_eq!(record().control_field("001"), Some("12345"));
        assert_eq!(record().control_field("008"), None);
    }

    #[test]
    fn subfield_values_filter_by_tag_and_code() {
        let record = record();
        assert_eq!(record.subfield_values("245", 'a'), vec!["Moby Dick :"]);
        assert_eq!(record.subfield_values("245", 'b'), vec!["or, the whale"]);
        assert!(record.subfield_values("245", 'c').is_empty());
        assert!(record.subfield_values("100", 'a').is_empty());
    }
}
