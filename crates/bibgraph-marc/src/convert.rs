//! Conversion entry points.

use crate::record::{Field, MarcRecord, Subfield};
use crate::rules::{Entity, RuleSet};
use crate::{binary, xml, MarcError};
use bibgraph_core::{vocab, Graph, Iri, Literal, Term, Triple};

const DEFAULT_LEADER: &str = "00000nam a2200000 a 4500";

fn bf(local: &str) -> Iri {
    Iri::new(format!("{}{}", vocab::BF, local))
}

/// Convert an uploaded MARC file to a BIBFRAME graph. The format is
/// chosen by file extension: `mrc`/`marc` for binary (only the first
/// record of a binary file is converted per call), `xml` for MARCXML.
/// The result is a standalone graph; the caller decides whether to
/// merge it.
pub fn marc_to_bibframe(name: &str, bytes: &[u8]) -> Result<Graph, MarcError> {
    let rules = RuleSet::bundled()?;
    let ext = name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let records = match ext.as_str() {
        "mrc" | "marc" => {
            let mut all = binary::parse_records(bytes)?;
            all.truncate(1);
            all
        }
        "xml" => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| MarcError::Conversion("MARCXML is not valid UTF-8".to_string()))?;
            xml::parse(text)?
        }
        other => return Err(MarcError::UnsupportedRecordFormat(other.to_string())),
    };

    let mut graph = Graph::new();
    graph.bind_prefix("bf", vocab::BF);
    graph.bind_prefix("rdf", vocab::RDF);
    for record in &records {
        import_record(record, rules, &mut graph);
    }
    Ok(graph)
}

fn import_record(record: &MarcRecord, rules: &RuleSet, graph: &mut Graph) {
    let id = record
        .control_field("001")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("record")
        .to_string();
    let work = Term::iri(rules.work_uri(&id));
    let instance = Term::iri(rules.instance_uri(&id));

    graph.insert(Triple::new(
        work.clone(),
        vocab::rdf_type(),
        Term::Iri(vocab::bf_work()),
    ));
    graph.insert(Triple::new(
        instance.clone(),
        vocab::rdf_type(),
        Term::Iri(vocab::bf_instance()),
    ));
    graph.insert(Triple::new(
        instance.clone(),
        bf("instanceOf"),
        work.clone(),
    ));

    for rule in &rules.rules {
        let subject = match rule.entity {
            Entity::Work => &work,
            Entity::Instance => &instance,
        };
        for value in record.subfield_values(&rule.tag, rule.subfield) {
            graph.insert(Triple::new(
                subject.clone(),
                Iri::new(rule.predicate.clone()),
                Term::Literal(Literal::plain(value)),
            ));
        }
    }
}

/// Convert a BIBFRAME graph to MARC. Requires at least one
/// Instance-typed entity; the first one (in store order) becomes the
/// record. `xml` yields MARCXML, `mrc`/`marc` yield binary MARC.
pub fn bibframe_to_marc(graph: &Graph, target_format: &str) -> Result<Vec<u8>, MarcError> {
    let rules = RuleSet::bundled()?;
    let record = export_record(graph, rules)?;
    match target_format {
        "xml" => Ok(xml::write(&[record]).into_bytes()),
        "mrc" | "marc" => Ok(binary::write_record(&record)),
        other => Err(MarcError::UnknownTargetFormat(other.to_string())),
    }
}

fn export_record(graph: &Graph, rules: &RuleSet) -> Result<MarcRecord, MarcError> {
    let instance = graph
        .match_pattern(
            None,
            Some(&vocab::rdf_type()),
            Some(&Term::Iri(vocab::bf_instance())),
        )
        .first()
        .map(|t| t.subject.clone())
        .ok_or(MarcError::NoInstance)?;
    let work = graph
        .match_pattern(Some(&instance), Some(&bf("instanceOf")), None)
        .first()
        .map(|t| t.object.clone());

    let mut record = MarcRecord::new(DEFAULT_LEADER);
    record.fields.push(Field::Control {
        tag: "001".to_string(),
        value: record_id(&instance),
    });

    // Consecutive rules sharing a tag and entity fold into one data
    // field, so 245 $a and $b land in the same field.
    let mut index = 0;
    while index < rules.rules.len() {
        let head = &rules.rules[index];
        let mut subfields = Vec::new();
        let mut end = index;
        while end < rules.rules.len()
            && rules.rules[end].tag == head.tag
            && rules.rules[end].entity == head.entity
        {
            let rule = &rules.rules[end];
            let subject = match rule.entity {
                Entity::Instance => Some(&instance),
                Entity::Work => work.as_ref(),
            };
            if let Some(subject) = subject {
                let predicate = Iri::new(rule.predicate.clone());
                for triple in graph.match_pattern(Some(subject), Some(&predicate), None) {
                    if let Term::Literal(literal) = &triple.object {
                        subfields.push(Subfield {
                            code: rule.subfield,
                            value: literal.value.clone(),
                        });
                    }
                }
            }
            end += 1;
        }
        if !subfields.is_empty() {
            record.fields.push(Field::Data {
                tag: head.tag.clone(),
                ind1: ' ',
                ind2: ' ',
                subfields,
            });
        }
        index = end;
    }
    Ok(record)
}

/// The last path segment of the entity IRI, used as the 001 value so a
/// re-import reconstructs the same entity IRIs.
fn record_id(term: &Term) -> String {
    let lexical = term.lexical();
    match lexical.rsplit(['/', '#']).next() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => "record".to_string(),
    }
}
