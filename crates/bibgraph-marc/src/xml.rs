//! MARCXML codec.
//!
//! Element matching is by local name, so documents with or without the
//! MARC21 slim namespace prefix both parse.

use crate::record::{Field, MarcRecord, Subfield};
use crate::MarcError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub const MARCXML_NAMESPACE: &str = "http://www.loc.gov/MARC21/slim";

pub fn parse(data: &str) -> Result<Vec<MarcRecord>, MarcError> {
    let mut reader = Reader::from_str(data);
    let mut records = Vec::new();

    let mut record: Option<MarcRecord> = None;
    let mut field: Option<(String, char, char, Vec<Subfield>)> = None;
    let mut control_tag: Option<String> = None;
    let mut subfield_code: Option<char> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()).as_str() {
                "collection" => {}
                "record" => record = Some(MarcRecord::new(String::new())),
                "leader" => text.clear(),
                "controlfield" => {
                    control_tag = Some(required_attr(e, "tag")?);
                    text.clear();
                }
                "datafield" => {
                    let tag = required_attr(e, "tag")?;
                    let ind1 = indicator(e, "ind1");
                    let ind2 = indicator(e, "ind2");
                    field = Some((tag, ind1, ind2, Vec::new()));
                }
                "subfield" => {
                    let code = required_attr(e, "code")?;
                    subfield_code = code.chars().next();
                    text.clear();
                }
                other => {
                    return Err(MarcError::Conversion(format!(
                        "unexpected MARCXML element <{}>",
                        other
                    )))
                }
            },
            Ok(Event::Text(ref e)) => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| MarcError::Conversion(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()).as_str() {
                "leader" => {
                    if let Some(record) = record.as_mut() {
                        record.leader = std::mem::take(&mut text);
                    }
                }
                "controlfield" => {
                    if let (Some(record), Some(tag)) = (record.as_mut(), control_tag.take()) {
                        record.fields.push(Field::Control {
                            tag,
                            value: std::mem::take(&mut text),
                        });
                    }
                }
                "subfield" => {
                    if let (Some((_, _, _, subfields)), Some(code)) =
                        (field.as_mut(), subfield_code.take())
                    {
                        subfields.push(Subfield {
                            code,
                            value: std::mem::take(&mut text),
                        });
                    }
                }
                "datafield" => {
                    if let (Some(record), Some((tag, ind1, ind2, subfields))) =
                        (record.as_mut(), field.take())
                    {
                        record.fields.push(Field::Data {
                            tag,
                            ind1,
                            ind2,
                            subfields,
                        });
                    }
                }
                "record" => {
                    if let Some(record) = record.take() {
                        records.push(record);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(MarcError::Conversion(err.to_string())),
        }
    }

    if records.is_empty() {
        return Err(MarcError::Conversion(
            "no <record> element in MARCXML input".to_string(),
        ));
    }
    Ok(records)
}

pub fn write(records: &[MarcRecord]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<collection xmlns=\"{}\">\n", MARCXML_NAMESPACE));
    for record in records {
        out.push_str("  <record>\n");
        out.push_str(&format!("    <leader>{}</leader>\n", escape(&record.leader)));
        for field in &record.fields {
            match field {
                Field::Control { tag, value } => {
                    out.push_str(&format!(
                        "    <controlfield tag=\"{}\">{}</controlfield>\n",
                        escape(tag),
                        escape(value)
                    ));
                }
                Field::Data {
                    tag,
                    ind1,
                    ind2,
                    subfields,
                } => {
                    out.push_str(&format!(
                        "    <datafield tag=\"{}\" ind1=\"{}\" ind2=\"{}\">\n",
                        escape(tag),
                        ind1,
                        ind2
                    ));
                    for subfield in subfields {
                        out.push_str(&format!(
                            "      <subfield code=\"{}\">{}</subfield>\n",
                            subfield.code,
                            escape(&subfield.value)
                        ));
                    }
                    out.push_str("    </datafield>\n");
                }
            }
        }
        out.push_str("  </record>\n");
    }
    out.push_str("</collection>\n");
    out
}

fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.to_string(),
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.0.as_ref()) == name {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}

fn required_attr(e: &BytesStart<'_>, name: &str) -> Result<String, MarcError> {
    attr(e, name).ok_or_else(|| {
        MarcError::Conversion(format!(
            "<{}> is missing the {} attribute",
            local_name(e.name().as_ref()),
            name
        ))
    })
}

fn indicator(e: &BytesStart<'_>, name: &str) -> char {
    attr(e, name)
        .and_then(|v| v.chars().next())
        .unwrap_or(' ')
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
        <collection xmlns="http://www.loc.gov/MARC21/slim">
          <record>
            <leader>00000nam a2200000 a 4500</leader>
            <controlfield tag="001">in00000001</controlfield>
            <datafield tag="245" ind1="1" ind2="0">
              <subfield code="a">Moby Dick &amp; the sea :</subfield>
              <subfield code="b">or, the whale</subfield>
            </datafield>
          </record>
        </collection>"#;

    #[test]
    fn parses_records_fields_and_subfields() {
        let records = parse(SAMPLE).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.leader, "00000nam a2200000 a 4500");
        assert_eq!(record.control_field("001"), Some("in00000001"));
        assert_eq!(
            record.subfield_values("245", 'a'),
            vec!["Moby Dick & the sea :"]
        );
    }

    #[test]
    fn parses_prefixed_elements() {
        let prefixed = SAMPLE
            .replace("<collection", "<marc:collection")
            .replace("</collection>", "</marc:collection>")
            .replace("xmlns=", "xmlns:marc=")
            .replace("<record>", "<marc:record>")
            .replace("</record>", "</marc:record>")
            .replace("<leader>", "<marc:leader>")
            .replace("</leader>", "</marc:leader>")
            .replace("<controlfield", "<marc:controlfield")
            .replace("</controlfield>", "</marc:controlfield>")
            .replace("<datafield", "<marc:datafield")
            .replace("</datafield>", "</marc:datafield>")
            .replace("<subfield", "<marc:subfield")
            .replace("</subfield>", "</marc:subfield>");
        let records = parse(&prefixed).unwrap();
        assert_eq!(records[0].control_field("001"), Some("in00000001"));
    }

    #[test]
    fn round_trips_through_write() {
        let records = parse(SAMPLE).unwrap();
        let written = write(&records);
        let reparsed = parse(&written).unwrap();
        assert_eq!(records, reparsed);
    }

    #[test]
    fn missing_tag_attribute_is_an_error() {
        let bad = "<collection><record><datafield ind1=\" \" ind2=\" \"></datafield></record></collection>";
        assert!(matches!(parse(bad), Err(MarcError::Conversion(_))));
    }

    #[test]
    fn recordless_document_is_an_error() {
        assert!(matches!(
            parse("<collection></collection>"),
            Err(MarcError::Conversion(_))
        ));
    }
}
