//! ISO 2709 binary MARC codec.
//!
//! Layout per record: a 24-byte leader, a directory of 12-byte entries
//! (3-byte tag, 4-byte field length, 5-byte start offset) terminated by
//! a field separator, then the field data area. Fields end with 0x1E,
//! subfields start with 0x1F, records end with 0x1D.

use crate::record::{Field, MarcRecord, Subfield};
use crate::MarcError;

const FIELD_TERMINATOR: u8 = 0x1E;
const SUBFIELD_DELIMITER: u8 = 0x1F;
const RECORD_TERMINATOR: u8 = 0x1D;
const LEADER_LEN: usize = 24;
const DIRECTORY_ENTRY_LEN: usize = 12;

/// Parse every record in a binary MARC file.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<MarcRecord>, MarcError> {
    let mut records = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (record, consumed) = parse_record(rest)?;
        records.push(record);
        rest = &rest[consumed..];
        // Tolerate trailing newlines between records
        while let [b'\n' | b'\r', tail @ ..] = rest {
            rest = tail;
        }
    }
    if records.is_empty() {
        return Err(MarcError::Conversion("empty MARC file".to_string()));
    }
    Ok(records)
}

fn parse_record(bytes: &[u8]) -> Result<(MarcRecord, usize), MarcError> {
    if bytes.len() < LEADER_LEN {
        return Err(MarcError::Conversion(format!(
            "record shorter than the {}-byte leader",
            LEADER_LEN
        )));
    }
    let leader = std::str::from_utf8(&bytes[..LEADER_LEN])
        .map_err(|_| MarcError::Conversion("leader is not valid UTF-8".to_string()))?
        .to_string();
    let record_length = leader_number(&leader, 0, 5)?;
    let base_address = leader_number(&leader, 12, 17)?;
    // A record can never fit inside its own leader; without this check a
    // zero record length would leave the caller's cursor stuck.
    if record_length <= LEADER_LEN || base_address < LEADER_LEN {
        return Err(MarcError::Conversion(format!(
            "leader declares record length {} / base address {}",
            record_length, base_address
        )));
    }
    if record_length > bytes.len() || base_address > record_length {
        return Err(MarcError::Conversion(format!(
            "record length {} / base address {} exceed the input",
            record_length, base_address
        )));
    }

    let mut record = MarcRecord::new(leader);
    let mut offset = LEADER_LEN;
    while offset + DIRECTORY_ENTRY_LEN <= base_address
        && bytes[offset] != FIELD_TERMINATOR
    {
        let entry = &bytes[offset..offset + DIRECTORY_ENTRY_LEN];
        let tag = std::str::from_utf8(&entry[..3])
            .map_err(|_| MarcError::Conversion("directory tag is not valid UTF-8".to_string()))?
            .to_string();
        let length = ascii_number(&entry[3..7])?;
        let start = ascii_number(&entry[7..12])?;
        let field_start = base_address + start;
        let field_end = field_start + length;
        if field_end > record_length {
            return Err(MarcError::Conversion(format!(
                "field {} extends past the record boundary",
                tag
            )));
        }
        // Drop the field terminator from the data
        let data = &bytes[field_start..field_end];
        let data = data.strip_suffix(&[FIELD_TERMINATOR]).unwrap_or(data);
        record.fields.push(decode_field(&tag, data)?);
        offset += DIRECTORY_ENTRY_LEN;
    }
    Ok((record, record_length))
}

fn decode_field(tag: &str, data: &[u8]) -> Result<Field, MarcError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| MarcError::Conversion(format!("field {} is not valid UTF-8", tag)))?;
    if is_control_tag(tag) {
        return Ok(Field::Control {
            tag: tag.to_string(),
            value: text.to_string(),
        });
    }
    let mut chars = text.chars();
    let ind1 = chars.next().unwrap_or(' ');
    let ind2 = chars.next().unwrap_or(' ');
    let mut subfields = Vec::new();
    for chunk in chars.as_str().split(SUBFIELD_DELIMITER as char) {
        let mut chunk_chars = chunk.chars();
        let Some(code) = chunk_chars.next() else {
            continue;
        };
        subfields.push(Subfield {
            code,
            value: chunk_chars.as_str().to_string(),
        });
    }
    Ok(Field::Data {
        tag: tag.to_string(),
        ind1,
        ind2,
        subfields,
    })
}

/// Encode one record. Leader length and base address are recomputed;
/// the rest of the caller's leader is preserved.
pub fn write_record(record: &MarcRecord) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut data_area: Vec<u8> = Vec::new();
    for field in &record.fields {
        let start = data_area.len();
        match field {
            Field::Control { value, .. } => {
                data_area.extend_from_slice(value.as_bytes());
            }
            Field::Data {
                ind1,
                ind2,
                subfields,
                ..
            } => {
                let mut buf = String::new();
                buf.push(*ind1);
                buf.push(*ind2);
                for subfield in subfields {
                    buf.push(SUBFIELD_DELIMITER as char);
                    buf.push(subfield.code);
                    buf.push_str(&subfield.value);
                }
                data_area.extend_from_slice(buf.as_bytes());
            }
        }
        data_area.push(FIELD_TERMINATOR);
        let length = data_area.len() - start;
        directory.extend_from_slice(
            format!("{:0>3.3}{:04}{:05}", field.tag(), length, start).as_bytes(),
        );
    }
    directory.push(FIELD_TERMINATOR);

    let base_address = LEADER_LEN + directory.len();
    let record_length = base_address + data_area.len() + 1;

    let mut leader: Vec<u8> = record
        .leader
        .bytes()
        .chain(std::iter::repeat(b' '))
        .take(LEADER_LEN)
        .collect();
    leader[0..5].copy_from_slice(format!("{:05}", record_length).as_bytes());
    leader[12..17].copy_from_slice(format!("{:05}", base_address).as_bytes());

    let mut out = leader;
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data_area);
    out.push(RECORD_TERMINATOR);
    out
}

fn is_control_tag(tag: &str) -> bool {
    tag.starts_with("00")
}

fn leader_number(leader: &str, from: usize, to: usize) -> Result<usize, MarcError> {
    leader[from..to].trim().parse::<usize>().map_err(|_| {
        MarcError::Conversion(format!(
            "leader bytes {}..{} are not numeric: {:?}",
            from,
            to,
            &leader[from..to]
        ))
    })
}

fn ascii_number(bytes: &[u8]) -> Result<usize, MarcError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            MarcError::Conversion(format!("directory entry is not numeric: {:?}", bytes))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MarcRecord {
        MarcRecord {
            leader: "00000nam a2200000 a 4500".to_string(),
            fields: vec![
                Field::Control {
                    tag: "001".to_string(),
                    value: "in00000001".to_string(),
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
                Field::Data {
                    tag: "250".to_string(),
                    ind1: ' ',
                    ind2: ' ',
                    subfields: vec![Subfield {
                        code: 'a',
                        value: "First edition.".to_string(),
                    }],
                },
            ],
        }
    }

    #[test]
    fn round_trips_a_record() {
        let encoded = write_record(&sample());
        let records = parse_records(&encoded).unwrap();
        assert_eq!(records.len(), 1);
        let decoded = &records[0];
        assert_eq!(decoded.control_field("001"), Some("in00000001"));
        assert_eq!(decoded.subfield_values("245", 'a'), vec!["Moby Dick :"]);
        assert_eq!(decoded.subfield_values("245", 'b'), vec!["or, the whale"]);
        assert_eq!(decoded.subfield_values("250", 'a'), vec!["First edition."]);
    }

    #[test]
    fn encoded_leader_carries_length_and_base() {
        let encoded = write_record(&sample());
        let length: usize = std::str::from_utf8(&encoded[0..5]).unwrap().parse().unwrap();
        assert_eq!(length, encoded.len());
        let base: usize = std::str::from_utf8(&encoded[12..17]).unwrap().parse().unwrap();
        assert_eq!(encoded[base - 1], FIELD_TERMINATOR);
        assert_eq!(*encoded.last().unwrap(), RECORD_TERMINATOR);
    }

    #[test]
    fn two_records_in_one_file() {
        let mut bytes = write_record(&sample());
        bytes.extend_from_slice(&write_record(&sample()));
        assert_eq!(parse_records(&bytes).unwrap().len(), 2);
    }

    #[test]
    fn zero_length_leader_is_rejected_not_looped_on() {
        // 24 ASCII zeros decode as record length 0 and base address 0;
        // parsing must fail instead of never advancing past the record.
        assert!(matches!(
            parse_records(&[b'0'; 24]),
            Err(MarcError::Conversion(_))
        ));
        // Same guard when the bogus record follows a valid one.
        let mut bytes = write_record(&sample());
        bytes.extend_from_slice(&[b'0'; 24]);
        assert!(matches!(
            parse_records(&bytes),
            Err(MarcError::Conversion(_))
        ));
    }

    #[test]
    fn truncated_input_is_a_conversion_error() {
        let encoded = write_record(&sample());
        assert!(matches!(
            parse_records(&encoded[..30]),
            Err(MarcError::Conversion(_))
        ));
        assert!(matches!(
            parse_records(b"garbage"),
            Err(MarcError::Conversion(_))
        ));
    }
}
