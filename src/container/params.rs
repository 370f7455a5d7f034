//! Parameter section decoding.
//!
//! The section is a singly linked chain of variable-length records starting
//! 4 bytes into the parameter block:
//! ```text
//! [0]       i8  name length (negative = locked; abs() is the length; 0 ends)
//! [1]       i8  group id (negative = defines group abs(id); positive =
//!               parameter belonging to group id)
//! [2..2+n]  name bytes (ASCII)
//! [..+2]    i16 offset to the next record, relative to the byte after
//!               this field; 0 terminates the chain
//! parameter records continue with:
//! [..]      i8  type tag (-1 char, 1 byte, 2 int16, 4 float32)
//! [..]      u8  dimension count, then that many u8 dimension sizes
//! [..]      flat element payload (product of dimensions)
//! ```
//!
//! Decoding is two-pass: pass 1 builds the group-id -> group-name map, pass 2
//! re-walks the identical chain resolving each parameter's owning group and
//! decoding its payload. Unknown groups, parameters, and type tags are
//! skipped; a chain offset running past the buffer ends the walk early
//! instead of failing. Real-world writers rely on this leniency.

use std::collections::HashMap;

use crate::codec::{self, ByteOrder};
use crate::container::header::Header;
use crate::error::{CaptureError, Result};

/// Element type tags.
const TYPE_CHAR: i8 = -1;
const TYPE_BYTE: i8 = 1;
const TYPE_INT: i8 = 2;
const TYPE_FLOAT: i8 = 4;

/// Decoded payload of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Strings(Vec<String>),
    Bytes(Vec<u8>),
    Ints(Vec<i16>),
    Floats(Vec<f32>),
}

/// One decoded parameter record.
#[derive(Debug, Clone)]
pub struct ParameterRecord {
    /// Owning group name (resolved in pass 2).
    pub group: String,
    /// Parameter name.
    pub name: String,
    /// Dimension list as stored; total element count is its product.
    pub dimensions: Vec<usize>,
    pub value: ParamValue,
}

/// Typed parameter dictionary keyed by `(GROUP, PARAMETER)` name pairs.
#[derive(Debug, Default)]
pub struct ParameterDict {
    records: HashMap<(String, String), ParameterRecord>,
}

impl ParameterDict {
    /// Decode the parameter section described by `header`.
    pub fn decode(data: &[u8], header: &Header) -> Result<Self> {
        let base = header.param_offset();
        if base + 4 > data.len() {
            return Err(CaptureError::short_read(
                "parameter block prologue",
                base,
                4,
                data.len(),
            ));
        }
        let signature = data[base + 1];
        if signature != super::header::MAGIC {
            return Err(CaptureError::UnsupportedVersion { signature });
        }

        let order = header.byte_order;
        let start = base + 4;

        // Pass 1: group id -> group name.
        let mut groups: HashMap<u8, String> = HashMap::new();
        walk_chain(data, start, order, |rec| {
            if rec.group_id < 0 {
                groups.insert(rec.group_id.unsigned_abs(), rec.name.clone());
            }
        });

        // Pass 2: decode parameter payloads, resolving owning groups.
        let mut records = HashMap::new();
        walk_chain(data, start, order, |rec| {
            if rec.group_id <= 0 {
                return;
            }
            let Some(group) = groups.get(&(rec.group_id as u8)) else {
                return; // parameter of an undeclared group: skip
            };
            if let Some((dimensions, value)) = decode_payload(data, rec.payload_start, order) {
                let record = ParameterRecord {
                    group: group.clone(),
                    name: rec.name.clone(),
                    dimensions,
                    value,
                };
                records.insert((group.to_uppercase(), rec.name.to_uppercase()), record);
            }
        });

        Ok(Self { records })
    }

    /// Look up a record by group and parameter name (case-insensitive).
    pub fn get(&self, group: &str, name: &str) -> Option<&ParameterRecord> {
        self.records
            .get(&(group.to_uppercase(), name.to_uppercase()))
    }

    /// String-array view of a parameter, if present and character-typed.
    pub fn strings(&self, group: &str, name: &str) -> Option<&[String]> {
        match &self.get(group, name)?.value {
            ParamValue::Strings(s) => Some(s),
            _ => None,
        }
    }

    /// Float view of a numeric parameter; integer payloads are widened.
    pub fn floats(&self, group: &str, name: &str) -> Option<Vec<f32>> {
        match &self.get(group, name)?.value {
            ParamValue::Floats(v) => Some(v.clone()),
            ParamValue::Ints(v) => Some(v.iter().map(|&i| f32::from(i)).collect()),
            ParamValue::Bytes(v) => Some(v.iter().map(|&b| f32::from(b)).collect()),
            ParamValue::Strings(_) => None,
        }
    }

    /// First element of a numeric parameter.
    pub fn scalar(&self, group: &str, name: &str) -> Option<f32> {
        self.floats(group, name)?.first().copied()
    }

    /// Dimension list of a parameter.
    pub fn dimensions(&self, group: &str, name: &str) -> Option<&[usize]> {
        Some(&self.get(group, name)?.dimensions)
    }

    /// Number of decoded parameters.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Chain walking
// ---------------------------------------------------------------------------

struct ChainRecord {
    group_id: i8,
    name: String,
    /// Offset of the byte after the next-record field (payload for parameters).
    payload_start: usize,
}

/// Walk the record chain from `start`, invoking `visit` for each record.
/// Malformed offsets end the walk; they never error.
fn walk_chain(data: &[u8], start: usize, order: ByteOrder, mut visit: impl FnMut(&ChainRecord)) {
    let mut pos = start;
    loop {
        let Ok(name_len) = codec::read_i8(data, pos) else {
            return;
        };
        if name_len == 0 {
            return;
        }
        let name_len = name_len.unsigned_abs() as usize; // sign is only a lock flag
        let Ok(group_id) = codec::read_i8(data, pos + 1) else {
            return;
        };

        let name_start = pos + 2;
        let offset_field = name_start + name_len;
        if offset_field + 2 > data.len() {
            return;
        }
        let name = String::from_utf8_lossy(&data[name_start..offset_field])
            .trim()
            .to_string();
        let Ok(next_offset) = codec::read_i16(data, offset_field, order) else {
            return;
        };

        visit(&ChainRecord {
            group_id,
            name,
            payload_start: offset_field + 2,
        });

        if next_offset <= 0 {
            return;
        }
        // The offset counts from the byte after the i16 field.
        let next = offset_field + 2 + next_offset as usize;
        if next >= data.len() {
            return; // offset running past the buffer ends the walk
        }
        pos = next;
    }
}

// ---------------------------------------------------------------------------
// Payload decoding
// ---------------------------------------------------------------------------

/// Decode one parameter payload. Returns `None` for unknown type tags or
/// payloads that would run past the buffer; such parameters are skipped.
fn decode_payload(
    data: &[u8],
    start: usize,
    order: ByteOrder,
) -> Option<(Vec<usize>, ParamValue)> {
    let type_tag = codec::read_i8(data, start).ok()?;
    let ndims = *data.get(start + 1)? as usize;
    if start + 2 + ndims > data.len() {
        return None;
    }
    let dimensions: Vec<usize> = data[start + 2..start + 2 + ndims]
        .iter()
        .map(|&d| d as usize)
        .collect();
    let count: usize = dimensions.iter().product();
    let elems = start + 2 + ndims;

    let value = match type_tag {
        TYPE_CHAR => {
            // dim 0 is the per-string width, dim 1 the string count; a
            // single-dimension char array is one string.
            let (width, n) = match dimensions.len() {
                0 => (0, 0),
                1 => (dimensions[0], 1),
                _ => (dimensions[0], dimensions[1..].iter().product()),
            };
            if elems + width * n > data.len() {
                return None;
            }
            let mut strings = Vec::with_capacity(n);
            for i in 0..n {
                let raw = &data[elems + i * width..elems + (i + 1) * width];
                strings.push(
                    String::from_utf8_lossy(raw)
                        .trim_end_matches(['\0', ' '])
                        .to_string(),
                );
            }
            ParamValue::Strings(strings)
        }
        TYPE_BYTE => {
            if elems + count > data.len() {
                return None;
            }
            ParamValue::Bytes(data[elems..elems + count].to_vec())
        }
        TYPE_INT => {
            let mut vals = Vec::with_capacity(count);
            for i in 0..count {
                vals.push(codec::read_i16(data, elems + i * 2, order).ok()?);
            }
            ParamValue::Ints(vals)
        }
        TYPE_FLOAT => {
            let mut vals = Vec::with_capacity(count);
            for i in 0..count {
                vals.push(codec::read_f32(data, elems + i * 4, order).ok()?);
            }
            ParamValue::Floats(vals)
        }
        _ => return None, // unknown element type: skip the parameter
    };

    Some((dimensions, value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::header::{BLOCK_SIZE, MAGIC};

    /// Append one chain record; returns with the next-offset patched so the
    /// chain stays linked. `payload` holds type/dims/elements for parameters.
    fn push_record(buf: &mut Vec<u8>, name: &str, group_id: i8, payload: &[u8], last: bool) {
        buf.push(name.len() as u8);
        buf.push(group_id as u8);
        buf.extend_from_slice(name.as_bytes());
        let next = if last { 0 } else { payload.len() as i16 };
        buf.extend_from_slice(&next.to_le_bytes());
        buf.extend_from_slice(payload);
    }

    /// Group definition payload: description length 0.
    const GROUP_PAYLOAD: &[u8] = &[0];

    fn dict_from_section(section: &[u8]) -> ParameterDict {
        // Header block + parameter block prologue + chain.
        let mut data = vec![0u8; BLOCK_SIZE];
        data[0] = 2; // parameter block pointer
        data[1] = MAGIC;
        data[2..4].copy_from_slice(&0u16.to_le_bytes()); // point count
        data[8..10].copy_from_slice(&1u16.to_le_bytes()); // last frame = first = 0? keep 1 >= 0
        data[6..8].copy_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&[0, MAGIC, 1, crate::codec::PROC_INTEL]);
        data.extend_from_slice(section);
        let header = Header::decode(&data).unwrap();
        ParameterDict::decode(&data, &header).unwrap()
    }

    fn point_labels_section() -> Vec<u8> {
        let mut s = Vec::new();
        push_record(&mut s, "POINT", -1, GROUP_PAYLOAD, false);
        // LABELS: char [4, 2] = "HEEL", "TOE "
        let mut payload = vec![TYPE_CHAR as u8, 2, 4, 2];
        payload.extend_from_slice(b"HEELTOE ");
        push_record(&mut s, "LABELS", 1, &payload, false);
        // RATE: float [1] = 100.0
        let mut rate = vec![TYPE_FLOAT as u8, 1, 1];
        rate.extend_from_slice(&100.0f32.to_le_bytes());
        push_record(&mut s, "RATE", 1, &rate, true);
        s
    }

    #[test]
    fn two_pass_resolves_groups_and_strings() {
        let dict = dict_from_section(&point_labels_section());
        let labels = dict.strings("POINT", "LABELS").unwrap();
        assert_eq!(labels, ["HEEL", "TOE"]);
        assert_eq!(dict.scalar("POINT", "RATE"), Some(100.0));
        assert_eq!(dict.dimensions("POINT", "LABELS").unwrap(), [4, 2]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dict = dict_from_section(&point_labels_section());
        assert!(dict.get("point", "labels").is_some());
    }

    #[test]
    fn group_defined_after_its_parameters() {
        // Parameter record appears before its group definition; pass 1
        // still resolves it.
        let mut s = Vec::new();
        let mut payload = vec![TYPE_INT as u8, 1, 2];
        payload.extend_from_slice(&7i16.to_le_bytes());
        payload.extend_from_slice(&(-3i16).to_le_bytes());
        push_record(&mut s, "USED", 2, &payload, false);
        push_record(&mut s, "ANALOG", -2, GROUP_PAYLOAD, true);
        let dict = dict_from_section(&s);
        assert_eq!(dict.floats("ANALOG", "USED").unwrap(), vec![7.0, -3.0]);
    }

    #[test]
    fn locked_records_decode_normally() {
        // Negative name length marks a locked record; only abs() matters.
        let mut s = Vec::new();
        s.push((-5i8) as u8);
        s.push((-1i8) as u8);
        s.extend_from_slice(b"POINT");
        s.extend_from_slice(&1i16.to_le_bytes());
        s.push(0); // description length
        let mut payload = vec![TYPE_INT as u8, 1, 1];
        payload.extend_from_slice(&12i16.to_le_bytes());
        push_record(&mut s, "USED", 1, &payload, true);
        let dict = dict_from_section(&s);
        assert_eq!(dict.scalar("POINT", "USED"), Some(12.0));
    }

    #[test]
    fn next_offset_counts_from_byte_after_offset_field() {
        // Hand-written chain with explicit offsets: each offset is the
        // distance from the byte immediately after the i16 field to the
        // next record, so a group record with a 1-byte description uses 1.
        let mut s = Vec::new();
        s.push(5);
        s.push((-1i8) as u8);
        s.extend_from_slice(b"POINT");
        s.extend_from_slice(&1i16.to_le_bytes());
        s.push(0); // description length
        s.push(4);
        s.push(1);
        s.extend_from_slice(b"RATE");
        s.extend_from_slice(&0i16.to_le_bytes());
        s.push(TYPE_FLOAT as u8);
        s.push(1);
        s.push(1);
        s.extend_from_slice(&100.0f32.to_le_bytes());
        let dict = dict_from_section(&s);
        assert_eq!(dict.scalar("POINT", "RATE"), Some(100.0));
    }

    #[test]
    fn unknown_group_parameter_skipped() {
        let mut s = Vec::new();
        push_record(&mut s, "POINT", -1, GROUP_PAYLOAD, false);
        // Parameter of group 9, which is never declared.
        let mut payload = vec![TYPE_INT as u8, 1, 1];
        payload.extend_from_slice(&1i16.to_le_bytes());
        push_record(&mut s, "ORPHAN", 9, &payload, true);
        let dict = dict_from_section(&s);
        assert!(dict.get("POINT", "ORPHAN").is_none());
        assert!(dict.is_empty());
    }

    #[test]
    fn unknown_type_tag_skipped() {
        let mut s = Vec::new();
        push_record(&mut s, "POINT", -1, GROUP_PAYLOAD, false);
        push_record(&mut s, "WEIRD", 1, &[0x33, 1, 1, 0xAA], true);
        let dict = dict_from_section(&s);
        assert!(dict.get("POINT", "WEIRD").is_none());
    }

    #[test]
    fn offset_past_buffer_ends_walk() {
        let mut s = Vec::new();
        push_record(&mut s, "POINT", -1, GROUP_PAYLOAD, false);
        // Hand-built record whose next-offset points far past the buffer.
        s.push(4);
        s.push((-2i8) as u8);
        s.extend_from_slice(b"GONE");
        s.extend_from_slice(&30_000i16.to_le_bytes());
        let dict = dict_from_section(&s);
        // Walk terminated without error; the well-formed prefix survived.
        assert!(dict.is_empty());
    }

    #[test]
    fn bad_signature_is_unsupported_version() {
        let mut data = vec![0u8; BLOCK_SIZE];
        data[0] = 2;
        data[1] = MAGIC;
        data[6..8].copy_from_slice(&1u16.to_le_bytes());
        data[8..10].copy_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&[0, 0x42, 1, crate::codec::PROC_INTEL]);
        let header = Header::decode(&data).unwrap();
        assert!(matches!(
            ParameterDict::decode(&data, &header),
            Err(CaptureError::UnsupportedVersion { signature: 0x42 })
        ));
    }

    #[test]
    fn single_dimension_char_is_one_string() {
        let mut s = Vec::new();
        push_record(&mut s, "POINT", -1, GROUP_PAYLOAD, false);
        let mut payload = vec![TYPE_CHAR as u8, 1, 2];
        payload.extend_from_slice(b"mm");
        push_record(&mut s, "UNITS", 1, &payload, true);
        let dict = dict_from_section(&s);
        assert_eq!(dict.strings("POINT", "UNITS").unwrap(), ["mm"]);
    }
}
