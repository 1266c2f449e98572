//! Identifier specification: the packing layout of one readout subsystem
//!
//! An [`IdentifierSpec`] is an ordered set of [`FieldLayout`]s with
//! non-overlapping bit ranges, built once at startup and immutable for the
//! rest of the run. It is the single authority on what a packed 64-bit cell
//! identifier means; an identifier is opaque without the spec that produced
//! it.
//!
//! The layout travels with the hit data as a human-readable encoding string
//! attached to the collection metadata, one descriptor per field:
//!
//! ```text
//! system:8,section:8,layer:8,row:8,column:8,x:-8,y:-8
//! ```
//!
//! Descriptors are order-significant and comma-delimited. Each is
//! `name:width` or `name:offset:width`; a negative width marks a signed
//! field; an omitted offset continues immediately after the previous field.
//! [`IdentifierSpec::parse`] accepts this format and
//! [`IdentifierSpec::descriptor`] re-serializes it with identical field
//! semantics.

use crate::bitfield::{FieldLayout, IDENTIFIER_WIDTH};
use crate::error::ReadoutError;
use crate::ReadoutResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Construction-time-validated reference to one field of a spec
///
/// Resolving a name once into a handle replaces repeated string lookups on
/// hot paths and turns unknown-field mistakes into an early, explicit error
/// instead of a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldHandle(usize);

/// Ordered, non-overlapping field layout for one identifier kind
///
/// Serializes its name and field layouts; reconstruct from the encoding
/// string via [`IdentifierSpec::parse`].
#[derive(Debug, Clone, Serialize)]
pub struct IdentifierSpec {
    name: String,
    fields: Vec<FieldLayout>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl IdentifierSpec {
    /// Build a spec from an ordered field list
    ///
    /// Validates unique names and non-overlapping bit ranges; both are
    /// configuration errors surfaced at construction, never later.
    pub fn new(name: impl Into<String>, fields: Vec<FieldLayout>) -> ReadoutResult<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        let mut used: u64 = 0;
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(ReadoutError::DuplicateField(field.name.clone()));
            }
            if used & field.mask() != 0 {
                let other = fields[..i]
                    .iter()
                    .find(|f| f.mask() & field.mask() != 0)
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                return Err(ReadoutError::Overlap {
                    field: field.name.clone(),
                    other,
                });
            }
            used |= field.mask();
        }
        Ok(Self {
            name: name.into(),
            fields,
            index,
        })
    }

    /// Parse a spec from its encoding-string descriptor
    pub fn parse(name: impl Into<String>, descriptor: &str) -> ReadoutResult<Self> {
        let mut fields = Vec::new();
        let mut next_offset: u16 = 0;
        for token in descriptor.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(ReadoutError::InvalidDescriptor(format!(
                    "empty field descriptor in '{}'",
                    descriptor
                )));
            }
            let parts: Vec<&str> = token.split(':').collect();
            let (field_name, offset, raw_width) = match parts.as_slice() {
                [n, w] => (*n, next_offset, parse_int(w, token)?),
                [n, o, w] => {
                    let o: i64 = parse_int(o, token)?;
                    if o < 0 || o >= IDENTIFIER_WIDTH as i64 {
                        return Err(ReadoutError::InvalidDescriptor(format!(
                            "offset {} out of bounds in '{}'",
                            o, token
                        )));
                    }
                    (*n, o as u16, parse_int(w, token)?)
                }
                _ => {
                    return Err(ReadoutError::InvalidDescriptor(format!(
                        "expected name:width or name:offset:width, got '{}'",
                        token
                    )));
                }
            };
            let signed = raw_width < 0;
            let width = raw_width.unsigned_abs();
            if width == 0 || width > IDENTIFIER_WIDTH as u64 {
                return Err(ReadoutError::InvalidDescriptor(format!(
                    "width {} out of bounds in '{}'",
                    raw_width, token
                )));
            }
            fields.push(FieldLayout::new(field_name, offset as u8, width as u8, signed)?);
            next_offset = offset + width as u16;
        }
        Self::new(name, fields)
    }

    /// Re-serialize the layout as an encoding string
    ///
    /// Offsets are always written explicitly, so the output parses back to a
    /// spec with identical field semantics regardless of field order gaps.
    pub fn descriptor(&self) -> String {
        self.fields
            .iter()
            .map(|f| {
                let sign = if f.signed { "-" } else { "" };
                format!("{}:{}:{}{}", f.name, f.offset, sign, f.width)
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Spec name (usually the hit-collection name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in layout order
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Resolve a field name into a validated handle
    pub fn handle(&self, name: &str) -> ReadoutResult<FieldHandle> {
        self.index
            .get(name)
            .copied()
            .map(FieldHandle)
            .ok_or_else(|| ReadoutError::UnknownField(name.to_string()))
    }

    /// Layout of the field behind a handle
    pub fn field(&self, handle: FieldHandle) -> &FieldLayout {
        &self.fields[handle.0]
    }

    /// Layout lookup by name
    pub fn field_by_name(&self, name: &str) -> ReadoutResult<&FieldLayout> {
        Ok(self.field(self.handle(name)?))
    }

    /// Extract one field's value from an identifier
    #[inline]
    pub fn get(&self, id: u64, handle: FieldHandle) -> i64 {
        self.fields[handle.0].unpack(id)
    }

    /// Set one field's value inside an identifier
    ///
    /// Clears the field's bits before writing, so repeated sets behave like
    /// assignment rather than accumulation.
    pub fn set(&self, id: &mut u64, handle: FieldHandle, value: i64) -> ReadoutResult<()> {
        let field = &self.fields[handle.0];
        let packed = field.pack(value)?;
        *id = (*id & !field.mask()) | packed;
        Ok(())
    }

    /// Name-keyed convenience for [`IdentifierSpec::get`]
    pub fn get_by_name(&self, id: u64, name: &str) -> ReadoutResult<i64> {
        Ok(self.get(id, self.handle(name)?))
    }

    /// Name-keyed convenience for [`IdentifierSpec::set`]
    pub fn set_by_name(&self, id: &mut u64, name: &str, value: i64) -> ReadoutResult<()> {
        self.set(id, self.handle(name)?, value)
    }

    /// Encode a full field assignment into an identifier
    ///
    /// Fields omitted from the input default to 0. A name outside the layout
    /// fails with `UnknownField`; a value outside its field's width fails
    /// with `OutOfRange`. Duplicated names behave like repeated assignment
    /// (last value wins).
    pub fn encode<S: AsRef<str>>(&self, values: &[(S, i64)]) -> ReadoutResult<u64> {
        let mut id = 0u64;
        for (name, value) in values {
            self.set_by_name(&mut id, name.as_ref(), *value)?;
        }
        Ok(id)
    }

    /// Decode an identifier into (name, value) pairs in layout order
    ///
    /// Total over the 64-bit space; bits outside any field are ignored.
    pub fn decode(&self, id: u64) -> Vec<(String, i64)> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.unpack(id)))
            .collect()
    }

    /// Human-readable field:value rendering of an identifier, for logs
    pub fn value_string(&self, id: u64) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.unpack(id)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn parse_int(text: &str, token: &str) -> ReadoutResult<i64> {
    text.trim().parse().map_err(|_| {
        ReadoutError::InvalidDescriptor(format!("'{}' is not an integer in '{}'", text, token))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CZT_ENCODING: &str = "system:8,section:8,layer:8,row:8,column:8,x:-8,y:-8";

    fn czt() -> IdentifierSpec {
        IdentifierSpec::parse("CztHits", CZT_ENCODING).unwrap()
    }

    #[test]
    fn test_parse_assigns_running_offsets() {
        let spec = czt();
        let layer = spec.field_by_name("layer").unwrap();
        assert_eq!(layer.offset, 16);
        assert_eq!(layer.width, 8);
        assert!(!layer.signed);
        let y = spec.field_by_name("y").unwrap();
        assert_eq!(y.offset, 48);
        assert!(y.signed);
    }

    #[test]
    fn test_parse_explicit_offset_and_signed_marker() {
        let spec = IdentifierSpec::parse("t", "a:4,b:16:-6,c:8").unwrap();
        let b = spec.field_by_name("b").unwrap();
        assert_eq!((b.offset, b.width, b.signed), (16, 6, true));
        // c continues after b, not after a
        assert_eq!(spec.field_by_name("c").unwrap().offset, 22);
    }

    #[test]
    fn test_parse_rejects_malformed_descriptors() {
        assert!(IdentifierSpec::parse("t", "a:4,,b:4").is_err());
        assert!(IdentifierSpec::parse("t", "a").is_err());
        assert!(IdentifierSpec::parse("t", "a:0").is_err());
        assert!(IdentifierSpec::parse("t", "a:1:2:3:4").is_err());
        assert!(IdentifierSpec::parse("t", "a:x").is_err());
        assert!(IdentifierSpec::parse("t", "a:70").is_err());
    }

    #[test]
    fn test_construction_rejects_overlap_and_duplicates() {
        match IdentifierSpec::parse("t", "a:8,b:4:8") {
            Err(ReadoutError::Overlap { field, other }) => {
                assert_eq!(field, "b");
                assert_eq!(other, "a");
            }
            other => panic!("expected Overlap, got {:?}", other),
        }
        assert!(matches!(
            IdentifierSpec::parse("t", "a:8,a:8"),
            Err(ReadoutError::DuplicateField(_))
        ));
    }

    #[test]
    fn test_descriptor_round_trip_preserves_semantics() {
        let spec = czt();
        let reparsed = IdentifierSpec::parse("CztHits", &spec.descriptor()).unwrap();
        assert_eq!(spec.fields(), reparsed.fields());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let spec = czt();
        let values: Vec<(&str, i64)> = vec![
            ("system", 2),
            ("section", 1),
            ("layer", 0),
            ("row", 13),
            ("column", 14),
            ("x", -3),
            ("y", 127),
        ];
        let id = spec.encode(&values).unwrap();
        let decoded = spec.decode(id);
        for (name, value) in &values {
            let got = decoded.iter().find(|(n, _)| n == name).unwrap().1;
            assert_eq!(got, *value, "field {}", name);
        }
    }

    #[test]
    fn test_round_trip_at_field_boundaries() {
        let spec = czt();
        for (name, value) in [
            ("system", 0i64),
            ("system", 255),
            ("x", -128),
            ("x", 127),
            ("y", -128),
        ] {
            let id = spec.encode(&[(name, value)]).unwrap();
            assert_eq!(spec.get_by_name(id, name).unwrap(), value);
        }
    }

    #[test]
    fn test_encode_defaults_omitted_fields_to_zero() {
        let spec = czt();
        let id = spec.encode(&[("row", 13)]).unwrap();
        assert_eq!(spec.get_by_name(id, "column").unwrap(), 0);
        assert_eq!(spec.get_by_name(id, "x").unwrap(), 0);
    }

    #[test]
    fn test_encode_rejects_unknown_field_and_overflow() {
        let spec = czt();
        assert!(matches!(
            spec.encode(&[("tower", 1)]),
            Err(ReadoutError::UnknownField(_))
        ));
        assert!(matches!(
            spec.encode(&[("row", 256)]),
            Err(ReadoutError::OutOfRange { .. })
        ));
        // x is signed 8 bits
        assert!(spec.encode(&[("x", 128)]).is_err());
        assert!(spec.encode(&[("x", -129)]).is_err());
    }

    #[test]
    fn test_per_field_set_matches_bulk_encode() {
        let spec = czt();
        let values: Vec<(&str, i64)> = vec![
            ("system", 2),
            ("section", 1),
            ("layer", 0),
            ("row", 13),
            ("column", 14),
            ("x", 0),
            ("y", 0),
        ];

        let mut one_at_a_time = 0u64;
        for (name, value) in &values {
            spec.set_by_name(&mut one_at_a_time, name, *value).unwrap();
        }
        let bulk = spec.encode(&values).unwrap();
        assert_eq!(one_at_a_time, bulk);
    }

    #[test]
    fn test_set_overwrites_rather_than_accumulates() {
        let spec = czt();
        let h = spec.handle("row").unwrap();
        let mut id = 0u64;
        spec.set(&mut id, h, 0xF0).unwrap();
        spec.set(&mut id, h, 0x0D).unwrap();
        assert_eq!(spec.get(id, h), 0x0D);
    }

    #[test]
    fn test_handle_resolution_fails_eagerly() {
        let spec = czt();
        assert!(spec.handle("row").is_ok());
        assert!(matches!(
            spec.handle("nope"),
            Err(ReadoutError::UnknownField(_))
        ));
    }

    #[test]
    fn test_value_string_lists_fields_in_layout_order() {
        let spec = czt();
        let id = spec.encode(&[("system", 2), ("row", 13)]).unwrap();
        let s = spec.value_string(id);
        assert!(s.starts_with("system:2,"));
        assert!(s.contains("row:13"));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let spec = czt();
        let values: Vec<(&str, i64)> = vec![("system", 2), ("row", 13), ("x", -1)];
        let a = spec.encode(&values).unwrap();
        let b = spec.encode(&values).unwrap();
        assert_eq!(a, b);
    }
}
