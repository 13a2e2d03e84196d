//! Ordered collections of [`BitField`]s describing complete payloads.
//!
//! Layouts are built once and never change. Related message types share
//! structure by deriving one layout from another with a [`LayoutBuilder`]:
//! either appending fields after the parent's last one, or replacing the
//! parent's trailing fields (usually its padding) with new fields and a
//! shorter padding so the total width stays constant.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use crate::bitfield::{self, BitField, FieldValue, SOFTWARE_ID_FIELD_ID, ValidationFailure};

/// Represents an error that occurred while encoding or decoding a payload or
/// a whole frame.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CodecError {
    /// Indicates that a value failed the range, length or fixed-value check of
    /// its field.
    #[error("invalid value for field `{field}` of `{layout}`: {reason}")]
    FieldValidation {
        layout: &'static str,
        field: &'static str,
        reason: ValidationFailure,
    },

    /// Indicates that a field without a default was not given a value.
    #[error("field `{field}` of `{layout}` is required")]
    MissingField {
        layout: &'static str,
        field: &'static str,
    },

    /// Indicates that a value was given for a field the layout does not
    /// declare.
    #[error("`{layout}` has no field named `{field}`")]
    UnknownField { layout: &'static str, field: String },

    /// Indicates that a buffer does not have the exact length required.
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    /// Indicates that a frame starts with a report ID that is neither the
    /// short nor the long HID++ report.
    #[error("malformed frame: unknown report ID {0:#04x}")]
    UnknownReportId(u8),
}

/// A set of named field values, either supplied for encoding or produced by
/// decoding.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FieldValues(BTreeMap<String, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, consuming and returning the set for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Returns the integer value of a field, if present and an integer.
    pub fn int(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    /// Returns the byte value of a field, if present and a byte value.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.get(name).and_then(FieldValue::as_bytes)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// An immutable, ordered list of fields with precomputed bit offsets.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Layout {
    name: &'static str,
    fields: Vec<BitField>,
    offsets: Vec<usize>,
    bit_length: usize,
}

impl Layout {
    /// The name of the message type the layout belongs to.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The fields in packing order.
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Iterates over all fields together with their bit offsets.
    pub fn iter(&self) -> impl Iterator<Item = (&BitField, usize)> {
        self.fields.iter().zip(self.offsets.iter().copied())
    }

    /// Looks up a field and its bit offset by name.
    pub fn field(&self, name: &str) -> Option<(&BitField, usize)> {
        self.iter().find(|(field, _)| field.name == name)
    }

    /// The sum of all field widths.
    pub fn total_bit_length(&self) -> usize {
        self.bit_length
    }

    /// The payload length in bytes, rounded up.
    pub fn byte_length(&self) -> usize {
        self.bit_length.div_ceil(8)
    }

    /// Encodes a set of values into a payload buffer.
    ///
    /// Omitted fields take their default value if they have one, otherwise
    /// [`CodecError::MissingField`] is returned.
    pub fn encode(&self, values: &FieldValues) -> Result<Vec<u8>, CodecError> {
        if let Some((unknown, _)) = values.iter().find(|(name, _)| self.field(name).is_none()) {
            return Err(CodecError::UnknownField {
                layout: self.name,
                field: unknown.to_owned(),
            });
        }

        let mut buf = vec![0u8; self.byte_length()];
        for (field, offset) in self.iter() {
            let value = match values.get(field.name) {
                Some(value) => value.clone(),
                None => field
                    .default_field_value()
                    .ok_or(CodecError::MissingField {
                        layout: self.name,
                        field: field.name,
                    })?,
            };

            field
                .validate(&value)
                .map_err(|reason| CodecError::FieldValidation {
                    layout: self.name,
                    field: field.name,
                    reason,
                })?;

            trace!(layout = self.name, field = field.name, offset, %value, "encoding field");

            match value {
                FieldValue::Int(int) => bitfield::put_int(&mut buf, offset, field.bit_length, int),
                FieldValue::Bytes(bytes) => bitfield::put_bytes(&mut buf, offset, &bytes),
            }
        }

        Ok(buf)
    }

    /// Decodes a payload buffer of exactly [`Self::byte_length`] bytes.
    pub fn decode(&self, payload: &[u8]) -> Result<FieldValues, CodecError> {
        if payload.len() != self.byte_length() {
            return Err(CodecError::MalformedFrame {
                expected: self.byte_length(),
                actual: payload.len(),
            });
        }

        let mut values = FieldValues::new();
        for (field, offset) in self.iter() {
            let value = if field.is_integer() {
                FieldValue::Int(bitfield::get_int(payload, offset, field.bit_length))
            } else {
                FieldValue::Bytes(bitfield::get_bytes(payload, offset, field.bit_length))
            };
            trace!(layout = self.name, field = field.name, offset, %value, "decoded field");
            values.set(field.name, value);
        }

        Ok(values)
    }
}

/// Builds a [`Layout`] from scratch or from a parent layout.
#[derive(Clone, Debug)]
pub struct LayoutBuilder {
    name: &'static str,
    fields: Vec<BitField>,
}

impl LayoutBuilder {
    /// Starts an empty layout.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Starts a layout with all fields of `parent`.
    pub fn derive(name: &'static str, parent: &Layout) -> Self {
        Self {
            name,
            fields: parent.fields.clone(),
        }
    }

    /// Appends a field after the current last one.
    pub fn append(mut self, field: BitField) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields in order.
    pub fn append_all(mut self, fields: impl IntoIterator<Item = BitField>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Drops the last `n` fields and appends `fields` in their place.
    pub fn replace_last(mut self, n: usize, fields: impl IntoIterator<Item = BitField>) -> Self {
        let keep = self.fields.len().saturating_sub(n);
        self.fields.truncate(keep);
        self.append_all(fields)
    }

    /// Assigns field IDs and bit offsets and freezes the layout.
    pub fn build(self) -> Layout {
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut offset = 0;
        let fields = self
            .fields
            .into_iter()
            .enumerate()
            .map(|(i, mut field)| {
                field.id = SOFTWARE_ID_FIELD_ID.wrapping_sub((i as u8).wrapping_add(1));
                offsets.push(offset);
                offset += field.bit_length;
                field
            })
            .collect();

        Layout {
            name: self.name,
            fields,
            offsets,
            bit_length: offset,
        }
    }
}

/// One optional, zero-defaulting field of `bit_length` bits per name.
pub(crate) fn optional_fields(
    names: &'static [&'static str],
    bit_length: usize,
) -> impl Iterator<Item = BitField> {
    names
        .iter()
        .map(move |name| BitField::optional(name, bit_length, 0))
}

/// One required field of `bit_length` bits per name.
pub(crate) fn required_fields(
    names: &'static [&'static str],
    bit_length: usize,
) -> impl Iterator<Item = BitField> {
    names
        .iter()
        .map(move |name| BitField::required(name, bit_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head() -> Layout {
        LayoutBuilder::new("Head")
            .append(BitField::required("index", 8))
            .append(BitField::optional("flags", 4, 0x3))
            .append(BitField::padding(12))
            .build()
    }

    #[test]
    fn offsets_follow_declaration_order() {
        let layout = head();
        let offsets: Vec<_> = layout.iter().map(|(f, o)| (f.name, o)).collect();
        assert_eq!(offsets, vec![("index", 0), ("flags", 8), ("padding", 12)]);
        assert_eq!(layout.total_bit_length(), 24);
        assert_eq!(layout.fields()[0].id, 0xfa);
        assert_eq!(layout.fields()[2].id, 0xf8);
    }

    #[test]
    fn replace_last_keeps_total_width() {
        let derived = LayoutBuilder::derive("Derived", &head())
            .replace_last(1, [BitField::required("extra", 4), BitField::padding(8)])
            .build();
        assert_eq!(derived.total_bit_length(), 24);
        assert_eq!(derived.field("extra").map(|(_, o)| o), Some(12));
    }

    #[test]
    fn omitted_optional_fields_use_defaults() {
        let payload = head()
            .encode(&FieldValues::new().with("index", 0x42u8))
            .unwrap();
        assert_eq!(payload, vec![0x42, 0x30, 0x00]);
    }

    #[test]
    fn missing_required_field_is_reported() {
        assert_eq!(
            head().encode(&FieldValues::new()),
            Err(CodecError::MissingField {
                layout: "Head",
                field: "index"
            })
        );
    }

    #[test]
    fn unknown_field_is_reported() {
        let err = head()
            .encode(&FieldValues::new().with("index", 1u8).with("indx", 1u8))
            .unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { field, .. } if field == "indx"));
    }

    #[test]
    fn out_of_range_value_names_the_field() {
        let err = head()
            .encode(&FieldValues::new().with("index", 0x100u16))
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::FieldValidation {
                field: "index",
                reason: ValidationFailure::OutOfRange { value: 0x100, .. },
                ..
            }
        ));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(
            head().decode(&[0u8; 4]),
            Err(CodecError::MalformedFrame {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn decode_returns_every_field() {
        let values = head().decode(&[0x42, 0x30, 0x00]).unwrap();
        assert_eq!(values.int("index"), Some(0x42));
        assert_eq!(values.int("flags"), Some(0x3));
        assert_eq!(values.int("padding"), Some(0));
        assert_eq!(values.len(), 3);
    }
}
