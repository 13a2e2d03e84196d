//! Describes single fields of fixed-size HID++ payloads and moves their bits
//! in and out of byte buffers.
//!
//! Fields are packed most-significant-bit first: the first declared field
//! occupies the leftmost bits of the first payload byte. A field may be any
//! width, including sub-byte flags (2 or 4 bits) that share a byte with their
//! neighbours.

use std::fmt;

/// The field ID of the envelope's software ID nibble.
///
/// Payload fields count down from the ID right below it, so a field list
/// can be extended without renumbering what came before.
pub const SOFTWARE_ID_FIELD_ID: u8 = 0xfb;

/// A value bound to a field.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    /// An unsigned integer, usable for any field up to 64 bits wide.
    Int(u64),

    /// Raw bytes, used for opaque fields wider than 64 bits (UUID fragments,
    /// name chunks, padding) and accepted for any byte-aligned field of the
    /// matching byte length.
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Returns the integer value, or `None` for byte values.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the raw bytes, or `None` for integer values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Int(_) => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value:#x}"),
            Self::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            },
        }
    }
}

macro_rules! impl_from_uint {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    Self::Int(value as u64)
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64);

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// A constraint a value must satisfy before it is written.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FieldCheck {
    /// The value must lie in `min..=max`.
    Range { min: u64, max: u64 },

    /// The value must equal the given constant.
    Fixed(u64),
}

/// Why a value was rejected by a field.
#[derive(Clone, PartialEq, Eq, Hash, Debug, thiserror::Error)]
pub enum ValidationFailure {
    /// The value does not fit the field or violates a range check.
    #[error("value {value:#x} is outside of {min:#x}..={max:#x}")]
    OutOfRange { value: u64, min: u64, max: u64 },

    /// A byte value has the wrong length for the field.
    #[error("expected {expected} bytes, got {actual}")]
    ByteLength { expected: usize, actual: usize },

    /// A fixed-value field was given something else.
    #[error("field is fixed to {expected:#x}, got {actual:#x}")]
    FixedValue { expected: u64, actual: u64 },

    /// An integer was given for a field wider than 64 bits.
    #[error("field is {bits} bits wide and only accepts raw bytes")]
    TooWide { bits: usize },
}

/// Describes one named, fixed-width field of a payload.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BitField {
    /// The ordering key of the field. Assigned by [`crate::layout::LayoutBuilder`].
    pub id: u8,

    /// The attribute name the field is exposed under.
    pub name: &'static str,

    /// The exact width in bits.
    pub bit_length: usize,

    /// The value used when the field is omitted.
    pub default_value: Option<u64>,

    /// Whether the field may be left out when encoding.
    pub optional: bool,

    /// Additional checks on top of the implicit width check.
    pub checks: Vec<FieldCheck>,
}

impl BitField {
    /// A required field without a default.
    pub fn required(name: &'static str, bit_length: usize) -> Self {
        Self {
            id: 0,
            name,
            bit_length,
            default_value: None,
            optional: false,
            checks: Vec::new(),
        }
    }

    /// An optional field that falls back to `default` when omitted.
    pub fn optional(name: &'static str, bit_length: usize, default: u64) -> Self {
        Self {
            default_value: Some(default),
            optional: true,
            ..Self::required(name, bit_length)
        }
    }

    /// A reserved field. Defaults to zero, any in-range value is accepted.
    pub fn reserved(name: &'static str, bit_length: usize) -> Self {
        Self::optional(name, bit_length, 0)
    }

    /// A padding field. Defaults to zero and rejects anything else.
    pub fn padding(bit_length: usize) -> Self {
        Self::optional("padding", bit_length, 0).with_check(FieldCheck::Fixed(0))
    }

    /// Adds a check to the field.
    pub fn with_check(mut self, check: FieldCheck) -> Self {
        self.checks.push(check);
        self
    }

    /// The largest integer that fits the field, saturating at `u64::MAX`.
    pub fn max_value(&self) -> u64 {
        if self.bit_length >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_length) - 1
        }
    }

    /// Whether the field decodes to [`FieldValue::Int`].
    pub fn is_integer(&self) -> bool {
        self.bit_length <= 64
    }

    /// Checks a value against the field's width and checks.
    pub fn validate(&self, value: &FieldValue) -> Result<(), ValidationFailure> {
        match value {
            FieldValue::Int(int) => {
                if !self.is_integer() {
                    return Err(ValidationFailure::TooWide {
                        bits: self.bit_length,
                    });
                }
                if *int > self.max_value() {
                    return Err(ValidationFailure::OutOfRange {
                        value: *int,
                        min: 0,
                        max: self.max_value(),
                    });
                }
                self.run_checks(*int)
            },
            FieldValue::Bytes(bytes) => {
                let expected = self.bit_length / 8;
                if self.bit_length % 8 != 0 || bytes.len() != expected {
                    return Err(ValidationFailure::ByteLength {
                        expected,
                        actual: bytes.len(),
                    });
                }
                if self.is_integer() {
                    return self.run_checks(bytes_to_int(bytes));
                }

                // Wide fields only ever carry a zero fixed check (padding).
                let nonzero = bytes.iter().copied().find(|&b| b != 0);
                match (nonzero, self.fixed_value()) {
                    (Some(actual), Some(expected)) => Err(ValidationFailure::FixedValue {
                        expected,
                        actual: actual as u64,
                    }),
                    _ => Ok(()),
                }
            },
        }
    }

    fn fixed_value(&self) -> Option<u64> {
        self.checks.iter().find_map(|check| match check {
            FieldCheck::Fixed(value) => Some(*value),
            FieldCheck::Range { .. } => None,
        })
    }

    fn run_checks(&self, value: u64) -> Result<(), ValidationFailure> {
        for check in &self.checks {
            match *check {
                FieldCheck::Range { min, max } if value < min || value > max => {
                    return Err(ValidationFailure::OutOfRange { value, min, max });
                },
                FieldCheck::Fixed(expected) if value != expected => {
                    return Err(ValidationFailure::FixedValue {
                        expected,
                        actual: value,
                    });
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// The value written when the field is omitted.
    ///
    /// Fields wider than 64 bits always default to all zero bytes.
    pub fn default_field_value(&self) -> Option<FieldValue> {
        let default = self.default_value?;
        if self.is_integer() {
            Some(FieldValue::Int(default))
        } else {
            Some(FieldValue::Bytes(vec![0u8; self.bit_length / 8]))
        }
    }
}

fn bytes_to_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Writes the `len` low bits of `value` at bit `offset`, MSB first.
pub(crate) fn put_int(buf: &mut [u8], offset: usize, len: usize, value: u64) {
    for i in 0..len {
        if (value >> (len - 1 - i)) & 1 == 1 {
            let pos = offset + i;
            buf[pos / 8] |= 0x80 >> (pos % 8);
        }
    }
}

/// Writes `bytes` as a `bytes.len() * 8` bit wide field at bit `offset`.
pub(crate) fn put_bytes(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    for (i, byte) in bytes.iter().enumerate() {
        put_int(buf, offset + i * 8, 8, *byte as u64);
    }
}

/// Reads a `len` bit wide integer at bit `offset`, MSB first.
pub(crate) fn get_int(buf: &[u8], offset: usize, len: usize) -> u64 {
    (0..len).fold(0u64, |acc, i| {
        let pos = offset + i;
        let bit = (buf[pos / 8] >> (7 - pos % 8)) & 1;
        (acc << 1) | bit as u64
    })
}

/// Reads a byte-aligned-length field of `len` bits at bit `offset`.
pub(crate) fn get_bytes(buf: &[u8], offset: usize, len: usize) -> Vec<u8> {
    (0..len / 8)
        .map(|i| get_int(buf, offset + i * 8, 8) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_byte_fields_share_a_byte() {
        let mut buf = [0u8; 1];
        put_int(&mut buf, 0, 4, 0);
        put_int(&mut buf, 4, 2, 0b10);
        put_int(&mut buf, 6, 2, 0b01);
        assert_eq!(buf, [0b0000_1001]);
        assert_eq!(get_int(&buf, 4, 2), 0b10);
        assert_eq!(get_int(&buf, 6, 2), 0b01);
    }

    #[test]
    fn multi_byte_values_are_big_endian() {
        let mut buf = [0u8; 3];
        put_int(&mut buf, 4, 16, 0xabcd);
        assert_eq!(buf, [0x0a, 0xbc, 0xd0]);
        assert_eq!(get_int(&buf, 4, 16), 0xabcd);
    }

    #[test]
    fn byte_fields_survive_unaligned_offsets() {
        let mut buf = [0u8; 4];
        put_bytes(&mut buf, 2, &[0xff, 0x81]);
        assert_eq!(get_bytes(&buf, 2, 16), vec![0xff, 0x81]);
    }

    #[test]
    fn range_is_derived_from_width() {
        let field = BitField::required("persistence", 2);
        assert!(field.validate(&FieldValue::Int(3)).is_ok());
        assert_eq!(
            field.validate(&FieldValue::Int(4)),
            Err(ValidationFailure::OutOfRange {
                value: 4,
                min: 0,
                max: 3
            })
        );
    }

    #[test]
    fn padding_rejects_non_zero_values() {
        let field = BitField::padding(24);
        assert!(field.validate(&FieldValue::Int(0)).is_ok());
        assert!(matches!(
            field.validate(&FieldValue::Int(1)),
            Err(ValidationFailure::FixedValue { .. })
        ));
    }

    #[test]
    fn wide_fields_only_accept_bytes_of_exact_length() {
        let field = BitField::required("uuid_0_10", 88);
        assert_eq!(
            field.validate(&FieldValue::Int(1)),
            Err(ValidationFailure::TooWide { bits: 88 })
        );
        assert!(field.validate(&FieldValue::Bytes(vec![0; 11])).is_ok());
        assert_eq!(
            field.validate(&FieldValue::Bytes(vec![0; 10])),
            Err(ValidationFailure::ByteLength {
                expected: 11,
                actual: 10
            })
        );
    }
}
