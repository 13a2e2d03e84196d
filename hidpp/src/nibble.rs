//! A four bit value as used by the function/software ID byte of HID++2.0
//! messages.

/// Represents an unsigned 4-bit value (nibble) stored in a byte.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct U4(u8);

impl U4 {
    /// The largest value a nibble can hold.
    pub const MAX: U4 = U4(0x0f);

    /// Constructs a nibble, returning `None` if `value` does not fit into 4
    /// bits.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Self(value))
    }

    /// Constructs a nibble from the 4 low/rightmost bits of a byte.
    pub fn from_lo(raw: u8) -> Self {
        Self(raw & 0x0f)
    }

    /// Constructs a nibble from the 4 high/leftmost bits of a byte.
    pub fn from_hi(raw: u8) -> Self {
        Self(raw >> 4)
    }

    /// Returns the plain value of the nibble.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Places the nibble in the 4 high/leftmost bits of a byte.
    pub fn to_hi(self) -> u8 {
        self.0 << 4
    }
}

impl From<U4> for u8 {
    fn from(value: U4) -> Self {
        value.0
    }
}

/// Packs two nibbles into one byte, `hi` taking the 4 leftmost bits.
pub fn combine(hi: U4, lo: U4) -> u8 {
    hi.to_hi() | lo.value()
}

/// Splits a byte into its high and low nibbles.
pub fn split(raw: u8) -> (U4, U4) {
    (U4::from_hi(raw), U4::from_lo(raw))
}
