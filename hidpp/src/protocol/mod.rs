//! Wire formats of the HID++ protocol versions.

pub mod v20;
