//! A versioned HID++2.0 message codec for Logitech RGB and backlight
//! features.
//!
//! HID++2.0 devices expose their functionality as numbered features. Each
//! feature has versions, and each version defines its own set of functions
//! (request/response pairs) and events. A function may keep its index across
//! versions while its request grows new fields. This crate models that with
//! declarative tables:
//!
//! - [`bitfield`] and [`layout`] describe payloads as ordered, MSB-first bit
//!   fields and pack or unpack them.
//! - [`protocol::v20`] frames payloads into short (7 byte) and long (20 byte)
//!   reports and recognizes HID++2.0 error reports.
//! - [`feature`] holds the version tables of the supported features
//!   (`RgbEffects` 0x8071 and `Backlight` 0x1982), the effect parameter
//!   tuple codec and the [`feature::registry`] to look them up by ID.
//! - [`channel`] matches replies to requests over a pluggable [`channel::Transport`],
//!   and [`feature::client::FeatureClient`] ties a feature version to it.
//! - [`capability`] checks per-product capability tables against the effect
//!   sets of the feature versions.
//!
//! # Quickstart
//!
//! Resolving and encoding a request needs no device:
//!
//! ```
//! use hidpp::{
//!     feature::{FeatureError, VersionedFeature, rgb_effects::RgbEffects},
//!     layout::FieldValues,
//! };
//!
//! let feature = RgbEffects::create(4)?;
//! let shutdown = feature.shutdown.ok_or(FeatureError::UnknownVersion {
//!     feature: "RgbEffects",
//!     version: 4,
//! })?;
//!
//! let msg = shutdown.request.encode(0xff, 0x0b, &FieldValues::new())?;
//! assert_eq!(msg.header().feature_index, 0x0b);
//! # Ok::<(), FeatureError>(())
//! ```
//!
//! Talking to a device means implementing [`channel::Transport`] for your HID
//! backend. The trait uses [`mod@async_trait`], which is re-exported for
//! annotating the implementing type. Wrap the transport in a
//! [`channel::HidppChannel`] and create a [`feature::client::FeatureClient`]
//! for the version the device reports.

pub use async_trait::async_trait;

pub mod bitfield;
pub mod capability;
pub mod channel;
pub mod feature;
pub mod layout;
pub mod nibble;
pub mod protocol;
