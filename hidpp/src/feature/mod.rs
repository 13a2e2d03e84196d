//! Versioned HID++2.0 feature definitions.
//!
//! Every feature is described by a [`VersionTable`]: for each declared
//! version, the request/response pair behind every function index and the
//! report behind every event index. Versions are declared in full, one by
//! one. A function keeping its index while switching to a new request layout
//! on a version boundary is therefore always explicit.
//!
//! Calling code usually does not touch the table itself but creates a
//! version-specific accessor through [`VersionedFeature::create`].

use std::{collections::BTreeMap, fmt};

use thiserror::Error;
use tracing::debug;

use crate::{
    layout::{CodecError, FieldValues, Layout},
    nibble::U4,
    protocol::v20::{self, MessageHeader, ReportKind},
};

pub mod backlight;
pub mod client;
pub mod registry;
pub mod rgb_effects;

use rgb_effects::effects::EffectFamily;

/// Whether a message travels from host to device as a request, back as a
/// response, or unsolicited as an event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MessageKind {
    Request,
    Response,
    Event,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Event => "event",
        })
    }
}

/// Describes one concrete message type of a feature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MessageDescriptor {
    /// The ID of the feature the message belongs to.
    pub feature_id: u16,

    pub kind: MessageKind,

    /// The function index (requests and responses) or event index (events).
    pub index: u8,

    /// The feature versions the message type applies to.
    pub versions: &'static [u8],

    /// The report the payload travels in.
    pub report: ReportKind,

    pub layout: Layout,

    /// For responses, the names of the requests producing them.
    pub request_list: &'static [&'static str],
}

impl MessageDescriptor {
    pub fn new(
        feature_id: u16,
        kind: MessageKind,
        index: u8,
        versions: &'static [u8],
        report: ReportKind,
        layout: Layout,
    ) -> Self {
        Self {
            feature_id,
            kind,
            index,
            versions,
            report,
            layout,
            request_list: &[],
        }
    }

    /// Records the requests a response answers.
    pub fn answering(mut self, request_list: &'static [&'static str]) -> Self {
        self.request_list = request_list;
        self
    }

    pub fn name(&self) -> &'static str {
        self.layout.name()
    }

    pub fn applies_to(&self, version: u8) -> bool {
        self.versions.contains(&version)
    }

    /// Encodes `values` into a payload of the descriptor's report size.
    pub fn encode_payload(&self, values: &FieldValues) -> Result<Vec<u8>, CodecError> {
        self.layout.encode(values)
    }

    /// Encodes `values` into a complete message.
    ///
    /// The function ID is the descriptor's index. The software ID is left at
    /// zero, [`crate::channel::HidppChannel`] fills it in when sending.
    pub fn encode(
        &self,
        device_index: u8,
        feature_index: u8,
        values: &FieldValues,
    ) -> Result<v20::Message, FeatureError> {
        let payload = self.encode_payload(values)?;
        let header = MessageHeader {
            device_index,
            feature_index,
            function_id: U4::from_lo(self.index),
            software_id: U4::default(),
        };
        Ok(v20::Message::new(self.report, header, &payload)?)
    }

    /// Decodes a message received for this descriptor.
    pub fn decode(&'static self, msg: &v20::Message) -> Result<DecodedMessage, FeatureError> {
        if msg.kind() != self.report {
            return Err(FeatureError::WrongReportKind {
                message: self.name(),
                expected: self.report,
                actual: msg.kind(),
            });
        }

        self.decode_bytes(msg.header(), msg.payload())
    }

    /// Decodes a bare payload, as captured outside of a channel.
    pub fn decode_bytes(
        &'static self,
        header: MessageHeader,
        payload: &[u8],
    ) -> Result<DecodedMessage, FeatureError> {
        let values = self.layout.decode(payload)?;
        Ok(DecodedMessage {
            descriptor: self,
            header,
            values,
            payload: payload.to_vec(),
        })
    }
}

/// A message decoded through its descriptor.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecodedMessage {
    pub descriptor: &'static MessageDescriptor,
    pub header: MessageHeader,
    pub values: FieldValues,

    /// The raw payload, kept for reinterpretation through [`Self::view`].
    pub payload: Vec<u8>,
}

impl DecodedMessage {
    /// Returns the integer value of a field.
    pub fn int(&self, name: &str) -> Option<u64> {
        self.values.int(name)
    }

    /// Reads the payload again through another layout of the same size.
    ///
    /// Some responses are generic containers (`param_1..param_n`) whose real
    /// meaning depends on the request, e.g. the different kinds of `getInfo`.
    pub fn view(&self, layout: &Layout) -> Result<FieldValues, CodecError> {
        layout.decode(&self.payload)
    }
}

/// The request and response type behind a function index.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FunctionEntry {
    pub request: &'static MessageDescriptor,
    pub response: &'static MessageDescriptor,
}

/// Describes the accessor ("main class") of one feature version.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MainDescriptor {
    pub name: &'static str,

    /// The highest function index the version supports.
    pub max_function_index: u8,
}

/// Everything a single feature version exposes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VersionEntry {
    pub main: MainDescriptor,
    pub functions: BTreeMap<u8, FunctionEntry>,
    pub events: BTreeMap<u8, &'static MessageDescriptor>,
}

/// The authoritative map from version and index to message types of one
/// feature.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VersionTable {
    pub feature_id: u16,
    pub name: &'static str,
    versions: BTreeMap<u8, VersionEntry>,
}

impl VersionTable {
    pub fn new(
        feature_id: u16,
        name: &'static str,
        versions: impl IntoIterator<Item = (u8, VersionEntry)>,
    ) -> Self {
        Self {
            feature_id,
            name,
            versions: versions.into_iter().collect(),
        }
    }

    /// All declared versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = u8> + '_ {
        self.versions.keys().copied()
    }

    /// Looks up the entry of a version.
    pub fn entry(&self, version: u8) -> Result<&VersionEntry, FeatureError> {
        self.versions
            .get(&version)
            .ok_or(FeatureError::UnknownVersion {
                feature: self.name,
                version,
            })
    }

    pub fn get_main_class(&self, version: u8) -> Result<&MainDescriptor, FeatureError> {
        self.entry(version).map(|entry| &entry.main)
    }

    fn function(&self, version: u8, function_index: u8) -> Result<&FunctionEntry, FeatureError> {
        self.entry(version)?
            .functions
            .get(&function_index)
            .ok_or(FeatureError::UnsupportedOperation {
                feature: self.name,
                version,
                kind: MessageKind::Request,
                index: function_index,
            })
    }

    pub fn get_request_type(
        &self,
        version: u8,
        function_index: u8,
    ) -> Result<&'static MessageDescriptor, FeatureError> {
        let request = self.function(version, function_index)?.request;
        debug!(feature = self.name, version, function_index, request = request.name(), "resolved request type");
        Ok(request)
    }

    pub fn get_response_type(
        &self,
        version: u8,
        function_index: u8,
    ) -> Result<&'static MessageDescriptor, FeatureError> {
        let response = self.function(version, function_index)?.response;
        debug!(feature = self.name, version, function_index, response = response.name(), "resolved response type");
        Ok(response)
    }

    pub fn get_report_type(
        &self,
        version: u8,
        event_index: u8,
    ) -> Result<&'static MessageDescriptor, FeatureError> {
        let report = self
            .entry(version)?
            .events
            .get(&event_index)
            .copied()
            .ok_or(FeatureError::UnsupportedOperation {
                feature: self.name,
                version,
                kind: MessageKind::Event,
                index: event_index,
            })?;
        debug!(feature = self.name, version, event_index, report = report.name(), "resolved report type");
        Ok(report)
    }

    /// Decodes a response, picking its type by the function ID of the
    /// envelope.
    pub fn resolve_response(
        &self,
        version: u8,
        msg: &v20::Message,
    ) -> Result<DecodedMessage, FeatureError> {
        self.get_response_type(version, msg.header().function_id.value())?
            .decode(msg)
    }

    /// Decodes an event, picking its type by the function ID of the envelope.
    pub fn resolve_event(&self, version: u8, msg: &v20::Message) -> Result<DecodedMessage, FeatureError> {
        self.get_report_type(version, msg.header().function_id.value())?
            .decode(msg)
    }

    /// Iterates over every distinct message type of the table.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static MessageDescriptor> + '_ {
        let mut seen: Vec<&'static MessageDescriptor> = Vec::new();
        self.versions
            .values()
            .flat_map(|entry| {
                entry
                    .functions
                    .values()
                    .flat_map(|f| [f.request, f.response])
                    .chain(entry.events.values().copied())
            })
            .filter(move |desc| {
                if seen.iter().any(|s| std::ptr::eq(*s, *desc)) {
                    false
                } else {
                    seen.push(*desc);
                    true
                }
            })
    }
}

/// Represents a version-specific accessor of a feature.
///
/// Implementations bind the message types of their version once, on
/// creation; operations a version does not have stay `None`.
pub trait VersionedFeature: Sized {
    /// The protocol ID of the feature.
    const ID: u16;

    const NAME: &'static str;

    fn table() -> &'static VersionTable;

    /// Binds the message types of `entry`.
    fn from_entry(version: u8, entry: &'static VersionEntry) -> Self;

    fn version(&self) -> u8;

    /// Creates the accessor for a negotiated version.
    fn create(version: u8) -> Result<Self, FeatureError> {
        let entry = Self::table().entry(version)?;
        debug!(feature = Self::NAME, version, main = entry.main.name, "creating feature accessor");
        Ok(Self::from_entry(version, entry))
    }

    /// The table entry the accessor was built from.
    fn entry(&self) -> &'static VersionEntry;

    fn main(&self) -> &'static MainDescriptor {
        &self.entry().main
    }

    fn max_function_index(&self) -> u8 {
        self.main().max_function_index
    }
}

/// Represents an error raised while resolving or coding feature messages.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// The function or event index is not defined for the version.
    #[error("{feature} v{version} has no {kind} with index {index}")]
    UnsupportedOperation {
        feature: &'static str,
        version: u8,
        kind: MessageKind,
        index: u8,
    },

    /// The version is not declared in the feature's version table.
    #[error("{feature} has no version {version}")]
    UnknownVersion { feature: &'static str, version: u8 },

    /// The effect ID is not part of the effect set of the version family.
    #[error("effect {id:#06x} is not supported by the {family:?} effect set")]
    UnsupportedEffect { family: EffectFamily, id: u16 },

    /// The feature ID is not known to the registry.
    #[error("unknown feature {0:#06x}")]
    UnknownFeature(u16),

    /// A message arrived in a report of the wrong size for its type.
    #[error("{message} travels in a {expected:?} report, got {actual:?}")]
    WrongReportKind {
        message: &'static str,
        expected: ReportKind,
        actual: ReportKind,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
