//! The HID++2.0 message envelope.
//!
//! Every message starts with `ReportID, DeviceIndex, FeatureIndex,
//! FunctionID:4, SoftwareID:4`, followed by a payload of 3 (short report) or
//! 16 (long report) bytes. Responses and events reuse the same envelope, with
//! the software ID of a response echoing the request's.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    channel::{LONG_REPORT_ID, LONG_REPORT_LENGTH, SHORT_REPORT_ID, SHORT_REPORT_LENGTH},
    layout::CodecError,
    nibble::{self, U4},
};

/// The length of the envelope preceding the payload, report ID included.
pub const HEADER_LENGTH: usize = 4;

/// The feature index devices use to report HID++2.0 errors.
pub const ERROR_FEATURE_INDEX: u8 = 0xff;

/// Represents the header that every HID++2.0 message starts with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MessageHeader {
    /// The index of the device involved in the communication.
    pub device_index: u8,

    /// The index of the feature the message belongs to.
    ///
    /// This is not the same as the feature ID, but the index returned from a
    /// feature enumeration request.
    pub feature_index: u8,

    /// The ID of the function (or event) involved in the communication.
    pub function_id: U4,

    /// The ID of the software communicating with the device.
    pub software_id: U4,
}

/// The two report sizes HID++ messages come in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ReportKind {
    /// A 7 byte report with 3 bytes (24 bits) of payload.
    Short,

    /// A 20 byte report with 16 bytes (128 bits) of payload.
    Long,
}

impl ReportKind {
    pub fn report_id(self) -> u8 {
        match self {
            Self::Short => SHORT_REPORT_ID,
            Self::Long => LONG_REPORT_ID,
        }
    }

    /// The length of the whole frame including the envelope.
    pub fn frame_length(self) -> usize {
        match self {
            Self::Short => SHORT_REPORT_LENGTH,
            Self::Long => LONG_REPORT_LENGTH,
        }
    }

    pub fn payload_length(self) -> usize {
        self.frame_length() - HEADER_LENGTH
    }

    pub fn payload_bits(self) -> usize {
        self.payload_length() * 8
    }

    pub fn from_report_id(id: u8) -> Option<Self> {
        match id {
            SHORT_REPORT_ID => Some(Self::Short),
            LONG_REPORT_ID => Some(Self::Long),
            _ => None,
        }
    }
}

/// Represents a HID++2.0 message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Message {
    /// Represents a short HID++2.0 message with 3 bytes of payload.
    Short(MessageHeader, [u8; SHORT_REPORT_LENGTH - HEADER_LENGTH]),

    /// Represents a long HID++2.0 message with 16 bytes of payload.
    Long(MessageHeader, [u8; LONG_REPORT_LENGTH - HEADER_LENGTH]),
}

impl Message {
    /// Builds a message of the given kind, failing if `payload` does not have
    /// exactly the payload length of that kind.
    pub fn new(kind: ReportKind, header: MessageHeader, payload: &[u8]) -> Result<Self, CodecError> {
        let malformed = || CodecError::MalformedFrame {
            expected: kind.payload_length(),
            actual: payload.len(),
        };

        Ok(match kind {
            ReportKind::Short => Self::Short(header, payload.try_into().map_err(|_| malformed())?),
            ReportKind::Long => Self::Long(header, payload.try_into().map_err(|_| malformed())?),
        })
    }

    /// Extracts the header of the message.
    pub fn header(&self) -> MessageHeader {
        match *self {
            Self::Short(header, _) => header,
            Self::Long(header, _) => header,
        }
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            Self::Short(..) => ReportKind::Short,
            Self::Long(..) => ReportKind::Long,
        }
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Short(_, payload) => payload,
            Self::Long(_, payload) => payload,
        }
    }

    /// Reads a message from a raw frame.
    ///
    /// The frame must start with a known report ID and have exactly the
    /// length belonging to it.
    pub fn read_raw(data: &[u8]) -> Result<Self, CodecError> {
        let Some(&report_id) = data.first() else {
            return Err(CodecError::MalformedFrame {
                expected: SHORT_REPORT_LENGTH,
                actual: 0,
            });
        };

        let kind = ReportKind::from_report_id(report_id).ok_or(CodecError::UnknownReportId(report_id))?;
        if data.len() != kind.frame_length() {
            return Err(CodecError::MalformedFrame {
                expected: kind.frame_length(),
                actual: data.len(),
            });
        }

        let (function_id, software_id) = nibble::split(data[3]);
        let header = MessageHeader {
            device_index: data[1],
            feature_index: data[2],
            function_id,
            software_id,
        };

        Self::new(kind, header, &data[HEADER_LENGTH..])
    }

    /// Writes the message in its raw frame form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = self.header();
        let mut buf = Vec::with_capacity(self.kind().frame_length());
        buf.push(self.kind().report_id());
        buf.push(header.device_index);
        buf.push(header.feature_index);
        buf.push(nibble::combine(header.function_id, header.software_id));
        buf.extend_from_slice(self.payload());
        buf
    }

    /// Interprets the message as a HID++2.0 error report, if it is one.
    pub fn as_error(&self) -> Option<ErrorReport> {
        let header = self.header();
        if header.feature_index != ERROR_FEATURE_INDEX {
            return None;
        }

        // The failed request's feature index takes the function/software ID
        // byte, its function/software ID byte moves into the payload.
        let payload = self.payload();
        let (function_id, software_id) = nibble::split(payload[0]);
        Some(ErrorReport {
            device_index: header.device_index,
            feature_index: nibble::combine(header.function_id, header.software_id),
            function_id,
            software_id,
            code: ErrorCode::try_from(payload[1]).unwrap_or(ErrorCode::Unknown),
        })
    }
}

/// An error a device reported in reply to a request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ErrorReport {
    pub device_index: u8,

    /// The feature index of the failed request.
    pub feature_index: u8,

    /// The function ID of the failed request.
    pub function_id: U4,

    /// The software ID of the failed request.
    pub software_id: U4,

    pub code: ErrorCode,
}

/// Represents the error codes of HID++2.0 error reports.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum ErrorCode {
    NoError = 0x00,
    Unknown = 0x01,
    InvalidArgument = 0x02,
    OutOfRange = 0x03,
    HardwareError = 0x04,
    LogitechInternal = 0x05,
    InvalidFeatureIndex = 0x06,
    InvalidFunctionId = 0x07,
    Busy = 0x08,
    Unsupported = 0x09,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frames_round_trip() {
        let raw = [0x10, 0x01, 0x0a, 0x1b, 0x00, 0x01, 0x02];
        let msg = Message::read_raw(&raw).unwrap();
        assert_eq!(msg.kind(), ReportKind::Short);
        assert_eq!(msg.header().function_id, U4::from_lo(0x1));
        assert_eq!(msg.header().software_id, U4::from_lo(0xb));
        assert_eq!(msg.to_bytes(), raw.to_vec());
    }

    #[test]
    fn length_must_match_report_id() {
        assert_eq!(
            Message::read_raw(&[0x11, 0x01, 0x0a, 0x1b, 0x00]),
            Err(CodecError::MalformedFrame {
                expected: 20,
                actual: 5
            })
        );
        assert_eq!(
            Message::read_raw(&[0x20, 0x01, 0x0a, 0x1b, 0x00, 0x00, 0x00]),
            Err(CodecError::UnknownReportId(0x20))
        );
        assert!(Message::read_raw(&[]).is_err());
    }

    #[test]
    fn error_reports_are_recognized() {
        let mut raw = [0u8; LONG_REPORT_LENGTH];
        raw[..7].copy_from_slice(&[0x11, 0x01, 0xff, 0x0a, 0x1b, 0x07, 0x00]);
        let report = Message::read_raw(&raw).unwrap().as_error().unwrap();
        assert_eq!(report.feature_index, 0x0a);
        assert_eq!(report.function_id, U4::from_lo(0x1));
        assert_eq!(report.code, ErrorCode::InvalidFunctionId);
    }
}
