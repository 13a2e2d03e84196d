//! Exchanges HID++2.0 messages over a byte-oriented transport.
//!
//! The transport itself (USB, receiver, emulator) lives outside this crate and
//! is plugged in through [`Transport`]. The channel takes care of framing,
//! software IDs, matching replies to requests and HID++2.0 error reports.

use std::{
    error::Error,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    layout::CodecError,
    nibble::U4,
    protocol::v20::{self, ErrorCode},
};

pub const SHORT_REPORT_ID: u8 = 0x10;
pub const SHORT_REPORT_LENGTH: usize = 7;

pub const LONG_REPORT_ID: u8 = 0x11;
pub const LONG_REPORT_LENGTH: usize = 20;

/// Represents anything that can send a raw HID++ frame and hand back the
/// device's reply.
///
/// Timeouts and retries are the implementation's business; a reply that
/// never arrives should surface as [`Transport::Error`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// An implementation-specific error type.
    type Error: Error + Send + Sync + 'static;

    /// Sends a complete frame and returns the complete reply frame.
    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, Self::Error>;

    /// Whether the transport can carry short reports. Messages declared short
    /// are widened to long reports otherwise.
    fn supports_short(&self) -> bool {
        true
    }

    /// Whether the transport can carry long reports.
    fn supports_long(&self) -> bool {
        true
    }
}

/// Represents a HID++2.0 channel on top of a [`Transport`].
pub struct HidppChannel<T: Transport> {
    transport: T,

    /// The software ID put into outgoing messages.
    sw_id: AtomicU8,

    /// Whether [`Self::sw_id`] advances after every request.
    rotating_sw_id: AtomicBool,

    /// Receivers of messages that did not answer a request (events).
    listeners: Mutex<Vec<flume::Sender<v20::Message>>>,
}

impl<T: Transport> HidppChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sw_id: AtomicU8::new(0x01),
            rotating_sw_id: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sets the software ID used for the next request.
    ///
    /// A software ID of zero is reserved for device notifications, so `0` is
    /// replaced by `1`.
    pub fn set_sw_id(&self, sw_id: U4) {
        self.sw_id.store(sw_id.value().max(1), Ordering::Relaxed);
    }

    pub fn get_sw_id(&self) -> U4 {
        U4::from_lo(self.sw_id.load(Ordering::Relaxed))
    }

    /// Enables or disables advancing the software ID after every request,
    /// cycling through `1..=15`.
    pub fn set_rotating_sw_id(&self, rotating: bool) {
        self.rotating_sw_id.store(rotating, Ordering::Relaxed);
    }

    fn next_sw_id(&self) -> U4 {
        if !self.rotating_sw_id.load(Ordering::Relaxed) {
            return self.get_sw_id();
        }

        let previous = self
            .sw_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(if id >= 0x0f { 0x01 } else { id + 1 })
            })
            .unwrap_or(0x01);
        U4::from_lo(previous)
    }

    /// Sends a request and waits for the matching reply.
    ///
    /// The software ID of `msg` is replaced by the channel's. The reply must
    /// echo the device index, feature index, function ID and software ID of
    /// the request, otherwise [`ChannelError::UnexpectedReply`] is returned.
    pub async fn send_v20(&self, msg: v20::Message) -> Result<v20::Message, ChannelError<T::Error>> {
        let msg = self.prepare(msg)?;
        let request = msg.header();
        let raw = msg.to_bytes();
        debug!(frame = ?raw, "sending HID++ request");

        let reply_raw = self
            .transport
            .exchange(&raw)
            .await
            .map_err(ChannelError::Transport)?;
        debug!(frame = ?reply_raw, "received HID++ reply");

        let reply = v20::Message::read_raw(&reply_raw)?;

        if let Some(error) = reply.as_error() {
            if error.feature_index == request.feature_index
                && error.function_id == request.function_id
            {
                return Err(ChannelError::Device(error.code));
            }
        }

        let header = reply.header();
        if header != request {
            warn!(?request, reply = ?header, "reply does not match the request");
            return Err(ChannelError::UnexpectedReply(reply));
        }

        Ok(reply)
    }

    fn prepare(&self, msg: v20::Message) -> Result<v20::Message, ChannelError<T::Error>> {
        let supports_long = self.transport.supports_long();
        if msg.kind() == v20::ReportKind::Long && !supports_long {
            return Err(ChannelError::MessageTypeNotSupported(msg.kind()));
        }

        let mut header = msg.header();
        header.software_id = self.next_sw_id();

        Ok(match msg {
            v20::Message::Short(_, payload) if !self.transport.supports_short() => {
                if !supports_long {
                    return Err(ChannelError::MessageTypeNotSupported(msg.kind()));
                }
                let mut long = [0u8; LONG_REPORT_LENGTH - v20::HEADER_LENGTH];
                long[..payload.len()].copy_from_slice(&payload);
                v20::Message::Long(header, long)
            },
            v20::Message::Short(_, payload) => v20::Message::Short(header, payload),
            v20::Message::Long(_, payload) => v20::Message::Long(header, payload),
        })
    }

    /// Creates a receiver for all unsolicited messages passed to
    /// [`Self::dispatch_unsolicited`].
    pub fn listen(&self) -> flume::Receiver<v20::Message> {
        let (tx, rx) = flume::unbounded();
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(tx);
        }
        rx
    }

    /// Forwards an unsolicited frame (usually an event) to every listener.
    ///
    /// Listeners whose receivers were dropped are removed.
    pub fn dispatch_unsolicited(&self, raw: &[u8]) -> Result<(), CodecError> {
        let msg = v20::Message::read_raw(raw)?;
        debug!(frame = ?raw, "dispatching unsolicited HID++ message");

        let Ok(mut listeners) = self.listeners.lock() else {
            return Ok(());
        };
        listeners.retain(|listener| listener.send(msg).is_ok());
        if listeners.is_empty() {
            warn!(header = ?msg.header(), "no listener for unsolicited message");
        }

        Ok(())
    }
}

/// Represents an error that occurred when exchanging messages across a
/// [`HidppChannel`].
#[derive(Debug, Error)]
pub enum ChannelError<E: Error> {
    /// Indicates that the [`Transport`] implementation returned an error.
    #[error("the transport returned an error")]
    Transport(#[source] E),

    /// Indicates that the reply was not a well-formed HID++ frame.
    #[error("the reply is not a valid HID++ frame")]
    Frame(#[from] CodecError),

    /// Indicates that the device answered with a HID++2.0 error report.
    #[error("the device reported an error: {0:?}")]
    Device(ErrorCode),

    /// Indicates that the reply does not belong to the request that was sent.
    #[error("the reply does not match the request")]
    UnexpectedReply(v20::Message),

    /// Indicates that the transport cannot carry the report kind of the
    /// message.
    #[error("the transport does not support {0:?} reports")]
    MessageTypeNotSupported(v20::ReportKind),
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, convert::Infallible};

    use futures::executor::block_on;

    use super::*;
    use crate::protocol::v20::MessageHeader;

    /// Replays canned replies and records every request.
    struct Scripted {
        replies: Mutex<VecDeque<Vec<u8>>>,
        sent: Mutex<Vec<Vec<u8>>>,
        short: bool,
        long: bool,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = Vec<u8>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                sent: Mutex::new(Vec::new()),
                short: true,
                long: true,
            }
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        type Error = Infallible;

        async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, Infallible> {
            self.sent.lock().unwrap().push(request.to_vec());
            Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
        }

        fn supports_short(&self) -> bool {
            self.short
        }

        fn supports_long(&self) -> bool {
            self.long
        }
    }

    fn request() -> v20::Message {
        v20::Message::Short(
            MessageHeader {
                device_index: 0x01,
                feature_index: 0x0a,
                function_id: U4::from_lo(0x2),
                software_id: U4::from_lo(0x0),
            },
            [0x00, 0x01, 0x02],
        )
    }

    fn long_reply(header: [u8; 4]) -> Vec<u8> {
        let mut raw = vec![0u8; LONG_REPORT_LENGTH];
        raw[..4].copy_from_slice(&header);
        raw
    }

    #[test]
    fn reply_with_matching_header_is_returned() {
        let chan = HidppChannel::new(Scripted::new([long_reply([0x11, 0x01, 0x0a, 0x21])]));
        let reply = block_on(chan.send_v20(request())).unwrap();
        assert_eq!(reply.kind(), v20::ReportKind::Long);
        assert_eq!(
            chan.transport().sent.lock().unwrap()[0],
            vec![0x10, 0x01, 0x0a, 0x21, 0x00, 0x01, 0x02]
        );
    }

    #[test]
    fn device_errors_are_surfaced() {
        let mut raw = long_reply([0x11, 0x01, 0xff, 0x0a]);
        raw[4] = 0x21;
        raw[5] = 0x02;
        let chan = HidppChannel::new(Scripted::new([raw]));
        assert!(matches!(
            block_on(chan.send_v20(request())),
            Err(ChannelError::Device(ErrorCode::InvalidArgument))
        ));
    }

    #[test]
    fn mismatching_reply_is_rejected() {
        let chan = HidppChannel::new(Scripted::new([long_reply([0x11, 0x01, 0x0a, 0x31])]));
        assert!(matches!(
            block_on(chan.send_v20(request())),
            Err(ChannelError::UnexpectedReply(_))
        ));
    }

    #[test]
    fn truncated_reply_is_malformed() {
        let chan = HidppChannel::new(Scripted::new([vec![0x11, 0x01, 0x0a]]));
        assert!(matches!(
            block_on(chan.send_v20(request())),
            Err(ChannelError::Frame(CodecError::MalformedFrame { .. }))
        ));
    }

    #[test]
    fn short_requests_are_widened_for_long_only_transports() {
        let mut transport = Scripted::new([long_reply([0x11, 0x01, 0x0a, 0x21])]);
        transport.short = false;
        let chan = HidppChannel::new(transport);
        block_on(chan.send_v20(request())).unwrap();

        let sent = &chan.transport().sent.lock().unwrap()[0];
        assert_eq!(sent.len(), LONG_REPORT_LENGTH);
        assert_eq!(sent[..7], [0x11, 0x01, 0x0a, 0x21, 0x00, 0x01, 0x02]);
    }

    #[test]
    fn long_requests_need_long_report_support() {
        let mut transport = Scripted::new([]);
        transport.long = false;
        let chan = HidppChannel::new(transport);
        let long = v20::Message::new(v20::ReportKind::Long, request().header(), &[0; 16]).unwrap();
        assert!(matches!(
            block_on(chan.send_v20(long)),
            Err(ChannelError::MessageTypeNotSupported(v20::ReportKind::Long))
        ));
        assert!(chan.transport().sent.lock().unwrap().is_empty());
    }

    #[test]
    fn rotating_sw_id_cycles_through_non_zero_values() {
        let chan = HidppChannel::new(Scripted::new([]));
        chan.set_sw_id(U4::from_lo(0x0f));
        chan.set_rotating_sw_id(true);
        assert_eq!(chan.next_sw_id(), U4::from_lo(0x0f));
        assert_eq!(chan.next_sw_id(), U4::from_lo(0x01));
    }

    #[test]
    fn unsolicited_messages_reach_listeners() {
        let chan = HidppChannel::new(Scripted::new([]));
        let rx = chan.listen();
        chan.dispatch_unsolicited(&long_reply([0x11, 0x01, 0x0a, 0x00]))
            .unwrap();
        let event = rx.try_recv().unwrap();
        assert_eq!(event.header().feature_index, 0x0a);
    }
}
