//! Implements the HID++ transport using the `async-hid` crate.

use std::{io, time::Duration};

use anyhow::{Context, Result};
use async_hid::{AsyncHidRead, AsyncHidWrite, Device, DeviceInfo, DeviceReader, DeviceWriter, HidBackend};
use futures_lite::StreamExt;
use hidpp::{
    async_trait,
    channel::{LONG_REPORT_ID, SHORT_REPORT_ID, Transport},
    protocol::v20::ERROR_FEATURE_INDEX,
};
use itertools::Itertools;
use tokio::{sync::Mutex, time::timeout};
use tracing::{debug, trace};

pub const LOGITECH_VENDOR_ID: u16 = 0x046d;

/// The vendor-defined usage page of Logitech's HID++ collections.
const HIDPP_USAGE_PAGE: u16 = 0xff00;

/// The largest input report we expect to read.
const READ_BUFFER_LENGTH: usize = 64;

pub struct AsyncHidTransport {
    reader: Mutex<DeviceReader>,
    writer: Mutex<DeviceWriter>,
    info: DeviceInfo,
    timeout: Duration,
}

impl AsyncHidTransport {
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

#[async_trait]
impl Transport for AsyncHidTransport {
    type Error = io::Error;

    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, io::Error> {
        // Hold the reader while writing so no other exchange can take our reply.
        let mut reader = self.reader.lock().await;
        self.writer
            .lock()
            .await
            .write_output_report(request)
            .await
            .map_err(io::Error::other)?;

        let mut buf = [0u8; READ_BUFFER_LENGTH];
        loop {
            let len = timeout(self.timeout, reader.read_input_report(&mut buf))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "the device did not reply"))?
                .map_err(io::Error::other)?;

            let frame = &buf[..len];
            if answers(request, frame) {
                return Ok(frame.to_vec());
            }
            trace!(?frame, "skipping unrelated input report");
        }
    }
}

/// Whether `frame` is the reply or the error report to `request`.
fn answers(request: &[u8], frame: &[u8]) -> bool {
    if frame.len() < 5 || request.len() < 4 {
        return false;
    }
    if ![SHORT_REPORT_ID, LONG_REPORT_ID].contains(&frame[0]) || frame[1] != request[1] {
        return false;
    }

    frame[2..4] == request[2..4]
        || (frame[2] == ERROR_FEATURE_INDEX && frame[3..5] == request[2..4])
}

/// Opens every Logitech HID++ interface, optionally only those of one
/// product.
pub async fn open_hidpp(product_id: Option<u16>, reply_timeout: Duration) -> Result<Vec<AsyncHidTransport>> {
    let hid = HidBackend::default();
    let devices: Vec<Device> = hid
        .enumerate()
        .await
        .context("could not enumerate HID devices")?
        .collect::<Vec<Device>>()
        .await
        .into_iter()
        .unique_by(|x| x.id.clone())
        .collect();

    let mut transports = Vec::new();
    for dev in devices {
        let info = (*dev).clone();
        if info.vendor_id != LOGITECH_VENDOR_ID
            || info.usage_page != HIDPP_USAGE_PAGE
            || product_id.is_some_and(|pid| pid != info.product_id)
        {
            continue;
        }

        debug!(name = %info.name, product_id = info.product_id, "opening HID++ interface");
        let (reader, writer) = dev
            .open()
            .await
            .with_context(|| format!("could not open {}", info.name))?;
        transports.push(AsyncHidTransport {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            info,
            timeout: reply_timeout,
        });
    }

    Ok(transports)
}
