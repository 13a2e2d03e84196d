use anyhow::{Context, Result};
use clap::Args;
use hidpp::{
    feature::registry::KnownFeature,
    nibble::U4,
    protocol::v20::{self, MessageHeader},
};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::debug;

use super::{
    Assignment,
    Cli,
    field_values,
    hex,
    parse_assignment,
    parse_feature,
    parse_hex,
    parse_u8,
    render_decoded,
};

/// Encode a function request into a raw HID++ frame.
#[derive(Args)]
pub struct EncodeCommand {
    /// The feature name or ID
    #[arg(value_parser = parse_feature)]
    feature: (u16, KnownFeature),

    version: u8,

    /// The function index
    index: u8,

    /// Field values as `name=value`
    #[arg(value_parser = parse_assignment)]
    fields: Vec<Assignment>,

    #[arg(long, value_parser = parse_u8, default_value = "0xff")]
    device_index: u8,

    /// The index of the feature in the device's feature table
    #[arg(long, value_parser = parse_u8, default_value = "0")]
    feature_index: u8,

    #[arg(long, value_parser = parse_u8, default_value = "1")]
    sw_id: u8,
}

impl EncodeCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let (_, feat) = self.feature;
        let request = feat.table.get_request_type(self.version, self.index)?;
        let msg = request
            .encode(self.device_index, self.feature_index, &field_values(&self.fields))
            .with_context(|| format!("could not encode {}", request.name()))?;

        let header = MessageHeader {
            software_id: U4::from_lo(self.sw_id),
            ..msg.header()
        };
        let frame = v20::Message::new(msg.kind(), header, msg.payload())?.to_bytes();
        debug!(request = request.name(), ?frame, "encoded request");

        if root.json {
            println!("{}", json!({ "request": request.name(), "frame": frame }));
        } else {
            anstream::println!("{} {}", request.name().bold(), hex(&frame));
        }

        Ok(())
    }
}

/// Decode a raw HID++ frame as a response or event of a feature version.
#[derive(Args)]
pub struct DecodeCommand {
    /// The feature name or ID
    #[arg(value_parser = parse_feature)]
    feature: (u16, KnownFeature),

    version: u8,

    /// The frame in hex, e.g. `11 01 0b 10 00 ...`
    #[arg(required = true, num_args = 1..)]
    frame: Vec<String>,

    /// Decode the frame as an event instead of a response
    #[arg(long)]
    event: bool,
}

impl DecodeCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let (_, feat) = self.feature;
        let raw = parse_hex(&self.frame.join(" ")).map_err(anyhow::Error::msg)?;
        let msg = v20::Message::read_raw(&raw)?;

        if let Some(error) = msg.as_error() {
            if root.json {
                println!(
                    "{}",
                    json!({
                        "error": format!("{:?}", error.code),
                        "feature_index": error.feature_index,
                        "function_id": error.function_id.value(),
                    })
                );
            } else {
                anstream::println!(
                    "{} {:?} for feature index {:#04x}, function {}",
                    "error report".red().bold(),
                    error.code,
                    error.feature_index,
                    error.function_id.value()
                );
            }
            return Ok(());
        }

        let decoded = if self.event {
            feat.table.resolve_event(self.version, &msg)?
        } else {
            feat.table.resolve_response(self.version, &msg)?
        };

        if root.json {
            println!(
                "{}",
                json!({
                    "message": decoded.descriptor.name(),
                    "kind": decoded.descriptor.kind.to_string(),
                    "device_index": decoded.header.device_index,
                    "feature_index": decoded.header.feature_index,
                    "software_id": decoded.header.software_id.value(),
                    "values": decoded.values,
                })
            );
        } else {
            anstream::print!("{}", render_decoded(&decoded));
        }

        Ok(())
    }
}
