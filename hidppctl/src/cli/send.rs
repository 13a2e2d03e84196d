use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::Args;
use hidpp::{
    channel::{HidppChannel, Transport},
    feature::{
        DecodedMessage,
        VersionedFeature,
        backlight::{self, Backlight},
        client::FeatureClient,
        registry::KnownFeature,
        rgb_effects::{self, RgbEffects},
    },
    layout::FieldValues,
};
use serde_json::json;
use tracing::{info, warn};

use crate::async_hid_impl::open_hidpp;

use super::{Assignment, Cli, field_values, parse_assignment, parse_feature, parse_u8, parse_u16, render_decoded};

/// Send a function request to a connected device and decode the reply.
#[derive(Args)]
pub struct SendCommand {
    /// The feature name or ID
    #[arg(value_parser = parse_feature)]
    feature: (u16, KnownFeature),

    /// The feature version the device reports
    version: u8,

    /// The function index
    index: u8,

    /// Field values as `name=value`
    #[arg(value_parser = parse_assignment)]
    fields: Vec<Assignment>,

    /// Only use the device with this USB product ID
    #[arg(long, value_parser = parse_u16)]
    product_id: Option<u16>,

    #[arg(long, value_parser = parse_u8, default_value = "0xff")]
    device_index: u8,

    /// The index of the feature in the device's feature table
    #[arg(long, value_parser = parse_u8)]
    feature_index: u8,

    /// How long to wait for the reply
    #[arg(long, default_value = "1000")]
    timeout_ms: u64,
}

impl SendCommand {
    pub async fn execute(&self, root: &Cli) -> Result<()> {
        let mut transports = open_hidpp(self.product_id, Duration::from_millis(self.timeout_ms)).await?;
        if transports.is_empty() {
            bail!("no HID++ device found");
        }
        if transports.len() > 1 {
            warn!(count = transports.len(), "several HID++ interfaces found, using the first");
        }
        let transport = transports.swap_remove(0);
        info!(name = %transport.info().name, "using HID++ interface");

        let chan = Arc::new(HidppChannel::new(transport));
        let values = field_values(&self.fields);
        let decoded = match self.feature.0 {
            rgb_effects::FEATURE_ID => self.call::<RgbEffects, _>(chan, &values).await?,
            backlight::FEATURE_ID => self.call::<Backlight, _>(chan, &values).await?,
            id => bail!("feature {id:#06x} cannot be sent to a device"),
        };

        if root.json {
            println!(
                "{}",
                json!({
                    "message": decoded.descriptor.name(),
                    "software_id": decoded.header.software_id.value(),
                    "values": decoded.values,
                })
            );
        } else {
            anstream::print!("{}", render_decoded(&decoded));
        }

        Ok(())
    }

    async fn call<F: VersionedFeature, T: Transport>(
        &self,
        chan: Arc<HidppChannel<T>>,
        values: &FieldValues,
    ) -> Result<DecodedMessage> {
        let client = FeatureClient::<F, T>::new(chan, self.device_index, self.feature_index, self.version)?;
        client
            .call(self.index, values)
            .await
            .with_context(|| format!("{} function {} failed", F::NAME, self.index))
    }
}
