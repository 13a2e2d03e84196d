//! Sends feature requests over a [`HidppChannel`] and decodes the replies
//! through the version table of the feature.

use std::{error::Error, sync::Arc};

use thiserror::Error;
use tracing::debug;

use crate::{
    channel::{ChannelError, HidppChannel, Transport},
    feature::{
        DecodedMessage,
        FeatureError,
        MessageDescriptor,
        VersionedFeature,
        backlight::{Backlight, BacklightEffect, BacklightFunction},
        rgb_effects::{
            CapabilityState,
            GetOrSet,
            Persistence,
            PowerMode,
            RgbEffects,
            RgbEffectsFunction,
            TypeOfInfo,
            effects::Effect,
        },
    },
    layout::FieldValues,
    protocol::v20::{self, ReportKind},
};

/// Binds a version-specific feature accessor to a device on a channel.
pub struct FeatureClient<F: VersionedFeature, T: Transport> {
    /// The underlying HID++ channel.
    chan: Arc<HidppChannel<T>>,

    /// The index of the device to talk to.
    device_index: u8,

    /// The index of the feature in the device's feature table.
    feature_index: u8,

    feature: F,
}

impl<F: VersionedFeature, T: Transport> FeatureClient<F, T> {
    /// Creates a client for the negotiated `version` of the feature.
    pub fn new(
        chan: Arc<HidppChannel<T>>,
        device_index: u8,
        feature_index: u8,
        version: u8,
    ) -> Result<Self, FeatureError> {
        Ok(Self::with_accessor(chan, device_index, feature_index, F::create(version)?))
    }

    pub fn with_accessor(chan: Arc<HidppChannel<T>>, device_index: u8, feature_index: u8, feature: F) -> Self {
        Self {
            chan,
            device_index,
            feature_index,
            feature,
        }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    pub fn channel(&self) -> &Arc<HidppChannel<T>> {
        &self.chan
    }

    /// Encodes `values` as the request of `function_index`, sends it and
    /// decodes the reply as the matching response type.
    pub async fn call(
        &self,
        function_index: u8,
        values: &FieldValues,
    ) -> Result<DecodedMessage, ClientError<T::Error>> {
        let table = F::table();
        let version = self.feature.version();
        let request = table.get_request_type(version, function_index)?;
        let response = table.get_response_type(version, function_index)?;

        let msg = request.encode(self.device_index, self.feature_index, values)?;
        debug!(
            feature = F::NAME,
            version,
            request = request.name(),
            "calling feature function"
        );
        let reply = self.chan.send_v20(msg).await?;

        Ok(decode_reply(response, &reply)?)
    }

    /// Decodes an event of the feature, picking the event type by the
    /// function ID of the envelope.
    pub fn decode_event(&self, msg: &v20::Message) -> Result<DecodedMessage, FeatureError> {
        F::table().resolve_event(self.feature.version(), msg)
    }
}

/// Decodes a reply, accepting a long report where a short one was declared.
///
/// Transports without short report support receive short replies widened to
/// long reports; the declared payload is then at the start of the long one.
fn decode_reply(
    response: &'static MessageDescriptor,
    reply: &v20::Message,
) -> Result<DecodedMessage, FeatureError> {
    match (response.report, reply.kind()) {
        (ReportKind::Short, ReportKind::Long) => {
            let len = ReportKind::Short.payload_length();
            response.decode_bytes(reply.header(), &reply.payload()[..len])
        },
        _ => response.decode(reply),
    }
}

impl<T: Transport> FeatureClient<RgbEffects, T> {
    /// Calls `getInfo`.
    ///
    /// Version 0 has no `type_of_info` field, `type_of_info` is ignored
    /// there.
    pub async fn get_info(
        &self,
        rgb_cluster_index: u8,
        rgb_cluster_effect_index: u8,
        type_of_info: TypeOfInfo,
    ) -> Result<DecodedMessage, ClientError<T::Error>> {
        let mut values = FieldValues::new()
            .with("rgb_cluster_index", rgb_cluster_index)
            .with("rgb_cluster_effect_index", rgb_cluster_effect_index);
        if self.feature.version() > 0 {
            values.set("type_of_info", u8::from(type_of_info));
        }

        self.call(RgbEffectsFunction::GetInfo.into(), &values).await
    }

    /// Calls `setRgbClusterEffect` with the parameters of `effect`.
    ///
    /// `rgb_cluster_effect_index` is the position of the effect in the
    /// cluster's effect list as reported by `getInfo`, not the effect ID. The
    /// effect must be part of the effect set of the client's version.
    /// Version 0 has no power mode, `power_mode` is ignored there.
    pub async fn set_rgb_cluster_effect(
        &self,
        rgb_cluster_index: u8,
        rgb_cluster_effect_index: u8,
        effect: &Effect,
        persistence: Persistence,
        power_mode: PowerMode,
    ) -> Result<(), ClientError<T::Error>> {
        let family = self.feature.require_effect_family()?;
        let kind = effect.kind();
        if !family.supports(kind) {
            return Err(FeatureError::UnsupportedEffect { family, id: kind.id() }.into());
        }

        let mut values = FieldValues::new()
            .with("rgb_cluster_index", rgb_cluster_index)
            .with("rgb_cluster_effect_index", rgb_cluster_effect_index)
            .with("persistence", u8::from(persistence));
        for (i, param) in effect.parameters().into_iter().enumerate() {
            values.set(format!("param_{}", i + 1), param);
        }
        if self.feature.version() > 0 {
            values.set("power_mode", u8::from(power_mode));
        }

        self.call(RgbEffectsFunction::SetRgbClusterEffect.into(), &values)
            .await?;
        Ok(())
    }

    /// Calls `manageNvConfig`.
    ///
    /// `params` fill `param_1` onwards; parameters the version declares but
    /// `params` does not cover are sent as zero. Versions 0 to 2 have two
    /// parameters, versions 3 and 4 have six.
    pub async fn manage_nv_config(
        &self,
        get_or_set: GetOrSet,
        nv_capabilities: u16,
        capability_state: CapabilityState,
        params: &[u8],
    ) -> Result<DecodedMessage, ClientError<T::Error>> {
        let function = u8::from(RgbEffectsFunction::ManageNvConfig);
        let request = RgbEffects::table().get_request_type(self.feature.version(), function)?;

        let mut values = FieldValues::new()
            .with("get_or_set", u8::from(get_or_set))
            .with("nv_capabilities", nv_capabilities)
            .with("capability_state", u8::from(capability_state));
        for i in 1.. {
            let name = format!("param_{i}");
            match params.get(i - 1) {
                Some(param) => values.set(name, *param),
                None if request.layout.field(&name).is_some() => values.set(name, 0u8),
                None => break,
            }
        }

        self.call(function, &values).await
    }

    /// Calls `manageRgbPowerMode`. `rgb_power_mode` is only sent for
    /// [`GetOrSet::Set`].
    pub async fn manage_rgb_power_mode(
        &self,
        get_or_set: GetOrSet,
        rgb_power_mode: u8,
    ) -> Result<DecodedMessage, ClientError<T::Error>> {
        let power_mode = match get_or_set {
            GetOrSet::Get => 0,
            GetOrSet::Set => rgb_power_mode,
        };
        let values = FieldValues::new()
            .with("get_or_set", u8::from(get_or_set))
            .with("rgb_power_mode", power_mode);

        self.call(RgbEffectsFunction::ManageRgbPowerMode.into(), &values)
            .await
    }

    /// Calls `shutdown`, which only exists from version 4 on.
    pub async fn shutdown(&self) -> Result<(), ClientError<T::Error>> {
        self.call(RgbEffectsFunction::Shutdown.into(), &FieldValues::new())
            .await?;
        Ok(())
    }
}

impl<T: Transport> FeatureClient<Backlight, T> {
    pub async fn get_backlight_config(&self) -> Result<DecodedMessage, ClientError<T::Error>> {
        self.call(BacklightFunction::GetBacklightConfig.into(), &FieldValues::new())
            .await
    }

    pub async fn get_backlight_info(&self) -> Result<DecodedMessage, ClientError<T::Error>> {
        self.call(BacklightFunction::GetBacklightInfo.into(), &FieldValues::new())
            .await
    }

    /// Calls `setBacklightEffect`, which only exists from version 2 on.
    pub async fn set_backlight_effect(&self, effect: BacklightEffect) -> Result<(), ClientError<T::Error>> {
        let values = FieldValues::new().with("backlight_effect", u8::from(effect));
        self.call(BacklightFunction::SetBacklightEffect.into(), &values)
            .await?;
        Ok(())
    }
}

/// Represents an error that occurred while calling a feature function.
#[derive(Debug, Error)]
pub enum ClientError<E: Error> {
    /// Indicates that the request could not be resolved, encoded, or its
    /// reply decoded.
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// Indicates that the exchange itself failed.
    #[error(transparent)]
    Channel(#[from] ChannelError<E>),
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, convert::Infallible, sync::Mutex};

    use async_trait::async_trait;
    use futures::executor::block_on;

    use super::*;
    use crate::{
        channel::LONG_REPORT_LENGTH,
        feature::rgb_effects::effects::{EffectFamily, EffectKind, Rgb, WaveDirection},
        protocol::v20::ErrorCode,
    };

    /// Echoes the request header into canned reply payloads. Payloads of a
    /// full long report length are replied verbatim.
    struct Device {
        payloads: Mutex<VecDeque<Vec<u8>>>,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl Device {
        fn new(payloads: impl IntoIterator<Item = Vec<u8>>) -> Arc<HidppChannel<Self>> {
            Arc::new(HidppChannel::new(Self {
                payloads: Mutex::new(payloads.into_iter().collect()),
                sent: Mutex::new(Vec::new()),
            }))
        }
    }

    #[async_trait]
    impl Transport for Device {
        type Error = Infallible;

        async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, Infallible> {
            self.sent.lock().unwrap().push(request.to_vec());
            let payload = self.payloads.lock().unwrap().pop_front().unwrap_or_default();
            if payload.len() == LONG_REPORT_LENGTH {
                return Ok(payload);
            }

            let mut reply = vec![0u8; LONG_REPORT_LENGTH];
            reply[0] = 0x11;
            reply[1..4].copy_from_slice(&request[1..4]);
            reply[4..4 + payload.len()].copy_from_slice(&payload);
            Ok(reply)
        }
    }

    fn sent(chan: &HidppChannel<Device>) -> Vec<Vec<u8>> {
        chan.transport().sent.lock().unwrap().clone()
    }

    #[test]
    fn set_rgb_cluster_effect_sends_the_cluster_effect_index() {
        let chan = Device::new([vec![]]);
        let client = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 2).unwrap();
        let effect = Effect::ColorWave {
            start: Rgb::new(0x11, 0x22, 0x33),
            stop: Rgb::new(0x44, 0x55, 0x66),
            period: 0xabcd,
            direction: WaveDirection::Vertical,
            intensity: 0x77,
        };

        block_on(client.set_rgb_cluster_effect(0x00, 0x03, &effect, Persistence::Volatile, PowerMode::PowerSave))
            .unwrap();

        let frame = &sent(&chan)[0];
        assert_eq!(frame[..4], [0x11, 0x01, 0x0b, 0x11]);
        assert_eq!(frame[4..6], [0x00, 0x03]);
        assert_eq!(frame[6..16], effect.encode()[1..]);
        assert_eq!(frame[16], 0b0000_0101);
    }

    #[test]
    fn slot_six_effect_ids_stay_out_of_the_params() {
        let chan = Device::new([vec![]]);
        let client = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 2).unwrap();
        let effect = Effect::ColorDecomposition {
            period: 0x0102,
            brightness: 0x03,
        };

        block_on(client.set_rgb_cluster_effect(0x01, 0x05, &effect, Persistence::Default, PowerMode::FullPower))
            .unwrap();

        let frame = &sent(&chan)[0];
        assert_eq!(frame[4..6], [0x01, 0x05]);
        assert_eq!(
            frame[6..16],
            [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x00]
        );
    }

    #[test]
    fn effects_outside_the_family_are_not_sent() {
        let chan = Device::new([]);
        let client = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 4).unwrap();
        let effect = Effect::random(EffectKind::SmoothWave, 7);

        let err = block_on(client.set_rgb_cluster_effect(0, 0, &effect, Persistence::Default, PowerMode::FullPower))
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Feature(FeatureError::UnsupportedEffect {
                family: EffectFamily::V4,
                ..
            })
        ));
        assert!(sent(&chan).is_empty());
    }

    #[test]
    fn get_info_v0_uses_a_short_request() {
        let chan = Device::new([vec![0xff, 0xff, 0x04, 0x00, 0x7f, 0x00, 0x00]]);
        let client = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 0).unwrap();

        let info = block_on(client.get_info(0xff, 0xff, TypeOfInfo::General)).unwrap();
        assert_eq!(sent(&chan)[0], vec![0x10, 0x01, 0x0b, 0x01, 0xff, 0xff, 0x00]);

        let device = info.view(client.feature().info_about_device()).unwrap();
        assert_eq!(device.int("rgb_cluster_count"), Some(4));
        assert_eq!(device.int("nv_capabilities"), Some(0x007f));
    }

    #[test]
    fn manage_nv_config_fills_the_version_params() {
        let chan = Device::new([vec![], vec![]]);
        let v2 = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 2).unwrap();
        block_on(v2.manage_nv_config(GetOrSet::Set, 0x0001, CapabilityState::Enabled, &[0x0a])).unwrap();
        assert_eq!(sent(&chan)[0][4..10], [0x01, 0x00, 0x01, 0x01, 0x0a, 0x00]);

        let err = block_on(v2.manage_nv_config(GetOrSet::Set, 0x0001, CapabilityState::Enabled, &[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Feature(FeatureError::Codec(_))));

        let v3 = FeatureClient::<RgbEffects, _>::new(chan.clone(), 0x01, 0x0b, 3).unwrap();
        let reply = block_on(v3.manage_nv_config(GetOrSet::Get, 0x0040, CapabilityState::NoChange, &[]))
            .unwrap();
        assert_eq!(reply.descriptor.name(), "ManageNvConfigResponseV3ToV4");
        assert_eq!(reply.int("param_6"), Some(0));
    }

    #[test]
    fn shutdown_is_unsupported_before_version_four() {
        let chan = Device::new([]);
        let client = FeatureClient::<RgbEffects, _>::new(chan, 0x01, 0x0b, 3).unwrap();
        assert!(matches!(
            block_on(client.shutdown()),
            Err(ClientError::Feature(FeatureError::UnsupportedOperation { index: 9, .. }))
        ));
    }

    #[test]
    fn device_errors_reach_the_caller() {
        let mut error = vec![0u8; LONG_REPORT_LENGTH];
        error[..6].copy_from_slice(&[0x11, 0x01, 0xff, 0x0b, 0x81, 0x02]);
        let chan = Device::new([error]);
        let client = FeatureClient::<RgbEffects, _>::new(chan, 0x01, 0x0b, 4).unwrap();

        assert!(matches!(
            block_on(client.manage_rgb_power_mode(GetOrSet::Set, 1)),
            Err(ClientError::Channel(ChannelError::Device(ErrorCode::InvalidArgument)))
        ));
    }

    #[test]
    fn short_responses_are_read_from_long_replies() {
        let chan = Device::new([vec![0x05, 0x02, 0x04]]);
        let client = FeatureClient::<Backlight, _>::new(chan, 0x01, 0x0c, 1).unwrap();

        let info = block_on(client.get_backlight_info()).unwrap();
        assert_eq!(info.descriptor.name(), "GetBacklightInfoResponseV1");
        assert_eq!(info.int("number_of_level"), Some(5));
        assert_eq!(info.int("backlight_status"), Some(4));
    }

    #[test]
    fn events_are_resolved_by_function_id() {
        let chan = Device::new([]);
        let client = FeatureClient::<RgbEffects, _>::new(chan, 0x01, 0x0b, 4).unwrap();
        let mut payload = [0u8; 16];
        payload[0] = 0x01;
        payload[1] = 0x04;
        let header = v20::MessageHeader {
            device_index: 0x01,
            feature_index: 0x0b,
            function_id: crate::nibble::U4::from_lo(2),
            software_id: crate::nibble::U4::from_lo(0),
        };
        let event = v20::Message::Long(header, payload);

        let decoded = client.decode_event(&event).unwrap();
        assert_eq!(decoded.descriptor.name(), "RgbClusterChangedEvent");
        assert_eq!(decoded.int("rgb_cluster_effect_index"), Some(0x04));
    }
}
