//! Implements the `Backlight` feature (ID `0x1982`) of keyboards with a
//! dimmable backlight.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::feature::{FunctionEntry, MessageDescriptor, VersionEntry, VersionTable, VersionedFeature};

pub mod messages;
pub mod model;

pub const FEATURE_ID: u16 = 0x1982;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum BacklightFunction {
    GetBacklightConfig = 0,
    SetBacklightConfig = 1,
    GetBacklightInfo = 2,
    SetBacklightEffect = 3,
}

/// The `configuration` field of `get/setBacklightConfig`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum Configuration {
    Disable = 0,
    Enable = 1,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum BacklightEffect {
    Static = 0,
    None = 1,
    BreathingLight = 2,
    Contrast = 3,
    Reaction = 4,
    Random = 5,
    Waves = 6,

    /// Keeps the effect currently running.
    Current = 0xff,
}

/// The `backlight_status` field of `getBacklightInfo` and the info event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum BacklightStatus {
    DisabledBySw = 0,
    DisabledByCriticalBattery = 1,
    AlsAutomaticMode = 2,
    AlsModeSaturated = 3,
    ManualMode = 4,
    PermanentManualMode = 5,
}

/// Bits of the `options` and `supported_options` fields.
pub mod options {
    pub const WOW: u16 = 0x01;
    pub const CROWN: u16 = 0x02;
    pub const PWR_SAVE: u16 = 0x04;
    pub const AUTOMATIC_MODE: u16 = 0x08;
    pub const TEMPORARY_MANUAL_MODE: u16 = 0x10;
    pub const PERMANENT_MANUAL_MODE: u16 = 0x18;
}

/// Binds the message types of one `Backlight` version.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Backlight {
    version: u8,
    entry: &'static VersionEntry,

    pub get_backlight_config: Option<FunctionEntry>,
    pub set_backlight_config: Option<FunctionEntry>,
    pub get_backlight_info: Option<FunctionEntry>,
    pub set_backlight_effect: Option<FunctionEntry>,

    pub backlight_info_event: Option<&'static MessageDescriptor>,
}

impl VersionedFeature for Backlight {
    const ID: u16 = FEATURE_ID;
    const NAME: &'static str = "Backlight";

    fn table() -> &'static VersionTable {
        &model::BACKLIGHT_TABLE
    }

    fn from_entry(version: u8, entry: &'static VersionEntry) -> Self {
        let function = |f: BacklightFunction| entry.functions.get(&u8::from(f)).copied();

        Self {
            version,
            entry,
            get_backlight_config: function(BacklightFunction::GetBacklightConfig),
            set_backlight_config: function(BacklightFunction::SetBacklightConfig),
            get_backlight_info: function(BacklightFunction::GetBacklightInfo),
            set_backlight_effect: function(BacklightFunction::SetBacklightEffect),
            backlight_info_event: entry.events.get(&0).copied(),
        }
    }

    fn version(&self) -> u8 {
        self.version
    }

    fn entry(&self) -> &'static VersionEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        feature::{FeatureError, MessageKind},
        layout::FieldValues,
        protocol::v20::ReportKind,
    };

    #[test]
    fn version_zero_is_not_declared() {
        assert_eq!(
            Backlight::create(0),
            Err(FeatureError::UnknownVersion {
                feature: "Backlight",
                version: 0
            })
        );
    }

    #[test]
    fn first_version_has_no_effect_function() {
        let v1 = Backlight::create(1).unwrap();
        assert!(v1.set_backlight_effect.is_none());
        assert_eq!(v1.max_function_index(), 2);
        assert_eq!(
            model::BACKLIGHT_TABLE.get_request_type(1, 3),
            Err(FeatureError::UnsupportedOperation {
                feature: "Backlight",
                version: 1,
                kind: MessageKind::Request,
                index: 3,
            })
        );

        let v2 = Backlight::create(2).unwrap();
        assert_eq!(v2.max_function_index(), 3);
        assert_eq!(v2.set_backlight_effect.map(|op| op.request.name()), Some("SetBacklightEffect"));
    }

    #[test]
    fn info_moves_to_long_reports_after_version_one() {
        let v1 = Backlight::create(1).unwrap();
        let v3 = Backlight::create(3).unwrap();
        assert_eq!(v1.get_backlight_info.unwrap().response.report, ReportKind::Short);
        assert_eq!(v3.get_backlight_info.unwrap().response.report, ReportKind::Long);
        assert_eq!(v1.backlight_info_event.unwrap().name(), "BacklightInfoEventV1");
        assert_eq!(v3.backlight_info_event.unwrap().name(), "BacklightInfoEventV2ToV4");
    }

    #[test]
    fn set_config_v3_places_durations_after_the_level() {
        let request = Backlight::create(3).unwrap().set_backlight_config.unwrap().request;
        let values = FieldValues::new()
            .with("configuration", u8::from(Configuration::Enable))
            .with("options", options::PWR_SAVE)
            .with("backlight_effect", u8::from(BacklightEffect::Current))
            .with("current_backlight_level", 3u8)
            .with("curr_duration_hands_out", 0x0102u16)
            .with("curr_duration_hands_in", 0x0304u16)
            .with("curr_duration_powered", 0x0506u16);

        let payload = request.encode_payload(&values).unwrap();
        assert_eq!(payload.len(), 16);
        assert_eq!(&payload[..10], &[0x01, 0x04, 0xff, 0x03, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert!(payload[10..].iter().all(|b| *b == 0));
    }
}
