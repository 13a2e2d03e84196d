//! Implements the `RgbEffects` feature (ID `0x8071`) that controls the RGB
//! lighting clusters of gaming devices.
//!
//! The feature exists in versions 0 to 4. Every version is described in full
//! by [`model::RGB_EFFECTS_TABLE`]; [`RgbEffects`] binds the message types of
//! one version so calling code does not have to branch on the version itself.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    feature::{FeatureError, FunctionEntry, MessageDescriptor, VersionEntry, VersionTable, VersionedFeature},
    layout::Layout,
};

pub mod effects;
pub mod messages;
pub mod model;

use effects::{EffectFamily, EffectKind};

pub const FEATURE_ID: u16 = 0x8071;

/// The functions of the feature by index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum RgbEffectsFunction {
    GetInfo = 0,
    SetRgbClusterEffect = 1,
    SetMultiLedRgbClusterPattern = 2,
    ManageNvConfig = 3,
    ManageRgbLedBinInfo = 4,
    ManageSwControl = 5,
    SetEffectSyncCorrection = 6,
    ManageRgbPowerModeConfig = 7,
    ManageRgbPowerMode = 8,
    Shutdown = 9,
}

/// The events of the feature by index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[non_exhaustive]
#[repr(u8)]
pub enum RgbEffectsEvent {
    EffectSync = 0,
    UserActivity = 1,
    RgbClusterChanged = 2,
}

/// The direction of the `Manage*` functions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum GetOrSet {
    Get = 0,
    Set = 1,
}

/// The requested state of an NV capability.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum CapabilityState {
    NoChange = 0,
    Enabled = 1,
    Disabled = 2,
    EnabledDuringTimeout = 4,
}

/// Whether an effect set with `setRgbClusterEffect` survives a power cycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum Persistence {
    /// Both RAM and EEPROM.
    #[default]
    Default = 0,
    /// RAM only.
    Volatile = 1,
    /// EEPROM only.
    NonVolatile = 2,
}

/// The power mode an effect set with `setRgbClusterEffect` applies to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum PowerMode {
    #[default]
    FullPower = 0,
    PowerSave = 1,
}

/// The `type_of_info` selector of `getInfo` from version 1 on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum TypeOfInfo {
    #[default]
    General = 0,
    CustomOnboardStored = 1,
}

/// The `rgb_cluster_index` value addressing the device itself in `getInfo`.
pub const DEVICE_CLUSTER_INDEX: u8 = 0xff;

/// The `rgb_cluster_effect_index` value asking for cluster rather than
/// effect information in `getInfo`.
pub const CLUSTER_EFFECT_INDEX: u8 = 0xff;

/// Bits of the `nv_capabilities` field.
pub mod nv_capabilities {
    pub const BOOT_UP_EFFECT: u16 = 0x0001;
    pub const DEMO: u16 = 0x0002;
    pub const USER_DEMO_MODE: u16 = 0x0004;
    pub const EVENTS_DISPLAY: u16 = 0x0008;
    pub const ACTIVE_DIMMING: u16 = 0x0010;
    pub const RAMP_DOWN_TO_OFF: u16 = 0x0020;
    pub const SHUTDOWN_EFFECT: u16 = 0x0040;
}

/// Binds the message types of one `RgbEffects` version.
///
/// Functions and events the version does not have are `None`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RgbEffects {
    version: u8,
    entry: &'static VersionEntry,

    pub get_info: Option<FunctionEntry>,
    pub set_rgb_cluster_effect: Option<FunctionEntry>,
    pub set_multi_led_rgb_cluster_pattern: Option<FunctionEntry>,
    pub manage_nv_config: Option<FunctionEntry>,
    pub manage_rgb_led_bin_info: Option<FunctionEntry>,
    pub manage_sw_control: Option<FunctionEntry>,
    pub set_effect_sync_correction: Option<FunctionEntry>,
    pub manage_rgb_power_mode_config: Option<FunctionEntry>,
    pub manage_rgb_power_mode: Option<FunctionEntry>,
    pub shutdown: Option<FunctionEntry>,

    pub effect_sync_event: Option<&'static MessageDescriptor>,
    pub user_activity_event: Option<&'static MessageDescriptor>,
    pub rgb_cluster_changed_event: Option<&'static MessageDescriptor>,
}

impl RgbEffects {
    /// The effect set the version supports.
    pub fn effect_family(&self) -> Option<EffectFamily> {
        EffectFamily::from_version(self.version)
    }

    /// The effects the version supports, in effect ID order.
    pub fn effect_dictionary(&self) -> &'static [EffectKind] {
        match self.effect_family() {
            Some(family) => family.effects(),
            None => &[],
        }
    }

    /// Fails with [`FeatureError::UnknownVersion`] for versions without an
    /// effect set.
    pub fn require_effect_family(&self) -> Result<EffectFamily, FeatureError> {
        self.effect_family().ok_or(FeatureError::UnknownVersion {
            feature: Self::NAME,
            version: self.version,
        })
    }

    /// The layout to read a `getInfo` response about the whole device with.
    pub fn info_about_device(&self) -> &'static Layout {
        if self.version < 2 {
            &messages::INFO_ABOUT_DEVICE_V0_TO_V1
        } else {
            &messages::INFO_ABOUT_DEVICE_V2_TO_V4
        }
    }

    /// The layout to read a `getInfo` response about one cluster with.
    pub fn info_about_rgb_cluster(&self) -> &'static Layout {
        if self.version == 0 {
            &messages::INFO_ABOUT_RGB_CLUSTER_V0
        } else {
            &messages::INFO_ABOUT_RGB_CLUSTER_V1_TO_V4
        }
    }

    fn operation(entry: &'static VersionEntry, function: RgbEffectsFunction) -> Option<FunctionEntry> {
        entry
            .functions
            .get(&u8::from(function))
            .copied()
    }

    fn event(entry: &'static VersionEntry, event: RgbEffectsEvent) -> Option<&'static MessageDescriptor> {
        entry.events.get(&u8::from(event)).copied()
    }
}

impl VersionedFeature for RgbEffects {
    const ID: u16 = FEATURE_ID;
    const NAME: &'static str = "RgbEffects";

    fn table() -> &'static VersionTable {
        &model::RGB_EFFECTS_TABLE
    }

    fn from_entry(version: u8, entry: &'static VersionEntry) -> Self {
        use RgbEffectsFunction as F;

        Self {
            version,
            entry,
            get_info: Self::operation(entry, F::GetInfo),
            set_rgb_cluster_effect: Self::operation(entry, F::SetRgbClusterEffect),
            set_multi_led_rgb_cluster_pattern: Self::operation(entry, F::SetMultiLedRgbClusterPattern),
            manage_nv_config: Self::operation(entry, F::ManageNvConfig),
            manage_rgb_led_bin_info: Self::operation(entry, F::ManageRgbLedBinInfo),
            manage_sw_control: Self::operation(entry, F::ManageSwControl),
            set_effect_sync_correction: Self::operation(entry, F::SetEffectSyncCorrection),
            manage_rgb_power_mode_config: Self::operation(entry, F::ManageRgbPowerModeConfig),
            manage_rgb_power_mode: Self::operation(entry, F::ManageRgbPowerMode),
            shutdown: Self::operation(entry, F::Shutdown),
            effect_sync_event: Self::event(entry, RgbEffectsEvent::EffectSync),
            user_activity_event: Self::event(entry, RgbEffectsEvent::UserActivity),
            rgb_cluster_changed_event: Self::event(entry, RgbEffectsEvent::RgbClusterChanged),
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

    #[test]
    fn accessor_binds_only_supported_operations() {
        let v3 = RgbEffects::create(3).unwrap();
        assert!(v3.shutdown.is_none());
        assert!(v3.rgb_cluster_changed_event.is_none());
        assert_eq!(v3.max_function_index(), 8);
        assert_eq!(
            v3.manage_nv_config.map(|op| op.request.name()),
            Some("ManageNvConfigV3ToV4")
        );

        let v4 = RgbEffects::create(4).unwrap();
        assert_eq!(v4.shutdown.map(|op| op.request.name()), Some("Shutdown"));
        assert_eq!(
            v4.rgb_cluster_changed_event.map(MessageDescriptor::name),
            Some("RgbClusterChangedEvent")
        );
        assert_eq!(v4.max_function_index(), 9);
        assert_eq!(v4.main().name, "RgbEffectsV4");
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert_eq!(
            RgbEffects::create(5),
            Err(FeatureError::UnknownVersion {
                feature: "RgbEffects",
                version: 5
            })
        );
    }

    #[test]
    fn effect_dictionary_follows_the_version() {
        let v1 = RgbEffects::create(1).unwrap();
        assert_eq!(v1.effect_dictionary().len(), 13);
        assert!(!v1.effect_dictionary().contains(&EffectKind::KittLighting));

        let v4 = RgbEffects::create(4).unwrap();
        assert!(v4.effect_dictionary().contains(&EffectKind::FrameBasedSignatureEffectActive));
        assert!(!v4.effect_dictionary().contains(&EffectKind::SmoothWave));
    }

    #[test]
    fn info_views_follow_the_version() {
        assert_eq!(RgbEffects::create(1).unwrap().info_about_device().name(), "InfoAboutDeviceV0ToV1");
        assert_eq!(RgbEffects::create(2).unwrap().info_about_device().name(), "InfoAboutDeviceV2ToV4");
        assert_eq!(
            RgbEffects::create(0).unwrap().info_about_rgb_cluster().name(),
            "InfoAboutRgbClusterV0"
        );
    }
}
