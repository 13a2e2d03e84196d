//! Payload layouts and message descriptors of the `RgbEffects` feature.
//!
//! Related layouts are derived from each other the way the firmware
//! documentation introduces them: a shared head, then per-version growth at
//! the tail that shrinks the padding or reserved field so the report size
//! stays the same.

use lazy_static::lazy_static;

use super::FEATURE_ID;
use crate::{
    bitfield::BitField,
    feature::{MessageDescriptor, MessageKind},
    layout::{Layout, LayoutBuilder, optional_fields, required_fields},
    protocol::v20::ReportKind,
};

const ALL_VERSIONS: &[u8] = &[0, 1, 2, 3, 4];

const PARAMS_1_TO_10: &[&str] = &[
    "param_1", "param_2", "param_3", "param_4", "param_5", "param_6", "param_7", "param_8",
    "param_9", "param_10",
];
const PARAMS_1_TO_13: &[&str] = &[
    "param_1", "param_2", "param_3", "param_4", "param_5", "param_6", "param_7", "param_8",
    "param_9", "param_10", "param_11", "param_12", "param_13",
];
const PARAMS_1_TO_14: &[&str] = &[
    "param_1", "param_2", "param_3", "param_4", "param_5", "param_6", "param_7", "param_8",
    "param_9", "param_10", "param_11", "param_12", "param_13", "param_14",
];

fn request(index: u8, versions: &'static [u8], report: ReportKind, layout: &Layout) -> MessageDescriptor {
    MessageDescriptor::new(FEATURE_ID, MessageKind::Request, index, versions, report, layout.clone())
}

fn response(
    index: u8,
    versions: &'static [u8],
    layout: Layout,
    request_list: &'static [&'static str],
) -> MessageDescriptor {
    MessageDescriptor::new(FEATURE_ID, MessageKind::Response, index, versions, ReportKind::Long, layout)
        .answering(request_list)
}

fn event(index: u8, versions: &'static [u8], layout: Layout) -> MessageDescriptor {
    MessageDescriptor::new(FEATURE_ID, MessageKind::Event, index, versions, ReportKind::Long, layout)
}

fn long_empty(name: &'static str) -> Layout {
    LayoutBuilder::new(name).append(BitField::padding(128)).build()
}

/// A copy of `parent` under another name, for responses echoing a request.
fn renamed(name: &'static str, parent: &Layout) -> Layout {
    LayoutBuilder::derive(name, parent).build()
}

lazy_static! {
    static ref CLUSTER_INFO_HEAD: Layout = LayoutBuilder::new("RgbClusterInfoHead")
        .append(BitField::required("rgb_cluster_index", 8))
        .append(BitField::required("rgb_cluster_effect_index", 8))
        .build();

    static ref EFFECT_INFO_HEAD: Layout = LayoutBuilder::derive("EffectInfoHead", &CLUSTER_INFO_HEAD)
        .append(BitField::required("type_of_info", 8))
        .build();

    static ref CUSTOM_ONBOARD_HEAD: Layout =
        LayoutBuilder::derive("CustomOnboardStoredEffectInfoHead", &EFFECT_INFO_HEAD)
            .append(BitField::required("slot", 8))
            .append(BitField::required("slot_info_type", 8))
            .build();

    static ref MANAGE_HEAD: Layout = LayoutBuilder::new("ManageHead")
        .append(BitField::required("get_or_set", 8))
        .build();

    static ref LED_BIN_HEAD: Layout = LayoutBuilder::derive("RgbLedBinInfoHead", &MANAGE_HEAD)
        .append(BitField::required("rgb_cluster_index", 8))
        .append(BitField::required("led_bin_index", 8))
        .build();

    // Reinterpretations of the generic `GetInfoResponse` payload.

    pub static ref INFO_ABOUT_DEVICE_V0_TO_V1: Layout =
        LayoutBuilder::derive("InfoAboutDeviceV0ToV1", &CLUSTER_INFO_HEAD)
            .append(BitField::required("rgb_cluster_count", 8))
            .append(BitField::required("nv_capabilities", 16))
            .append(BitField::required("ext_capabilities", 16))
            .append(BitField::reserved("reserved", 72))
            .build();

    pub static ref INFO_ABOUT_DEVICE_V2_TO_V4: Layout =
        LayoutBuilder::derive("InfoAboutDeviceV2ToV4", &INFO_ABOUT_DEVICE_V0_TO_V1)
            .replace_last(1, [
                BitField::required("number_of_multi_cluster_effects", 8),
                BitField::reserved("reserved", 64),
            ])
            .build();

    pub static ref INFO_ABOUT_RGB_CLUSTER_V0: Layout =
        LayoutBuilder::derive("InfoAboutRgbClusterV0", &CLUSTER_INFO_HEAD)
            .append(BitField::required("location_effect", 16))
            .append(BitField::required("effects_number", 8))
            .append(BitField::required("display_persistency_capabilities", 8))
            .append(BitField::reserved("reserved", 80))
            .build();

    pub static ref INFO_ABOUT_RGB_CLUSTER_V1_TO_V4: Layout =
        LayoutBuilder::derive("InfoAboutRgbClusterV1ToV4", &INFO_ABOUT_RGB_CLUSTER_V0)
            .replace_last(1, [
                BitField::required("effect_persistency_capabilities", 8),
                BitField::required("multi_led_pattern_capabilities", 8),
                BitField::reserved("reserved", 64),
            ])
            .build();

    pub static ref INFO_ABOUT_EFFECT_GENERAL_INFO: Layout =
        LayoutBuilder::derive("InfoAboutEffectGeneralInfo", &CLUSTER_INFO_HEAD)
            .append(BitField::required("effect_id", 16))
            .append(BitField::required("effect_capabilities", 16))
            .append(BitField::required("effect_period", 16))
            .append(BitField::reserved("reserved", 64))
            .build();

    /// The seven slot info types of a custom onboard stored effect, indexed by
    /// `slot_info_type`.
    pub static ref INFO_ABOUT_CUSTOM_ONBOARD_STORED_EFFECT: [Layout; 7] = [
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect0", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("data_validity", 8))
            .append(BitField::required("length_frame", 16))
            .append(BitField::reserved("reserved", 64))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect1", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("init_frame", 16))
            .append(BitField::required("length_frames_to_play", 16))
            .append(BitField::required("frame_period_ms", 16))
            .append(BitField::required("intensity", 8))
            .append(BitField::reserved("reserved", 32))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect2", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("uuid_0_10", 88))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect3", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("uuid_11_16", 48))
            .append(BitField::reserved("reserved", 40))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect4", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("effect_name_0_10", 88))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect5", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("effect_name_11_21", 88))
            .build(),
        LayoutBuilder::derive("InfoAboutCustomOnboardStoredEffect6", &CUSTOM_ONBOARD_HEAD)
            .append(BitField::required("effect_name_22_31", 80))
            .append(BitField::reserved("reserved", 8))
            .build(),
    ];

    /// Reinterpretations of the LED bin parameters, indexed by
    /// `led_bin_index`.
    pub static ref LED_BIN_INDEX: [Layout; 6] = [
        LayoutBuilder::derive("LedBinIndex0", &LED_BIN_HEAD)
            .append_all(required_fields(
                &["combination_1", "combination_2", "combination_3", "combination_4", "combination_5"],
                8,
            ))
            .append(BitField::padding(64))
            .build(),
        LayoutBuilder::derive("LedBinIndex1", &LED_BIN_HEAD)
            .append_all(required_fields(&["bin_code_1", "bin_code_2"], 8))
            .append(BitField::padding(88))
            .build(),
        LayoutBuilder::derive("LedBinIndex2", &LED_BIN_HEAD)
            .append_all(required_fields(&["cali_factor_1", "cali_factor_2", "cali_factor_3"], 8))
            .append(BitField::padding(80))
            .build(),
        LayoutBuilder::derive("LedBinIndex3", &LED_BIN_HEAD)
            .append_all(required_fields(&["r_intensity", "g_intensity", "b_intensity"], 16))
            .append(BitField::padding(56))
            .build(),
        LayoutBuilder::derive("LedBinIndex4", &LED_BIN_HEAD)
            .append_all(required_fields(&["r_cx", "g_cx", "b_cx", "w_cx"], 16))
            .append(BitField::padding(40))
            .build(),
        LayoutBuilder::derive("LedBinIndex5", &LED_BIN_HEAD)
            .append_all(required_fields(&["r_cy", "g_cy", "b_cy", "w_cy"], 16))
            .append(BitField::padding(40))
            .build(),
    ];

    // Request layouts.

    static ref GET_INFO_V0_LAYOUT: Layout = LayoutBuilder::derive("GetInfoV0", &CLUSTER_INFO_HEAD)
        .append(BitField::padding(8))
        .build();

    static ref GET_INFO_V1_TO_V4_LAYOUT: Layout = LayoutBuilder::derive("GetInfoV1ToV4", &EFFECT_INFO_HEAD)
        .append_all(optional_fields(PARAMS_1_TO_13, 8))
        .build();

    static ref SET_RGB_CLUSTER_EFFECT_V0_LAYOUT: Layout = LayoutBuilder::new("SetRgbClusterEffectV0")
        .append(BitField::required("rgb_cluster_index", 8))
        .append(BitField::required("rgb_cluster_effect_index", 8))
        .append_all(optional_fields(PARAMS_1_TO_10, 8))
        .append(BitField::reserved("reserved", 6))
        .append(BitField::optional("persistence", 2, 0))
        .append(BitField::padding(24))
        .build();

    static ref SET_RGB_CLUSTER_EFFECT_V1_TO_V4_LAYOUT: Layout =
        LayoutBuilder::derive("SetRgbClusterEffectV1ToV4", &SET_RGB_CLUSTER_EFFECT_V0_LAYOUT)
            .replace_last(3, [
                BitField::reserved("reserved", 4),
                BitField::optional("power_mode", 2, 0),
                BitField::optional("persistence", 2, 0),
                BitField::padding(24),
            ])
            .build();

    static ref SET_MULTI_LED_RGB_CLUSTER_PATTERN_LAYOUT: Layout =
        LayoutBuilder::new("SetMultiLedRgbClusterPattern")
            .append(BitField::required("rgb_cluster_index", 8))
            .append(BitField::required("pattern", 8))
            .append(BitField::padding(8))
            .build();

    static ref MANAGE_NV_CONFIG_V0_TO_V2_LAYOUT: Layout =
        LayoutBuilder::derive("ManageNvConfigV0ToV2", &MANAGE_HEAD)
            .append(BitField::required("nv_capabilities", 16))
            .append(BitField::required("capability_state", 8))
            .append(BitField::required("param_1", 8))
            .append(BitField::required("param_2", 8))
            .append(BitField::padding(80))
            .build();

    static ref MANAGE_NV_CONFIG_V3_TO_V4_LAYOUT: Layout =
        LayoutBuilder::derive("ManageNvConfigV3ToV4", &MANAGE_NV_CONFIG_V0_TO_V2_LAYOUT)
            .replace_last(1, required_fields(&["param_3", "param_4", "param_5", "param_6"], 8))
            .append(BitField::padding(48))
            .build();

    static ref MANAGE_RGB_LED_BIN_INFO_LAYOUT: Layout =
        LayoutBuilder::derive("ManageRgbLedBinInfo", &LED_BIN_HEAD)
            .append_all(required_fields(
                &["param_1", "param_2", "param_3", "param_4", "param_5", "param_6", "param_7", "param_8"],
                8,
            ))
            .append(BitField::padding(40))
            .build();

    static ref MANAGE_SW_CONTROL_LAYOUT: Layout = LayoutBuilder::derive("ManageSwControl", &MANAGE_HEAD)
        .append(BitField::required("sw_control_flags", 8))
        .append(BitField::required("events_notification_flags", 8))
        .append(BitField::reserved("reserved", 104))
        .build();

    static ref SET_EFFECT_SYNC_CORRECTION_LAYOUT: Layout = LayoutBuilder::new("SetEffectSyncCorrection")
        .append(BitField::required("rgb_cluster_index", 8))
        .append(BitField::required("drift_value", 16))
        .append(BitField::reserved("reserved", 104))
        .build();

    static ref MANAGE_RGB_POWER_MODE_CONFIG_LAYOUT: Layout =
        LayoutBuilder::derive("ManageRgbPowerModeConfig", &MANAGE_HEAD)
            .append(BitField::required("rgb_power_mode_flags", 16))
            .append(BitField::required("rgb_no_act_timeout_to_psave", 16))
            .append(BitField::required("rgb_no_act_timeout_to_off", 16))
            .append(BitField::reserved("reserved", 72))
            .build();

    static ref MANAGE_RGB_POWER_MODE_LAYOUT: Layout = LayoutBuilder::derive("ManageRgbPowerMode", &MANAGE_HEAD)
        .append(BitField::required("rgb_power_mode", 8))
        .append(BitField::reserved("reserved", 112))
        .build();

    static ref SHUTDOWN_LAYOUT: Layout = LayoutBuilder::new("Shutdown")
        .append(BitField::padding(24))
        .build();

    // Requests.

    pub static ref GET_INFO_V0: MessageDescriptor =
        request(0, &[0], ReportKind::Short, &GET_INFO_V0_LAYOUT);
    pub static ref GET_INFO_V1_TO_V4: MessageDescriptor =
        request(0, &[1, 2, 3, 4], ReportKind::Long, &GET_INFO_V1_TO_V4_LAYOUT);
    pub static ref SET_RGB_CLUSTER_EFFECT_V0: MessageDescriptor =
        request(1, &[0], ReportKind::Long, &SET_RGB_CLUSTER_EFFECT_V0_LAYOUT);
    pub static ref SET_RGB_CLUSTER_EFFECT_V1_TO_V4: MessageDescriptor =
        request(1, &[1, 2, 3, 4], ReportKind::Long, &SET_RGB_CLUSTER_EFFECT_V1_TO_V4_LAYOUT);
    pub static ref SET_MULTI_LED_RGB_CLUSTER_PATTERN: MessageDescriptor =
        request(2, ALL_VERSIONS, ReportKind::Short, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_LAYOUT);
    pub static ref MANAGE_NV_CONFIG_V0_TO_V2: MessageDescriptor =
        request(3, &[0, 1, 2], ReportKind::Long, &MANAGE_NV_CONFIG_V0_TO_V2_LAYOUT);
    pub static ref MANAGE_NV_CONFIG_V3_TO_V4: MessageDescriptor =
        request(3, &[3, 4], ReportKind::Long, &MANAGE_NV_CONFIG_V3_TO_V4_LAYOUT);
    pub static ref MANAGE_RGB_LED_BIN_INFO: MessageDescriptor =
        request(4, ALL_VERSIONS, ReportKind::Long, &MANAGE_RGB_LED_BIN_INFO_LAYOUT);
    pub static ref MANAGE_SW_CONTROL: MessageDescriptor =
        request(5, ALL_VERSIONS, ReportKind::Long, &MANAGE_SW_CONTROL_LAYOUT);
    pub static ref SET_EFFECT_SYNC_CORRECTION: MessageDescriptor =
        request(6, ALL_VERSIONS, ReportKind::Long, &SET_EFFECT_SYNC_CORRECTION_LAYOUT);
    pub static ref MANAGE_RGB_POWER_MODE_CONFIG: MessageDescriptor =
        request(7, ALL_VERSIONS, ReportKind::Long, &MANAGE_RGB_POWER_MODE_CONFIG_LAYOUT);
    pub static ref MANAGE_RGB_POWER_MODE: MessageDescriptor =
        request(8, ALL_VERSIONS, ReportKind::Long, &MANAGE_RGB_POWER_MODE_LAYOUT);
    pub static ref SHUTDOWN: MessageDescriptor = request(9, &[4], ReportKind::Short, &SHUTDOWN_LAYOUT);

    // Responses.

    pub static ref GET_INFO_RESPONSE: MessageDescriptor = response(
        0,
        ALL_VERSIONS,
        LayoutBuilder::derive("GetInfoResponse", &CLUSTER_INFO_HEAD)
            .append_all(required_fields(PARAMS_1_TO_14, 8))
            .build(),
        &["GetInfoV0", "GetInfoV1ToV4"],
    );
    pub static ref SET_RGB_CLUSTER_EFFECT_RESPONSE: MessageDescriptor = response(
        1,
        ALL_VERSIONS,
        long_empty("SetRgbClusterEffectResponse"),
        &["SetRgbClusterEffectV0", "SetRgbClusterEffectV1ToV4"],
    );
    pub static ref SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE: MessageDescriptor = response(
        2,
        ALL_VERSIONS,
        long_empty("SetMultiLedRgbClusterPatternResponse"),
        &["SetMultiLedRgbClusterPattern"],
    );
    pub static ref MANAGE_NV_CONFIG_RESPONSE_V0_TO_V2: MessageDescriptor = response(
        3,
        &[0, 1, 2],
        renamed("ManageNvConfigResponseV0ToV2", &MANAGE_NV_CONFIG_V0_TO_V2_LAYOUT),
        &["ManageNvConfigV0ToV2"],
    );
    pub static ref MANAGE_NV_CONFIG_RESPONSE_V3_TO_V4: MessageDescriptor = response(
        3,
        &[3, 4],
        renamed("ManageNvConfigResponseV3ToV4", &MANAGE_NV_CONFIG_V3_TO_V4_LAYOUT),
        &["ManageNvConfigV3ToV4"],
    );
    pub static ref MANAGE_RGB_LED_BIN_INFO_RESPONSE: MessageDescriptor = response(
        4,
        ALL_VERSIONS,
        renamed("ManageRgbLedBinInfoResponse", &MANAGE_RGB_LED_BIN_INFO_LAYOUT),
        &["ManageRgbLedBinInfo"],
    );
    pub static ref MANAGE_SW_CONTROL_RESPONSE: MessageDescriptor = response(
        5,
        ALL_VERSIONS,
        renamed("ManageSwControlResponse", &MANAGE_SW_CONTROL_LAYOUT),
        &["ManageSwControl"],
    );
    pub static ref SET_EFFECT_SYNC_CORRECTION_RESPONSE: MessageDescriptor = response(
        6,
        ALL_VERSIONS,
        long_empty("SetEffectSyncCorrectionResponse"),
        &["SetEffectSyncCorrection"],
    );
    pub static ref MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE: MessageDescriptor = response(
        7,
        ALL_VERSIONS,
        renamed("ManageRgbPowerModeConfigResponse", &MANAGE_RGB_POWER_MODE_CONFIG_LAYOUT),
        &["ManageRgbPowerModeConfig"],
    );
    pub static ref MANAGE_RGB_POWER_MODE_RESPONSE: MessageDescriptor = response(
        8,
        ALL_VERSIONS,
        renamed("ManageRgbPowerModeResponse", &MANAGE_RGB_POWER_MODE_LAYOUT),
        &["ManageRgbPowerMode"],
    );
    pub static ref SHUTDOWN_RESPONSE: MessageDescriptor =
        response(9, &[4], long_empty("ShutdownResponse"), &["Shutdown"]);

    // Events.

    pub static ref EFFECT_SYNC_EVENT: MessageDescriptor = event(
        0,
        ALL_VERSIONS,
        LayoutBuilder::new("EffectSyncEvent")
            .append(BitField::required("rgb_cluster_index", 8))
            .append(BitField::required("effect_counter", 16))
            .append(BitField::padding(104))
            .build(),
    );
    pub static ref USER_ACTIVITY_EVENT: MessageDescriptor = event(
        1,
        ALL_VERSIONS,
        LayoutBuilder::new("UserActivityEvent")
            .append(BitField::required("activity_event_type", 8))
            .append(BitField::padding(120))
            .build(),
    );
    pub static ref RGB_CLUSTER_CHANGED_EVENT: MessageDescriptor = event(
        2,
        &[4],
        renamed("RgbClusterChangedEvent", &SET_RGB_CLUSTER_EFFECT_V1_TO_V4_LAYOUT),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_bin_views_keep_the_head() {
        for view in LED_BIN_INDEX.iter() {
            assert_eq!(view.total_bit_length(), 128, "{}", view.name());
            assert_eq!(view.field("led_bin_index").map(|(_, offset)| offset), Some(16));
        }
    }

    #[test]
    fn custom_onboard_views_share_the_slot_head() {
        for view in INFO_ABOUT_CUSTOM_ONBOARD_STORED_EFFECT.iter() {
            assert_eq!(view.total_bit_length(), 128, "{}", view.name());
            assert_eq!(view.field("slot_info_type").map(|(_, offset)| offset), Some(32));
        }
    }

    #[test]
    fn power_mode_sits_before_persistence() {
        let layout = &SET_RGB_CLUSTER_EFFECT_V1_TO_V4.layout;
        assert_eq!(layout.field("power_mode").map(|(_, offset)| offset), Some(100));
        assert_eq!(layout.field("persistence").map(|(_, offset)| offset), Some(102));
    }

    #[test]
    fn responses_name_their_requests() {
        assert!(
            GET_INFO_RESPONSE
                .request_list
                .contains(&GET_INFO_V1_TO_V4.name())
        );
        assert!(SHUTDOWN_RESPONSE.request_list.contains(&SHUTDOWN.name()));
    }
}
