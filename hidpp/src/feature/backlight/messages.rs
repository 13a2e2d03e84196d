//! Payload layouts and message descriptors of the `Backlight` feature.
//!
//! Configuration and info payloads grow with every version. Version 1 keeps
//! them in short reports, later versions switch to long reports and pad the
//! remainder with a reserved field.

use lazy_static::lazy_static;

use super::FEATURE_ID;
use crate::{
    bitfield::BitField,
    feature::{MessageDescriptor, MessageKind},
    layout::{Layout, LayoutBuilder},
    protocol::v20::ReportKind,
};

fn request(index: u8, versions: &'static [u8], report: ReportKind, layout: Layout) -> MessageDescriptor {
    MessageDescriptor::new(FEATURE_ID, MessageKind::Request, index, versions, report, layout)
}

fn response(
    index: u8,
    versions: &'static [u8],
    report: ReportKind,
    layout: Layout,
    request_list: &'static [&'static str],
) -> MessageDescriptor {
    MessageDescriptor::new(FEATURE_ID, MessageKind::Response, index, versions, report, layout)
        .answering(request_list)
}

fn short_empty(name: &'static str) -> Layout {
    LayoutBuilder::new(name).append(BitField::padding(24)).build()
}

fn long_empty(name: &'static str) -> Layout {
    LayoutBuilder::new(name).append(BitField::padding(128)).build()
}

fn with_reserved(name: &'static str, parent: &Layout, bits: usize) -> Layout {
    LayoutBuilder::derive(name, parent)
        .append(BitField::reserved("reserved", bits))
        .build()
}

lazy_static! {
    static ref CONFIG_DATA_1: Layout = LayoutBuilder::new("GetBacklightConfigResponseData1")
        .append(BitField::required("configuration", 8))
        .append(BitField::required("supported_options", 16))
        .build();

    static ref CONFIG_DATA_2: Layout = LayoutBuilder::derive("GetBacklightConfigResponseData2", &CONFIG_DATA_1)
        .append(BitField::required("backlight_effect_list", 16))
        .build();

    static ref CONFIG_DATA_3: Layout = LayoutBuilder::derive("GetBacklightConfigResponseData3", &CONFIG_DATA_2)
        .append(BitField::required("current_backlight_level", 8))
        .append(BitField::required("curr_duration_hands_out", 16))
        .append(BitField::required("curr_duration_hands_in", 16))
        .append(BitField::required("curr_duration_powered", 16))
        .build();

    static ref CONFIG_DATA_4: Layout = LayoutBuilder::derive("GetBacklightConfigResponseData4", &CONFIG_DATA_3)
        .append(BitField::required("curr_duration_not_powered", 16))
        .build();

    static ref SET_CONFIG_DATA_1: Layout = LayoutBuilder::new("SetBacklightConfigData1")
        .append(BitField::required("configuration", 8))
        .append(BitField::required("options", 8))
        .build();

    static ref SET_CONFIG_DATA_2: Layout = LayoutBuilder::derive("SetBacklightConfigData2", &SET_CONFIG_DATA_1)
        .append(BitField::required("backlight_effect", 8))
        .build();

    static ref SET_CONFIG_DATA_3: Layout = LayoutBuilder::derive("SetBacklightConfigData3", &SET_CONFIG_DATA_2)
        .append(BitField::required("current_backlight_level", 8))
        .append(BitField::required("curr_duration_hands_out", 16))
        .append(BitField::required("curr_duration_hands_in", 16))
        .append(BitField::required("curr_duration_powered", 16))
        .build();

    static ref SET_CONFIG_DATA_4: Layout = LayoutBuilder::derive("SetBacklightConfigData4", &SET_CONFIG_DATA_3)
        .append(BitField::required("curr_duration_not_powered", 16))
        .build();

    static ref INFO_DATA_1: Layout = LayoutBuilder::new("GetBacklightInfoResponseData1")
        .append(BitField::required("number_of_level", 8))
        .append(BitField::required("current_level", 8))
        .append(BitField::required("backlight_status", 8))
        .build();

    static ref INFO_DATA_2: Layout = LayoutBuilder::derive("GetBacklightInfoResponseData2", &INFO_DATA_1)
        .append(BitField::required("backlight_effect", 8))
        .build();

    static ref INFO_DATA_3: Layout = LayoutBuilder::derive("GetBacklightInfoResponseData3", &INFO_DATA_2)
        .append(BitField::required("oob_duration_hands_out", 16))
        .append(BitField::required("oob_duration_hands_in", 16))
        .append(BitField::required("oob_duration_powered", 16))
        .build();

    static ref INFO_DATA_4: Layout = LayoutBuilder::derive("GetBacklightInfoResponseData4", &INFO_DATA_3)
        .append(BitField::required("oob_duration_not_powered", 16))
        .build();

    // Requests.

    pub static ref GET_BACKLIGHT_CONFIG: MessageDescriptor =
        request(0, &[1, 2, 3, 4], ReportKind::Short, short_empty("GetBacklightConfig"));

    pub static ref SET_BACKLIGHT_CONFIG_V1: MessageDescriptor = request(
        1,
        &[1],
        ReportKind::Short,
        LayoutBuilder::derive("SetBacklightConfigV1", &SET_CONFIG_DATA_1)
            .append(BitField::padding(8))
            .build(),
    );
    pub static ref SET_BACKLIGHT_CONFIG_V2: MessageDescriptor = request(
        1,
        &[2],
        ReportKind::Short,
        LayoutBuilder::derive("SetBacklightConfigV2", &SET_CONFIG_DATA_2).build(),
    );
    pub static ref SET_BACKLIGHT_CONFIG_V3: MessageDescriptor = request(
        1,
        &[3],
        ReportKind::Long,
        LayoutBuilder::derive("SetBacklightConfigV3", &SET_CONFIG_DATA_3)
            .append(BitField::padding(48))
            .build(),
    );
    pub static ref SET_BACKLIGHT_CONFIG_V4: MessageDescriptor = request(
        1,
        &[4],
        ReportKind::Long,
        LayoutBuilder::derive("SetBacklightConfigV4", &SET_CONFIG_DATA_4)
            .append(BitField::padding(32))
            .build(),
    );

    pub static ref GET_BACKLIGHT_INFO: MessageDescriptor =
        request(2, &[1, 2, 3, 4], ReportKind::Short, short_empty("GetBacklightInfo"));

    pub static ref SET_BACKLIGHT_EFFECT: MessageDescriptor = request(
        3,
        &[2, 3, 4],
        ReportKind::Short,
        LayoutBuilder::new("SetBacklightEffect")
            .append(BitField::required("backlight_effect", 8))
            .append(BitField::padding(16))
            .build(),
    );

    // Responses.

    pub static ref GET_BACKLIGHT_CONFIG_RESPONSE_V1: MessageDescriptor = response(
        0,
        &[1],
        ReportKind::Short,
        LayoutBuilder::derive("GetBacklightConfigResponseV1", &CONFIG_DATA_1).build(),
        &["GetBacklightConfig"],
    );
    pub static ref GET_BACKLIGHT_CONFIG_RESPONSE_V2: MessageDescriptor = response(
        0,
        &[2],
        ReportKind::Long,
        with_reserved("GetBacklightConfigResponseV2", &CONFIG_DATA_2, 88),
        &["GetBacklightConfig"],
    );
    pub static ref GET_BACKLIGHT_CONFIG_RESPONSE_V3: MessageDescriptor = response(
        0,
        &[3],
        ReportKind::Long,
        with_reserved("GetBacklightConfigResponseV3", &CONFIG_DATA_3, 32),
        &["GetBacklightConfig"],
    );
    pub static ref GET_BACKLIGHT_CONFIG_RESPONSE_V4: MessageDescriptor = response(
        0,
        &[4],
        ReportKind::Long,
        with_reserved("GetBacklightConfigResponseV4", &CONFIG_DATA_4, 16),
        &["GetBacklightConfig"],
    );

    pub static ref SET_BACKLIGHT_CONFIG_RESPONSE: MessageDescriptor = response(
        1,
        &[1, 2, 3, 4],
        ReportKind::Long,
        long_empty("SetBacklightConfigResponse"),
        &["SetBacklightConfigV1", "SetBacklightConfigV2", "SetBacklightConfigV3", "SetBacklightConfigV4"],
    );

    pub static ref GET_BACKLIGHT_INFO_RESPONSE_V1: MessageDescriptor = response(
        2,
        &[1],
        ReportKind::Short,
        LayoutBuilder::derive("GetBacklightInfoResponseV1", &INFO_DATA_1).build(),
        &["GetBacklightInfo"],
    );
    pub static ref GET_BACKLIGHT_INFO_RESPONSE_V2: MessageDescriptor = response(
        2,
        &[2],
        ReportKind::Long,
        with_reserved("GetBacklightInfoResponseV2", &INFO_DATA_2, 96),
        &["GetBacklightInfo"],
    );
    pub static ref GET_BACKLIGHT_INFO_RESPONSE_V3: MessageDescriptor = response(
        2,
        &[3],
        ReportKind::Long,
        with_reserved("GetBacklightInfoResponseV3", &INFO_DATA_3, 48),
        &["GetBacklightInfo"],
    );
    pub static ref GET_BACKLIGHT_INFO_RESPONSE_V4: MessageDescriptor = response(
        2,
        &[4],
        ReportKind::Long,
        with_reserved("GetBacklightInfoResponseV4", &INFO_DATA_4, 32),
        &["GetBacklightInfo"],
    );

    pub static ref SET_BACKLIGHT_EFFECT_RESPONSE: MessageDescriptor = response(
        3,
        &[2, 3, 4],
        ReportKind::Long,
        long_empty("SetBacklightEffectResponse"),
        &["SetBacklightEffect"],
    );

    // Events.

    pub static ref BACKLIGHT_INFO_EVENT_V1: MessageDescriptor = MessageDescriptor::new(
        FEATURE_ID,
        MessageKind::Event,
        0,
        &[1],
        ReportKind::Short,
        LayoutBuilder::derive("BacklightInfoEventV1", &INFO_DATA_1).build(),
    );
    pub static ref BACKLIGHT_INFO_EVENT_V2_TO_V4: MessageDescriptor = MessageDescriptor::new(
        FEATURE_ID,
        MessageKind::Event,
        0,
        &[2, 3, 4],
        ReportKind::Long,
        with_reserved("BacklightInfoEventV2ToV4", &INFO_DATA_2, 96),
    );
}
