//! The version table of the `Backlight` feature.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use super::{FEATURE_ID, messages::*};
use crate::feature::{FunctionEntry, MainDescriptor, MessageDescriptor, VersionEntry, VersionTable};

fn function(
    request: &'static MessageDescriptor,
    response: &'static MessageDescriptor,
) -> (u8, FunctionEntry) {
    (request.index, FunctionEntry { request, response })
}

fn version(
    name: &'static str,
    functions: impl IntoIterator<Item = (u8, FunctionEntry)>,
    info_event: &'static MessageDescriptor,
) -> VersionEntry {
    let functions: BTreeMap<u8, FunctionEntry> = functions.into_iter().collect();
    VersionEntry {
        main: MainDescriptor {
            name,
            max_function_index: functions.keys().copied().max().unwrap_or(0),
        },
        functions,
        events: BTreeMap::from([(info_event.index, info_event)]),
    }
}

lazy_static! {
    pub static ref BACKLIGHT_TABLE: VersionTable = VersionTable::new(FEATURE_ID, "Backlight", [
        (1, version(
            "BacklightV1",
            [
                function(&GET_BACKLIGHT_CONFIG, &GET_BACKLIGHT_CONFIG_RESPONSE_V1),
                function(&SET_BACKLIGHT_CONFIG_V1, &SET_BACKLIGHT_CONFIG_RESPONSE),
                function(&GET_BACKLIGHT_INFO, &GET_BACKLIGHT_INFO_RESPONSE_V1),
            ],
            &BACKLIGHT_INFO_EVENT_V1,
        )),
        (2, version(
            "BacklightV2",
            [
                function(&GET_BACKLIGHT_CONFIG, &GET_BACKLIGHT_CONFIG_RESPONSE_V2),
                function(&SET_BACKLIGHT_CONFIG_V2, &SET_BACKLIGHT_CONFIG_RESPONSE),
                function(&GET_BACKLIGHT_INFO, &GET_BACKLIGHT_INFO_RESPONSE_V2),
                function(&SET_BACKLIGHT_EFFECT, &SET_BACKLIGHT_EFFECT_RESPONSE),
            ],
            &BACKLIGHT_INFO_EVENT_V2_TO_V4,
        )),
        (3, version(
            "BacklightV3",
            [
                function(&GET_BACKLIGHT_CONFIG, &GET_BACKLIGHT_CONFIG_RESPONSE_V3),
                function(&SET_BACKLIGHT_CONFIG_V3, &SET_BACKLIGHT_CONFIG_RESPONSE),
                function(&GET_BACKLIGHT_INFO, &GET_BACKLIGHT_INFO_RESPONSE_V3),
                function(&SET_BACKLIGHT_EFFECT, &SET_BACKLIGHT_EFFECT_RESPONSE),
            ],
            &BACKLIGHT_INFO_EVENT_V2_TO_V4,
        )),
        (4, version(
            "BacklightV4",
            [
                function(&GET_BACKLIGHT_CONFIG, &GET_BACKLIGHT_CONFIG_RESPONSE_V4),
                function(&SET_BACKLIGHT_CONFIG_V4, &SET_BACKLIGHT_CONFIG_RESPONSE),
                function(&GET_BACKLIGHT_INFO, &GET_BACKLIGHT_INFO_RESPONSE_V4),
                function(&SET_BACKLIGHT_EFFECT, &SET_BACKLIGHT_EFFECT_RESPONSE),
            ],
            &BACKLIGHT_INFO_EVENT_V2_TO_V4,
        )),
    ]);
}
