//! The version table of the `RgbEffects` feature.
//!
//! Every version lists all of its functions and events, even where the
//! entry is the same message type as in the previous version.

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

fn events(
    descriptors: impl IntoIterator<Item = &'static MessageDescriptor>,
) -> BTreeMap<u8, &'static MessageDescriptor> {
    descriptors.into_iter().map(|desc| (desc.index, desc)).collect()
}

lazy_static! {
    pub static ref RGB_EFFECTS_TABLE: VersionTable = VersionTable::new(FEATURE_ID, "RgbEffects", [
        (0, VersionEntry {
            main: MainDescriptor {
                name: "RgbEffectsV0",
                max_function_index: 8,
            },
            functions: BTreeMap::from([
                function(&GET_INFO_V0, &GET_INFO_RESPONSE),
                function(&SET_RGB_CLUSTER_EFFECT_V0, &SET_RGB_CLUSTER_EFFECT_RESPONSE),
                function(&SET_MULTI_LED_RGB_CLUSTER_PATTERN, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE),
                function(&MANAGE_NV_CONFIG_V0_TO_V2, &MANAGE_NV_CONFIG_RESPONSE_V0_TO_V2),
                function(&MANAGE_RGB_LED_BIN_INFO, &MANAGE_RGB_LED_BIN_INFO_RESPONSE),
                function(&MANAGE_SW_CONTROL, &MANAGE_SW_CONTROL_RESPONSE),
                function(&SET_EFFECT_SYNC_CORRECTION, &SET_EFFECT_SYNC_CORRECTION_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE_CONFIG, &MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE, &MANAGE_RGB_POWER_MODE_RESPONSE),
            ]),
            events: events([&*EFFECT_SYNC_EVENT, &*USER_ACTIVITY_EVENT]),
        }),
        (1, VersionEntry {
            main: MainDescriptor {
                name: "RgbEffectsV1",
                max_function_index: 8,
            },
            functions: BTreeMap::from([
                function(&GET_INFO_V1_TO_V4, &GET_INFO_RESPONSE),
                function(&SET_RGB_CLUSTER_EFFECT_V1_TO_V4, &SET_RGB_CLUSTER_EFFECT_RESPONSE),
                function(&SET_MULTI_LED_RGB_CLUSTER_PATTERN, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE),
                function(&MANAGE_NV_CONFIG_V0_TO_V2, &MANAGE_NV_CONFIG_RESPONSE_V0_TO_V2),
                function(&MANAGE_RGB_LED_BIN_INFO, &MANAGE_RGB_LED_BIN_INFO_RESPONSE),
                function(&MANAGE_SW_CONTROL, &MANAGE_SW_CONTROL_RESPONSE),
                function(&SET_EFFECT_SYNC_CORRECTION, &SET_EFFECT_SYNC_CORRECTION_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE_CONFIG, &MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE, &MANAGE_RGB_POWER_MODE_RESPONSE),
            ]),
            events: events([&*EFFECT_SYNC_EVENT, &*USER_ACTIVITY_EVENT]),
        }),
        (2, VersionEntry {
            main: MainDescriptor {
                name: "RgbEffectsV2",
                max_function_index: 8,
            },
            functions: BTreeMap::from([
                function(&GET_INFO_V1_TO_V4, &GET_INFO_RESPONSE),
                function(&SET_RGB_CLUSTER_EFFECT_V1_TO_V4, &SET_RGB_CLUSTER_EFFECT_RESPONSE),
                function(&SET_MULTI_LED_RGB_CLUSTER_PATTERN, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE),
                function(&MANAGE_NV_CONFIG_V0_TO_V2, &MANAGE_NV_CONFIG_RESPONSE_V0_TO_V2),
                function(&MANAGE_RGB_LED_BIN_INFO, &MANAGE_RGB_LED_BIN_INFO_RESPONSE),
                function(&MANAGE_SW_CONTROL, &MANAGE_SW_CONTROL_RESPONSE),
                function(&SET_EFFECT_SYNC_CORRECTION, &SET_EFFECT_SYNC_CORRECTION_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE_CONFIG, &MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE, &MANAGE_RGB_POWER_MODE_RESPONSE),
            ]),
            events: events([&*EFFECT_SYNC_EVENT, &*USER_ACTIVITY_EVENT]),
        }),
        (3, VersionEntry {
            main: MainDescriptor {
                name: "RgbEffectsV3",
                max_function_index: 8,
            },
            functions: BTreeMap::from([
                function(&GET_INFO_V1_TO_V4, &GET_INFO_RESPONSE),
                function(&SET_RGB_CLUSTER_EFFECT_V1_TO_V4, &SET_RGB_CLUSTER_EFFECT_RESPONSE),
                function(&SET_MULTI_LED_RGB_CLUSTER_PATTERN, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE),
                function(&MANAGE_NV_CONFIG_V3_TO_V4, &MANAGE_NV_CONFIG_RESPONSE_V3_TO_V4),
                function(&MANAGE_RGB_LED_BIN_INFO, &MANAGE_RGB_LED_BIN_INFO_RESPONSE),
                function(&MANAGE_SW_CONTROL, &MANAGE_SW_CONTROL_RESPONSE),
                function(&SET_EFFECT_SYNC_CORRECTION, &SET_EFFECT_SYNC_CORRECTION_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE_CONFIG, &MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE, &MANAGE_RGB_POWER_MODE_RESPONSE),
            ]),
            events: events([&*EFFECT_SYNC_EVENT, &*USER_ACTIVITY_EVENT]),
        }),
        (4, VersionEntry {
            main: MainDescriptor {
                name: "RgbEffectsV4",
                max_function_index: 9,
            },
            functions: BTreeMap::from([
                function(&GET_INFO_V1_TO_V4, &GET_INFO_RESPONSE),
                function(&SET_RGB_CLUSTER_EFFECT_V1_TO_V4, &SET_RGB_CLUSTER_EFFECT_RESPONSE),
                function(&SET_MULTI_LED_RGB_CLUSTER_PATTERN, &SET_MULTI_LED_RGB_CLUSTER_PATTERN_RESPONSE),
                function(&MANAGE_NV_CONFIG_V3_TO_V4, &MANAGE_NV_CONFIG_RESPONSE_V3_TO_V4),
                function(&MANAGE_RGB_LED_BIN_INFO, &MANAGE_RGB_LED_BIN_INFO_RESPONSE),
                function(&MANAGE_SW_CONTROL, &MANAGE_SW_CONTROL_RESPONSE),
                function(&SET_EFFECT_SYNC_CORRECTION, &SET_EFFECT_SYNC_CORRECTION_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE_CONFIG, &MANAGE_RGB_POWER_MODE_CONFIG_RESPONSE),
                function(&MANAGE_RGB_POWER_MODE, &MANAGE_RGB_POWER_MODE_RESPONSE),
                function(&SHUTDOWN, &SHUTDOWN_RESPONSE),
            ]),
            events: events([&*EFFECT_SYNC_EVENT, &*USER_ACTIVITY_EVENT, &*RGB_CLUSTER_CHANGED_EVENT]),
        }),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureError, MessageKind};

    #[test]
    fn get_info_request_changes_on_version_one() {
        assert_eq!(RGB_EFFECTS_TABLE.get_request_type(0, 0).unwrap().name(), "GetInfoV0");
        assert_eq!(RGB_EFFECTS_TABLE.get_request_type(1, 0).unwrap().name(), "GetInfoV1ToV4");
    }

    #[test]
    fn shutdown_only_exists_in_version_four() {
        assert_eq!(
            RGB_EFFECTS_TABLE.get_request_type(3, 9),
            Err(FeatureError::UnsupportedOperation {
                feature: "RgbEffects",
                version: 3,
                kind: MessageKind::Request,
                index: 9,
            })
        );
        assert_eq!(RGB_EFFECTS_TABLE.get_request_type(4, 9).unwrap().name(), "Shutdown");
    }

    #[test]
    fn entries_sit_at_their_own_index() {
        for version in RGB_EFFECTS_TABLE.versions() {
            let entry = RGB_EFFECTS_TABLE.entry(version).unwrap();
            for (index, function) in &entry.functions {
                assert_eq!(function.request.index, *index);
                assert_eq!(function.response.index, *index);
                assert!(function.request.applies_to(version), "{}", function.request.name());
                assert!(function.response.applies_to(version), "{}", function.response.name());
            }
            for (index, event) in &entry.events {
                assert_eq!(event.index, *index);
                assert!(event.applies_to(version), "{}", event.name());
            }
        }
    }
}
