//! Invariants every registered version table has to satisfy.

use std::collections::HashSet;

use hidpp::{
    feature::{
        MessageDescriptor,
        MessageKind,
        registry::{self, KnownFeature},
        rgb_effects::messages,
    },
    layout::Layout,
};

fn features() -> Vec<(u16, KnownFeature)> {
    registry::known_features()
}

fn descriptors() -> Vec<&'static MessageDescriptor> {
    features()
        .into_iter()
        .flat_map(|(_, feat)| feat.table.descriptors().collect::<Vec<_>>())
        .collect()
}

fn views() -> Vec<&'static Layout> {
    let mut views: Vec<&'static Layout> = vec![
        &messages::INFO_ABOUT_DEVICE_V0_TO_V1,
        &messages::INFO_ABOUT_DEVICE_V2_TO_V4,
        &messages::INFO_ABOUT_RGB_CLUSTER_V0,
        &messages::INFO_ABOUT_RGB_CLUSTER_V1_TO_V4,
        &messages::INFO_ABOUT_EFFECT_GENERAL_INFO,
    ];
    views.extend(messages::INFO_ABOUT_CUSTOM_ONBOARD_STORED_EFFECT.iter());
    views.extend(messages::LED_BIN_INDEX.iter());
    views
}

#[test]
fn every_layout_fills_its_report_exactly() {
    for desc in descriptors() {
        assert_eq!(
            desc.layout.total_bit_length(),
            desc.report.payload_bits(),
            "{} does not fill a {:?} report",
            desc.name(),
            desc.report
        );
        assert_eq!(desc.layout.total_bit_length() % 8, 0);
    }
    for view in views() {
        assert_eq!(view.total_bit_length(), 128, "{}", view.name());
    }
}

#[test]
fn field_names_are_unique_within_a_layout() {
    let layouts = descriptors()
        .into_iter()
        .map(|desc| &desc.layout)
        .chain(views());
    for layout in layouts {
        let mut seen = HashSet::new();
        for field in layout.fields() {
            assert!(seen.insert(field.name), "{} repeats {}", layout.name(), field.name);
        }
    }
}

#[test]
fn field_ids_count_down_from_below_the_software_id() {
    for desc in descriptors() {
        for (i, field) in desc.layout.fields().iter().enumerate() {
            assert_eq!(field.id as usize, 0xfa - i, "{}.{}", desc.name(), field.name);
        }
    }
}

#[test]
fn every_claimed_function_index_is_declared() {
    for (_, feat) in features() {
        for version in feat.table.versions() {
            let main = feat.table.get_main_class(version).unwrap();
            for index in 0..=main.max_function_index {
                let request = feat.table.get_request_type(version, index);
                let response = feat.table.get_response_type(version, index);
                assert!(request.is_ok(), "{} v{version} has no request {index}", feat.name);
                assert!(response.is_ok(), "{} v{version} has no response {index}", feat.name);
            }
            assert!(feat.table.get_request_type(version, main.max_function_index + 1).is_err());
        }
    }
}

#[test]
fn descriptors_agree_with_their_table_position() {
    for (id, feat) in features() {
        for version in feat.table.versions() {
            let entry = feat.table.entry(version).unwrap();
            for (&index, function) in &entry.functions {
                assert_eq!(function.request.kind, MessageKind::Request);
                assert_eq!(function.response.kind, MessageKind::Response);
                assert_eq!(function.request.index, index);
                assert!(function.request.applies_to(version));
                assert!(function.response.applies_to(version));
                assert!(
                    function.response.request_list.contains(&function.request.name()),
                    "{} does not answer {}",
                    function.response.name(),
                    function.request.name()
                );
                assert_eq!(function.request.feature_id, id);
            }
            for (&index, event) in &entry.events {
                assert_eq!(event.kind, MessageKind::Event);
                assert_eq!(event.index, index);
                assert!(event.applies_to(version));
            }
        }
    }
}
