//! Frame-level scenarios for the `RgbEffects` and `Backlight` tables.

use hidpp::{
    feature::{
        FeatureError,
        MessageKind,
        VersionedFeature,
        backlight::Backlight,
        rgb_effects::{
            RgbEffects,
            effects::{Effect, EffectFamily, EffectKind},
            messages,
            model::RGB_EFFECTS_TABLE,
        },
    },
    layout::FieldValues,
    protocol::v20::ReportKind,
};
use insta::assert_snapshot;

fn fixed_red() -> FieldValues {
    FieldValues::new()
        .with("rgb_cluster_index", 0x00u8)
        .with("rgb_cluster_effect_index", 0x01u8)
        .with("param_1", 0xffu8)
        .with("param_2", 0x00u8)
        .with("param_3", 0x00u8)
        .with("param_4", 0x00u8)
}

// ── Scenario 1: persistence packing ──────────────────────────────────────────

#[test]
fn set_rgb_cluster_effect_v0_packs_persistence_into_the_low_bits() {
    let values = fixed_red().with("persistence", 0x02u8);
    let frame = messages::SET_RGB_CLUSTER_EFFECT_V0
        .encode(0x01, 0x0b, &values)
        .unwrap()
        .to_bytes();

    assert_eq!(frame.len(), 20);
    assert_eq!(frame[4 + 12], 0x02);
    assert_snapshot!(
        format!("{:02X?}", frame),
        @"[11, 01, 0B, 10, 00, 01, FF, 00, 00, 00, 00, 00, 00, 00, 00, 00, 02, 00, 00, 00]"
    );
}

#[test]
fn set_rgb_cluster_effect_v1_puts_power_mode_above_persistence() {
    let values = fixed_red().with("power_mode", 0x02u8);
    let payload = messages::SET_RGB_CLUSTER_EFFECT_V1_TO_V4
        .encode_payload(&values)
        .unwrap();

    assert_snapshot!(
        format!("{:02X?}", payload),
        @"[00, 01, FF, 00, 00, 00, 00, 00, 00, 00, 00, 00, 08, 00, 00, 00]"
    );
}

#[test]
fn effect_parameters_fill_the_cluster_effect_params() {
    let fixed = Effect::Fixed {
        color: hidpp::feature::rgb_effects::effects::Rgb::new(0xff, 0x00, 0x00),
        mode: Default::default(),
    };

    // Fixed sits at position 1 of the cluster's effect list.
    let mut values = FieldValues::new()
        .with("rgb_cluster_index", 0x00u8)
        .with("rgb_cluster_effect_index", 0x01u8);
    for (i, param) in fixed.parameters().into_iter().enumerate() {
        values.set(format!("param_{}", i + 1), param);
    }

    assert_eq!(
        messages::SET_RGB_CLUSTER_EFFECT_V0.encode_payload(&values),
        messages::SET_RGB_CLUSTER_EFFECT_V0.encode_payload(&fixed_red())
    );
}

#[test]
fn slot_six_effect_id_is_not_a_param() {
    let decomposition = Effect::ColorDecomposition {
        period: 0x0102,
        brightness: 0x03,
    };

    let mut values = FieldValues::new()
        .with("rgb_cluster_index", 0x00u8)
        .with("rgb_cluster_effect_index", 0x04u8);
    for (i, param) in decomposition.parameters().into_iter().enumerate() {
        values.set(format!("param_{}", i + 1), param);
    }
    let payload = messages::SET_RGB_CLUSTER_EFFECT_V1_TO_V4
        .encode_payload(&values)
        .unwrap();

    assert_snapshot!(
        format!("{:02X?}", payload),
        @"[00, 04, 00, 00, 00, 00, 00, 00, 01, 02, 03, 00, 00, 00, 00, 00]"
    );
}

// ── Scenario 2: getInfo dispatch ─────────────────────────────────────────────

#[test]
fn get_info_resolves_per_version() {
    let v0 = RGB_EFFECTS_TABLE.get_request_type(0, 0).unwrap();
    assert_eq!(v0.name(), "GetInfoV0");
    assert_eq!(v0.report, ReportKind::Short);
    assert!(v0.layout.field("type_of_info").is_none());

    let v2 = RGB_EFFECTS_TABLE.get_request_type(2, 0).unwrap();
    assert_eq!(v2.name(), "GetInfoV1ToV4");
    assert_eq!(v2.report, ReportKind::Long);
    assert!(v2.layout.field("type_of_info").is_some());
    let optional_params = v2
        .layout
        .fields()
        .iter()
        .filter(|f| f.name.starts_with("param_") && f.optional)
        .count();
    assert_eq!(optional_params, 13);
}

#[test]
fn get_info_v0_frame() {
    let values = FieldValues::new()
        .with("rgb_cluster_index", 0xffu8)
        .with("rgb_cluster_effect_index", 0xffu8);
    let frame = RGB_EFFECTS_TABLE
        .get_request_type(0, 0)
        .unwrap()
        .encode(0xff, 0x0b, &values)
        .unwrap()
        .to_bytes();

    assert_snapshot!(format!("{:02X?}", frame), @"[10, FF, 0B, 00, FF, FF, 00]");
}

// ── Scenario 3: shutdown only in version 4 ───────────────────────────────────

#[test]
fn shutdown_is_version_scoped() {
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
    assert_eq!(RGB_EFFECTS_TABLE.get_response_type(4, 9).unwrap().name(), "ShutdownResponse");
}

// ── Scenario 4: manageNvConfig growth ────────────────────────────────────────

#[test]
fn nv_config_grows_without_changing_the_frame_size() {
    let names = |version| {
        RGB_EFFECTS_TABLE
            .get_request_type(version, 3)
            .unwrap()
            .layout
            .fields()
            .iter()
            .filter(|f| f.name != "padding")
            .map(|f| f.name)
            .collect::<Vec<_>>()
    };
    let padding = |version| {
        RGB_EFFECTS_TABLE
            .get_request_type(version, 3)
            .unwrap()
            .layout
            .field("padding")
            .map(|(f, _)| f.bit_length)
    };

    assert_eq!(names(2), ["get_or_set", "nv_capabilities", "capability_state", "param_1", "param_2"]);
    assert_eq!(names(3), [
        "get_or_set",
        "nv_capabilities",
        "capability_state",
        "param_1",
        "param_2",
        "param_3",
        "param_4",
        "param_5",
        "param_6",
    ]);
    assert_eq!(padding(2), Some(80));
    assert_eq!(padding(3), Some(48));
    for version in [0, 2, 3, 4] {
        let request = RGB_EFFECTS_TABLE.get_request_type(version, 3).unwrap();
        assert_eq!(request.layout.total_bit_length(), 128);
    }
}

// ── Effect ID scoping ────────────────────────────────────────────────────────

#[test]
fn effect_0x0f_depends_on_the_family() {
    assert_eq!(EffectFamily::V2.lookup(0x0f), Some(EffectKind::SnipePulseCyanPink));
    assert_eq!(EffectFamily::V3.lookup(0x0f), Some(EffectKind::SnipePulseCyanPink));
    assert_eq!(EffectFamily::V4.lookup(0x0f), Some(EffectKind::FrameBasedSignatureEffectActive));
    assert_eq!(EffectFamily::V0V1.lookup(0x0f), None);

    let snipe = Effect::random(EffectKind::SnipePulseCyanPink, 1).encode();
    assert!(matches!(Effect::decode(&snipe, EffectFamily::V4), Ok(Effect::FrameBasedSignatureEffectActive(_))));
    assert!(matches!(
        Effect::decode(&snipe, EffectFamily::V0V1),
        Err(FeatureError::UnsupportedEffect { id: 0x0f, .. })
    ));
}

#[test]
fn accessors_expose_the_version_dictionary() {
    let v4 = RgbEffects::create(4).unwrap();
    assert!(v4.effect_dictionary().contains(&EffectKind::FrameBasedSignatureEffectActive));
    assert!(!v4.effect_dictionary().contains(&EffectKind::SnipePulseCyanPink));
}

// ── Idempotence ──────────────────────────────────────────────────────────────

#[test]
fn encoding_is_deterministic() {
    let request = RGB_EFFECTS_TABLE.get_request_type(4, 1).unwrap();
    let values = fixed_red().with("persistence", 1u8).with("power_mode", 1u8);
    assert_eq!(request.encode_payload(&values), request.encode_payload(&values));

    let effect = Effect::random(EffectKind::KittLighting, 42);
    assert_eq!(effect.encode(), effect.encode());
    assert_eq!(effect, Effect::random(EffectKind::KittLighting, 42));
}

// ── Backlight ────────────────────────────────────────────────────────────────

#[test]
fn backlight_set_config_v2_fills_a_short_report() {
    let set_config = Backlight::create(2).unwrap().set_backlight_config.unwrap().request;
    let values = FieldValues::new()
        .with("configuration", 1u8)
        .with("options", 0x08u8)
        .with("backlight_effect", 0x02u8);
    let frame = set_config.encode(0x01, 0x0c, &values).unwrap().to_bytes();

    assert_snapshot!(format!("{:02X?}", frame), @"[10, 01, 0C, 10, 01, 08, 02]");
}
