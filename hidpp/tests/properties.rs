//! Property-based tests for the payload codec and the effect tuples.

use hidpp::{
    feature::{
        MessageDescriptor,
        registry,
        rgb_effects::effects::{EFFECT_PARAMS_COUNT, Effect, EffectFamily},
    },
    layout::FieldValues,
};
use proptest::prelude::*;

fn descriptors() -> Vec<&'static MessageDescriptor> {
    registry::known_features()
        .into_iter()
        .flat_map(|(_, feat)| feat.table.descriptors().collect::<Vec<_>>())
        .collect()
}

/// Reads an arbitrary but valid assignment out of `raw`: every field except
/// the zero-only padding takes the bits found at its position.
fn assignment(desc: &MessageDescriptor, raw: &[u8; 16]) -> FieldValues {
    let mut values = desc.layout.decode(&raw[..desc.layout.byte_length()]).unwrap();
    values.remove("padding");
    values
}

const FAMILIES: [EffectFamily; 4] = [EffectFamily::V0V1, EffectFamily::V2, EffectFamily::V3, EffectFamily::V4];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_valid_assignments_round_trip(index in any::<prop::sample::Index>(), raw in any::<[u8; 16]>()) {
        let descs = descriptors();
        let desc = descs[index.index(descs.len())];
        let values = assignment(desc, &raw);

        let payload = desc.encode_payload(&values).unwrap();
        prop_assert_eq!(payload.len(), desc.report.payload_length());

        let decoded = desc.layout.decode(&payload).unwrap();
        for (name, value) in values.iter() {
            prop_assert_eq!(decoded.get(name), Some(value), "{}.{}", desc.name(), name);
        }
        prop_assert_eq!(desc.encode_payload(&decoded).unwrap(), payload);
    }

    #[test]
    fn prop_wrong_length_payloads_are_rejected(index in any::<prop::sample::Index>(), len in 0usize..32) {
        let descs = descriptors();
        let desc = descs[index.index(descs.len())];
        prop_assume!(len != desc.layout.byte_length());
        prop_assert!(desc.layout.decode(&vec![0u8; len]).is_err());
    }

    #[test]
    fn prop_random_effects_round_trip(family_index in 0usize..4, index in any::<prop::sample::Index>(), seed in any::<u64>()) {
        let family = FAMILIES[family_index];
        let kind = family.effects()[index.index(family.effects().len())];
        let effect = Effect::random(kind, seed);

        let tuple = effect.encode();
        prop_assert_eq!(tuple.len(), EFFECT_PARAMS_COUNT);
        prop_assert_eq!(tuple[kind.id_slot()] as u16, kind.id());
        prop_assert_eq!(Effect::decode(&tuple, family).unwrap(), effect);
    }
}
