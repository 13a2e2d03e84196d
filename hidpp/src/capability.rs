//! Per-product capability tables.
//!
//! A capability table lists which effects a concrete product offers on each
//! of its RGB clusters. Tables are loaded at runtime (usually from JSON with
//! the `serde` feature) and checked against the effect set of the
//! `RgbEffects` version the product reports.

use crate::feature::{
    FeatureError,
    VersionedFeature,
    rgb_effects::{RgbEffects, effects::EffectFamily},
};

/// The effects offered on one RGB cluster.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterCapability {
    /// The `rgb_cluster_index` of the cluster.
    pub index: u8,

    /// Effect IDs, as used in the effect parameter tuple.
    pub effects: Vec<u16>,
}

/// The capabilities of one product.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapabilityTable {
    pub product: String,

    /// The `RgbEffects` version the product implements.
    pub feature_version: u8,

    /// See [`crate::feature::rgb_effects::nv_capabilities`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub nv_capabilities: u16,

    pub clusters: Vec<ClusterCapability>,
}

impl CapabilityTable {
    /// Returns every `(cluster, effect ID)` pair the effect set of
    /// [`Self::feature_version`] does not contain.
    pub fn validate(&self) -> Result<Vec<(u8, u16)>, FeatureError> {
        let family = self.effect_family()?;

        Ok(self
            .clusters
            .iter()
            .flat_map(|cluster| cluster.effects.iter().map(move |&id| (cluster.index, id)))
            .filter(|&(_, id)| family.lookup(id).is_none())
            .collect())
    }

    fn effect_family(&self) -> Result<EffectFamily, FeatureError> {
        EffectFamily::from_version(self.feature_version).ok_or(FeatureError::UnknownVersion {
            feature: RgbEffects::NAME,
            version: self.feature_version,
        })
    }

    pub fn cluster(&self, index: u8) -> Option<&ClusterCapability> {
        self.clusters.iter().find(|cluster| cluster.index == index)
    }

    pub fn supports_effect(&self, cluster: u8, id: u16) -> bool {
        self.cluster(cluster)
            .is_some_and(|cluster| cluster.effects.contains(&id))
    }

    /// The position of effect `id` in the effect list of `cluster`, as sent
    /// in `rgb_cluster_effect_index`.
    pub fn effect_index(&self, cluster: u8, id: u16) -> Option<u8> {
        self.cluster(cluster)?
            .effects
            .iter()
            .position(|&effect| effect == id)
            .and_then(|index| u8::try_from(index).ok())
    }

    /// Whether all bits of `flags` are set in [`Self::nv_capabilities`].
    pub fn supports_nv(&self, flags: u16) -> bool {
        self.nv_capabilities & flags == flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::rgb_effects::{effects::EffectKind, nv_capabilities};

    fn table(feature_version: u8) -> CapabilityTable {
        CapabilityTable {
            product: "G915".to_owned(),
            feature_version,
            nv_capabilities: nv_capabilities::BOOT_UP_EFFECT | nv_capabilities::DEMO,
            clusters: vec![
                ClusterCapability {
                    index: 0,
                    effects: vec![EffectKind::Fixed.id(), EffectKind::ColorWave.id()],
                },
                ClusterCapability {
                    index: 1,
                    effects: vec![EffectKind::Fixed.id(), EffectKind::SnipePulseConfigurableColor.id()],
                },
            ],
        }
    }

    #[test]
    fn effects_outside_the_version_are_reported() {
        assert_eq!(table(3).validate(), Ok(vec![]));
        assert_eq!(table(4).validate(), Ok(vec![(1, EffectKind::SnipePulseConfigurableColor.id())]));
    }

    #[test]
    fn undeclared_versions_fail() {
        assert_eq!(
            table(7).validate(),
            Err(FeatureError::UnknownVersion {
                feature: "RgbEffects",
                version: 7
            })
        );
    }

    #[test]
    fn lookups() {
        let table = table(3);
        assert!(table.supports_effect(0, EffectKind::ColorWave.id()));
        assert!(!table.supports_effect(1, EffectKind::ColorWave.id()));
        assert!(!table.supports_effect(2, EffectKind::Fixed.id()));
        assert_eq!(table.effect_index(1, EffectKind::SnipePulseConfigurableColor.id()), Some(1));
        assert_eq!(table.effect_index(1, EffectKind::ColorWave.id()), None);
        assert!(table.supports_nv(nv_capabilities::DEMO));
        assert!(!table.supports_nv(nv_capabilities::DEMO | nv_capabilities::SHUTDOWN_EFFECT));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn tables_load_from_json() {
        let json = r#"{
            "product": "G502 X",
            "feature_version": 2,
            "clusters": [{ "index": 0, "effects": [1, 10] }]
        }"#;
        let table: CapabilityTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.nv_capabilities, 0);
        assert_eq!(table.cluster(0).map(|c| c.effects.len()), Some(2));
    }
}
