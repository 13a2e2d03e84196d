//! Maintains a registry of the HID++2.0 features this crate has version
//! tables for.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::feature::{
    FeatureError,
    VersionEntry,
    VersionTable,
    VersionedFeature,
    backlight::Backlight,
    rgb_effects::RgbEffects,
};

/// Represents a known HID++2.0 device feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnownFeature {
    /// The name of the feature.
    /// This is usually a slightly modified version of the name found in
    /// Logitech's documentation.
    pub name: &'static str,

    /// The message types of every declared version.
    pub table: &'static VersionTable,
}

/// Looks up a feature by its ID.
pub fn lookup(feature_id: u16) -> Option<KnownFeature> {
    KNOWN_FEATURES.get(&feature_id).copied()
}

/// Looks up a feature by its name, ignoring ASCII case.
pub fn lookup_name(name: &str) -> Option<(u16, KnownFeature)> {
    KNOWN_FEATURES
        .iter()
        .find(|(_, feat)| feat.name.eq_ignore_ascii_case(name))
        .map(|(&id, &feat)| (id, feat))
}

/// Looks up the entry of a specific feature ID and version combination.
pub fn lookup_version(feature_id: u16, feature_version: u8) -> Result<&'static VersionEntry, FeatureError> {
    lookup(feature_id)
        .ok_or(FeatureError::UnknownFeature(feature_id))?
        .table
        .entry(feature_version)
}

/// All known features, ordered by ID.
pub fn known_features() -> Vec<(u16, KnownFeature)> {
    let mut features: Vec<_> = KNOWN_FEATURES.iter().map(|(&id, &feat)| (id, feat)).collect();
    features.sort_by_key(|(id, _)| *id);
    features
}

fn known<F: VersionedFeature>() -> (u16, KnownFeature) {
    (F::ID, KnownFeature {
        name: F::NAME,
        table: F::table(),
    })
}

lazy_static! {
    static ref KNOWN_FEATURES: HashMap<u16, KnownFeature> =
        HashMap::from([known::<Backlight>(), known::<RgbEffects>()]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_are_registered_under_their_table_id() {
        for (id, feat) in known_features() {
            assert_eq!(feat.table.feature_id, id);
            assert_eq!(feat.table.name, feat.name);
        }
        assert_eq!(lookup(0x8071).map(|f| f.name), Some("RgbEffects"));
        assert_eq!(lookup_name("backlight").map(|(id, _)| id), Some(0x1982));
    }

    #[test]
    fn lookup_version_reports_what_is_missing() {
        assert_eq!(lookup_version(0x8071, 4).unwrap().main.name, "RgbEffectsV4");
        assert_eq!(lookup_version(0x1234, 0), Err(FeatureError::UnknownFeature(0x1234)));
        assert_eq!(
            lookup_version(0x1982, 0),
            Err(FeatureError::UnknownVersion {
                feature: "Backlight",
                version: 0
            })
        );
    }
}
