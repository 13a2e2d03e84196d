use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use hidpp::{
    capability::CapabilityTable,
    feature::rgb_effects::effects::{EffectFamily, EffectKind},
};
use owo_colors::OwoColorize;
use serde_json::json;

use super::Cli;

/// Check a product's capability table against the effect set of its
/// RgbEffects version.
#[derive(Args)]
pub struct CapabilitiesCommand {
    /// A JSON capability table
    file: PathBuf,
}

impl CapabilitiesCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let text = fs::read_to_string(&self.file)
            .with_context(|| format!("could not read {}", self.file.display()))?;
        let table: CapabilityTable = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a capability table", self.file.display()))?;

        let unsupported = table.validate()?;
        let family = EffectFamily::from_version(table.feature_version);
        let name_of = |id: u16| {
            family
                .and_then(|family| family.lookup(id))
                .map(EffectKind::name)
        };

        if root.json {
            let clusters: Vec<_> = table
                .clusters
                .iter()
                .map(|cluster| {
                    json!({
                        "index": cluster.index,
                        "effects": cluster.effects.iter().map(|&id| json!({
                            "id": id,
                            "name": name_of(id),
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!(
                "{}",
                json!({
                    "product": table.product,
                    "feature_version": table.feature_version,
                    "clusters": clusters,
                    "unsupported": unsupported,
                })
            );
        } else {
            anstream::println!("{} (RgbEffects v{})", table.product.bold(), table.feature_version);
            for cluster in &table.clusters {
                anstream::println!("  cluster {}", cluster.index.bright_blue());
                for &id in &cluster.effects {
                    match name_of(id) {
                        Some(name) => anstream::println!("    {id:#04x} {name}"),
                        None => anstream::println!("    {id:#04x} {}", "unsupported".red()),
                    }
                }
            }
        }

        if !unsupported.is_empty() {
            bail!(
                "{} declares {} effect(s) outside the v{} effect set",
                table.product,
                unsupported.len(),
                table.feature_version
            );
        }

        Ok(())
    }
}
