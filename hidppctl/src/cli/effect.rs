use anyhow::{Result, bail};
use clap::Args;
use hidpp::feature::rgb_effects::effects::{EFFECT_PARAMS_COUNT, Effect, EffectFamily, EffectKind, EffectParams};
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde_json::json;

use super::{Cli, hex, parse_u8};

/// Build an effect parameter tuple and check it against the effect set of a
/// feature version.
#[derive(Args)]
pub struct EffectCommand {
    /// The RgbEffects feature version
    version: u8,

    /// The effect name, e.g. `color_wave`
    effect: String,

    /// Raw tuple slots as `slot=value`, applied after the effect ID
    #[arg(value_parser = parse_slot)]
    slots: Vec<(usize, u8)>,

    /// Fill the parameters with random values
    #[arg(long, conflicts_with = "slots")]
    random: bool,

    /// Seed for --random; the system clock is used otherwise
    #[arg(long, requires = "random")]
    seed: Option<u64>,
}

impl EffectCommand {
    pub fn execute(&self, root: &Cli) -> Result<()> {
        let Some(family) = EffectFamily::from_version(self.version) else {
            bail!("RgbEffects v{} has no effect set", self.version);
        };
        let Some(kind) = EffectKind::from_name(&self.effect) else {
            bail!(
                "unknown effect `{}`, expected one of: {}",
                self.effect,
                family.effects().iter().join(", ")
            );
        };
        if !family.supports(kind) {
            bail!("{kind} is not part of the {family:?} effect set");
        }

        let (params, effect) = if self.random {
            let effect = match self.seed {
                Some(seed) => Effect::random(kind, seed),
                None => Effect::random_from_clock(kind),
            };
            (effect.encode(), effect)
        } else {
            build_raw(kind, family, &self.slots)?
        };

        if root.json {
            println!(
                "{}",
                json!({
                    "family": format!("{family:?}"),
                    "params": params,
                    "effect": effect,
                })
            );
        } else {
            anstream::println!("{} {}", kind.name().bold(), hex(&params).bright_black());
            anstream::println!("{effect:#?}");
        }

        Ok(())
    }
}

/// Builds a tuple from raw slots and checks that it still decodes as `kind`.
fn build_raw(kind: EffectKind, family: EffectFamily, slots: &[(usize, u8)]) -> Result<(EffectParams, Effect)> {
    let mut params = [0u8; EFFECT_PARAMS_COUNT];
    params[kind.id_slot()] = kind.id() as u8;
    for &(slot, value) in slots {
        if slot == kind.id_slot() {
            bail!("slot {slot} holds the effect ID of {kind}");
        }
        params[slot] = value;
    }

    let effect = Effect::decode(&params, family)?;
    if effect.kind() != kind {
        bail!("the slots turn {kind} into {}", effect.kind());
    }

    Ok((params, effect))
}

fn parse_slot(arg: &str) -> Result<(usize, u8), String> {
    let (slot, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `slot=value`, got `{arg}`"))?;
    let slot: usize = slot
        .trim()
        .parse()
        .map_err(|err| format!("invalid slot `{slot}`: {err}"))?;
    if slot >= EFFECT_PARAMS_COUNT {
        return Err(format!("slot {slot} is outside the {EFFECT_PARAMS_COUNT} byte tuple"));
    }

    Ok((slot, parse_u8(value.trim())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_bounded() {
        assert_eq!(parse_slot("4=0x02"), Ok((4, 2)));
        assert!(parse_slot("11=1").is_err());
        assert!(parse_slot("1=256").is_err());
        assert!(parse_slot("1").is_err());
    }

    #[test]
    fn raw_slots_keep_the_named_effect() {
        let (params, effect) = build_raw(EffectKind::ColorWave, EffectFamily::V2, &[(9, 0x40)]).unwrap();
        assert_eq!(params[0], 0x04);
        assert_eq!(effect.kind(), EffectKind::ColorWave);

        assert!(build_raw(EffectKind::ColorWave, EffectFamily::V2, &[(0, 0x01)]).is_err());
        assert!(build_raw(EffectKind::ColorDecomposition, EffectFamily::V2, &[(6, 0x01)]).is_err());
        assert!(build_raw(EffectKind::SnipePulseCyanPink, EffectFamily::V2, &[(0, 0x01)]).is_err());
    }
}
