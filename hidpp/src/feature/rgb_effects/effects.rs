//! The effect parameter tuple carried by `setRgbClusterEffect` and
//! `rgbClusterChangedEvent`.
//!
//! Every effect is described by 11 bytes: the effect ID and the effect's own
//! parameters at fixed slots. The slot list of each effect is a firmware
//! contract, not a natural ordering; `ColorWave` for example stores the low
//! byte of its period after the direction and intensity, and a handful of
//! effects put their ID at slot 5 or 6 instead of slot 0.
//!
//! Effect IDs are only unique within one [`EffectFamily`]: `0x0f` is
//! [`EffectKind::SnipePulseCyanPink`] for versions 2 and 3 but
//! [`EffectKind::FrameBasedSignatureEffectActive`] for version 4.

use std::{
    collections::HashMap,
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use lazy_static::lazy_static;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    bitfield::ValidationFailure,
    feature::FeatureError,
    layout::CodecError,
};

/// The number of bytes in an effect parameter tuple.
pub const EFFECT_PARAMS_COUNT: usize = 11;

/// A raw effect parameter tuple.
pub type EffectParams = [u8; EFFECT_PARAMS_COUNT];

/// The sets of effects the feature versions support.
///
/// Versions 0 and 1 share a set. Version 4 is not a superset of version 3: it
/// drops the configurable snipe/neural and smooth effects in favor of the
/// signature effects.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EffectFamily {
    V0V1,
    V2,
    V3,
    V4,
}

impl EffectFamily {
    /// The family a feature version uses, if the version is known.
    pub fn from_version(version: u8) -> Option<Self> {
        match version {
            0 | 1 => Some(Self::V0V1),
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            4 => Some(Self::V4),
            _ => None,
        }
    }

    /// The effects of the family in ID order.
    pub fn effects(self) -> &'static [EffectKind] {
        match self {
            Self::V0V1 => V0_V1_EFFECTS,
            Self::V2 => V2_EFFECTS,
            Self::V3 => V3_EFFECTS,
            Self::V4 => V4_EFFECTS,
        }
    }

    /// Looks up the effect behind an ID within this family.
    pub fn lookup(self, id: u16) -> Option<EffectKind> {
        EFFECT_MAP.get(&(self, id)).copied()
    }

    pub fn supports(self, kind: EffectKind) -> bool {
        self.lookup(kind.id()) == Some(kind)
    }
}

/// Every effect the feature knows about, across all families.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EffectKind {
    Disabled,
    Fixed,
    PulsingBreathing,
    Cycling,
    ColorWave,
    Starlight,
    LightOnPress,
    AudioVisualizer,
    BootUp,
    DemoMode,
    PulsingBreathingWaveform,
    Ripple,
    CustomOnboardStored,
    KittLighting,
    ColorDecomposition,
    SnipePulseCyanPink,
    NeuralWaveCyanPink,
    SnipePulseConfigurableColor,
    NeuralWaveConfigurableColor,
    HostStreaming,
    HsvPulsingBreathing,
    ColorCyclingConfigurableS,
    ColorWaveConfigurableS,
    RippleConfigurableS,
    SmoothStarBreathing,
    SmoothWave,
    FrameBasedSignatureEffectActive,
    FrameBasedSignatureEffectPassive,
    FormulaBasedSignatureEffectActive,
    FormulaBasedSignatureEffectPassive,
}

impl EffectKind {
    pub const ALL: [EffectKind; 30] = [
        Self::Disabled,
        Self::Fixed,
        Self::PulsingBreathing,
        Self::Cycling,
        Self::ColorWave,
        Self::Starlight,
        Self::LightOnPress,
        Self::AudioVisualizer,
        Self::BootUp,
        Self::DemoMode,
        Self::PulsingBreathingWaveform,
        Self::Ripple,
        Self::CustomOnboardStored,
        Self::KittLighting,
        Self::ColorDecomposition,
        Self::SnipePulseCyanPink,
        Self::NeuralWaveCyanPink,
        Self::SnipePulseConfigurableColor,
        Self::NeuralWaveConfigurableColor,
        Self::HostStreaming,
        Self::HsvPulsingBreathing,
        Self::ColorCyclingConfigurableS,
        Self::ColorWaveConfigurableS,
        Self::RippleConfigurableS,
        Self::SmoothStarBreathing,
        Self::SmoothWave,
        Self::FrameBasedSignatureEffectActive,
        Self::FrameBasedSignatureEffectPassive,
        Self::FormulaBasedSignatureEffectActive,
        Self::FormulaBasedSignatureEffectPassive,
    ];

    /// The numeric effect ID. Only unique within an [`EffectFamily`].
    pub fn id(self) -> u16 {
        match self {
            Self::Disabled => 0x00,
            Self::Fixed => 0x01,
            Self::PulsingBreathing => 0x02,
            Self::Cycling => 0x03,
            Self::ColorWave => 0x04,
            Self::Starlight => 0x05,
            Self::LightOnPress => 0x06,
            Self::AudioVisualizer => 0x07,
            Self::BootUp => 0x08,
            Self::DemoMode => 0x09,
            Self::PulsingBreathingWaveform => 0x0a,
            Self::Ripple => 0x0b,
            Self::CustomOnboardStored => 0x0c,
            Self::KittLighting => 0x0d,
            Self::ColorDecomposition => 0x0e,
            Self::SnipePulseCyanPink | Self::FrameBasedSignatureEffectActive => 0x0f,
            Self::NeuralWaveCyanPink | Self::FrameBasedSignatureEffectPassive => 0x10,
            Self::SnipePulseConfigurableColor => 0x11,
            Self::NeuralWaveConfigurableColor => 0x12,
            Self::HostStreaming => 0x13,
            Self::HsvPulsingBreathing => 0x14,
            Self::ColorCyclingConfigurableS => 0x15,
            Self::ColorWaveConfigurableS => 0x16,
            Self::RippleConfigurableS => 0x17,
            Self::SmoothStarBreathing | Self::FormulaBasedSignatureEffectActive => 0x18,
            Self::SmoothWave | Self::FormulaBasedSignatureEffectPassive => 0x19,
        }
    }

    /// The tuple slot holding the effect ID.
    pub fn id_slot(self) -> usize {
        match self {
            Self::SnipePulseCyanPink
            | Self::NeuralWaveCyanPink
            | Self::FrameBasedSignatureEffectActive
            | Self::FrameBasedSignatureEffectPassive => 5,
            Self::ColorDecomposition => 6,
            _ => 0,
        }
    }

    /// The snake case name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Fixed => "fixed",
            Self::PulsingBreathing => "pulsing_breathing",
            Self::Cycling => "cycling",
            Self::ColorWave => "color_wave",
            Self::Starlight => "starlight",
            Self::LightOnPress => "light_on_press",
            Self::AudioVisualizer => "audio_visualizer",
            Self::BootUp => "boot_up",
            Self::DemoMode => "demo_mode",
            Self::PulsingBreathingWaveform => "pulsing_breathing_waveform",
            Self::Ripple => "ripple",
            Self::CustomOnboardStored => "custom_onboard_stored",
            Self::KittLighting => "kitt_lighting",
            Self::ColorDecomposition => "color_decomposition",
            Self::SnipePulseCyanPink => "snipe_pulse_cyan_pink",
            Self::NeuralWaveCyanPink => "neural_wave_cyan_pink",
            Self::SnipePulseConfigurableColor => "snipe_pulse_configurable_color",
            Self::NeuralWaveConfigurableColor => "neural_wave_configurable_color",
            Self::HostStreaming => "host_streaming",
            Self::HsvPulsingBreathing => "hsv_pulsing_breathing",
            Self::ColorCyclingConfigurableS => "color_cycling_configurable_s",
            Self::ColorWaveConfigurableS => "color_wave_configurable_s",
            Self::RippleConfigurableS => "ripple_configurable_s",
            Self::SmoothStarBreathing => "smooth_star_breathing",
            Self::SmoothWave => "smooth_wave",
            Self::FrameBasedSignatureEffectActive => "frame_based_signature_effect_active",
            Self::FrameBasedSignatureEffectPassive => "frame_based_signature_effect_passive",
            Self::FormulaBasedSignatureEffectActive => "formula_based_signature_effect_active",
            Self::FormulaBasedSignatureEffectPassive => "formula_based_signature_effect_passive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const V0_V1_EFFECTS: &[EffectKind] = &[
    EffectKind::Disabled,
    EffectKind::Fixed,
    EffectKind::PulsingBreathing,
    EffectKind::Cycling,
    EffectKind::ColorWave,
    EffectKind::Starlight,
    EffectKind::LightOnPress,
    EffectKind::AudioVisualizer,
    EffectKind::BootUp,
    EffectKind::DemoMode,
    EffectKind::PulsingBreathingWaveform,
    EffectKind::Ripple,
    EffectKind::CustomOnboardStored,
];

const V2_EFFECTS: &[EffectKind] = &[
    EffectKind::Disabled,
    EffectKind::Fixed,
    EffectKind::PulsingBreathing,
    EffectKind::Cycling,
    EffectKind::ColorWave,
    EffectKind::Starlight,
    EffectKind::LightOnPress,
    EffectKind::AudioVisualizer,
    EffectKind::BootUp,
    EffectKind::DemoMode,
    EffectKind::PulsingBreathingWaveform,
    EffectKind::Ripple,
    EffectKind::CustomOnboardStored,
    EffectKind::KittLighting,
    EffectKind::ColorDecomposition,
    EffectKind::SnipePulseCyanPink,
    EffectKind::NeuralWaveCyanPink,
    EffectKind::SnipePulseConfigurableColor,
    EffectKind::NeuralWaveConfigurableColor,
    EffectKind::HostStreaming,
    EffectKind::HsvPulsingBreathing,
    EffectKind::ColorCyclingConfigurableS,
];

const V3_EFFECTS: &[EffectKind] = &[
    EffectKind::Disabled,
    EffectKind::Fixed,
    EffectKind::PulsingBreathing,
    EffectKind::Cycling,
    EffectKind::ColorWave,
    EffectKind::Starlight,
    EffectKind::LightOnPress,
    EffectKind::AudioVisualizer,
    EffectKind::BootUp,
    EffectKind::DemoMode,
    EffectKind::PulsingBreathingWaveform,
    EffectKind::Ripple,
    EffectKind::CustomOnboardStored,
    EffectKind::KittLighting,
    EffectKind::ColorDecomposition,
    EffectKind::SnipePulseCyanPink,
    EffectKind::NeuralWaveCyanPink,
    EffectKind::SnipePulseConfigurableColor,
    EffectKind::NeuralWaveConfigurableColor,
    EffectKind::HostStreaming,
    EffectKind::HsvPulsingBreathing,
    EffectKind::ColorCyclingConfigurableS,
    EffectKind::ColorWaveConfigurableS,
    EffectKind::RippleConfigurableS,
    EffectKind::SmoothStarBreathing,
    EffectKind::SmoothWave,
];

const V4_EFFECTS: &[EffectKind] = &[
    EffectKind::Disabled,
    EffectKind::Fixed,
    EffectKind::PulsingBreathing,
    EffectKind::Cycling,
    EffectKind::ColorWave,
    EffectKind::Starlight,
    EffectKind::LightOnPress,
    EffectKind::AudioVisualizer,
    EffectKind::BootUp,
    EffectKind::DemoMode,
    EffectKind::PulsingBreathingWaveform,
    EffectKind::Ripple,
    EffectKind::CustomOnboardStored,
    EffectKind::KittLighting,
    EffectKind::ColorDecomposition,
    EffectKind::FrameBasedSignatureEffectActive,
    EffectKind::FrameBasedSignatureEffectPassive,
    EffectKind::HostStreaming,
    EffectKind::HsvPulsingBreathing,
    EffectKind::ColorCyclingConfigurableS,
    EffectKind::ColorWaveConfigurableS,
    EffectKind::RippleConfigurableS,
    EffectKind::FormulaBasedSignatureEffectActive,
    EffectKind::FormulaBasedSignatureEffectPassive,
];

lazy_static! {
    static ref EFFECT_MAP: HashMap<(EffectFamily, u16), EffectKind> = [
        EffectFamily::V0V1,
        EffectFamily::V2,
        EffectFamily::V3,
        EffectFamily::V4,
    ]
    .into_iter()
    .flat_map(|family| {
        family
            .effects()
            .iter()
            .map(move |&kind| ((family, kind.id()), kind))
    })
    .collect();
}

/// The behavior of [`Effect::Fixed`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum FixedMode {
    #[default]
    Default = 0,
    RampUpDown = 1,
    NoEffect = 2,
}

/// The direction of the wave effects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum WaveDirection {
    #[default]
    Default = 0,
    Horizontal = 1,
    Vertical = 2,
    CenterOut = 3,
    Inward = 4,
    Outward = 5,
    ReverseHorizontal = 6,
    ReverseVertical = 7,
    CenterIn = 8,
}

/// The curve of [`Effect::PulsingBreathingWaveform`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum Waveform {
    #[default]
    Default = 0,
    Sine = 1,
    Square = 2,
    Triangle = 3,
    SawTooth = 4,
    SharkFin = 5,
    Exponential = 6,
}

/// The start behavior of the ripple effects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum RippleAnimation {
    #[default]
    Default = 0,
    SkipStartUpAnimation = 1,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    fn write(self, params: &mut EffectParams, slot: usize) {
        params[slot] = self.red;
        params[slot + 1] = self.green;
        params[slot + 2] = self.blue;
    }

    fn read(params: &EffectParams, slot: usize) -> Self {
        Self::new(params[slot], params[slot + 1], params[slot + 2])
    }
}

/// The parameters shared by the effects playing a stored animation at a
/// frame rate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FrameParams {
    pub frame_period: u16,
    pub intensity: u8,
}

/// The parameters shared by the two-color effects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DualColorParams {
    pub first: Rgb,
    pub second: Rgb,
    pub period: u16,
    pub intensity: u8,
}

/// An effect together with its parameters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Effect {
    Disabled,
    Fixed {
        color: Rgb,
        mode: FixedMode,
    },
    PulsingBreathing {
        color: Rgb,
        period: u8,
    },
    Cycling {
        period: u16,
        intensity: u8,
    },
    ColorWave {
        start: Rgb,
        stop: Rgb,
        period: u16,
        direction: WaveDirection,
        intensity: u8,
    },
    Starlight {
        sky: Rgb,
        star: Rgb,
    },
    LightOnPress {
        press: Rgb,
        release: Rgb,
        delay: u16,
    },
    AudioVisualizer,
    BootUp,
    DemoMode,
    PulsingBreathingWaveform {
        color: Rgb,
        period: u16,
        waveform: Waveform,
        intensity: u8,
    },
    Ripple {
        color: Rgb,
        animation: RippleAnimation,
        period: u16,
    },
    CustomOnboardStored {
        slot: u8,
        init_frame: u16,
        length: u16,
        frame_period: u16,
        intensity: u8,
    },
    KittLighting {
        foreground: Rgb,
        led_overlapped_percent: u8,
        period: u16,
        background: Rgb,
        brightness: u8,
    },
    ColorDecomposition {
        period: u16,
        brightness: u8,
    },
    SnipePulseCyanPink(FrameParams),
    NeuralWaveCyanPink(FrameParams),
    /// `first` is the background color, `second` the foreground color.
    SnipePulseConfigurableColor(DualColorParams),
    /// `first` is the background color, `second` the foreground color.
    NeuralWaveConfigurableColor(DualColorParams),
    HostStreaming,
    HsvPulsingBreathing {
        hue: u8,
        saturation: u8,
        value: u8,
        period: u16,
    },
    ColorCyclingConfigurableS {
        saturation: u8,
        period: u16,
        intensity: u8,
    },
    ColorWaveConfigurableS {
        saturation: u8,
        period: u16,
        intensity: u8,
        direction: WaveDirection,
    },
    RippleConfigurableS {
        color: Rgb,
        saturation: u8,
        animation: RippleAnimation,
        period: u16,
    },
    SmoothStarBreathing(DualColorParams),
    SmoothWave(DualColorParams),
    FrameBasedSignatureEffectActive(FrameParams),
    FrameBasedSignatureEffectPassive(FrameParams),
    FormulaBasedSignatureEffectActive(DualColorParams),
    FormulaBasedSignatureEffectPassive(DualColorParams),
}

fn write_u16(params: &mut EffectParams, msb_slot: usize, lsb_slot: usize, value: u16) {
    let [msb, lsb] = value.to_be_bytes();
    params[msb_slot] = msb;
    params[lsb_slot] = lsb;
}

fn read_u16(params: &EffectParams, msb_slot: usize, lsb_slot: usize) -> u16 {
    u16::from_be_bytes([params[msb_slot], params[lsb_slot]])
}

fn write_frame(params: &mut EffectParams, frame: FrameParams) {
    write_u16(params, 6, 7, frame.frame_period);
    params[8] = frame.intensity;
}

fn read_frame(params: &EffectParams) -> FrameParams {
    FrameParams {
        frame_period: read_u16(params, 6, 7),
        intensity: params[8],
    }
}

fn write_dual(params: &mut EffectParams, dual: DualColorParams) {
    dual.first.write(params, 1);
    dual.second.write(params, 4);
    write_u16(params, 7, 8, dual.period);
    params[9] = dual.intensity;
}

fn read_dual(params: &EffectParams) -> DualColorParams {
    DualColorParams {
        first: Rgb::read(params, 1),
        second: Rgb::read(params, 4),
        period: read_u16(params, 7, 8),
        intensity: params[9],
    }
}

/// Converts a parameter byte into one of the parameter enumerations.
fn sub_enum<E: TryFrom<u8>>(
    kind: EffectKind,
    field: &'static str,
    raw: u8,
    max: E,
) -> Result<E, FeatureError>
where
    u8: From<E>,
{
    E::try_from(raw).map_err(|_| {
        FeatureError::Codec(CodecError::FieldValidation {
            layout: kind.name(),
            field,
            reason: ValidationFailure::OutOfRange {
                value: raw as u64,
                min: 0,
                max: u8::from(max) as u64,
            },
        })
    })
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Disabled => EffectKind::Disabled,
            Self::Fixed { .. } => EffectKind::Fixed,
            Self::PulsingBreathing { .. } => EffectKind::PulsingBreathing,
            Self::Cycling { .. } => EffectKind::Cycling,
            Self::ColorWave { .. } => EffectKind::ColorWave,
            Self::Starlight { .. } => EffectKind::Starlight,
            Self::LightOnPress { .. } => EffectKind::LightOnPress,
            Self::AudioVisualizer => EffectKind::AudioVisualizer,
            Self::BootUp => EffectKind::BootUp,
            Self::DemoMode => EffectKind::DemoMode,
            Self::PulsingBreathingWaveform { .. } => EffectKind::PulsingBreathingWaveform,
            Self::Ripple { .. } => EffectKind::Ripple,
            Self::CustomOnboardStored { .. } => EffectKind::CustomOnboardStored,
            Self::KittLighting { .. } => EffectKind::KittLighting,
            Self::ColorDecomposition { .. } => EffectKind::ColorDecomposition,
            Self::SnipePulseCyanPink(_) => EffectKind::SnipePulseCyanPink,
            Self::NeuralWaveCyanPink(_) => EffectKind::NeuralWaveCyanPink,
            Self::SnipePulseConfigurableColor(_) => EffectKind::SnipePulseConfigurableColor,
            Self::NeuralWaveConfigurableColor(_) => EffectKind::NeuralWaveConfigurableColor,
            Self::HostStreaming => EffectKind::HostStreaming,
            Self::HsvPulsingBreathing { .. } => EffectKind::HsvPulsingBreathing,
            Self::ColorCyclingConfigurableS { .. } => EffectKind::ColorCyclingConfigurableS,
            Self::ColorWaveConfigurableS { .. } => EffectKind::ColorWaveConfigurableS,
            Self::RippleConfigurableS { .. } => EffectKind::RippleConfigurableS,
            Self::SmoothStarBreathing(_) => EffectKind::SmoothStarBreathing,
            Self::SmoothWave(_) => EffectKind::SmoothWave,
            Self::FrameBasedSignatureEffectActive(_) => EffectKind::FrameBasedSignatureEffectActive,
            Self::FrameBasedSignatureEffectPassive(_) => EffectKind::FrameBasedSignatureEffectPassive,
            Self::FormulaBasedSignatureEffectActive(_) => EffectKind::FormulaBasedSignatureEffectActive,
            Self::FormulaBasedSignatureEffectPassive(_) => {
                EffectKind::FormulaBasedSignatureEffectPassive
            },
        }
    }

    /// Writes the effect into its 11 byte tuple. Unused slots are zero.
    pub fn encode(&self) -> EffectParams {
        let mut p = [0u8; EFFECT_PARAMS_COUNT];
        let kind = self.kind();
        p[kind.id_slot()] = kind.id() as u8;

        match *self {
            Self::Disabled
            | Self::AudioVisualizer
            | Self::BootUp
            | Self::DemoMode
            | Self::HostStreaming => {},
            Self::Fixed { color, mode } => {
                color.write(&mut p, 1);
                p[4] = mode.into();
            },
            Self::PulsingBreathing { color, period } => {
                color.write(&mut p, 1);
                p[4] = period;
            },
            Self::Cycling { period, intensity } => {
                write_u16(&mut p, 6, 7, period);
                p[8] = intensity;
            },
            Self::ColorWave {
                start,
                stop,
                period,
                direction,
                intensity,
            } => {
                start.write(&mut p, 1);
                stop.write(&mut p, 4);
                write_u16(&mut p, 7, 10, period);
                p[8] = direction.into();
                p[9] = intensity;
            },
            Self::Starlight { sky, star } => {
                sky.write(&mut p, 1);
                star.write(&mut p, 4);
            },
            Self::LightOnPress {
                press,
                release,
                delay,
            } => {
                press.write(&mut p, 1);
                release.write(&mut p, 4);
                write_u16(&mut p, 7, 8, delay);
            },
            Self::PulsingBreathingWaveform {
                color,
                period,
                waveform,
                intensity,
            } => {
                color.write(&mut p, 1);
                write_u16(&mut p, 4, 5, period);
                p[6] = waveform.into();
                p[7] = intensity;
            },
            Self::Ripple {
                color,
                animation,
                period,
            } => {
                color.write(&mut p, 1);
                p[4] = animation.into();
                write_u16(&mut p, 5, 6, period);
            },
            Self::CustomOnboardStored {
                slot,
                init_frame,
                length,
                frame_period,
                intensity,
            } => {
                p[1] = slot;
                write_u16(&mut p, 2, 3, init_frame);
                write_u16(&mut p, 4, 5, length);
                write_u16(&mut p, 6, 7, frame_period);
                p[8] = intensity;
            },
            Self::KittLighting {
                foreground,
                led_overlapped_percent,
                period,
                background,
                brightness,
            } => {
                foreground.write(&mut p, 1);
                p[4] = led_overlapped_percent;
                write_u16(&mut p, 5, 6, period);
                background.write(&mut p, 7);
                p[10] = brightness;
            },
            Self::ColorDecomposition { period, brightness } => {
                write_u16(&mut p, 7, 8, period);
                p[9] = brightness;
            },
            Self::SnipePulseCyanPink(frame)
            | Self::NeuralWaveCyanPink(frame)
            | Self::FrameBasedSignatureEffectActive(frame)
            | Self::FrameBasedSignatureEffectPassive(frame) => write_frame(&mut p, frame),
            Self::SnipePulseConfigurableColor(dual)
            | Self::NeuralWaveConfigurableColor(dual)
            | Self::SmoothStarBreathing(dual)
            | Self::SmoothWave(dual)
            | Self::FormulaBasedSignatureEffectActive(dual)
            | Self::FormulaBasedSignatureEffectPassive(dual) => write_dual(&mut p, dual),
            Self::HsvPulsingBreathing {
                hue,
                saturation,
                value,
                period,
            } => {
                p[1] = hue;
                p[2] = saturation;
                p[3] = value;
                write_u16(&mut p, 7, 8, period);
            },
            Self::ColorCyclingConfigurableS {
                saturation,
                period,
                intensity,
            } => {
                p[2] = saturation;
                write_u16(&mut p, 7, 8, period);
                p[9] = intensity;
            },
            Self::ColorWaveConfigurableS {
                saturation,
                period,
                intensity,
                direction,
            } => {
                p[2] = saturation;
                write_u16(&mut p, 7, 8, period);
                p[9] = intensity;
                p[10] = direction.into();
            },
            Self::RippleConfigurableS {
                color,
                saturation,
                animation,
                period,
            } => {
                color.write(&mut p, 1);
                p[4] = saturation;
                p[5] = animation.into();
                write_u16(&mut p, 7, 8, period);
            },
        }

        p
    }

    /// The parameter slots 1 to 10 of the tuple with the effect ID cleared.
    ///
    /// These fill `param_1..param_10` of `setRgbClusterEffect`, whose effect
    /// is selected by the cluster's effect index instead of the ID.
    pub fn parameters(&self) -> [u8; EFFECT_PARAMS_COUNT - 1] {
        let mut p = self.encode();
        p[self.kind().id_slot()] = 0;

        let mut params = [0u8; EFFECT_PARAMS_COUNT - 1];
        params.copy_from_slice(&p[1..]);
        params
    }

    /// Locates the effect ID of a tuple and resolves it within `family`.
    ///
    /// A non-zero slot 0 is looked up among the effects anchored at slot 0,
    /// then slot 5 and slot 6 are tried. A tuple whose first seven slots are
    /// zero is [`EffectKind::Disabled`].
    pub fn kind_of(params: &EffectParams, family: EffectFamily) -> Result<EffectKind, FeatureError> {
        let Some(slot) = [0, 5, 6].into_iter().find(|&slot| params[slot] != 0) else {
            return Ok(EffectKind::Disabled);
        };

        let id = params[slot] as u16;
        family
            .lookup(id)
            .filter(|kind| kind.id_slot() == slot)
            .ok_or(FeatureError::UnsupportedEffect { family, id })
    }

    /// Decodes a tuple within the effect set of `family`.
    pub fn decode(params: &EffectParams, family: EffectFamily) -> Result<Self, FeatureError> {
        let kind = Self::kind_of(params, family)?;
        let p = params;

        Ok(match kind {
            EffectKind::Disabled => Self::Disabled,
            EffectKind::Fixed => Self::Fixed {
                color: Rgb::read(p, 1),
                mode: sub_enum(kind, "mode", p[4], FixedMode::NoEffect)?,
            },
            EffectKind::PulsingBreathing => Self::PulsingBreathing {
                color: Rgb::read(p, 1),
                period: p[4],
            },
            EffectKind::Cycling => Self::Cycling {
                period: read_u16(p, 6, 7),
                intensity: p[8],
            },
            EffectKind::ColorWave => Self::ColorWave {
                start: Rgb::read(p, 1),
                stop: Rgb::read(p, 4),
                period: read_u16(p, 7, 10),
                direction: sub_enum(kind, "direction", p[8], WaveDirection::CenterIn)?,
                intensity: p[9],
            },
            EffectKind::Starlight => Self::Starlight {
                sky: Rgb::read(p, 1),
                star: Rgb::read(p, 4),
            },
            EffectKind::LightOnPress => Self::LightOnPress {
                press: Rgb::read(p, 1),
                release: Rgb::read(p, 4),
                delay: read_u16(p, 7, 8),
            },
            EffectKind::AudioVisualizer => Self::AudioVisualizer,
            EffectKind::BootUp => Self::BootUp,
            EffectKind::DemoMode => Self::DemoMode,
            EffectKind::PulsingBreathingWaveform => Self::PulsingBreathingWaveform {
                color: Rgb::read(p, 1),
                period: read_u16(p, 4, 5),
                waveform: sub_enum(kind, "waveform", p[6], Waveform::Exponential)?,
                intensity: p[7],
            },
            EffectKind::Ripple => Self::Ripple {
                color: Rgb::read(p, 1),
                animation: sub_enum(kind, "animation", p[4], RippleAnimation::SkipStartUpAnimation)?,
                period: read_u16(p, 5, 6),
            },
            EffectKind::CustomOnboardStored => Self::CustomOnboardStored {
                slot: p[1],
                init_frame: read_u16(p, 2, 3),
                length: read_u16(p, 4, 5),
                frame_period: read_u16(p, 6, 7),
                intensity: p[8],
            },
            EffectKind::KittLighting => Self::KittLighting {
                foreground: Rgb::read(p, 1),
                led_overlapped_percent: p[4],
                period: read_u16(p, 5, 6),
                background: Rgb::read(p, 7),
                brightness: p[10],
            },
            EffectKind::ColorDecomposition => Self::ColorDecomposition {
                period: read_u16(p, 7, 8),
                brightness: p[9],
            },
            EffectKind::SnipePulseCyanPink => Self::SnipePulseCyanPink(read_frame(p)),
            EffectKind::NeuralWaveCyanPink => Self::NeuralWaveCyanPink(read_frame(p)),
            EffectKind::FrameBasedSignatureEffectActive => {
                Self::FrameBasedSignatureEffectActive(read_frame(p))
            },
            EffectKind::FrameBasedSignatureEffectPassive => {
                Self::FrameBasedSignatureEffectPassive(read_frame(p))
            },
            EffectKind::SnipePulseConfigurableColor => Self::SnipePulseConfigurableColor(read_dual(p)),
            EffectKind::NeuralWaveConfigurableColor => Self::NeuralWaveConfigurableColor(read_dual(p)),
            EffectKind::SmoothStarBreathing => Self::SmoothStarBreathing(read_dual(p)),
            EffectKind::SmoothWave => Self::SmoothWave(read_dual(p)),
            EffectKind::FormulaBasedSignatureEffectActive => {
                Self::FormulaBasedSignatureEffectActive(read_dual(p))
            },
            EffectKind::FormulaBasedSignatureEffectPassive => {
                Self::FormulaBasedSignatureEffectPassive(read_dual(p))
            },
            EffectKind::HostStreaming => Self::HostStreaming,
            EffectKind::HsvPulsingBreathing => Self::HsvPulsingBreathing {
                hue: p[1],
                saturation: p[2],
                value: p[3],
                period: read_u16(p, 7, 8),
            },
            EffectKind::ColorCyclingConfigurableS => Self::ColorCyclingConfigurableS {
                saturation: p[2],
                period: read_u16(p, 7, 8),
                intensity: p[9],
            },
            EffectKind::ColorWaveConfigurableS => Self::ColorWaveConfigurableS {
                saturation: p[2],
                period: read_u16(p, 7, 8),
                intensity: p[9],
                direction: sub_enum(kind, "direction", p[10], WaveDirection::CenterIn)?,
            },
            EffectKind::RippleConfigurableS => Self::RippleConfigurableS {
                color: Rgb::read(p, 1),
                saturation: p[4],
                animation: sub_enum(kind, "animation", p[5], RippleAnimation::SkipStartUpAnimation)?,
                period: read_u16(p, 7, 8),
            },
        })
    }

    /// Builds an effect with pseudo-random parameters for stress testing.
    ///
    /// All parameters derive from a single random number drawn from a
    /// generator seeded with `seed`, so equal seeds give equal effects.
    pub fn random(kind: EffectKind, seed: u64) -> Self {
        let number = StdRng::seed_from_u64(seed).random::<u64>();
        Self::derive(kind, number)
    }

    /// Like [`Self::random`], seeded from the system clock.
    pub fn random_from_clock(kind: EffectKind) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos() as u64);
        Self::random(kind, seed)
    }

    /// Derives every parameter of `kind` from one number.
    fn derive(kind: EffectKind, n: u64) -> Self {
        let red = (n % 0x100) as u8;
        let green = 0xff - red;
        let blue = red.abs_diff(green);
        let color = Rgb::new(red, green, blue);
        let shifted = Rgb::new(blue, red, green);
        let period = (n % 0x1_0000) as u16;
        let inverted_intensity = 0xff - ((n >> 8) & 0xff) as u8;
        let frame = FrameParams {
            frame_period: period,
            intensity: period as u8,
        };
        let dual = DualColorParams {
            first: color,
            second: shifted,
            period,
            intensity: red,
        };
        let enum_value = |max: u8| (n % (max as u64 + 1)) as u8;
        let direction = WaveDirection::try_from(enum_value(WaveDirection::CenterIn.into()))
            .unwrap_or_default();
        let animation =
            RippleAnimation::try_from(enum_value(RippleAnimation::SkipStartUpAnimation.into()))
                .unwrap_or_default();

        match kind {
            EffectKind::Disabled => Self::Disabled,
            EffectKind::Fixed => Self::Fixed {
                color,
                mode: FixedMode::try_from(enum_value(FixedMode::NoEffect.into())).unwrap_or_default(),
            },
            EffectKind::PulsingBreathing => Self::PulsingBreathing { color, period: red },
            EffectKind::Cycling => Self::Cycling {
                period,
                intensity: inverted_intensity,
            },
            EffectKind::ColorWave => Self::ColorWave {
                start: color,
                stop: shifted,
                period,
                direction,
                intensity: red,
            },
            EffectKind::Starlight => Self::Starlight {
                sky: color,
                star: shifted,
            },
            EffectKind::LightOnPress => Self::LightOnPress {
                press: color,
                release: shifted,
                delay: period,
            },
            EffectKind::AudioVisualizer => Self::AudioVisualizer,
            EffectKind::BootUp => Self::BootUp,
            EffectKind::DemoMode => Self::DemoMode,
            EffectKind::PulsingBreathingWaveform => Self::PulsingBreathingWaveform {
                color,
                period,
                waveform: Waveform::try_from(enum_value(Waveform::Exponential.into()))
                    .unwrap_or_default(),
                intensity: inverted_intensity,
            },
            EffectKind::Ripple => Self::Ripple {
                color,
                animation,
                period,
            },
            EffectKind::CustomOnboardStored => Self::CustomOnboardStored {
                slot: red,
                init_frame: period,
                length: 0xffff - period,
                frame_period: period,
                intensity: 0xff - red,
            },
            EffectKind::KittLighting => Self::KittLighting {
                foreground: color,
                led_overlapped_percent: red,
                period,
                background: shifted,
                brightness: period as u8,
            },
            EffectKind::ColorDecomposition => Self::ColorDecomposition {
                period,
                brightness: period as u8,
            },
            EffectKind::SnipePulseCyanPink => Self::SnipePulseCyanPink(frame),
            EffectKind::NeuralWaveCyanPink => Self::NeuralWaveCyanPink(frame),
            EffectKind::FrameBasedSignatureEffectActive => Self::FrameBasedSignatureEffectActive(frame),
            EffectKind::FrameBasedSignatureEffectPassive => {
                Self::FrameBasedSignatureEffectPassive(frame)
            },
            // The background blue of these two is |red - 0| in the device
            // test suites, i.e. the red value.
            EffectKind::SnipePulseConfigurableColor => {
                Self::SnipePulseConfigurableColor(background_first(dual))
            },
            EffectKind::NeuralWaveConfigurableColor => {
                Self::NeuralWaveConfigurableColor(background_first(dual))
            },
            EffectKind::SmoothStarBreathing => Self::SmoothStarBreathing(dual),
            EffectKind::SmoothWave => Self::SmoothWave(dual),
            EffectKind::FormulaBasedSignatureEffectActive => {
                Self::FormulaBasedSignatureEffectActive(dual)
            },
            EffectKind::FormulaBasedSignatureEffectPassive => {
                Self::FormulaBasedSignatureEffectPassive(dual)
            },
            EffectKind::HostStreaming => Self::HostStreaming,
            EffectKind::HsvPulsingBreathing => Self::HsvPulsingBreathing {
                hue: red,
                saturation: green,
                value: blue,
                period,
            },
            EffectKind::ColorCyclingConfigurableS => Self::ColorCyclingConfigurableS {
                saturation: red,
                period,
                intensity: 0xff - red,
            },
            EffectKind::ColorWaveConfigurableS => Self::ColorWaveConfigurableS {
                saturation: red,
                period,
                intensity: 0xff - red,
                direction,
            },
            EffectKind::RippleConfigurableS => Self::RippleConfigurableS {
                color,
                saturation: red,
                animation,
                period,
            },
        }
    }
}

fn background_first(dual: DualColorParams) -> DualColorParams {
    let background = Rgb::new(dual.first.red, dual.first.green, dual.first.red);
    DualColorParams {
        first: background,
        second: Rgb::new(background.blue, background.red, background.green),
        ..dual
    }
}
