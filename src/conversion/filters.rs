//! Filter stages and ffmpeg filter-graph serialization
//!
//! Every effect is a `FilterStage` value. Chains are plain lists of stages
//! and only become ffmpeg syntax in `FilterChain::to_ffmpeg`, so the rest of
//! the crate never concatenates filter strings by hand.

use std::fmt;

use crate::core::{Intensity, ProcessingParameters};

/// Sample rate every voice segment is normalized to
pub const VOICE_SAMPLE_RATE: u32 = 22050;
/// Gain applied to beep tones
pub const BEEP_GAIN: f32 = 0.3;
/// Gain applied to the voice before compression
pub const VOICE_BOOST: f32 = 2.0;

/// Dynamic-range curve used by `compand`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCurve {
    Gentle,
    Moderate,
    Aggressive,
}

impl CompressionCurve {
    /// ffmpeg `compand` arguments for this curve
    pub fn compand_args(&self) -> &'static str {
        match self {
            CompressionCurve::Gentle => ".3|.3:1|1:-90/-60|-60/-40|-40/-30|-20/-20:6:0:-90:0.2",
            CompressionCurve::Moderate => ".2|.2:1|1:-90/-60|-60/-40|-40/-20|-10/-10:8:0:-90:0.15",
            CompressionCurve::Aggressive => ".1|.1:1|1:-90/-60|-60/-30|-30/-20|-10/-10:12:0:-90:0.1",
        }
    }
}

/// Band-pass limits and compression for one intensity preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioPreset {
    pub highpass_hz: u32,
    pub lowpass_hz: u32,
    pub compression: CompressionCurve,
}

impl RadioPreset {
    /// Preset for an intensity, `None` when no radio shaping applies
    pub fn for_intensity(intensity: Intensity) -> Option<Self> {
        let (highpass_hz, lowpass_hz, compression) = match intensity {
            Intensity::None => return None,
            Intensity::Light => (300, 4000, CompressionCurve::Gentle),
            Intensity::Medium => (500, 3000, CompressionCurve::Moderate),
            Intensity::Heavy => (700, 2500, CompressionCurve::Aggressive),
        };
        Some(Self {
            highpass_hz,
            lowpass_hz,
            compression,
        })
    }
}

/// A single audio filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterStage {
    Resample { rate: u32 },
    Highpass { hz: u32 },
    Lowpass { hz: u32 },
    Volume { gain: f32 },
    Compand(CompressionCurve),
    /// Fixed triangular phaser
    Phaser,
    Echo { delay_ms: u32 },
    /// Fixed 30 Hz tremolo with 5% depth
    Tremolo,
    /// Force sample format, rate and layout so segments can be concatenated
    Normalize { rate: u32 },
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Resample { rate } => write!(f, "aresample={}", rate),
            FilterStage::Highpass { hz } => write!(f, "highpass=f={}", hz),
            FilterStage::Lowpass { hz } => write!(f, "lowpass=f={}", hz),
            FilterStage::Volume { gain } => write!(f, "volume={:.1}", gain),
            FilterStage::Compand(curve) => write!(f, "compand={}", curve.compand_args()),
            FilterStage::Phaser => write!(
                f,
                "aphaser=in_gain=0.8:out_gain=0.9:delay=3.0:decay=0.4:speed=0.2:type=t"
            ),
            FilterStage::Echo { delay_ms } => write!(f, "aecho=0.8:0.9:{}:0.3", delay_ms),
            FilterStage::Tremolo => write!(f, "tremolo=d=0.05:f=30"),
            FilterStage::Normalize { rate } => write!(
                f,
                "aformat=sample_fmts=s16:sample_rates={}:channel_layouts=mono",
                rate
            ),
        }
    }
}

/// Ordered list of filter stages applied to one stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    stages: Vec<FilterStage>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, stage: FilterStage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn contains(&self, predicate: impl Fn(&FilterStage) -> bool) -> bool {
        self.stages.iter().any(predicate)
    }

    /// Comma-separated ffmpeg filter syntax
    pub fn to_ffmpeg(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The radio chain for a voice line.
    ///
    /// Order: resample, highpass, lowpass, boost, compand, [phaser], [echo],
    /// tremolo. With `Intensity::None` only resample and the optional
    /// phaser/echo remain.
    pub fn voice(params: &ProcessingParameters) -> Self {
        let mut chain = Self::new().push(FilterStage::Resample {
            rate: VOICE_SAMPLE_RATE,
        });

        let preset = RadioPreset::for_intensity(params.intensity);
        if let Some(preset) = preset {
            chain = chain
                .push(FilterStage::Highpass {
                    hz: preset.highpass_hz,
                })
                .push(FilterStage::Lowpass {
                    hz: preset.lowpass_hz,
                })
                .push(FilterStage::Volume { gain: VOICE_BOOST })
                .push(FilterStage::Compand(preset.compression));
        }

        if params.phaser_enabled {
            chain = chain.push(FilterStage::Phaser);
        }
        if let Some(delay_ms) = params.echo_delay() {
            chain = chain.push(FilterStage::Echo { delay_ms });
        }

        if preset.is_some() {
            chain = chain.push(FilterStage::Tremolo);
        }

        chain
    }

    /// Chain for a beep segment: resample, attenuate, normalize
    pub fn beep() -> Self {
        Self::new()
            .push(FilterStage::Resample {
                rate: VOICE_SAMPLE_RATE,
            })
            .push(FilterStage::Volume { gain: BEEP_GAIN })
            .push(FilterStage::Normalize {
                rate: VOICE_SAMPLE_RATE,
            })
    }

    /// Voice chain followed by the concat normalization step
    pub fn voice_segment(params: &ProcessingParameters) -> Self {
        Self::voice(params).push(FilterStage::Normalize {
            rate: VOICE_SAMPLE_RATE,
        })
    }
}

/// `-filter_complex` graph joining beep, voice and beep into `[out]`.
///
/// Input 0 and 2 are the beep, input 1 is the voice line. Each segment is
/// normalized on its own before `concat` sees it.
pub fn beep_concat_graph(params: &ProcessingParameters) -> String {
    let beep = FilterChain::beep().to_ffmpeg();
    let voice = FilterChain::voice_segment(params).to_ffmpeg();
    format!(
        "[0:a]{beep}[b1];[1:a]{voice}[m];[2:a]{beep}[b2];[b1][m][b2]concat=n=3:v=0:a=1[out]"
    )
}
