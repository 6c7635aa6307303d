//! Cleanup policy generation.
//!
//! The policy is a lookup table keyed by `(NoiseRegime, Profile)`. Each row
//! lists the stage parameters literally; [`generate`] turns a row into an
//! ordered [`FilterChainConfig`]. Stage order is fixed:
//!
//! ```text
//! [pan] → highpass → [lowpass] → [equalizer…] → [afftdn] → [agate]
//!       → acompressor → [agate] → loudnorm → [alimiter]
//! ```
//!
//! The fallback policy is used when analysis fails or a caller supplies an
//! empty filter list.

use tracing::debug;

use voxclean_models::chain::DEFAULT_AUDIO_CODEC;
use voxclean_models::{
    AudioFeatures, FilterChainConfig, FilterSpec, FilterValue, NoiseRegime, Profile,
};

use crate::classify::classify;

/// Downmix expression folding stereo into one centred channel.
pub const MONO_DOWNMIX: &str = "mono|c0=0.5*c0+0.5*c1";

/// Spectral denoise (`afftdn`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Denoise {
    /// Noise reduction in dB
    pub nr: i64,
    /// Noise floor in dB
    pub nf: i64,
    /// Residual floor in dB
    pub rf: Option<i64>,
    /// Continuously learn the noise profile
    pub track_noise: bool,
}

/// Downward expander (`agate`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub threshold: f64,
    pub ratio: f64,
    pub attack_ms: i64,
    pub release_ms: i64,
}

/// Where the expander sits relative to the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePlacement {
    BeforeCompressor,
    AfterCompressor,
}

/// Dynamics compressor (`acompressor`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compressor {
    pub threshold_db: i64,
    pub ratio: f64,
    pub attack_ms: i64,
    pub release_ms: i64,
    pub makeup: f64,
}

/// Peaking equalizer band, octave width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    pub freq_hz: u32,
    pub width_octaves: f64,
    pub gain_db: f64,
}

/// Loudness normalization (`loudnorm`) target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loudness {
    /// Integrated loudness, LUFS
    pub integrated: f64,
    /// Loudness range, LU
    pub range: f64,
    /// True-peak ceiling, dBTP
    pub true_peak: f64,
}

/// Brickwall limiter (`alimiter`) parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    pub limit: f64,
    pub attack_ms: i64,
    pub release_ms: i64,
}

/// One row of the policy table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyRow {
    pub audio_bitrate: &'static str,
    pub mono_downmix: bool,
    pub highpass_hz: u32,
    pub lowpass_hz: Option<u32>,
    pub eq_bands: &'static [EqBand],
    pub denoise: Option<Denoise>,
    pub gate: Option<(Gate, GatePlacement)>,
    pub compressor: Compressor,
    pub loudness: Loudness,
    pub limiter: Option<Limiter>,
}

/// Delivery loudness shared by the Light, Aggressive and fallback policies.
pub const SPEECH_LOUDNESS: Loudness = Loudness {
    integrated: -16.0,
    range: 11.0,
    true_peak: -1.5,
};

const LIGHT_COMPRESSOR: Compressor = Compressor {
    threshold_db: -20,
    ratio: 2.5,
    attack_ms: 10,
    release_ms: 120,
    makeup: 2.0,
};

const AGGRESSIVE_COMPRESSOR: Compressor = Compressor {
    threshold_db: -24,
    ratio: 3.0,
    attack_ms: 5,
    release_ms: 80,
    makeup: 3.0,
};

const LIGHT_DENOISE: Denoise = Denoise {
    nr: 10,
    nf: -50,
    rf: None,
    track_noise: false,
};

const AGGRESSIVE_DENOISE: Denoise = Denoise {
    nr: 20,
    nf: -40,
    rf: None,
    track_noise: true,
};

const AGGRESSIVE_EXPANDER: Gate = Gate {
    threshold: 0.01,
    ratio: 2.0,
    attack_ms: 5,
    release_ms: 150,
};

const STUDIO_PRESENCE_EQ: &[EqBand] = &[
    // Take the mud out
    EqBand {
        freq_hz: 300,
        width_octaves: 1.0,
        gain_db: -1.5,
    },
    // Intelligibility
    EqBand {
        freq_hz: 1800,
        width_octaves: 1.0,
        gain_db: 3.0,
    },
    EqBand {
        freq_hz: 4200,
        width_octaves: 0.8,
        gain_db: 2.0,
    },
];

const STUDIO_EXPANDER: Gate = Gate {
    threshold: 0.02,
    ratio: 3.0,
    attack_ms: 5,
    release_ms: 200,
};

const STUDIO_COMPRESSOR: Compressor = Compressor {
    threshold_db: -22,
    ratio: 2.5,
    attack_ms: 8,
    release_ms: 90,
    makeup: 4.0,
};

const STUDIO_LOUDNESS: Loudness = Loudness {
    integrated: -18.0,
    range: 9.0,
    true_peak: -1.2,
};

const STUDIO_LIMITER: Limiter = Limiter {
    limit: 0.98,
    attack_ms: 2,
    release_ms: 60,
};

const LIGHT_BASE: PolicyRow = PolicyRow {
    audio_bitrate: "192k",
    mono_downmix: false,
    highpass_hz: 80,
    lowpass_hz: None,
    eq_bands: &[],
    denoise: None,
    gate: None,
    compressor: LIGHT_COMPRESSOR,
    loudness: SPEECH_LOUDNESS,
    limiter: None,
};

const LIGHT_NOISY: PolicyRow = PolicyRow {
    highpass_hz: 90,
    lowpass_hz: Some(14000),
    denoise: Some(LIGHT_DENOISE),
    ..LIGHT_BASE
};

const AGGRESSIVE_BASE: PolicyRow = PolicyRow {
    audio_bitrate: "256k",
    mono_downmix: false,
    highpass_hz: 100,
    lowpass_hz: None,
    eq_bands: &[],
    denoise: None,
    gate: None,
    compressor: AGGRESSIVE_COMPRESSOR,
    loudness: SPEECH_LOUDNESS,
    limiter: None,
};

const AGGRESSIVE_NOISY: PolicyRow = PolicyRow {
    highpass_hz: 120,
    lowpass_hz: Some(12000),
    denoise: Some(AGGRESSIVE_DENOISE),
    gate: Some((AGGRESSIVE_EXPANDER, GatePlacement::AfterCompressor)),
    ..AGGRESSIVE_BASE
};

const STUDIO_BASE: PolicyRow = PolicyRow {
    audio_bitrate: "192k",
    mono_downmix: true,
    highpass_hz: 80,
    lowpass_hz: Some(6000),
    eq_bands: STUDIO_PRESENCE_EQ,
    denoise: None,
    gate: Some((STUDIO_EXPANDER, GatePlacement::BeforeCompressor)),
    compressor: STUDIO_COMPRESSOR,
    loudness: STUDIO_LOUDNESS,
    limiter: Some(STUDIO_LIMITER),
};

/// Conservative regime-independent policy.
pub const FALLBACK: PolicyRow = PolicyRow {
    audio_bitrate: "192k",
    mono_downmix: false,
    highpass_hz: 80,
    lowpass_hz: None,
    eq_bands: &[],
    denoise: Some(Denoise {
        nr: 8,
        nf: -50,
        rf: None,
        track_noise: false,
    }),
    gate: None,
    compressor: Compressor {
        threshold_db: -20,
        ratio: 2.0,
        attack_ms: 10,
        release_ms: 150,
        makeup: 2.0,
    },
    loudness: SPEECH_LOUDNESS,
    limiter: None,
};

/// Look up the policy row for a regime and profile.
pub fn policy_row(regime: NoiseRegime, profile: Profile) -> PolicyRow {
    match (profile, regime) {
        (Profile::Light, NoiseRegime::Low) => LIGHT_BASE,
        (Profile::Light, NoiseRegime::Medium | NoiseRegime::High) => LIGHT_NOISY,
        (Profile::Aggressive, NoiseRegime::Low) => AGGRESSIVE_BASE,
        (Profile::Aggressive, NoiseRegime::Medium | NoiseRegime::High) => AGGRESSIVE_NOISY,
        (Profile::Studio, NoiseRegime::Low) => PolicyRow {
            denoise: Some(Denoise {
                nr: 6,
                nf: -60,
                rf: Some(-70),
                track_noise: false,
            }),
            ..STUDIO_BASE
        },
        (Profile::Studio, NoiseRegime::Medium) => PolicyRow {
            denoise: Some(Denoise {
                nr: 8,
                nf: -50,
                rf: Some(-60),
                track_noise: false,
            }),
            ..STUDIO_BASE
        },
        (Profile::Studio, NoiseRegime::High) => PolicyRow {
            denoise: Some(Denoise {
                nr: 10,
                nf: -45,
                rf: Some(-55),
                track_noise: false,
            }),
            ..STUDIO_BASE
        },
    }
}

/// Generate the cleanup configuration for a clip.
pub fn generate(features: &AudioFeatures, profile: Profile) -> FilterChainConfig {
    generate_for_regime(classify(features), profile)
}

/// Generate the cleanup configuration for an already-classified clip.
pub fn generate_for_regime(regime: NoiseRegime, profile: Profile) -> FilterChainConfig {
    let config = build_chain(&policy_row(regime, profile));
    debug!(
        regime = %regime,
        profile = %profile,
        filters = ?config.filter_names(),
        "Generated cleanup policy"
    );
    config
}

/// The fixed policy used when analysis fails or no filters were supplied.
pub fn fallback_policy() -> FilterChainConfig {
    build_chain(&FALLBACK)
}

/// Expand a policy row into an ordered filter chain.
pub fn build_chain(row: &PolicyRow) -> FilterChainConfig {
    let mut filters = Vec::new();

    if row.mono_downmix {
        filters.push(FilterSpec::new("pan").arg("args", MONO_DOWNMIX));
    }

    filters.push(FilterSpec::new("highpass").arg("f", row.highpass_hz));

    if let Some(hz) = row.lowpass_hz {
        filters.push(FilterSpec::new("lowpass").arg("f", hz));
    }

    for band in row.eq_bands {
        filters.push(equalizer(band));
    }

    if let Some(denoise) = &row.denoise {
        filters.push(afftdn(denoise));
    }

    if let Some((gate, GatePlacement::BeforeCompressor)) = &row.gate {
        filters.push(agate(gate));
    }

    filters.push(acompressor(&row.compressor));

    if let Some((gate, GatePlacement::AfterCompressor)) = &row.gate {
        filters.push(agate(gate));
    }

    filters.push(loudnorm(&row.loudness));

    if let Some(limiter) = &row.limiter {
        filters.push(alimiter(limiter));
    }

    FilterChainConfig {
        audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
        audio_bitrate: row.audio_bitrate.to_string(),
        filters,
    }
}

/// Whole numbers render as integers, everything else keeps its fraction.
fn number(value: f64) -> FilterValue {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        FilterValue::Integer(value as i64)
    } else {
        FilterValue::Float(value)
    }
}

fn equalizer(band: &EqBand) -> FilterSpec {
    FilterSpec::new("equalizer")
        .arg("f", band.freq_hz)
        .arg("width_type", "o")
        .arg("width", band.width_octaves)
        .arg("g", number(band.gain_db))
}

fn afftdn(denoise: &Denoise) -> FilterSpec {
    let mut spec = FilterSpec::new("afftdn")
        .arg("nr", denoise.nr)
        .arg("nf", denoise.nf);
    if let Some(rf) = denoise.rf {
        spec = spec.arg("rf", rf);
    }
    if denoise.track_noise {
        spec = spec.arg("tn", 1);
    }
    spec
}

fn agate(gate: &Gate) -> FilterSpec {
    FilterSpec::new("agate")
        .arg("threshold", gate.threshold)
        .arg("ratio", number(gate.ratio))
        .arg("attack", gate.attack_ms)
        .arg("release", gate.release_ms)
}

fn acompressor(compressor: &Compressor) -> FilterSpec {
    FilterSpec::new("acompressor")
        .arg("threshold", format!("{}dB", compressor.threshold_db))
        .arg("ratio", number(compressor.ratio))
        .arg("attack", compressor.attack_ms)
        .arg("release", compressor.release_ms)
        .arg("makeup", number(compressor.makeup))
}

fn loudnorm(loudness: &Loudness) -> FilterSpec {
    FilterSpec::new("loudnorm")
        .arg("I", number(loudness.integrated))
        .arg("LRA", number(loudness.range))
        .arg("TP", number(loudness.true_peak))
}

fn alimiter(limiter: &Limiter) -> FilterSpec {
    FilterSpec::new("alimiter")
        .arg("limit", limiter.limit)
        .arg("attack", limiter.attack_ms)
        .arg("release", limiter.release_ms)
}
