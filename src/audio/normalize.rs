use std::path::Path;

use super::decode::decode_audio;
use super::resample::resample_linear;
use super::{DecodeError, TARGET_DURATION_SECONDS, TARGET_SAMPLE_LEN, TARGET_SAMPLE_RATE};

/// A clip normalized to the corpus rate and length.
///
/// Invariant: `samples.len() == TARGET_SAMPLE_LEN`, always.
#[derive(Debug, Clone)]
pub struct NormalizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode `path`, downmix to mono, resample to the corpus rate, and fix the
/// length to exactly [`TARGET_SAMPLE_LEN`] by trailing zero-padding or
/// truncation.
pub fn normalize(path: &Path) -> Result<NormalizedAudio, DecodeError> {
    let decoded = decode_audio(path, TARGET_DURATION_SECONDS as f32)?;
    let mono = downmix_to_mono(&decoded.samples, decoded.channels);
    let mut samples = resample_linear(&mono, decoded.sample_rate, TARGET_SAMPLE_RATE);
    // Rounding during resampling can land a frame or two past the target.
    samples.truncate(TARGET_SAMPLE_LEN);
    samples.resize(TARGET_SAMPLE_LEN, 0.0);
    Ok(NormalizedAudio {
        samples,
        sample_rate: TARGET_SAMPLE_RATE,
    })
}

fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.iter().copied().map(sanitize_sample).collect();
    }
    let frames = samples.len() / channels;
    let mut out = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let mut sum = 0.0_f32;
        for &sample in &samples[start..start + channels] {
            sum += sanitize_sample(sample);
        }
        out.push(sum / channels as f32);
    }
    out
}

fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}
