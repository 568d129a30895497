//! Fixture helpers shared by the preparation integration tests.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Write a mono float WAV holding `seconds` of a constant amplitude.
pub fn write_constant_wav(path: &Path, sample_rate: u32, seconds: u32, amplitude: f32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).expect("create fixture wav");
    for _ in 0..(sample_rate * seconds) {
        writer.write_sample(amplitude).expect("write fixture sample");
    }
    writer.finalize().expect("finalize fixture wav");
}

/// Read all samples of a mono float WAV.
pub fn read_wav_samples(path: &Path) -> (Vec<f32>, u32) {
    let mut reader = hound::WavReader::open(path).expect("open output wav");
    let sample_rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<f32>()
        .collect::<Result<Vec<_>, _>>()
        .expect("read output samples");
    (samples, sample_rate)
}
