use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};
use thiserror::Error;

/// Raw decoded audio in interleaved `f32` samples.
pub(crate) struct DecodedAudio {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
}

/// Errors raised while decoding a source recording.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported or corrupt audio in {path}: {message}")]
    Unsupported { path: PathBuf, message: String },
    #[error("Decoded 0 samples from {path}")]
    Empty { path: PathBuf },
}

fn unsupported(path: &Path, message: impl ToString) -> DecodeError {
    DecodeError::Unsupported {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

/// Decode up to `max_seconds` of audio into interleaved `f32` samples.
///
/// The cap bounds the packet loop so arbitrarily long recordings are never
/// held in memory in full; the caller still truncates to an exact length
/// after resampling.
pub(crate) fn decode_audio(path: &Path, max_seconds: f32) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| unsupported(path, format!("probe failed: {err}")))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| unsupported(path, "no default track"))?;
    let codec_params = &track.codec_params;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| unsupported(path, "missing sample rate"))?
        .max(1);
    let channels = codec_params
        .channels
        .ok_or_else(|| unsupported(path, "missing channel count"))?
        .count()
        .max(1) as u16;
    let max_samples = {
        let frames = (max_seconds.max(0.0) * sample_rate as f32).ceil().max(1.0);
        (frames as usize).saturating_mul(channels as usize).max(1)
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(codec_params, &DecoderOptions::default())
        .map_err(|err| unsupported(path, format!("no decoder: {err}")))?;

    let mut samples = Vec::new();
    loop {
        if samples.len() >= max_samples {
            break;
        }
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break,
            Err(err) => return Err(unsupported(path, format!("packet read failed: {err}"))),
        };
        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(Error::DecodeError(_)) => continue,
            Err(err) => return Err(unsupported(path, format!("decode failed: {err}"))),
        };
        let spec = *audio_buf.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
        if samples.len() >= max_samples {
            samples.truncate(max_samples);
            break;
        }
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}
