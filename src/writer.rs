use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::NormalizedAudio;
use crate::walker::WorkItem;

/// Suffix appended to the audio stem for the per-file metadata sidecar.
const METADATA_SUFFIX: &str = "_metadata.json";

/// What to do when a normalized output already exists from a previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Rewrite outputs unconditionally (the historical behavior).
    #[default]
    Replace,
    /// Leave existing outputs untouched and skip the item entirely.
    SkipExisting,
}

/// Errors raised while persisting a normalized clip.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create {path}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write WAV {path}: {source}")]
    Wav { path: PathBuf, source: hound::Error },
    #[error("Failed to write metadata sidecar {path}: {source}")]
    Sidecar {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Destination audio path for an item: its original base filename under the
/// item's destination directory.
pub fn output_audio_path(item: &WorkItem) -> PathBuf {
    match item.source_path.file_name() {
        Some(name) => item.dest_dir.join(name),
        None => item.dest_dir.clone(),
    }
}

/// Persist a normalized clip (and its metadata sidecar, when resolved) under
/// the item's destination directory. Returns the audio path written.
pub fn write(
    item: &WorkItem,
    normalized: &NormalizedAudio,
    metadata: Option<&serde_json::Value>,
) -> Result<PathBuf, WriteError> {
    // Tolerates concurrent creation of the same participant directory.
    fs::create_dir_all(&item.dest_dir).map_err(|source| WriteError::CreateDir {
        path: item.dest_dir.clone(),
        source,
    })?;
    let audio_path = output_audio_path(item);
    write_wav(&audio_path, normalized)?;
    if let Some(metadata) = metadata {
        write_json_pretty(&sidecar_path(&audio_path), metadata)?;
    }
    Ok(audio_path)
}

/// Sidecar path for an audio file: extension replaced by `_metadata.json`.
pub fn sidecar_path(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("audio");
    audio_path.with_file_name(format!("{stem}{METADATA_SUFFIX}"))
}

/// Write a JSON value pretty-printed, creating or replacing `path`.
pub fn write_json_pretty(path: &Path, value: &serde_json::Value) -> Result<(), WriteError> {
    let file = File::create(path).map_err(|source| WriteError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|source| {
        WriteError::Sidecar {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_wav(path: &Path, normalized: &NormalizedAudio) -> Result<(), WriteError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: normalized.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let file = File::create(path).map_err(|source| WriteError::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let buf_writer = BufWriter::with_capacity(1024 * 1024, file);
    let mut writer =
        hound::WavWriter::new(buf_writer, spec).map_err(|source| WriteError::Wav {
            path: path.to_path_buf(),
            source,
        })?;
    for &sample in &normalized.samples {
        writer.write_sample(sample).map_err(|source| WriteError::Wav {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.finalize().map_err(|source| WriteError::Wav {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{TARGET_SAMPLE_LEN, TARGET_SAMPLE_RATE};
    use crate::walker::DatasetKind;
    use tempfile::TempDir;

    fn normalized() -> NormalizedAudio {
        NormalizedAudio {
            samples: vec![0.0; TARGET_SAMPLE_LEN],
            sample_rate: TARGET_SAMPLE_RATE,
        }
    }

    fn item(dest_dir: PathBuf) -> WorkItem {
        WorkItem {
            source_path: PathBuf::from("in/rec.wav"),
            relative_key: "rec.wav".to_string(),
            dataset_kind: DatasetKind::Flat,
            companion_metadata_path: None,
            dest_dir,
        }
    }

    #[test]
    fn writes_audio_under_original_base_name() {
        let dir = TempDir::new().expect("temp dir");
        let dest = dir.path().join("out");
        let path = write(&item(dest.clone()), &normalized(), None).expect("write");
        assert_eq!(path, dest.join("rec.wav"));
        let reader = hound::WavReader::open(&path).expect("readable wav");
        assert_eq!(reader.spec().sample_rate, TARGET_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len() as usize, TARGET_SAMPLE_LEN);
    }

    #[test]
    fn writes_sidecar_when_metadata_is_present() {
        let dir = TempDir::new().expect("temp dir");
        let dest = dir.path().to_path_buf();
        let metadata = serde_json::json!({"annotations": "wheeze 1.0 2.0"});
        write(&item(dest.clone()), &normalized(), Some(&metadata)).expect("write");
        let sidecar = dest.join("rec_metadata.json");
        let raw = std::fs::read_to_string(&sidecar).expect("sidecar exists");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(parsed, metadata);
        // Pretty-printed, not a single line.
        assert!(raw.contains('\n'));
    }

    #[test]
    fn sidecar_path_replaces_audio_extension() {
        assert_eq!(
            sidecar_path(Path::new("out/101_1b1_Al_sc.wav")),
            PathBuf::from("out/101_1b1_Al_sc_metadata.json")
        );
    }

    #[test]
    fn directory_creation_is_idempotent() {
        let dir = TempDir::new().expect("temp dir");
        let dest = dir.path().join("a").join("b");
        write(&item(dest.clone()), &normalized(), None).expect("first write");
        write(&item(dest), &normalized(), None).expect("second write");
    }
}
