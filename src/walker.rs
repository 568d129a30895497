use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// Which dataset shape produced a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Single directory of recordings with same-stem text annotations.
    Flat,
    /// `root/<date>/<participant>/` archive with per-participant metadata.
    Nested,
}

/// One recording discovered during enumeration, consumed once by a worker.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub source_path: PathBuf,
    /// Stable identifier used for failure attribution and output placement.
    pub relative_key: String,
    pub dataset_kind: DatasetKind,
    /// Sidecar to resolve metadata from, when one exists on disk.
    pub companion_metadata_path: Option<PathBuf>,
    /// Directory the normalized output lands in.
    pub dest_dir: PathBuf,
}

/// Errors that can occur while enumerating a dataset root.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Dataset root is not a directory: {0}")]
    InvalidRoot(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Enumerate `*.wav` files directly under `root` (the flat layout is known
/// to be non-recursive). Each item's key is its own filename; a same-stem
/// `.txt` annotation file is attached as the companion when present.
pub fn walk_flat(root: &Path, out_dir: &Path) -> Result<Vec<WorkItem>, WalkError> {
    let mut items = Vec::new();
    for path in read_dir_sorted(root)? {
        if !path.is_file() || !has_wav_extension(&path) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            debug!(path = %path.display(), "Skipping file with non-UTF-8 name");
            continue;
        };
        let annotation = path.with_extension("txt");
        items.push(WorkItem {
            relative_key: file_name.to_string(),
            dataset_kind: DatasetKind::Flat,
            companion_metadata_path: annotation.is_file().then_some(annotation),
            dest_dir: out_dir.to_path_buf(),
            source_path: path,
        });
    }
    Ok(items)
}

/// Enumerate `root/<date>/<participant>/*.wav`. Every item within one
/// participant directory shares that participant's `metadata.json` companion
/// and a mirrored `out_root/<date>/<participant>` destination. Non-directory
/// entries at the date or participant level are skipped.
pub fn walk_nested(root: &Path, out_root: &Path) -> Result<Vec<WorkItem>, WalkError> {
    let mut items = Vec::new();
    for date_dir in read_dir_sorted(root)? {
        if !date_dir.is_dir() {
            debug!(path = %date_dir.display(), "Skipping non-directory date entry");
            continue;
        }
        let Some(date) = dir_name(&date_dir) else {
            continue;
        };
        for participant_dir in read_dir_sorted(&date_dir)? {
            if !participant_dir.is_dir() {
                debug!(
                    path = %participant_dir.display(),
                    "Skipping non-directory participant entry"
                );
                continue;
            }
            let Some(participant) = dir_name(&participant_dir) else {
                continue;
            };
            let metadata_path = participant_dir.join("metadata.json");
            let companion = metadata_path.is_file().then_some(metadata_path);
            let dest_dir = out_root.join(&date).join(&participant);
            for path in read_dir_sorted(&participant_dir)? {
                if !path.is_file() || !has_wav_extension(&path) {
                    continue;
                }
                let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                    debug!(path = %path.display(), "Skipping file with non-UTF-8 name");
                    continue;
                };
                items.push(WorkItem {
                    relative_key: format!("{date}/{participant}/{file_name}"),
                    dataset_kind: DatasetKind::Nested,
                    companion_metadata_path: companion.clone(),
                    dest_dir: dest_dir.clone(),
                    source_path: path,
                });
            }
        }
    }
    Ok(items)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, WalkError> {
    if !dir.is_dir() {
        return Err(WalkError::InvalidRoot(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| WalkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| WalkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    // Stable enumeration keeps reruns and progress output deterministic.
    paths.sort();
    Ok(paths)
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flat_walk_pairs_wavs_with_same_stem_annotations() {
        let dir = TempDir::new().expect("temp dir");
        let out = TempDir::new().expect("out dir");
        fs::write(dir.path().join("a.wav"), b"x").expect("write");
        fs::write(dir.path().join("a.txt"), b"crackle").expect("write");
        fs::write(dir.path().join("b.wav"), b"x").expect("write");
        fs::write(dir.path().join("notes.md"), b"x").expect("write");

        let items = walk_flat(dir.path(), out.path()).expect("walk");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].relative_key, "a.wav");
        assert!(items[0].companion_metadata_path.is_some());
        assert_eq!(items[1].relative_key, "b.wav");
        assert!(items[1].companion_metadata_path.is_none());
        assert!(items.iter().all(|item| item.dest_dir == out.path()));
        assert!(
            items
                .iter()
                .all(|item| item.dataset_kind == DatasetKind::Flat)
        );
    }

    #[test]
    fn flat_walk_rejects_missing_root() {
        let out = TempDir::new().expect("out dir");
        let err = walk_flat(Path::new("/nonexistent-dataset-root"), out.path())
            .expect_err("missing root");
        assert!(matches!(err, WalkError::InvalidRoot(_)));
    }

    #[test]
    fn nested_walk_mirrors_date_and_participant() {
        let dir = TempDir::new().expect("temp dir");
        let out = TempDir::new().expect("out dir");
        let participant = dir.path().join("20210507").join("p1");
        fs::create_dir_all(&participant).expect("mkdirs");
        fs::write(participant.join("cough.wav"), b"x").expect("write");
        fs::write(participant.join("breath.wav"), b"x").expect("write");
        fs::write(participant.join("metadata.json"), b"{}").expect("write");
        // Stray file at the date level must be skipped, not fail the walk.
        fs::write(dir.path().join("README.txt"), b"x").expect("write");

        let items = walk_nested(dir.path(), out.path()).expect("walk");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].relative_key, "20210507/p1/breath.wav");
        assert_eq!(items[1].relative_key, "20210507/p1/cough.wav");
        let expected_dest = out.path().join("20210507").join("p1");
        for item in &items {
            assert_eq!(item.dest_dir, expected_dest);
            assert_eq!(item.dataset_kind, DatasetKind::Nested);
            assert_eq!(
                item.companion_metadata_path.as_deref(),
                Some(participant.join("metadata.json").as_path())
            );
        }
    }

    #[test]
    fn nested_walk_skips_participant_level_files() {
        let dir = TempDir::new().expect("temp dir");
        let out = TempDir::new().expect("out dir");
        let date = dir.path().join("20220224");
        fs::create_dir_all(&date).expect("mkdir");
        fs::write(date.join("loose.wav"), b"x").expect("write");

        let items = walk_nested(dir.path(), out.path()).expect("walk");
        assert!(items.is_empty());
    }
}
