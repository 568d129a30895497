use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{self, BatchProgress, BatchResult};
use crate::metadata;
use crate::walker::{self, WalkError, WorkItem};
use crate::writer::{self, OverwritePolicy, WriteError};

/// Configuration shared by both preparation entry points.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Worker threads for the batch; defaults to available parallelism.
    pub worker_count: Option<usize>,
    /// Behavior when outputs from a previous run already exist.
    pub overwrite: OverwritePolicy,
}

/// Errors that abort preparation before or outside the per-item batch.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Prepare a flat dataset: every `*.wav` under `input_root` is normalized
/// into `output_dir`, with `{"annotations": ...}` sidecars for recordings
/// that have a same-stem `.txt` file.
pub fn prepare_flat(
    input_root: &Path,
    output_dir: &Path,
    options: &PrepareOptions,
    progress: Option<&mut dyn FnMut(BatchProgress)>,
) -> Result<BatchResult, PrepareError> {
    let items = walker::walk_flat(input_root, output_dir)?;
    info!(
        root = %input_root.display(),
        files = items.len(),
        "Preparing flat dataset"
    );
    let result = batch::run(items, options.worker_count, options.overwrite, progress);
    report(&result, "flat");
    Ok(result)
}

/// Prepare a nested `date/participant` dataset into a mirrored output tree.
/// Each participant's metadata is propagated to every clip's sidecar and
/// additionally copied once per participant directory, as downstream tooling
/// expects to find it there.
pub fn prepare_nested(
    input_root: &Path,
    output_root: &Path,
    options: &PrepareOptions,
    progress: Option<&mut dyn FnMut(BatchProgress)>,
) -> Result<BatchResult, PrepareError> {
    let items = walker::walk_nested(input_root, output_root)?;
    info!(
        root = %input_root.display(),
        files = items.len(),
        "Preparing nested dataset"
    );
    copy_participant_metadata(&items, options.overwrite)?;
    let result = batch::run(items, options.worker_count, options.overwrite, progress);
    report(&result, "nested");
    Ok(result)
}

/// Write each participant's parsed metadata once to
/// `<dest_dir>/metadata.json`, for every participant that has one.
fn copy_participant_metadata(
    items: &[WorkItem],
    overwrite: OverwritePolicy,
) -> Result<(), PrepareError> {
    let mut seen: HashSet<&Path> = HashSet::new();
    for item in items {
        if item.companion_metadata_path.is_none() || !seen.insert(item.dest_dir.as_path()) {
            continue;
        }
        let dest = item.dest_dir.join("metadata.json");
        if overwrite == OverwritePolicy::SkipExisting && dest.exists() {
            continue;
        }
        let Some(value) = metadata::resolve(item) else {
            continue;
        };
        fs::create_dir_all(&item.dest_dir).map_err(|source| PrepareError::CreateDir {
            path: item.dest_dir.clone(),
            source,
        })?;
        writer::write_json_pretty(&dest, &value)?;
    }
    Ok(())
}

fn report(result: &BatchResult, dataset: &str) {
    info!(
        dataset,
        total = result.total,
        succeeded = result.succeeded,
        failed = result.failed,
        skipped = result.skipped,
        "Batch complete"
    );
    if result.total > 0 && result.succeeded == 0 && result.skipped == 0 {
        warn!(dataset, total = result.total, "No items were prepared successfully");
    }
}
