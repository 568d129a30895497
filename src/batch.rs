use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    mpsc::{Sender, channel},
};
use std::thread;

use thiserror::Error;
use tracing::{debug, warn};

use crate::audio::DecodeError;
use crate::walker::WorkItem;
use crate::writer::{OverwritePolicy, WriteError};
use crate::{audio, metadata, writer};

/// Cumulative progress emitted after every completed item.
#[derive(Clone, Copy, Debug)]
pub struct BatchProgress {
    /// Items finished so far, successful or not.
    pub completed: usize,
    /// Items in the batch.
    pub total: usize,
    /// Items failed so far.
    pub failed: usize,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items left untouched under [`OverwritePolicy::SkipExisting`].
    pub skipped: usize,
    /// `(relative_key, error description)` in completion order.
    pub failures: Vec<(String, String)>,
}

#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

enum ItemOutcome {
    Written(PathBuf),
    Skipped,
}

/// Process every item on a bounded pool of worker threads and block until
/// all of them finish. A failing item is recorded and logged, never fatal to
/// its siblings. `progress` is invoked on the calling thread as completions
/// arrive.
pub fn run(
    items: Vec<WorkItem>,
    worker_count: Option<usize>,
    overwrite: OverwritePolicy,
    mut progress: Option<&mut dyn FnMut(BatchProgress)>,
) -> BatchResult {
    let total = items.len();
    let mut result = BatchResult {
        total,
        ..Default::default()
    };
    if total == 0 {
        return result;
    }
    let worker_count = effective_worker_count(worker_count, total);
    debug!(total, worker_count, "Starting batch");

    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let (tx, rx) = channel();

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let tx: Sender<(String, Result<ItemOutcome, String>)> = tx.clone();
            scope.spawn(move || {
                loop {
                    let item = {
                        let mut guard = match queue.lock() {
                            Ok(guard) => guard,
                            Err(_) => return,
                        };
                        guard.pop_front()
                    };
                    let Some(item) = item else {
                        break;
                    };
                    // Single call site per item so a future per-item timeout
                    // can wrap it without restructuring the pool.
                    let outcome =
                        process_item(&item, overwrite).map_err(|err| err.to_string());
                    if tx.send((item.relative_key, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut completed = 0usize;
        for (key, outcome) in rx.iter() {
            completed += 1;
            match outcome {
                Ok(ItemOutcome::Written(path)) => {
                    result.succeeded += 1;
                    debug!(key = %key, path = %path.display(), "Item written");
                }
                Ok(ItemOutcome::Skipped) => {
                    result.skipped += 1;
                    debug!(key = %key, "Output already exists, skipped");
                }
                Err(error) => {
                    result.failed += 1;
                    warn!(key = %key, error = %error, "Item failed");
                    result.failures.push((key, error));
                }
            }
            if let Some(callback) = progress.as_deref_mut() {
                callback(BatchProgress {
                    completed,
                    total,
                    failed: result.failed,
                });
            }
        }
    });

    result
}

fn effective_worker_count(requested: Option<usize>, total: usize) -> usize {
    requested
        .filter(|count| *count > 0)
        .unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1)
        })
        .min(total)
        .max(1)
}

fn process_item(item: &WorkItem, overwrite: OverwritePolicy) -> Result<ItemOutcome, ItemError> {
    if overwrite == OverwritePolicy::SkipExisting && writer::output_audio_path(item).exists() {
        return Ok(ItemOutcome::Skipped);
    }
    let metadata = metadata::resolve(item);
    let normalized = audio::normalize(&item.source_path)?;
    let path = writer::write(item, &normalized, metadata.as_ref())?;
    Ok(ItemOutcome::Written(path))
}
