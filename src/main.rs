//! Entry point for the corpus preparation binary.
//!
//! Usage: `rales <flat-root> <flat-out> <nested-root> <nested-out> [log-dir]`
//!
//! A missing dataset root is reported and skipped so one dataset can be
//! prepared without the other being present, matching how the raw archives
//! arrive independently.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{info, warn};

use rales::batch::BatchProgress;
use rales::logging;
use rales::pipeline::{self, PrepareOptions};

fn main() -> ExitCode {
    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let [flat_root, flat_out, nested_root, nested_out, rest @ ..] = args.as_slice() else {
        eprintln!("Usage: rales <flat-root> <flat-out> <nested-root> <nested-out> [log-dir]");
        return ExitCode::FAILURE;
    };
    let log_dir = rest.first().map(PathBuf::as_path);
    if let Err(err) = logging::init(log_dir) {
        eprintln!("Logging disabled: {err}");
    }

    let options = PrepareOptions::default();
    let mut ok = true;

    if flat_root.is_dir() {
        let mut progress = progress_logger("flat");
        match pipeline::prepare_flat(flat_root, flat_out, &options, Some(&mut progress)) {
            Ok(_) => {}
            Err(err) => {
                warn!(dataset = "flat", error = %err, "Preparation failed");
                ok = false;
            }
        }
    } else {
        warn!(dataset = "flat", root = %flat_root.display(), "Dataset root not found, skipping");
    }

    if nested_root.is_dir() {
        let mut progress = progress_logger("nested");
        match pipeline::prepare_nested(nested_root, nested_out, &options, Some(&mut progress)) {
            Ok(_) => {}
            Err(err) => {
                warn!(dataset = "nested", error = %err, "Preparation failed");
                ok = false;
            }
        }
    } else {
        warn!(
            dataset = "nested",
            root = %nested_root.display(),
            "Dataset root not found, skipping"
        );
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Log cumulative progress at roughly 5% increments to keep long batches
/// readable.
fn progress_logger(dataset: &'static str) -> impl FnMut(BatchProgress) {
    let mut last_logged = 0usize;
    move |progress: BatchProgress| {
        let step = (progress.total / 20).max(1);
        if progress.completed == progress.total || progress.completed >= last_logged + step {
            last_logged = progress.completed;
            info!(
                dataset,
                completed = progress.completed,
                total = progress.total,
                failed = progress.failed,
                "Processed"
            );
        }
    }
}
