use std::fs;

use serde::Serialize;
use tracing::warn;

use crate::walker::{DatasetKind, WorkItem};

#[derive(Serialize)]
struct FlatAnnotations<'a> {
    annotations: &'a str,
}

/// Resolve the metadata record for one work item, if any.
///
/// Nested items parse their participant's JSON sidecar; flat items wrap the
/// same-stem annotation text as `{"annotations": ...}`. Absence and parse
/// failures both yield `None`; a bad sidecar is logged but never fails the
/// item.
pub fn resolve(item: &WorkItem) -> Option<serde_json::Value> {
    let path = item.companion_metadata_path.as_deref()?;
    match item.dataset_kind {
        DatasetKind::Nested => {
            let raw = match fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(
                        key = %item.relative_key,
                        path = %path.display(),
                        error = %err,
                        "Failed to read metadata sidecar"
                    );
                    return None;
                }
            };
            match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(
                        key = %item.relative_key,
                        path = %path.display(),
                        error = %err,
                        "Malformed metadata sidecar"
                    );
                    None
                }
            }
        }
        DatasetKind::Flat => {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        key = %item.relative_key,
                        path = %path.display(),
                        error = %err,
                        "Failed to read annotation file"
                    );
                    return None;
                }
            };
            serde_json::to_value(FlatAnnotations { annotations: &text }).ok()
        }
    }
}
