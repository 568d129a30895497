//! Preparation of heterogeneous respiratory-sound datasets into a uniform
//! fixed-rate, fixed-length audio corpus.
//!
//! Two input shapes are supported: a flat directory of clinical recordings
//! with same-stem text annotations, and a nested `date/participant` archive
//! with per-participant JSON metadata. Both are normalized to 10-second mono
//! clips at 22 050 Hz and written out under mirrored layouts, in parallel,
//! with per-file failures collected rather than aborting the batch.

/// Audio decoding, resampling, and length normalization.
pub mod audio;
/// Parallel batch execution over discovered work items.
pub mod batch;
/// Tracing subscriber setup.
pub mod logging;
/// Sidecar metadata resolution.
pub mod metadata;
/// End-to-end dataset preparation entry points.
pub mod pipeline;
/// Dataset enumeration for both input shapes.
pub mod walker;
/// Normalized audio and sidecar persistence.
pub mod writer;
