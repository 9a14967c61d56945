//! Stage narration.
//!
//! The geometry code never logs directly. Each builder reports
//! `(stage, subject, count)` to a [`ProgressObserver`]; the pipeline's
//! default [`TracingObserver`] turns those into `tracing` events and tests
//! use [`NullObserver`] or a recording observer.

use std::fmt;

use tracing::{debug, info};

/// Pipeline milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Features loaded from a dataset
    DatasetLoaded,
    /// Countries found around the target
    Neighbors,
    /// Border pieces left after clipping one country
    BorderClipped,
    /// Border lines after dedup and merge
    BordersMerged,
    /// Border lines after orphan removal
    BorderOrphans,
    /// River lines after clip, union and merge
    Rivers,
    /// Lake polygons after clip and union
    Lakes,
    /// River lines after cutting out lakes
    RiversTrimmed,
    /// River lines after orphan removal
    RiverOrphans,
    /// Track samples read
    TrackPoints,
    /// Trail pieces inside the drawable area
    TrailClipped,
    /// Kerf polygons built for a layer
    Kerf,
    /// Combined engrave polygons
    Engrave,
    /// A document was written
    Document,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::DatasetLoaded => "dataset",
            Stage::Neighbors => "neighbors",
            Stage::BorderClipped => "border clip",
            Stage::BordersMerged => "border merge",
            Stage::BorderOrphans => "border orphans",
            Stage::Rivers => "rivers",
            Stage::Lakes => "lakes",
            Stage::RiversTrimmed => "lake trim",
            Stage::RiverOrphans => "river orphans",
            Stage::TrackPoints => "track",
            Stage::TrailClipped => "trail clip",
            Stage::Kerf => "kerf",
            Stage::Engrave => "engrave",
            Stage::Document => "document",
        }
    }

    /// Per-feature stages are detail; the rest are stage summaries.
    fn is_detail(&self) -> bool {
        matches!(self, Stage::DatasetLoaded | Stage::BorderClipped)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receiver for pipeline progress.
pub trait ProgressObserver {
    fn report(&self, stage: Stage, subject: &str, count: usize);
}

/// Logs every report through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn report(&self, stage: Stage, subject: &str, count: usize) {
        if stage.is_detail() {
            debug!(stage = %stage, subject, count, "{}: {} ({})", stage, subject, count);
        } else {
            info!(stage = %stage, subject, count, "{}: {} ({})", stage, subject, count);
        }
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn report(&self, _stage: Stage, _subject: &str, _count: usize) {}
}
