use std::path::PathBuf;

use partmap_map::BatchReport;

/// Where the run's cache came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// No `--cache` file was given.
    Disabled,
    /// The cache file did not exist yet.
    Empty,
    /// Seeded from a compatible snapshot.
    Seeded { entries: usize },
    /// A snapshot existed but was unreadable or built from other rules.
    Stale,
}

#[derive(Debug)]
pub struct MapRun {
    pub records_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub cache_origin: CacheOrigin,
    pub input_skipped: usize,
    pub report: BatchReport,
}
