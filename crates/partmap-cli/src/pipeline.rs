//! The `map` run: load inputs, seed the cache, map every record, write the
//! output and persist the cache.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use partmap_map::{
    BatchRunner, CacheRepository, CacheSnapshot, CancelFlag, ConfidenceScorer, EngineConfig,
    MappingEngine, ResultCache, RuleSet, SharedCache, StrategyRegistry,
};
use partmap_model::MappedComponent;
use tracing::{info, info_span, trace, warn};

use crate::input::{load_rules, read_records};
use crate::logging::{log_data_enabled, redact_value};
use crate::settings::Settings;
use crate::types::{CacheOrigin, MapRun};

/// Everything a `map` run needs.
#[derive(Debug, Clone, Default)]
pub struct MapRequest {
    pub records: PathBuf,
    pub rules: PathBuf,
    pub config: Option<PathBuf>,
    /// Output file; `None` writes to stdout.
    pub output: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub workers: Option<usize>,
    pub speculative: bool,
    pub min_acceptance: Option<f32>,
}

/// Applies command-line overrides on top of the settings file.
pub fn engine_config(settings: &Settings, request: &MapRequest) -> Result<EngineConfig> {
    let mut config = settings.engine.clone();
    if let Some(workers) = request.workers {
        config.workers = Some(workers);
    }
    if request.speculative {
        config.speculative = true;
    }
    if let Some(min_acceptance) = request.min_acceptance {
        config.min_acceptance = min_acceptance;
    }
    config.validate().context("invalid engine settings")?;
    Ok(config)
}

/// Loads the snapshot at `repository` into a fresh cache.
///
/// A missing, unreadable or stale snapshot is not fatal: the run starts with
/// an empty cache and the reason is logged.
pub fn open_cache(
    repository: Option<&CacheRepository>,
    rules: &RuleSet,
    config: &EngineConfig,
) -> (SharedCache, CacheOrigin) {
    let Some(repository) = repository else {
        return (SharedCache::new(), CacheOrigin::Disabled);
    };
    match repository.load() {
        Ok(Some(snapshot)) => {
            let saved_at = snapshot.saved_at;
            match snapshot.into_cache(rules, &ConfidenceScorer::new(config)) {
                Some(cache) => {
                    let entries = cache.len();
                    info!(entries, %saved_at, "cache snapshot loaded");
                    (cache, CacheOrigin::Seeded { entries })
                }
                None => {
                    warn!(
                        path = %repository.path().display(),
                        "cache snapshot was built from different rules, ignoring it"
                    );
                    (SharedCache::new(), CacheOrigin::Stale)
                }
            }
        }
        Ok(None) => (SharedCache::new(), CacheOrigin::Empty),
        Err(error) => {
            warn!(%error, "cache snapshot unreadable, starting empty");
            (SharedCache::new(), CacheOrigin::Stale)
        }
    }
}

pub fn run_map(request: &MapRequest) -> Result<MapRun> {
    let span = info_span!("map", records = %request.records.display());
    let _guard = span.enter();
    let start = Instant::now();

    let settings = Settings::load(request.config.as_deref())?;
    let config = engine_config(&settings, request)?;
    let rules = load_rules(&request.rules)?;
    let input = read_records(&request.records)?;
    if input.skipped > 0 {
        warn!(skipped = input.skipped, "some input rows could not be read");
    }

    let repository = request
        .cache
        .as_ref()
        .map(|path| CacheRepository::new(path.clone()));
    let (cache, cache_origin) = open_cache(repository.as_ref(), &rules, &config);
    let cache = Arc::new(cache);

    let engine = MappingEngine::new(
        rules,
        settings.catalog,
        settings.field_names,
        config,
        &StrategyRegistry::builtin(),
        cache.clone(),
    )
    .context("build mapping engine")?;
    let report = BatchRunner::new(&engine).run(&input.records, &CancelFlag::new());
    trace_outputs(&report.outputs);

    match &request.output {
        Some(path) => write_output_file(path, &report.outputs)?,
        None => write_output(io::stdout().lock(), &report.outputs).context("write output")?,
    }

    if let Some(repository) = &repository {
        let snapshot = CacheSnapshot::capture(engine.matcher().rules(), &cache);
        repository
            .save(&snapshot)
            .with_context(|| format!("save cache {}", repository.path().display()))?;
        info!(entries = snapshot.entries.len(), "cache snapshot saved");
    }

    info!(
        processed = report.summary.records_processed,
        duration_ms = start.elapsed().as_millis() as u64,
        "map finished"
    );
    Ok(MapRun {
        records_path: request.records.clone(),
        output_path: request.output.clone(),
        cache_path: request.cache.clone(),
        cache_origin,
        input_skipped: input.skipped,
        report,
    })
}

/// Writes mapped components as a pretty-printed JSON array.
pub fn write_output<W: Write>(mut writer: W, outputs: &[MappedComponent]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, outputs)?;
    writeln!(writer)?;
    writer.flush()
}

fn write_output_file(path: &Path, outputs: &[MappedComponent]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create output {}", path.display()))?;
    write_output(BufWriter::new(file), outputs)
        .with_context(|| format!("write output {}", path.display()))
}

fn trace_outputs(outputs: &[MappedComponent]) {
    if !log_data_enabled() {
        return;
    }
    for component in outputs {
        for (category, result) in component.results() {
            trace!(
                %category,
                target = redact_value(&result.target),
                strategy = %result.strategy,
                confidence = result.confidence,
                "mapped"
            );
        }
    }
}
