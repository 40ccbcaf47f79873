//! Batch execution over a fixed-size worker pool.
//!
//! Workers claim record indices from a shared counter, so a record is mapped
//! exactly once whatever the worker count. Cancellation is checked before a
//! record is claimed; a record that has been claimed is always finished.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use partmap_model::{
    ComponentRecord, IssueKind, IssueSeverity, MappedComponent, RuleCategory, Strategy,
};
use tracing::{debug, info, info_span};

use crate::cache::CacheStats;
use crate::engine::{MappingEngine, RecordOutcome};
use crate::score::{ConfidenceLevel, ConfidenceScorer};

/// Cooperative cancellation flag shared between a run and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further records are started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-category tallies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySummary {
    pub strategies: BTreeMap<Strategy, usize>,
    pub levels: BTreeMap<ConfidenceLevel, usize>,
    confidence_sum: f64,
    count: usize,
}

impl CategorySummary {
    /// Returns the mean confidence, or `None` if nothing was counted.
    #[must_use]
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.count == 0 {
            return None;
        }
        Some((self.confidence_sum / self.count as f64) as f32)
    }

    pub fn strategy_count(&self, strategy: Strategy) -> usize {
        self.strategies.get(&strategy).copied().unwrap_or(0)
    }

    pub fn level_count(&self, level: ConfidenceLevel) -> usize {
        self.levels.get(&level).copied().unwrap_or(0)
    }
}

/// End-of-run statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub records_total: usize,
    pub records_processed: usize,
    pub categories: BTreeMap<RuleCategory, CategorySummary>,
    pub issues: BTreeMap<(IssueKind, IssueSeverity), usize>,
    pub cache: CacheStats,
}

impl RunSummary {
    fn new(records_total: usize) -> Self {
        Self {
            records_total,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: &RecordOutcome, scorer: &ConfidenceScorer) {
        self.records_processed += 1;
        for (category, result) in outcome.component.results() {
            let summary = self.categories.entry(category).or_default();
            *summary.strategies.entry(result.strategy).or_insert(0) += 1;
            *summary
                .levels
                .entry(scorer.classify(result.confidence))
                .or_insert(0) += 1;
            summary.confidence_sum += f64::from(result.confidence);
            summary.count += 1;
        }
        for (_, kind) in &outcome.issues {
            *self.issues.entry((*kind, kind.severity())).or_insert(0) += 1;
        }
    }

    /// Records not started because the run was cancelled.
    pub fn records_skipped(&self) -> usize {
        self.records_total.saturating_sub(self.records_processed)
    }

    pub fn category(&self, category: RuleCategory) -> Option<&CategorySummary> {
        self.categories.get(&category)
    }

    pub fn issue_count(&self, kind: IssueKind) -> usize {
        self.issues.get(&(kind, kind.severity())).copied().unwrap_or(0)
    }

    /// Total issues of one severity.
    pub fn severity_count(&self, severity: IssueSeverity) -> usize {
        self.issues
            .iter()
            .filter(|((_, level), _)| *level == severity)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Mapped records in input order. When the run was cancelled only the
    /// records that were started are present.
    pub outputs: Vec<MappedComponent>,
    pub summary: RunSummary,
    pub cancelled: bool,
}

/// Maps many records with a shared engine.
pub struct BatchRunner<'a> {
    engine: &'a MappingEngine,
    workers: usize,
}

impl<'a> BatchRunner<'a> {
    /// Uses the engine's configured worker count.
    pub fn new(engine: &'a MappingEngine) -> Self {
        Self {
            engine,
            workers: engine.config().worker_count(),
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, records: &[ComponentRecord], cancel: &CancelFlag) -> BatchReport {
        let worker_count = self.workers.clamp(1, records.len().max(1));
        let span = info_span!("batch", records = records.len(), workers = worker_count);
        let _guard = span.enter();
        let start = Instant::now();

        let next = AtomicUsize::new(0);
        let mut outcomes: Vec<(usize, RecordOutcome)> = if worker_count == 1 {
            self.work(records, &next, cancel)
        } else {
            std::thread::scope(|scope| {
                let tasks: Vec<_> = (0..worker_count)
                    .map(|_| scope.spawn(|| self.work(records, &next, cancel)))
                    .collect();
                let mut collected = Vec::with_capacity(records.len());
                for task in tasks {
                    match task.join() {
                        Ok(local) => collected.extend(local),
                        Err(payload) => std::panic::resume_unwind(payload),
                    }
                }
                collected
            })
        };
        outcomes.sort_by_key(|(index, _)| *index);

        let scorer = self.engine.matcher().scorer();
        let mut summary = RunSummary::new(records.len());
        for (_, outcome) in &outcomes {
            summary.record(outcome, scorer);
        }
        summary.cache = self.engine.matcher().cache().stats();

        let cancelled = cancel.is_cancelled() && summary.records_processed < records.len();
        info!(
            processed = summary.records_processed,
            skipped = summary.records_skipped(),
            cancelled,
            duration_ms = start.elapsed().as_millis() as u64,
            "batch finished"
        );

        BatchReport {
            outputs: outcomes
                .into_iter()
                .map(|(_, outcome)| outcome.component)
                .collect(),
            summary,
            cancelled,
        }
    }

    fn work(
        &self,
        records: &[ComponentRecord],
        next: &AtomicUsize,
        cancel: &CancelFlag,
    ) -> Vec<(usize, RecordOutcome)> {
        let mut local = Vec::new();
        loop {
            if cancel.is_cancelled() {
                debug!("cancellation requested; worker stopping");
                break;
            }
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(record) = records.get(index) else {
                break;
            };
            local.push((index, self.engine.map_record_traced(record)));
        }
        local
    }
}
