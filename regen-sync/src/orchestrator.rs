//! Whole-run orchestration.
//!
//! ```text
//! Idle → Planning → Pruning → Generating → Synchronized
//!                                       ↘ Failed
//! ```
//!
//! Pruning completes before any unit starts. Units then run on a bounded
//! pool of scoped worker threads fed through a crossbeam channel. A render
//! failure is recorded and siblings keep going; a synchronization failure
//! cancels every unit that has not started yet.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use regen_core::{GenerationUnit, Layout};
use regen_renderer::Renderer;

use crate::error::{io_err, GenerateError, SyncError};
use crate::generator::{self, GeneratedFile};
use crate::plan;
use crate::pruner::{self, PruneReport, PruneWarning};
use crate::synchronizer::SyncOutcome;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Keep source-location comments in outputs.
    pub annotate: bool,
    /// Worker count override; falls back to the layout, then to available parallelism.
    pub jobs: Option<usize>,
}

/// Where a run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Synchronized,
    Failed,
}

#[derive(Debug)]
pub enum UnitOutcome {
    Generated(GeneratedFile),
    Failed(GenerateError),
    /// Never started because an earlier unit failed fatally.
    Cancelled,
}

#[derive(Debug)]
pub struct UnitReport {
    pub unit: GenerationUnit,
    pub outcome: UnitOutcome,
}

#[derive(Debug)]
pub struct RunResult {
    /// One report per planned unit, in plan order.
    pub reports: Vec<UnitReport>,
    pub removed: Vec<PathBuf>,
    pub prune_warnings: Vec<PruneWarning>,
    pub jobs: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn state(&self) -> RunState {
        if self.is_success() {
            RunState::Synchronized
        } else {
            RunState::Failed
        }
    }

    /// No unit failed or was cancelled. Prune warnings do not count.
    pub fn is_success(&self) -> bool {
        self.reports
            .iter()
            .all(|r| matches!(r.outcome, UnitOutcome::Generated(_)))
    }

    pub fn generated(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            UnitOutcome::Generated(file) => Some(file),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&GenerationUnit, &GenerateError)> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            UnitOutcome::Failed(err) => Some((&r.unit, err)),
            _ => None,
        })
    }

    pub fn changed(&self) -> usize {
        self.generated()
            .filter(|f| f.outcome == SyncOutcome::Changed)
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.generated()
            .filter(|f| f.outcome == SyncOutcome::Unchanged)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn cancelled(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, UnitOutcome::Cancelled))
            .count()
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Generate every output in `layout` and bring the destinations in sync.
///
/// Errors are reserved for problems that stop the run before generation
/// (bad layout, missing renderer, unreadable destination). Per-unit
/// failures are reported inside the [`RunResult`].
pub fn run(
    layout: &Layout,
    renderer: &dyn Renderer,
    options: &RunOptions,
) -> Result<RunResult, SyncError> {
    let started_at = Utc::now();
    renderer.preflight()?;

    tracing::debug!("planning {} group(s)", layout.groups.len());
    let plan = plan::plan(layout)?;

    tracing::debug!("pruning {} destination(s)", plan.prune_targets.len());
    let mut pruned = PruneReport::default();
    for target in &plan.prune_targets {
        pruned.merge(pruner::prune(target)?);
    }

    let jobs = worker_count(options.jobs.or(layout.jobs), plan.units.len());
    tracing::debug!("generating {} unit(s) on {jobs} worker(s)", plan.units.len());

    let scratch = tempfile::Builder::new()
        .prefix("regen-")
        .tempdir()
        .map_err(|e| io_err(std::env::temp_dir(), e))?;
    let outcomes = dispatch(&plan.units, jobs, |index, unit| {
        generator::generate(
            unit,
            &scratch.path().join(index.to_string()),
            renderer,
            options.annotate,
        )
    });

    let reports = plan
        .units
        .into_iter()
        .zip(outcomes)
        .map(|(unit, outcome)| UnitReport { unit, outcome })
        .collect();

    Ok(RunResult {
        reports,
        removed: pruned.removed,
        prune_warnings: pruned.warnings,
        jobs,
        started_at,
        finished_at: Utc::now(),
    })
}

fn worker_count(requested: Option<usize>, units: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.unwrap_or(available).clamp(1, units.max(1))
}

/// Run `work` for every unit on `jobs` threads; outcomes come back in unit order.
fn dispatch<F>(units: &[GenerationUnit], jobs: usize, work: F) -> Vec<UnitOutcome>
where
    F: Fn(usize, &GenerationUnit) -> Result<GeneratedFile, GenerateError> + Sync,
{
    let (work_tx, work_rx) = crossbeam_channel::unbounded::<(usize, &GenerationUnit)>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, UnitOutcome)>();
    for item in units.iter().enumerate() {
        // The receiver is alive until the scope below ends.
        let _ = work_tx.send(item);
    }
    drop(work_tx);

    let cancelled = AtomicBool::new(false);
    std::thread::scope(|scope| {
        for worker in 0..jobs {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let cancelled = &cancelled;
            let work = &work;
            scope.spawn(move || {
                for (index, unit) in work_rx.iter() {
                    let outcome = if cancelled.load(Ordering::SeqCst) {
                        UnitOutcome::Cancelled
                    } else {
                        match work(index, unit) {
                            Ok(file) => UnitOutcome::Generated(file),
                            Err(err) => {
                                tracing::debug!("worker {worker}: {err}");
                                if err.is_fatal() {
                                    cancelled.store(true, Ordering::SeqCst);
                                }
                                UnitOutcome::Failed(err)
                            }
                        }
                    };
                    let _ = result_tx.send((index, outcome));
                }
            });
        }
    });
    drop(result_tx);

    let mut outcomes: Vec<(usize, UnitOutcome)> = result_rx.iter().collect();
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use regen_core::{GroupName, OutputName, TemplateSource};
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    fn units(n: usize) -> Vec<GenerationUnit> {
        (0..n)
            .map(|i| GenerationUnit {
                group: GroupName::from("Core"),
                source: TemplateSource::expanded(
                    Path::new("/src/T.gyb"),
                    OutputName::from(format!("Out{i}.swift")),
                    vec![],
                ),
                destination_dir: PathBuf::from("/gen"),
            })
            .collect()
    }

    fn file(unit: &GenerationUnit) -> GeneratedFile {
        GeneratedFile {
            output_name: unit.source.output_name.clone(),
            destination: unit.destination_path(),
            content: Vec::new(),
            checksum: String::new(),
            annotated: false,
            outcome: SyncOutcome::Unchanged,
            tool_output: String::new(),
        }
    }

    #[test]
    fn worker_count_is_clamped() {
        assert_eq!(worker_count(Some(8), 3), 3);
        assert_eq!(worker_count(Some(2), 10), 2);
        assert_eq!(worker_count(Some(4), 0), 1);
        assert!(worker_count(None, 100) >= 1);
    }

    #[test]
    fn outcomes_keep_unit_order() {
        let units = units(20);
        let outcomes = dispatch(&units, 4, |_, unit| Ok(file(unit)));
        let names: Vec<String> = outcomes
            .iter()
            .map(|o| match o {
                UnitOutcome::Generated(f) => f.output_name.0.clone(),
                other => panic!("expected generated, got {other:?}"),
            })
            .collect();
        let expected: Vec<String> = (0..20).map(|i| format!("Out{i}.swift")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn render_failure_does_not_stop_siblings() {
        let units = units(5);
        let outcomes = dispatch(&units, 2, |index, unit| {
            if index == 2 {
                Err(GenerateError::Render {
                    template: unit.source.label(),
                    source: regen_renderer::RenderError::Template {
                        path: unit.source.path.clone(),
                        detail: "bad".to_string(),
                    },
                })
            } else {
                Ok(file(unit))
            }
        });
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Failed(_)))
            .count();
        let generated = outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Generated(_)))
            .count();
        assert_eq!((failed, generated), (1, 4));
    }

    #[test]
    fn sync_failure_cancels_pending_units() {
        let units = units(6);
        let started = AtomicUsize::new(0);
        let outcomes = dispatch(&units, 1, |index, unit| {
            started.fetch_add(1, Ordering::SeqCst);
            if index == 1 {
                Err(GenerateError::Sync {
                    template: unit.source.label(),
                    source: io_err(
                        unit.destination_path(),
                        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                    ),
                })
            } else {
                Ok(file(unit))
            }
        });
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert!(matches!(outcomes[0], UnitOutcome::Generated(_)));
        assert!(matches!(outcomes[1], UnitOutcome::Failed(_)));
        assert!(outcomes[2..]
            .iter()
            .all(|o| matches!(o, UnitOutcome::Cancelled)));
    }
}
