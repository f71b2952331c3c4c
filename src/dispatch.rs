//! Fan-out of per-file rendering over a bounded worker pool.
//!
//! Each work item renders without holding any lock; only the push of the
//! finished report into the shared collection is serialized. The returned
//! reports are in completion order, which is not meaningful: callers sort.
//!
//! Failures are fail-fast: the first rendering error stops any work item
//! that has not started yet, in-flight items finish, and the error is
//! returned with the offending filename. No partial result escapes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::error::{ExportError, Result};
use crate::export::ExportOptions;
use crate::mapping::CoverageModel;
use crate::model::FileSummary;
use crate::render::{render_file, FileReport};

/// Caller-held handle to stop an export. Work items that have not started
/// when it fires are skipped and the export returns `ExportError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Number of hardware threads, or 1 when it cannot be determined.
#[must_use]
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Worker count for `file_count` files. `requested == 0` picks as many
/// workers as the hardware offers; either way the pool never exceeds the
/// number of files and always has at least one worker.
#[must_use]
pub fn resolve_worker_count(requested: usize, available: usize, file_count: usize) -> usize {
    let wanted = if requested == 0 { available } else { requested };
    wanted.min(file_count).max(1)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Render every file on a worker pool and collect the reports.
///
/// `files` and `summaries` are parallel slices and must be the same length.
/// Blocks until every worker has finished.
pub fn render_all(
    model: &dyn CoverageModel,
    files: &[String],
    summaries: &[FileSummary],
    options: &ExportOptions,
    cancel: &CancelToken,
) -> Result<Vec<FileReport>> {
    if files.len() != summaries.len() {
        return Err(ExportError::Config(format!(
            "{} files but {} summaries to render",
            files.len(),
            summaries.len()
        )));
    }
    if cancel.is_cancelled() {
        return Err(ExportError::Cancelled);
    }
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let workers = resolve_worker_count(options.num_threads, available_parallelism(), files.len());
    info!("Rendering {} files on {} workers", files.len(), workers);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("covexport-worker-{i}"))
        .build()?;

    let reports: Mutex<Vec<FileReport>> = Mutex::new(Vec::with_capacity(files.len()));
    let failure: Mutex<Option<ExportError>> = Mutex::new(None);
    let abort = AtomicBool::new(false);

    pool.scope(|s| {
        for (filename, summary) in files.iter().zip(summaries) {
            let (reports, failure, abort) = (&reports, &failure, &abort);
            s.spawn(move |_| {
                if abort.load(Ordering::SeqCst) || cancel.is_cancelled() {
                    return;
                }
                match render_file(model, filename, summary, options) {
                    Ok(report) => {
                        debug!("Rendered {}", filename);
                        lock(reports).push(report);
                    }
                    Err(e) => {
                        abort.store(true, Ordering::SeqCst);
                        let mut slot = lock(failure);
                        if slot.is_none() {
                            *slot = Some(ExportError::Render {
                                filename: filename.clone(),
                                source: Box::new(e),
                            });
                        }
                    }
                }
            });
        }
    });

    if let Some(e) = failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
        warn!("Export aborted: {}", e);
        return Err(e);
    }
    if cancel.is_cancelled() {
        warn!("Export cancelled after rendering");
        return Err(ExportError::Cancelled);
    }

    Ok(reports.into_inner().unwrap_or_else(PoisonError::into_inner))
}
