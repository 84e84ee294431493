// Phase 10: ジョブ単位: 受付 -> 最適化 -> ラスタ化 -> PDF再構築 -> サイズ比較 -> 置換

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::merged::MergedConfig;
use crate::error::PdfSqueezeError;
use crate::notify::{NotificationSink, TracingNotifier, summarize};
use crate::pdf::optimizer::{OptimizeOutcome, optimize_file};
use crate::pdf::writer::{RebuildPage, rebuild, save_to_file};
use crate::pipeline::cancel::{CancellationToken, Checkpoint};
use crate::pipeline::job::{CompressionJob, CompressionOutcome, JobState};
use crate::pipeline::slot::{JobGuard, JobSlot};
use crate::pipeline::workspace::{TempWorkspace, parent_dir};
use crate::render::DocumentLoader;
use crate::render::rasterizer::Rasterizer;
use crate::replace::access::{FsWriteAccess, WriteAccess};
use crate::replace::safe_replace;
use crate::replace::trash::{DirectoryTrash, Trash};

const OPTIMIZED_FILE: &str = "optimized.pdf";
const CANDIDATE_FILE: &str = "candidate.pdf";

/// Drives compression jobs through the single job slot.
pub struct Compressor {
    loader: Box<dyn DocumentLoader>,
    access: Box<dyn WriteAccess>,
    trash: Option<Box<dyn Trash>>,
    notifier: Box<dyn NotificationSink>,
    slot: Arc<JobSlot>,
}

impl Compressor {
    /// Filesystem write check, trash chosen per job from its configuration,
    /// outcomes logged through `tracing`.
    pub fn new(loader: Box<dyn DocumentLoader>) -> Self {
        Self {
            loader,
            access: Box::new(FsWriteAccess),
            trash: None,
            notifier: Box::new(TracingNotifier),
            slot: Arc::new(JobSlot::new()),
        }
    }

    pub fn with_trash(mut self, trash: Box<dyn Trash>) -> Self {
        self.trash = Some(trash);
        self
    }

    pub fn with_write_access(mut self, access: Box<dyn WriteAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Handle to the job slot, e.g. for watching progress from another thread.
    pub fn slot(&self) -> Arc<JobSlot> {
        Arc::clone(&self.slot)
    }

    /// Compresses the document at `path` and reports the outcome to the
    /// notification sink.
    ///
    /// `config` is copied into the job; later changes do not affect it.
    pub fn compress(
        &self,
        path: &Path,
        config: &MergedConfig,
        cancel: &CancellationToken,
    ) -> CompressionOutcome {
        let outcome = match self.run(path, config, cancel) {
            Ok(outcome) => outcome,
            Err(e) => CompressionOutcome::failed(path, &e),
        };
        self.notifier.notify(&outcome, &summarize(&outcome));
        outcome
    }

    fn run(
        &self,
        path: &Path,
        config: &MergedConfig,
        cancel: &CancellationToken,
    ) -> crate::error::Result<CompressionOutcome> {
        let original_size = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m.len(),
            Ok(_) => return Err(PdfSqueezeError::load(format!("{} is not a file", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfSqueezeError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        self.access.ensure_writable(parent_dir(path))?;

        let guard = self
            .slot
            .try_acquire(CompressionJob::new(path, original_size, config))?;
        self.notifier.state_changed(JobState::Accepted);
        info!(
            path = %path.display(),
            original_size,
            tier = %config.quality,
            color = %config.color_mode,
            "job accepted"
        );

        // Intermediate files go before the job is reported as finished.
        let result = TempWorkspace::beside(path).and_then(|ws| {
            let result = self.run_job(&guard, &ws, cancel);
            ws.close();
            result
        });

        let terminal = match &result {
            Ok(outcome) => outcome.terminal_state(),
            Err(_) => JobState::Failed,
        };
        self.transition(&guard, terminal);
        drop(guard);
        self.notifier.state_changed(JobState::Idle);

        result
    }

    fn transition(&self, guard: &JobGuard<'_>, state: JobState) {
        guard.set_state(state);
        self.notifier.state_changed(state);
    }

    fn run_job(
        &self,
        guard: &JobGuard<'_>,
        workspace: &TempWorkspace,
        cancel: &CancellationToken,
    ) -> crate::error::Result<CompressionOutcome> {
        let job = guard.job();
        if cancel.is_cancelled() {
            return Err(PdfSqueezeError::Cancelled);
        }

        self.transition(guard, JobState::Optimizing);
        let optimized = if job.config.optimize {
            self.optimize_stage(job, workspace)
        } else {
            None
        };
        if cancel.is_cancelled() {
            return Err(PdfSqueezeError::Cancelled);
        }

        if job.quality.is_lossless() {
            self.transition(guard, JobState::Comparing);
            return match optimized {
                Some((path, size)) => self.gate(job, &path, size),
                None => Ok(CompressionOutcome::NoReduction {
                    path: job.source_path.clone(),
                    original_size: job.original_size,
                    candidate_size: None,
                }),
            };
        }

        let optimized_path = optimized.map(|(path, _)| path);
        let pages = self.rasterize_stage(guard, optimized_path.as_deref(), cancel)?;
        if pages.is_empty() {
            return Err(PdfSqueezeError::EmptyOutput);
        }

        let title = job.file_name();
        let mut doc = rebuild(pages, Some(&title));
        let candidate = workspace.file(CANDIDATE_FILE);
        let final_size = save_to_file(&mut doc, &candidate)?;

        self.transition(guard, JobState::Comparing);
        self.gate(job, &candidate, final_size)
    }

    /// Best-effort lossless pass. `None` means "continue from the original".
    fn optimize_stage(&self, job: &CompressionJob, workspace: &TempWorkspace) -> Option<(PathBuf, u64)> {
        match optimize_file(&job.source_path, &workspace.file(OPTIMIZED_FILE)) {
            Ok(OptimizeOutcome::Optimized(doc)) => Some((doc.path, doc.byte_size)),
            Ok(OptimizeOutcome::NotSmaller {
                input_size,
                output_size,
            }) => {
                info!(input_size, output_size, "optimization skipped: output not smaller");
                None
            }
            Err(e) => {
                warn!("optimization skipped: {e}");
                None
            }
        }
    }

    /// Renders every page of the optimized copy, or of the original when
    /// there is no optimized copy or it cannot be loaded.
    fn rasterize_stage(
        &self,
        guard: &JobGuard<'_>,
        optimized: Option<&Path>,
        cancel: &CancellationToken,
    ) -> crate::error::Result<Vec<RebuildPage>> {
        let job = guard.job();
        let source = match optimized.map(|path| self.loader.load(path)) {
            Some(Ok(source)) => source,
            Some(Err(e)) => {
                warn!("optimized copy not loadable, rasterizing the original: {e}");
                self.loader.load(&job.source_path)?
            }
            None => self.loader.load(&job.source_path)?,
        };
        let total = source.page_count();
        let rasterizer = Rasterizer::from_config(&job.config);
        let mut checkpoint = Checkpoint::new(cancel, job.config.yield_every);
        let mut pages = Vec::with_capacity(total as usize);

        for index in 0..total {
            checkpoint.check()?;
            self.transition(guard, JobState::Rasterizing { done: index, total });

            let rendered = source.page_boxes(index).and_then(|boxes| {
                rasterizer
                    .rasterize_page(source.as_ref(), index, &boxes, job.quality, job.color_mode)
                    .map(|image| RebuildPage { index, image, boxes })
            });
            match rendered {
                Ok(page) => pages.push(page),
                Err(e) => warn!(page = index + 1, "page omitted: {e}"),
            }

            checkpoint.page_done();
        }
        checkpoint.check()?;
        self.transition(guard, JobState::Rasterizing { done: total, total });

        debug!(rendered = pages.len(), total, "rasterization finished");
        Ok(pages)
    }

    /// Strict size gate against the size captured at accept time.
    fn gate(
        &self,
        job: &CompressionJob,
        candidate: &Path,
        final_size: u64,
    ) -> crate::error::Result<CompressionOutcome> {
        if final_size >= job.original_size {
            info!(
                original_size = job.original_size,
                final_size, "no size reduction, keeping the original"
            );
            return Ok(CompressionOutcome::NoReduction {
                path: job.source_path.clone(),
                original_size: job.original_size,
                candidate_size: Some(final_size),
            });
        }

        let replaced = match &self.trash {
            Some(trash) => safe_replace(&job.source_path, candidate, trash.as_ref())?,
            None => {
                let trash = match &job.config.trash_dir {
                    Some(dir) => DirectoryTrash::new(dir),
                    None => DirectoryTrash::for_file(&job.source_path),
                };
                safe_replace(&job.source_path, candidate, &trash)?
            }
        };

        Ok(CompressionOutcome::Reduced {
            path: replaced.path,
            original_size: job.original_size,
            final_size,
            trashed: replaced.trashed,
        })
    }
}
