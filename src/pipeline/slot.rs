use std::sync::{Mutex, MutexGuard};

use crate::error::PdfSqueezeError;
use crate::pipeline::job::{CompressionJob, JobState};

#[derive(Debug)]
struct ActiveJob {
    job: CompressionJob,
    state: JobState,
}

/// The single job slot. At most one job occupies it at a time.
#[derive(Debug, Default)]
pub struct JobSlot {
    inner: Mutex<Option<ActiveJob>>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Occupies the slot with `job` in state `Accepted`.
    ///
    /// Fails with [`PdfSqueezeError::JobActive`] while another job holds it.
    pub fn try_acquire(&self, job: CompressionJob) -> crate::error::Result<JobGuard<'_>> {
        let mut inner = self.lock();
        if let Some(active) = inner.as_ref() {
            return Err(PdfSqueezeError::JobActive(active.job.source_path.clone()));
        }
        let snapshot = job.clone();
        *inner = Some(ActiveJob {
            job,
            state: JobState::Accepted,
        });
        Ok(JobGuard {
            slot: self,
            job: snapshot,
        })
    }

    pub fn state(&self) -> JobState {
        self.lock()
            .as_ref()
            .map_or(JobState::Idle, |active| active.state)
    }

    pub fn active_job(&self) -> Option<CompressionJob> {
        self.lock().as_ref().map(|active| active.job.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }
}

/// Exclusive hold on the slot. Dropping it empties the slot.
#[derive(Debug)]
pub struct JobGuard<'a> {
    slot: &'a JobSlot,
    job: CompressionJob,
}

impl JobGuard<'_> {
    pub fn job(&self) -> &CompressionJob {
        &self.job
    }

    pub fn set_state(&self, state: JobState) {
        if let Some(active) = self.slot.lock().as_mut() {
            active.state = state;
        }
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}
