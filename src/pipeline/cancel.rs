use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::PdfSqueezeError;

/// Shareable cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-page checkpoint of the rasterization loop: honors cancellation and
/// yields the thread every `yield_every` pages.
#[derive(Debug)]
pub struct Checkpoint<'a> {
    token: &'a CancellationToken,
    yield_every: usize,
    pages_since_yield: usize,
    yields: usize,
}

impl<'a> Checkpoint<'a> {
    pub fn new(token: &'a CancellationToken, yield_every: usize) -> Self {
        Self {
            token,
            yield_every,
            pages_since_yield: 0,
            yields: 0,
        }
    }

    /// Fails with [`PdfSqueezeError::Cancelled`] once the token is cancelled.
    pub fn check(&self) -> crate::error::Result<()> {
        if self.token.is_cancelled() {
            Err(PdfSqueezeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Records a finished page, yielding when the interval is reached.
    pub fn page_done(&mut self) {
        if self.yield_every == 0 {
            return;
        }
        self.pages_since_yield += 1;
        if self.pages_since_yield >= self.yield_every {
            self.pages_since_yield = 0;
            self.yields += 1;
            std::thread::yield_now();
        }
    }

    /// Number of times the thread has been yielded.
    pub fn yields(&self) -> usize {
        self.yields
    }
}
