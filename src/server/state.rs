use crate::core::{Pipeline, ProcessingEngine};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Shared handler state. `jobs` caps concurrent processing requests at the
/// configured worker count; requests beyond it queue on the semaphore.
pub struct AppState<P: Pipeline> {
    pub engine: Arc<ProcessingEngine<P>>,
    pub jobs: Arc<Semaphore>,
    pub started_at: Instant,
}

impl<P: Pipeline> AppState<P> {
    pub fn new(engine: ProcessingEngine<P>, max_jobs: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            jobs: Arc::new(Semaphore::new(max_jobs.max(1))),
            started_at: Instant::now(),
        }
    }
}

// Manual impl: `P` itself is not `Clone`, only the shared handles are.
impl<P: Pipeline> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            jobs: Arc::clone(&self.jobs),
            started_at: self.started_at,
        }
    }
}
