use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cooperative stop request, checked between batches.
///
/// Clones share the same flag, so a handle given to another
/// thread (a signal handler, a supervisor) can end a training or
/// validation sweep at the next batch boundary.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
