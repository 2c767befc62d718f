use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Delay between the last resize/move notification of a burst and the geometry sample.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(100);

/// Single-slot cancellable timer: scheduling replaces whatever was pending.
///
/// Aborting a tokio task only takes effect at its next await point, so the fired callback is
/// handed its generation and must confirm it with [`Debouncer::take_if_current`] under the same
/// lock that guards the debouncer before doing any work.
#[derive(Debug, Default)]
pub struct Debouncer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(&mut self, runtime: &Handle, delay: Duration, fire: F)
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            fire(generation).await;
        }));
    }

    /// Invalidates and aborts the pending timer, if any.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Claims the firing for `generation`; false when it was cancelled or replaced meanwhile.
    pub fn take_if_current(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || self.generation != generation {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
