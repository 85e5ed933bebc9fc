//! The termination cascade: a fixed-order pipeline of idempotent, non-
//! throwing handlers run once on a cancellation signal. Priority order
//! is encoded by registration order, not a sortable field — callers
//! register child-process kill, producer stop, CSV flush, log flush,
//! statistics append, archive close, temp-file delete, extension unload,
//! in that order.

use futures::future::BoxFuture;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminationOutcome {
    Ok,
    Failed,
}

/// A handler produces a fresh future each time it's called; the cascade
/// only ever calls it once, but the signature stays `FnMut` so a handler
/// can close over `&mut` state if it needs to.
pub type TerminationHandler = Box<dyn FnMut() -> BoxFuture<'static, TerminationOutcome> + Send>;

/// Runs its registered handlers at most once, in registration order,
/// continuing past a failing handler rather than aborting the cascade.
/// Handlers are awaited sequentially, not concurrently: a later handler
/// (archive close) often depends on an earlier one (CSV flush) having
/// already completed.
pub struct TerminationCascade {
    handlers: Vec<(&'static str, TerminationHandler)>,
    fired: bool,
}

impl TerminationCascade {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            fired: false,
        }
    }

    pub fn register(&mut self, name: &'static str, handler: TerminationHandler) {
        self.handlers.push((name, handler));
    }

    /// No-op on a second call: the cascade is idempotent regardless of
    /// how many termination signals arrive.
    pub async fn run(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        for (name, handler) in &mut self.handlers {
            if handler().await == TerminationOutcome::Failed {
                warn!(stage = *name, "termination handler reported failure, continuing cascade");
            }
        }
    }
}

impl Default for TerminationCascade {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_handlers_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut cascade = TerminationCascade::new();

        let o1 = order.clone();
        cascade.register("kill-children", Box::new(move || {
            let o1 = o1.clone();
            Box::pin(async move {
                o1.lock().unwrap().push("kill-children");
                TerminationOutcome::Ok
            })
        }));
        let o2 = order.clone();
        cascade.register("flush-csv", Box::new(move || {
            let o2 = o2.clone();
            Box::pin(async move {
                o2.lock().unwrap().push("flush-csv");
                TerminationOutcome::Ok
            })
        }));

        cascade.run().await;
        assert_eq!(*order.lock().unwrap(), vec!["kill-children", "flush-csv"]);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut cascade = TerminationCascade::new();
        let counter = calls.clone();
        cascade.register("flush-csv", Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TerminationOutcome::Ok
            })
        }));

        cascade.run().await;
        cascade.run().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_failing_handler_does_not_stop_the_cascade() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut cascade = TerminationCascade::new();
        cascade.register("flush-csv", Box::new(|| Box::pin(async { TerminationOutcome::Failed })));
        let counter = calls.clone();
        cascade.register("close-archive", Box::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TerminationOutcome::Ok
            })
        }));

        cascade.run().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
