//! Reversible environmental side-effects the orchestrator may apply for
//! the duration of a run: process priority, sleep inhibition, the
//! Windows-Error-Reporting UI toggle, and a job object's breakaway bit.
//! None of these have a portable Rust equivalent, so the actual syscalls
//! live behind `EnvironmentEffects` (an external collaborator, same
//! pattern as `FileFinder`/`UploadAgent`); what this module owns is the
//! "scoped acquisition, guaranteed release on every exit path" discipline
//! itself, expressed as ordinary RAII guards.

/// Requested process scheduling priority, the CLI's `/Priority=` vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriorityClass {
    Low,
    Normal,
    High,
}

/// The actual OS-level calls. A real implementation targets Win32
/// (`SetPriorityClass`, `SetThreadExecutionState`, the WER registry key,
/// `JOB_OBJECT_LIMIT_BREAKAWAY_OK`); none of that belongs in this crate.
pub trait EnvironmentEffects: Send + Sync {
    fn set_priority(&self, class: PriorityClass);
    fn inhibit_sleep(&self, inhibit: bool);
    fn set_wer_ui_suppressed(&self, suppressed: bool);
    fn set_job_breakaway(&self, allow: bool);
}

/// Default collaborator for platforms or test runs with nothing to wire
/// up: every call is a no-op, so guards built over it still exercise the
/// acquire/release discipline without touching real process state.
pub struct NullEnvironmentEffects;

impl EnvironmentEffects for NullEnvironmentEffects {
    fn set_priority(&self, _class: PriorityClass) {}
    fn inhibit_sleep(&self, _inhibit: bool) {}
    fn set_wer_ui_suppressed(&self, _suppressed: bool) {}
    fn set_job_breakaway(&self, _allow: bool) {}
}

/// A scoped acquisition of one environmental effect: applies on
/// construction, restores on drop, including on an unwinding panic.
pub struct ScopedEffect<'a> {
    restore: Option<Box<dyn FnOnce() + Send + 'a>>,
}

impl<'a> ScopedEffect<'a> {
    fn new(apply: impl FnOnce(), restore: impl FnOnce() + Send + 'a) -> Self {
        apply();
        Self {
            restore: Some(Box::new(restore)),
        }
    }

    pub fn priority(effects: &'a dyn EnvironmentEffects, class: PriorityClass, restore_to: PriorityClass) -> Self {
        Self::new(
            || effects.set_priority(class),
            move || effects.set_priority(restore_to),
        )
    }

    pub fn sleep_inhibition(effects: &'a dyn EnvironmentEffects) -> Self {
        Self::new(
            || effects.inhibit_sleep(true),
            move || effects.inhibit_sleep(false),
        )
    }

    pub fn wer_ui_suppression(effects: &'a dyn EnvironmentEffects) -> Self {
        Self::new(
            || effects.set_wer_ui_suppressed(true),
            move || effects.set_wer_ui_suppressed(false),
        )
    }

    pub fn job_breakaway(effects: &'a dyn EnvironmentEffects) -> Self {
        Self::new(
            || effects.set_job_breakaway(true),
            move || effects.set_job_breakaway(false),
        )
    }
}

impl Drop for ScopedEffect<'_> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingEffects {
        priority: Mutex<Option<PriorityClass>>,
        sleep_inhibited: Mutex<bool>,
    }

    impl EnvironmentEffects for RecordingEffects {
        fn set_priority(&self, class: PriorityClass) {
            *self.priority.lock().unwrap() = Some(class);
        }
        fn inhibit_sleep(&self, inhibit: bool) {
            *self.sleep_inhibited.lock().unwrap() = inhibit;
        }
        fn set_wer_ui_suppressed(&self, _suppressed: bool) {}
        fn set_job_breakaway(&self, _allow: bool) {}
    }

    #[test]
    fn priority_guard_restores_on_drop() {
        let effects = RecordingEffects {
            priority: Mutex::new(Some(PriorityClass::Normal)),
            sleep_inhibited: Mutex::new(false),
        };
        {
            let _guard = ScopedEffect::priority(&effects, PriorityClass::High, PriorityClass::Normal);
            assert_eq!(*effects.priority.lock().unwrap(), Some(PriorityClass::High));
        }
        assert_eq!(*effects.priority.lock().unwrap(), Some(PriorityClass::Normal));
    }

    #[test]
    fn sleep_inhibition_restores_on_drop() {
        let effects = RecordingEffects {
            priority: Mutex::new(None),
            sleep_inhibited: Mutex::new(false),
        };
        {
            let _guard = ScopedEffect::sleep_inhibition(&effects);
            assert!(*effects.sleep_inhibited.lock().unwrap());
        }
        assert!(!*effects.sleep_inhibited.lock().unwrap());
    }
}
