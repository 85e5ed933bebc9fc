use serde::{Deserialize, Serialize};

/// Sum type produced by classifying a candidate against a pair of `Limits`.
///
/// Anything other than `NoLimits`/`WithinLimits` is "off-limits" (spec
/// terminology carried from `GetThis.h`'s `LimitStatus`/`IsOfflimits()`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitStatus {
    NoLimits,
    WithinLimits,
    GlobalCountReached,
    GlobalPerSampleExceeded,
    GlobalTotalReached,
    LocalCountReached,
    LocalPerSampleExceeded,
    LocalTotalReached,
    FailedToCompute,
}

impl LimitStatus {
    /// True for every variant other than `NoLimits`/`WithinLimits`.
    pub fn is_offlimits(&self) -> bool {
        !matches!(self, LimitStatus::NoLimits | LimitStatus::WithinLimits)
    }
}

impl Default for LimitStatus {
    fn default() -> Self {
        LimitStatus::NoLimits
    }
}

/// Configured quotas plus the running accumulators and sticky flags they
/// drive. One instance is global (run-wide), one is per-`SampleSpec`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Limits {
    pub max_bytes_per_sample: Option<u64>,
    pub max_total_bytes: Option<u64>,
    pub max_sample_count: Option<u64>,
    pub ignore_all: bool,

    pub bytes_total: u64,
    pub sample_count: u64,

    pub count_reached: bool,
    pub per_sample_exceeded: bool,
    pub total_reached: bool,
}

impl Limits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_bytes_per_sample(mut self, n: u64) -> Self {
        self.max_bytes_per_sample = Some(n);
        self
    }

    pub fn with_max_total_bytes(mut self, n: u64) -> Self {
        self.max_total_bytes = Some(n);
        self
    }

    pub fn with_max_sample_count(mut self, n: u64) -> Self {
        self.max_sample_count = Some(n);
        self
    }

    pub fn ignoring_all(mut self) -> Self {
        self.ignore_all = true;
        self
    }

    fn count_exhausted(&self) -> bool {
        matches!(self.max_sample_count, Some(max) if self.sample_count >= max)
    }

    fn per_sample_exceeds(&self, candidate: u64) -> bool {
        matches!(self.max_bytes_per_sample, Some(max) if candidate > max)
    }

    fn total_exceeds(&self, candidate: u64) -> bool {
        matches!(self.max_total_bytes, Some(max) if self.bytes_total + candidate > max)
    }

    /// Increments the accumulators for a sample that was within limits.
    /// Off-limits samples must never be charged.
    pub fn charge(&mut self, size: u64) {
        self.bytes_total += size;
        self.sample_count += 1;
    }

    /// Sets the sticky flag named by `status` on this side (global or
    /// local) of the ledger. A no-op for statuses that don't name this
    /// side, so callers can call it unconditionally on both sides.
    pub fn mark(&mut self, status: LimitStatus) {
        match status {
            LimitStatus::GlobalCountReached | LimitStatus::LocalCountReached => {
                self.count_reached = true;
            }
            LimitStatus::GlobalPerSampleExceeded | LimitStatus::LocalPerSampleExceeded => {
                self.per_sample_exceeded = true;
            }
            LimitStatus::GlobalTotalReached | LimitStatus::LocalTotalReached => {
                self.total_reached = true;
            }
            _ => {}
        }
    }
}

/// Stateless classifier over a pair of `Limits`: evaluates, in the fixed
/// order spec'd by the engine, and returns the first matching condition.
/// Order matters: `GlobalCountReached` hides every condition below it.
pub fn classify(global: &Limits, local: &Limits, candidate_byte_size: u64) -> LimitStatus {
    if global.ignore_all {
        return LimitStatus::NoLimits;
    }
    if global.count_exhausted() {
        return LimitStatus::GlobalCountReached;
    }
    if local.count_exhausted() {
        return LimitStatus::LocalCountReached;
    }
    if global.per_sample_exceeds(candidate_byte_size) {
        return LimitStatus::GlobalPerSampleExceeded;
    }
    if global.total_exceeds(candidate_byte_size) {
        return LimitStatus::GlobalTotalReached;
    }
    if local.per_sample_exceeds(candidate_byte_size) {
        return LimitStatus::LocalPerSampleExceeded;
    }
    if local.total_exceeds(candidate_byte_size) {
        return LimitStatus::LocalTotalReached;
    }
    LimitStatus::WithinLimits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_all_short_circuits_everything() {
        let global = Limits::new().with_max_sample_count(0).ignoring_all();
        let local = Limits::new();
        assert_eq!(classify(&global, &local, 1_000_000), LimitStatus::NoLimits);
    }

    #[test]
    fn global_count_hides_per_sample_and_total() {
        let mut global = Limits::new()
            .with_max_sample_count(2)
            .with_max_bytes_per_sample(5)
            .with_max_total_bytes(5);
        global.sample_count = 2;
        let local = Limits::new();
        // Candidate would also violate per-sample and total, but count wins.
        assert_eq!(
            classify(&global, &local, 1_000),
            LimitStatus::GlobalCountReached
        );
    }

    #[test]
    fn fixed_order_prefers_global_over_local() {
        let global = Limits::new().with_max_bytes_per_sample(15);
        let local = Limits::new().with_max_bytes_per_sample(10);
        assert_eq!(
            classify(&global, &local, 20),
            LimitStatus::GlobalPerSampleExceeded
        );
    }

    #[test]
    fn within_limits_when_nothing_fires() {
        let global = Limits::new().with_max_total_bytes(100);
        let local = Limits::new();
        assert_eq!(classify(&global, &local, 10), LimitStatus::WithinLimits);
    }

    #[test]
    fn charge_only_on_within_limits_path() {
        let mut global = Limits::new();
        global.charge(30);
        assert_eq!(global.bytes_total, 30);
        assert_eq!(global.sample_count, 1);
    }

    #[test]
    fn mark_sets_the_named_sticky_flag() {
        let mut local = Limits::new();
        local.mark(LimitStatus::LocalTotalReached);
        assert!(local.total_reached);
        assert!(!local.count_reached);
        assert!(!local.per_sample_exceeded);
    }

    #[test]
    fn is_offlimits_classification() {
        assert!(!LimitStatus::NoLimits.is_offlimits());
        assert!(!LimitStatus::WithinLimits.is_offlimits());
        assert!(LimitStatus::GlobalCountReached.is_offlimits());
        assert!(LimitStatus::FailedToCompute.is_offlimits());
    }
}
