//! The run-wide limit ledger: owns the global `Limits` record and
//! classifies every candidate against it plus whichever spec-local
//! `Limits` the caller supplies, before any bytes are read.

use orc_model::{classify, LimitStatus, Limits};

/// Stateful wrapper around the global `Limits`. The classifier itself
/// (`orc_model::limits::classify`) is a pure function; this type just
/// owns the global side of the pair and gives the collector a single
/// place to call `classify`/`charge_or_mark` against it.
#[derive(Debug, Default)]
pub struct LimitLedger {
    global: Limits,
}

impl LimitLedger {
    pub fn new(global: Limits) -> Self {
        Self { global }
    }

    pub fn global(&self) -> &Limits {
        &self.global
    }

    pub fn classify(&self, local: &Limits, candidate_byte_size: u64) -> LimitStatus {
        classify(&self.global, local, candidate_byte_size)
    }

    /// Applies the outcome of a prior `classify` call: charges both
    /// accumulators on an in-limits status, or marks the sticky flag the
    /// status names on whichever side (global/local) it belongs to.
    /// Off-limits samples are never charged, only marked.
    pub fn charge_or_mark(&mut self, local: &mut Limits, status: LimitStatus, size: u64) {
        if status.is_offlimits() {
            self.global.mark(status);
            local.mark(status);
        } else {
            self.global.charge(size);
            local.charge(size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_limits_charges_both_sides() {
        let mut ledger = LimitLedger::new(Limits::new().with_max_total_bytes(1000));
        let mut local = Limits::new();
        let status = ledger.classify(&local, 30);
        assert_eq!(status, LimitStatus::WithinLimits);
        ledger.charge_or_mark(&mut local, status, 30);
        assert_eq!(ledger.global().bytes_total, 30);
        assert_eq!(local.bytes_total, 30);
    }

    #[test]
    fn off_limits_marks_but_never_charges() {
        let mut ledger = LimitLedger::new(Limits::new().with_max_sample_count(0));
        let mut local = Limits::new();
        let status = ledger.classify(&local, 10);
        assert_eq!(status, LimitStatus::GlobalCountReached);
        ledger.charge_or_mark(&mut local, status, 10);
        assert_eq!(ledger.global().bytes_total, 0);
        assert!(ledger.global().count_reached);
    }

    #[test]
    fn count_limit_scenario_from_spec() {
        // Four 10-byte matches against MaxSampleCount=2: first two
        // collected, next two GlobalCountReached.
        let mut ledger = LimitLedger::new(Limits::new().with_max_sample_count(2));
        let mut local = Limits::new();
        let mut statuses = Vec::new();
        for _ in 0..4 {
            let status = ledger.classify(&local, 10);
            ledger.charge_or_mark(&mut local, status, 10);
            statuses.push(status);
        }
        assert_eq!(
            statuses,
            vec![
                LimitStatus::WithinLimits,
                LimitStatus::WithinLimits,
                LimitStatus::GlobalCountReached,
                LimitStatus::GlobalCountReached,
            ]
        );
    }
}
