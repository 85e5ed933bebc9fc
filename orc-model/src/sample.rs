use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::ContentSpec;
use crate::limits::{LimitStatus, Limits};
use crate::search_term::SearchTerm;

/// Identifies one NTFS attribute instance across passes: `{frn,
/// attribute_index, volume_serial, snapshot_id}`, equality over all four.
///
/// Deliberately `Eq + Hash` only, no `Ord` — an ordering built from these
/// fields would fall through to a non-strict-weak ordering on partial
/// equality, which this model does not attempt (see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleId {
    pub file_record_number: u64,
    pub attribute_index: u32,
    pub volume_serial: i64,
    pub snapshot_id: Uuid,
}

impl SampleId {
    pub fn new(
        file_record_number: u64,
        attribute_index: u32,
        volume_serial: i64,
        snapshot_id: Uuid,
    ) -> Self {
        Self {
            file_record_number,
            attribute_index,
            volume_serial,
            snapshot_id,
        }
    }
}

/// Crypto/fuzzy digest buffers, filled in by the archive-completion
/// callback — never before. Each field is `None` until its algorithm is
/// both enabled and has finished consuming the stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashBuffers {
    pub md5: Option<Vec<u8>>,
    pub sha1: Option<Vec<u8>>,
    pub sha256: Option<Vec<u8>>,
    pub ssdeep: Option<String>,
    pub tlsh: Option<String>,
}

impl HashBuffers {
    pub fn is_empty(&self) -> bool {
        self.md5.is_none()
            && self.sha1.is_none()
            && self.sha256.is_none()
            && self.ssdeep.is_none()
            && self.tlsh.is_none()
    }
}

/// Metadata record for one matched attribute. The live, in-flight
/// counterpart (holding the actual open stream handle) lives in
/// `orc-core`'s collector — this type is the pure-data projection that
/// survives into the CSV row and, serialized, into test fixtures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub match_names: Vec<String>,
    pub attribute_index: u32,
    pub instance_id: u32,
    pub source_path: String,
    pub content_spec: ContentSpec,
    pub size_after_pipeline: u64,
    pub hashes: HashBuffers,
    pub collection_time: chrono::DateTime<chrono::Utc>,
    pub archive_name: Option<String>,
    pub limit_status: LimitStatus,
    pub in_use: bool,
}

impl Sample {
    /// True once every algorithm that was requested has produced a value
    /// (used by tests and `report-all` bookkeeping; an unrequested
    /// algorithm stays `None` forever and does not block this check).
    pub fn digests_complete(&self, requested: &[&str]) -> bool {
        requested.iter().all(|algo| match *algo {
            "md5" => self.hashes.md5.is_some(),
            "sha1" => self.hashes.sha1.is_some(),
            "sha256" => self.hashes.sha256.is_some(),
            "ssdeep" => self.hashes.ssdeep.is_some(),
            "tlsh" => self.hashes.tlsh.is_some(),
            _ => true,
        })
    }
}

/// A named rule group: `{name-prefix, per-spec limits, content-spec,
/// search terms}`. Many specs exist per run; a `Match` is resolved to its
/// owning spec by term-identity, not by spec-identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleSpec {
    pub name_prefix: String,
    pub limits: Limits,
    pub content_spec: ContentSpec,
    pub terms: Vec<SearchTerm>,
}

impl SampleSpec {
    pub fn new(name_prefix: impl Into<String>, content_spec: ContentSpec) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            limits: Limits::new(),
            content_spec,
            terms: Vec::new(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_term(mut self, term: SearchTerm) -> Self {
        self.terms.push(term);
        self
    }

    /// Finds the term this spec owns by identity (term name), the
    /// resolution rule a `Match` uses to find its spec.
    pub fn owns_term(&self, term_name: &str) -> bool {
        self.terms.iter().any(|t| t.name == term_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_id_equality_is_over_all_four_fields() {
        let snap = Uuid::nil();
        let a = SampleId::new(1, 0, 42, snap);
        let b = SampleId::new(1, 0, 42, snap);
        let c = SampleId::new(1, 1, 42, snap);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sample_id_is_hashable_for_dedup_sets() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(SampleId::new(1, 0, 42, Uuid::nil()));
        assert!(!set.insert(SampleId::new(1, 0, 42, Uuid::nil())));
        assert!(set.insert(SampleId::new(2, 0, 42, Uuid::nil())));
    }

    #[test]
    fn spec_owns_term_resolves_by_name() {
        let spec = SampleSpec::new("cfg", ContentSpec::default())
            .with_term(SearchTerm::new("*.ini"));
        assert!(spec.owns_term("*.ini"));
        assert!(!spec.owns_term("*.exe"));
    }
}
