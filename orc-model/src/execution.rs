use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the orchestrator should treat a pre-existing output for a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatPolicy {
    /// Skip the set if a non-empty output already exists, but still
    /// request upload of that existing file (idempotency).
    Once,
    /// Always run the set, replacing whatever output exists.
    Overwrite,
    /// Repeat semantics the source never implemented; treated as
    /// `Overwrite` by the orchestrator but kept distinct for fidelity
    /// with configuration files that name it explicitly.
    NotImplemented,
}

/// One unit of orchestration: produces a single archive (or directory)
/// from a command list that runs out-of-process in the external executor.
/// The command list itself is opaque to this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionSet {
    pub keyword: String,
    pub archive_file_name: String,
    pub output_full_path: PathBuf,
    pub commands: Vec<String>,
    pub repeat_policy: RepeatPolicy,
    pub optional: bool,
    pub upload: bool,
    pub concurrency: u32,
    pub encryption_journal: Option<String>,
}

impl ExecutionSet {
    pub fn new(keyword: impl Into<String>, output_full_path: impl Into<PathBuf>) -> Self {
        let keyword = keyword.into();
        Self {
            archive_file_name: format!("{keyword}.7z"),
            keyword,
            output_full_path: output_full_path.into(),
            commands: Vec::new(),
            repeat_policy: RepeatPolicy::Overwrite,
            optional: false,
            upload: false,
            concurrency: 1,
            encryption_journal: None,
        }
    }

    pub fn with_repeat_policy(mut self, policy: RepeatPolicy) -> Self {
        self.repeat_policy = policy;
        self
    }

    pub fn with_upload(mut self, upload: bool) -> Self {
        self.upload = upload;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_archive_name_derives_from_keyword() {
        let set = ExecutionSet::new("NTFSInfo", "/out");
        assert_eq!(set.archive_file_name, "NTFSInfo.7z");
    }
}
