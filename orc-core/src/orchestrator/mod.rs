//! `CommandSetOrchestrator`: sequences a run's `ExecutionSet`s, applies
//! each set's repeat policy, drives upload, and assembles the Outline
//! (pre-run) and Outcome (post-run) manifests.
//!
//! The per-set work itself — building a `SampleCollector`, an archive, a
//! table sink, and running the walker to completion — is delegated to a
//! `SetExecutor` the caller supplies, the same external-collaborator
//! pattern `FileFinder` and `UploadAgent` use: this module owns
//! sequencing and policy, not concrete wiring.

pub mod guard;
pub mod termination;

pub use guard::{EnvironmentEffects, NullEnvironmentEffects, PriorityClass, ScopedEffect};
pub use termination::{TerminationCascade, TerminationHandler, TerminationOutcome};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use orc_contracts::{UploadAgent, UploadMethod, UploadRequest};
use orc_model::{
    ArchiveManifestEntry, ExecutionSet, Outcome, Outline, ProcessInfo, Recipient, RepeatPolicy,
    SystemIdentity,
};

use crate::error::{CoreError, Result};

/// Builds the collector/archive/table-sink chain for one `ExecutionSet`
/// and drives it to completion. Implemented by whatever binary knows the
/// concrete `FileFinder`/`Appender`/`TableSink` types (`orc-cli`).
#[async_trait]
pub trait SetExecutor: Send + Sync {
    /// Size in bytes of the set's output if it already exists, `None`
    /// otherwise. Feeds the `repeat == Once` pre-flight probe.
    async fn local_state(&self, set: &ExecutionSet) -> std::io::Result<Option<u64>>;

    /// Runs the set: collector, archive, table sink, walker, close.
    async fn execute(&self, set: &ExecutionSet, cascade: &mut TerminationCascade) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreflightDecision {
    Proceed,
    SkipButUpload,
}

/// Pure pre-flight classifier: `Once` skips collection when a
/// non-empty output already exists locally or remotely, but the set is
/// still eligible for upload so a partial prior run completes its
/// transfer. `Overwrite`/`NotImplemented` always proceed.
pub fn preflight(set: &ExecutionSet, local_exists_nonzero: bool, remote_exists: bool) -> PreflightDecision {
    match set.repeat_policy {
        RepeatPolicy::Once if local_exists_nonzero || remote_exists => PreflightDecision::SkipButUpload,
        _ => PreflightDecision::Proceed,
    }
}

pub struct CommandSetOrchestrator {
    tool_name: String,
    tool_version: String,
    computer_name: String,
    upload: Option<Arc<dyn UploadAgent>>,
}

impl CommandSetOrchestrator {
    pub fn new(
        tool_name: impl Into<String>,
        tool_version: impl Into<String>,
        computer_name: impl Into<String>,
        upload: Option<Arc<dyn UploadAgent>>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_version: tool_version.into(),
            computer_name: computer_name.into(),
            upload,
        }
    }

    /// `Keywords` mode: list what would run without touching the walker.
    pub fn enumerate_keywords(&self, sets: &[ExecutionSet]) -> Vec<String> {
        sets.iter().map(|s| s.keyword.clone()).collect()
    }

    /// Assembles the pre-run manifest before any set executes.
    pub fn build_outline(
        &self,
        sets: &[ExecutionSet],
        start: DateTime<Utc>,
        mothership: ProcessInfo,
        self_info: ProcessInfo,
        system_identity: SystemIdentity,
    ) -> Outline {
        let mut outline = Outline::new(self.tool_name.clone(), self.tool_version.clone(), start);
        outline.mothership = mothership;
        outline.self_info = self_info;
        outline.system_identity = system_identity;
        outline.planned = sets
            .iter()
            .map(|s| ArchiveManifestEntry {
                keyword: s.keyword.clone(),
                archive_file_name: s.archive_file_name.clone(),
                commands: s.commands.clone(),
            })
            .collect();
        outline
    }

    /// `Execute` mode: runs every non-optional set in order, honoring
    /// each one's repeat policy, uploading what it produces, and
    /// returning the assembled Outcome manifest.
    pub async fn run_execute(
        &self,
        sets: &[ExecutionSet],
        executor: &dyn SetExecutor,
        start: DateTime<Utc>,
        timestamp_key: impl Into<String>,
        mothership: ProcessInfo,
        self_info: ProcessInfo,
        recipients: Vec<Recipient>,
    ) -> Result<Outcome> {
        let mut outcome = Outcome::new(self.computer_name.clone(), timestamp_key, start);
        outcome.mothership = mothership;
        outcome.self_info = self_info;
        outcome.recipients = recipients;

        for set in sets {
            if set.optional {
                info!(keyword = %set.keyword, "optional set skipped by configuration");
                continue;
            }

            let local_size = executor
                .local_state(set)
                .await
                .map_err(CoreError::Io)?
                .unwrap_or(0);
            // Remote-existence probing is the upload agent's concern; no
            // agent here means no remote copy can exist yet.
            let remote_exists = false;
            let decision = preflight(set, local_size > 0, remote_exists);

            let mut cascade = TerminationCascade::new();
            let produced = match decision {
                PreflightDecision::SkipButUpload => {
                    info!(keyword = %set.keyword, "repeat=Once and a non-empty output already exists, skipping collection");
                    true
                }
                PreflightDecision::Proceed => {
                    if set.repeat_policy == RepeatPolicy::Overwrite && local_size > 0 {
                        info!(keyword = %set.keyword, previous_size = local_size, "overwriting existing output");
                    }
                    match executor.execute(set, &mut cascade).await {
                        Ok(()) => true,
                        Err(err) => {
                            warn!(keyword = %set.keyword, error = %err, "set execution failed, running termination cascade");
                            cascade.run().await;
                            false
                        }
                    }
                }
            };

            if !produced {
                continue;
            }

            if set.upload {
                if let Some(upload) = &self.upload {
                    let request = UploadRequest {
                        local_path: set.output_full_path.clone(),
                        destination: set.archive_file_name.clone(),
                        method: UploadMethod::Copy,
                    };
                    if let Err(err) = upload.request_upload(request).await {
                        warn!(keyword = %set.keyword, error = %err, "upload request failed");
                    }
                }
            }

            outcome.push_produced(ArchiveManifestEntry {
                keyword: set.keyword.clone(),
                archive_file_name: set.archive_file_name.clone(),
                commands: set.commands.clone(),
            });
        }

        if let Some(upload) = &self.upload {
            upload.complete_upload().await?;
        }

        outcome.finish(Utc::now());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keyword: &str, policy: RepeatPolicy) -> ExecutionSet {
        ExecutionSet::new(keyword, "/out").with_repeat_policy(policy)
    }

    #[test]
    fn once_with_existing_nonempty_output_skips() {
        let s = set("NTFSInfo", RepeatPolicy::Once);
        assert_eq!(preflight(&s, true, false), PreflightDecision::SkipButUpload);
    }

    #[test]
    fn once_with_no_existing_output_proceeds() {
        let s = set("NTFSInfo", RepeatPolicy::Once);
        assert_eq!(preflight(&s, false, false), PreflightDecision::Proceed);
    }

    #[test]
    fn overwrite_always_proceeds() {
        let s = set("NTFSInfo", RepeatPolicy::Overwrite);
        assert_eq!(preflight(&s, true, true), PreflightDecision::Proceed);
    }

    #[test]
    fn once_with_remote_only_existing_skips() {
        let s = set("NTFSInfo", RepeatPolicy::Once);
        assert_eq!(preflight(&s, false, true), PreflightDecision::SkipButUpload);
    }
}
