//! Placeholder collaborators for the two external contracts this crate
//! never implements: the NTFS/Yara walker and the upload transport. Both
//! are intentionally out of scope (spec's external-collaborator
//! boundary) — wiring in a real implementation means swapping these out,
//! not touching the orchestrator or collector.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use orc_contracts::{
    ContractError, FileFinder, Match, MatchSink, Result as ContractResult, UploadAgent,
    UploadRequest,
};
use orc_model::SearchTerm;

/// A `FileFinder` that declares no terms and fails any `walk`. This crate
/// assembles the full collection pipeline around a `FileFinder`, but the
/// actual volume walker and Yara matcher are a separate, platform-
/// specific component this workspace does not ship.
pub struct UnimplementedFileFinder;

#[async_trait]
impl FileFinder for UnimplementedFileFinder {
    fn search_terms(&self) -> Vec<SearchTerm> {
        Vec::new()
    }

    async fn walk(&self, _sink: &mut dyn MatchSink) -> ContractResult<()> {
        Err(ContractError::Backend(
            "no FileFinder is linked into this build; the NTFS walker and Yara matcher are an external component".to_string(),
        ))
    }

    fn open_stream(&self, _event: &Match, _attribute_index: u32) -> ContractResult<Box<dyn AsyncRead + Unpin + Send>> {
        Err(ContractError::Backend("no FileFinder is linked into this build".to_string()))
    }
}

/// Accepts upload requests and immediately completes them without
/// sending anything anywhere. Used when no `--upload-destination` is
/// configured; a real transport plugs in behind the same trait.
pub struct NoopUploadAgent;

#[async_trait]
impl UploadAgent for NoopUploadAgent {
    async fn request_upload(&self, _request: UploadRequest) -> ContractResult<()> {
        Ok(())
    }

    async fn complete_upload(&self) -> ContractResult<()> {
        Ok(())
    }
}
