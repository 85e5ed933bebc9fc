use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// Whether the upload transport should copy the local file and leave it
/// in place, or move it (freeing local disk once the transfer commits).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadMethod {
    Copy,
    Move,
}

/// One queued upload. `destination` is opaque to the core — its shape
/// (UNC path, URL, message-queue topic) is entirely the agent's concern.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub local_path: PathBuf,
    pub destination: String,
    pub method: UploadMethod,
}

/// The message-driven upload transport. The orchestrator holds the agent
/// and must release its handle before the agent's queue on the
/// cancellation path, so the agent can drain in-flight requests.
#[async_trait]
pub trait UploadAgent: Send + Sync {
    /// Enqueues a request; returns once accepted, not once transferred.
    async fn request_upload(&self, request: UploadRequest) -> Result<()>;

    /// Waits for all outstanding uploads to finish.
    async fn complete_upload(&self) -> Result<()>;
}
