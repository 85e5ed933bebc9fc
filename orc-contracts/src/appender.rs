use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Invoked after an item's bytes are fully consumed into the archive,
/// carrying the outcome of that item specifically (not the whole archive).
pub type CompletionCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// One named input stream plus its completion notification.
pub struct ArchiveItem {
    pub name: String,
    pub source: Box<dyn AsyncRead + Unpin + Send>,
    pub on_complete: Option<CompletionCallback>,
}

impl ArchiveItem {
    pub fn new(name: impl Into<String>, source: Box<dyn AsyncRead + Unpin + Send>) -> Self {
        Self {
            name: name.into(),
            source,
            on_complete: None,
        }
    }

    pub fn with_completion(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }
}

/// An incremental archive builder, consumed without knowledge of the
/// underlying format's internals (7-Zip in the source system; this crate
/// names only the contract, see `orc-core::archive` for the default
/// implementation over the real `zip` codec).
///
/// Contract: `add` enqueues work and returns once accepted, not once
/// written — the per-item callback is the only signal of completion.
/// `flush` compacts pending items into an intermediate store at the
/// fastest compression level. `close` re-compresses from the current
/// store at the target level and must be called even after a prior
/// `flush` failure, so temporaries are always released.
#[async_trait]
pub trait Appender: Send + Sync {
    async fn add(&self, item: ArchiveItem) -> Result<()>;
    async fn flush(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;
}
