use async_trait::async_trait;
use tokio::io::AsyncRead;

use orc_model::SearchTerm;

use crate::error::Result;
use crate::match_event::Match;

/// Receives `Match` events one at a time, in delivery order, from the
/// walker. The source system's walker invokes this truly synchronously
/// from its own thread; this crate models the same sequencing guarantee
/// (never two `on_match` calls in flight at once, never reordered) as an
/// `async fn` so the collector can drive its own async archive/pipeline
/// machinery directly instead of bridging a sync/async boundary.
#[async_trait]
pub trait MatchSink: Send {
    async fn on_match(&mut self, event: Match) -> Result<()>;
}

/// The NTFS MFT walker and Yara matcher, consumed only through this
/// contract. A real implementation drives volumes (including
/// volume-shadow snapshots) and Yara rule evaluation; none of that lives
/// in this crate.
#[async_trait]
pub trait FileFinder: Send + Sync {
    /// Declares the terms this finder will evaluate, so the orchestrator
    /// can pass them to the `StatisticsReporter` up front.
    fn search_terms(&self) -> Vec<SearchTerm>;

    /// Walks the configured volumes, invoking `sink.on_match` once per
    /// matching MFT record. Returns once the walk is exhausted or a
    /// cancellation token fires.
    async fn walk(&self, sink: &mut dyn MatchSink) -> Result<()>;

    /// Opens the raw data-stream for one attribute of a delivered `Match`.
    /// Synchronous by design: the collector calls this from inside
    /// `on_match`, on the walker's own thread, and only hands the
    /// returned handle off to the (async) archive/pipeline machinery —
    /// it never awaits anything itself.
    fn open_stream(
        &self,
        event: &Match,
        attribute_index: u32,
    ) -> Result<Box<dyn AsyncRead + Unpin + Send>>;
}
