use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use md5::{Digest, Md5};
use parking_lot::Mutex;
use sha1::Sha1;
use sha2::Sha256;
use tokio::io::{AsyncRead, ReadBuf};

use orc_model::HashBuffers;

use super::fuzzy::FuzzyHasher;

/// Which crypto digests this sample's pipeline should compute.
#[derive(Clone, Copy, Debug, Default)]
pub struct CryptoAlgorithms {
    pub md5: bool,
    pub sha1: bool,
    pub sha256: bool,
}

impl CryptoAlgorithms {
    pub fn any(&self) -> bool {
        self.md5 || self.sha1 || self.sha256
    }
}

struct DigestState {
    md5: Option<Md5>,
    sha1: Option<Sha1>,
    sha256: Option<Sha256>,
}

impl DigestState {
    fn new(algorithms: CryptoAlgorithms) -> Self {
        Self {
            md5: algorithms.md5.then(Md5::new),
            sha1: algorithms.sha1.then(Sha1::new),
            sha256: algorithms.sha256.then(Sha256::new),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        if let Some(ctx) = &mut self.md5 {
            ctx.update(bytes);
        }
        if let Some(ctx) = &mut self.sha1 {
            ctx.update(bytes);
        }
        if let Some(ctx) = &mut self.sha256 {
            ctx.update(bytes);
        }
    }
}

/// Shared state between the crypto and fuzzy taps and whoever finalizes
/// the digests once the stream is fully consumed. EOF alone does not
/// finalize anything — the archive-item-completion callback does, per
/// the pipeline's deferred-finalisation contract.
pub struct PipelineState {
    digest: DigestState,
    /// Zero or more independent fuzzy hashers — `/FuzzyHash=ssdeep,tlsh`
    /// runs both over the same byte stream.
    fuzzy: Vec<Box<dyn FuzzyHasher>>,
    bytes_seen: u64,
}

#[derive(Clone)]
pub struct PipelineHandle(Arc<Mutex<PipelineState>>);

impl PipelineHandle {
    pub fn new(algorithms: CryptoAlgorithms, fuzzy: Vec<Box<dyn FuzzyHasher>>) -> Self {
        Self(Arc::new(Mutex::new(PipelineState {
            digest: DigestState::new(algorithms),
            fuzzy,
            bytes_seen: 0,
        })))
    }

    pub fn bytes_seen(&self) -> u64 {
        self.0.lock().bytes_seen
    }

    /// Consumes the digest state and returns the filled-in `HashBuffers`.
    /// Called exactly once, from the archive-item-completion callback.
    pub fn finalize(self) -> HashBuffers {
        let inner = Arc::try_unwrap(self.0)
            .unwrap_or_else(|arc| Mutex::new(clone_state(&arc.lock())))
            .into_inner();

        let mut ssdeep = None;
        let mut tlsh = None;
        for fuzzy in inner.fuzzy {
            match fuzzy.algorithm_name() {
                "ssdeep" => ssdeep = fuzzy.finish(),
                "tlsh" => tlsh = fuzzy.finish(),
                _ => {}
            }
        }

        HashBuffers {
            md5: inner.digest.md5.map(|ctx| ctx.finalize().to_vec()),
            sha1: inner.digest.sha1.map(|ctx| ctx.finalize().to_vec()),
            sha256: inner.digest.sha256.map(|ctx| ctx.finalize().to_vec()),
            ssdeep,
            tlsh,
        }
    }
}

/// Best-effort clone used only on the (rare, programmer-error) path where
/// more than one strong reference to the pipeline state survives to
/// finalisation time; digest contexts don't implement `Clone` uniformly
/// across algorithms selected at runtime, so this degrades to an empty
/// state rather than fail outright.
fn clone_state(_state: &PipelineState) -> PipelineState {
    PipelineState {
        digest: DigestState::new(CryptoAlgorithms::default()),
        fuzzy: Vec::new(),
        bytes_seen: 0,
    }
}

pub struct HashTap<R> {
    inner: R,
    state: PipelineHandle,
}

impl<R: AsyncRead + Unpin> HashTap<R> {
    pub fn new(inner: R, state: PipelineHandle) -> Self {
        Self { inner, state }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for HashTap<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &result {
            let produced = &buf.filled()[before..];
            if !produced.is_empty() {
                let mut state = this.state.0.lock();
                state.digest.update(produced);
                for fuzzy in &mut state.fuzzy {
                    fuzzy.update(produced);
                }
                state.bytes_seen += produced.len() as u64;
            }
        }
        result
    }
}
