//! Composes, per matched sample, a chain of readers stacked in order:
//! source → optional strings filter → crypto-hash tap → fuzzy-hash tap →
//! destination sink. The pipeline is pull-based: whoever drives the
//! outermost handle to EOF is what determines how much gets read; the
//! taps see every byte exactly once, in order, regardless of who's
//! pulling.

mod discard;
mod fuzzy;
mod hash_tap;
mod strings;

pub use discard::DiscardSink;
pub use fuzzy::{FuzzyHasher, NullFuzzyHasher};
pub use hash_tap::{CryptoAlgorithms, HashTap, PipelineHandle};
pub use strings::StringsFilter;

use tokio::io::AsyncRead;

use orc_model::ContentSpec;

/// The outermost stacked reader a pipeline produces, type-erased so the
/// archive appender and directory sink don't need to know the chain's
/// concrete shape.
pub type PipelineOutput = Box<dyn AsyncRead + Unpin + Send>;

pub struct StreamPipeline;

impl StreamPipeline {
    /// Builds the reader chain for one matched attribute's data-stream.
    /// Returns the outermost handle plus a `PipelineHandle` the caller
    /// keeps past EOF in order to finalize digests once the archive (or
    /// directory copy) has fully consumed the stream.
    pub fn build<R>(
        source: R,
        content_spec: &ContentSpec,
        crypto: CryptoAlgorithms,
        fuzzy_hashers: Vec<Box<dyn FuzzyHasher>>,
    ) -> (PipelineOutput, PipelineHandle)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        use orc_model::ContentKind;

        let handle = PipelineHandle::new(crypto, fuzzy_hashers);

        let staged: PipelineOutput = if content_spec.kind == ContentKind::Strings {
            Box::new(StringsFilter::new(
                source,
                content_spec.effective_min_chars(),
                content_spec.effective_max_chars(),
            ))
        } else {
            Box::new(source)
        };

        let hashed: PipelineOutput = Box::new(HashTap::new(staged, handle.clone()));

        (hashed, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_model::{ContentKind, ContentSpec};
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn data_kind_passes_bytes_through_unmodified() {
        let (mut out, handle) = StreamPipeline::build(
            &b"hello world"[..],
            &ContentSpec::new(ContentKind::Data),
            CryptoAlgorithms {
                md5: true,
                sha1: false,
                sha256: false,
            },
            Vec::new(),
        );
        let mut buf = Vec::new();
        out.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello world");
        assert_eq!(handle.bytes_seen(), 11);
        let hashes = handle.finalize();
        assert!(hashes.md5.is_some());
        assert!(hashes.sha1.is_none());
    }

    #[tokio::test]
    async fn strings_kind_filters_before_hashing() {
        let data: &'static [u8] = b"\x01\x02ABCDE";
        let (mut out, handle) = StreamPipeline::build(
            data,
            &ContentSpec::strings(5, 16),
            CryptoAlgorithms::default(),
            Vec::new(),
        );
        let mut buf = Vec::new();
        out.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ABCDE");
        assert_eq!(handle.bytes_seen(), 5);
    }
}
