use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Drains a reader without keeping any of its bytes. Used for off-limits
/// items requested under `report-all`: the only legitimate reason to
/// exhaust a stream whose content will never reach the archive is to let
/// the hash taps upstream of this sink fill the digest columns.
pub struct DiscardSink<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> DiscardSink<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub async fn drain(mut self) -> io::Result<u64>
    where
        R: Unpin,
    {
        tokio::io::copy(&mut self.inner, &mut tokio::io::sink()).await
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DiscardSink<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}
