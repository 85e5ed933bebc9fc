use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// Wraps a reader, emitting only the printable byte runs of length within
/// `[min_chars, max_chars]`. A single interior `0x00` byte does not
/// terminate a run (tolerated, as the source's byte scan allows); any
/// other non-printable byte does. Detection is an 8-bit byte scan —
/// pairing bytes for UTF-16 probing is not implemented.
pub struct StringsFilter<R> {
    inner: R,
    min_chars: usize,
    max_chars: usize,
    current_run: Vec<u8>,
    output: VecDeque<u8>,
    inner_eof: bool,
}

impl<R: AsyncRead + Unpin> StringsFilter<R> {
    pub fn new(inner: R, min_chars: u32, max_chars: u32) -> Self {
        Self {
            inner,
            min_chars: min_chars as usize,
            max_chars: max_chars.max(min_chars) as usize,
            current_run: Vec::new(),
            output: VecDeque::new(),
            inner_eof: false,
        }
    }

    fn ingest(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if is_printable(b) {
                self.current_run.push(b);
                if self.current_run.len() >= self.max_chars {
                    self.emit_run();
                }
            } else if b == 0 {
                // Interior zero: tolerated, run continues but the byte
                // itself never appears in output.
            } else {
                self.flush_run();
            }
        }
    }

    fn flush_run(&mut self) {
        if self.current_run.len() >= self.min_chars {
            self.output.extend(self.current_run.iter().copied());
        }
        self.current_run.clear();
    }

    fn emit_run(&mut self) {
        self.output.extend(self.current_run.drain(..));
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for StringsFilter<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if !this.output.is_empty() {
                let n = buf.remaining().min(this.output.len());
                let chunk: Vec<u8> = this.output.drain(..n).collect();
                buf.put_slice(&chunk);
                return Poll::Ready(Ok(()));
            }
            if this.inner_eof {
                return Poll::Ready(Ok(()));
            }
            let mut scratch = [0u8; 8192];
            let mut scratch_buf = ReadBuf::new(&mut scratch);
            match Pin::new(&mut this.inner).poll_read(cx, &mut scratch_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Ready(Ok(())) => {
                    let filled = scratch_buf.filled();
                    if filled.is_empty() {
                        this.inner_eof = true;
                        this.flush_run();
                    } else {
                        this.ingest(filled);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn extracts_only_qualifying_runs() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x01, 0x02]);
        data.extend_from_slice(b"ABCDE");
        data.extend_from_slice(&[0x00, 0x03]);
        let mut filter = StringsFilter::new(&data[..], 5, 16);
        let mut out = Vec::new();
        filter.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"ABCDE");
    }

    #[tokio::test]
    async fn drops_runs_shorter_than_min_chars() {
        let data = b"ab\x01cdefgh".to_vec();
        let mut filter = StringsFilter::new(&data[..], 5, 16);
        let mut out = Vec::new();
        filter.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"cdefgh");
    }

    #[tokio::test]
    async fn splits_runs_longer_than_max_chars() {
        let data = vec![b'A'; 20];
        let mut filter = StringsFilter::new(&data[..], 4, 8);
        let mut out = Vec::new();
        filter.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), 20);
    }

    #[tokio::test]
    async fn interior_zero_does_not_terminate_run() {
        let mut data = b"AB".to_vec();
        data.push(0);
        data.extend_from_slice(b"CDE");
        let mut filter = StringsFilter::new(&data[..], 5, 16);
        let mut out = Vec::new();
        filter.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"ABCDE");
    }
}
