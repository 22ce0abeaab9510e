//! Reader and writer adapters that feed transferred byte counts into a
//! [`RateCounter`].
//!
//! Both adapters implement the blocking `std::io` traits and the tokio async
//! traits, depending on what the wrapped value supports. Only bytes actually
//! transferred are counted; zero-length transfers and errors leave the
//! counter untouched, and errors are returned unchanged.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::error::Result;
use crate::rate::RateCounter;

/// Record a transfer of `n` bytes, ignoring empty ones.
fn record(counter: &RateCounter, n: usize) {
    if n > 0 {
        counter.increment(n as i64);
    }
}

/// Computes the transfer rate of everything read through it.
#[derive(Debug)]
pub struct RatedReader<R> {
    inner: R,
    counter: Arc<RateCounter>,
}

impl<R> RatedReader<R> {
    /// Wrap `inner`, counting bytes read into `counter`.
    pub fn new(inner: R, counter: Arc<RateCounter>) -> Self {
        Self { inner, counter }
    }

    /// See [`RateCounter::rate`].
    pub fn rate(&self) -> i64 {
        self.counter.rate()
    }

    /// See [`RateCounter::rate_per`].
    pub fn rate_per(&self, divisor: i64) -> Result<i64> {
        self.counter.rate_per(divisor)
    }

    /// Get the shared counter.
    pub fn counter(&self) -> &Arc<RateCounter> {
        &self.counter
    }

    /// Get a reference to the wrapped value.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Get a mutable reference to the wrapped value; bytes moved through it
    /// directly are not counted.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap, returning the wrapped value.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> io::Read for RatedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        record(&self.counter, n);
        Ok(n)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for RatedReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            record(&this.counter, buf.filled().len() - before);
        }
        poll
    }
}

/// Computes the transfer rate of everything written through it.
#[derive(Debug)]
pub struct RatedWriter<W> {
    inner: W,
    counter: Arc<RateCounter>,
}

impl<W> RatedWriter<W> {
    /// Wrap `inner`, counting bytes written into `counter`.
    pub fn new(inner: W, counter: Arc<RateCounter>) -> Self {
        Self { inner, counter }
    }

    /// See [`RateCounter::rate`].
    pub fn rate(&self) -> i64 {
        self.counter.rate()
    }

    /// See [`RateCounter::rate_per`].
    pub fn rate_per(&self, divisor: i64) -> Result<i64> {
        self.counter.rate_per(divisor)
    }

    /// Get the shared counter.
    pub fn counter(&self) -> &Arc<RateCounter> {
        &self.counter
    }

    /// Get a reference to the wrapped value.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Get a mutable reference to the wrapped value; bytes moved through it
    /// directly are not counted.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap, returning the wrapped value.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> io::Write for RatedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        record(&self.counter, n);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for RatedWriter<W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = poll {
            record(&this.counter, n);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}


#[cfg(test)]
mod tests {
    use super::support::{test_counter, BrokenSink, ShortSink};
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_writer_counts_written_bytes() {
        let counter = test_counter();
        let mut writer = RatedWriter::new(Vec::new(), counter.clone());

        assert_eq!(writer.write(b"hello").unwrap(), 5);
        assert_eq!(counter.buffered(), 5);
        assert_eq!(writer.write(b", world").unwrap(), 7);
        assert_eq!(counter.buffered(), 12);

        writer.flush().unwrap();
        assert_eq!(writer.into_inner(), b"hello, world".to_vec());
    }

    #[test]
    fn test_writer_counts_accepted_not_requested() {
        let counter = test_counter();
        let sink = ShortSink {
            limit: 3,
            data: Vec::new(),
        };
        let mut writer = RatedWriter::new(sink, counter.clone());

        assert_eq!(writer.write(b"abcdefgh").unwrap(), 3);
        assert_eq!(counter.buffered(), 3);
        assert_eq!(writer.get_ref().data, b"abc".to_vec());
    }

    #[test]
    fn test_writer_failure_does_not_count() {
        let counter = test_counter();
        let mut writer = RatedWriter::new(BrokenSink, counter.clone());

        let err = writer.write(b"data").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(counter.buffered(), 0);
    }

    #[test]
    fn test_reader_counts_read_bytes() {
        let counter = test_counter();
        let mut reader = RatedReader::new(io::Cursor::new(vec![7u8; 100]), counter.clone());

        let mut buf = [0u8; 30];
        assert_eq!(reader.read(&mut buf).unwrap(), 30);
        assert_eq!(counter.buffered(), 30);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len(), 70);
        assert_eq!(counter.buffered(), 100);

        // EOF reads return zero and are not recorded.
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(counter.buffered(), 100);
    }

    #[test]
    fn test_adapters_share_counter() {
        let counter = test_counter();
        let mut reader = RatedReader::new(&b"abcd"[..], counter.clone());
        let mut writer = RatedWriter::new(Vec::new(), counter.clone());

        io::copy(&mut reader, &mut writer).unwrap();
        assert_eq!(counter.buffered(), 8);
        assert!(Arc::ptr_eq(reader.counter(), writer.counter()));
    }

    #[test]
    fn test_rate_delegates_to_counter() {
        let counter = test_counter();
        let reader = RatedReader::new(io::empty(), counter.clone());
        let writer = RatedWriter::new(io::sink(), counter);

        assert_eq!(reader.rate(), 0);
        assert_eq!(writer.rate_per(crate::units::KIB).unwrap(), 0);
        assert!(reader.rate_per(0).is_err());
    }
}

#[cfg(test)]
mod async_tests {
    use super::support::{test_counter, BrokenSink};
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_async_reader_counts_read_bytes() {
        let counter = test_counter();
        let mut reader = RatedReader::new(&b"async payload"[..], counter.clone());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"async payload".to_vec());
        assert_eq!(counter.buffered(), 13);
    }

    #[tokio::test]
    async fn test_async_writer_counts_written_bytes() {
        let counter = test_counter();
        let mut writer = RatedWriter::new(Vec::new(), counter.clone());

        writer.write_all(b"0123456789").await.unwrap();
        writer.flush().await.unwrap();
        writer.shutdown().await.unwrap();

        assert_eq!(counter.buffered(), 10);
        assert_eq!(writer.get_ref().len(), 10);
    }

    #[tokio::test]
    async fn test_async_writer_failure_does_not_count() {
        let counter = test_counter();
        let mut writer = RatedWriter::new(BrokenSink, counter.clone());

        let err = writer.write(b"data").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(counter.buffered(), 0);
    }

    #[tokio::test]
    async fn test_async_copy_through_duplex() {
        let counter = test_counter();
        let (client, mut server) = tokio::io::duplex(64);
        let mut writer = RatedWriter::new(client, counter.clone());

        let payload = vec![1u8; 200];
        let send = async {
            writer.write_all(&payload).await.unwrap();
            writer.shutdown().await.unwrap();
        };
        let mut received = Vec::new();
        let recv = server.read_to_end(&mut received);

        let (_, read) = tokio::join!(send, recv);
        assert_eq!(read.unwrap(), 200);
        assert_eq!(counter.buffered(), 200);
    }
}
