//! Output channels the emitter can write to.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::Sender;

/// Destination for serialized NDJSON lines.
///
/// A returned error means the reader is gone; the emitter does not retry.
#[async_trait]
pub trait EventSink: Send {
    async fn write_line(&mut self, line: String) -> io::Result<()>;
}

/// Feeds a streaming HTTP response body.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write_line(&mut self, line: String) -> io::Result<()> {
        self.tx
            .send(line)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "stream receiver closed"))
    }
}

/// Writes each line to an async writer and flushes it immediately.
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> EventSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_line(&mut self, line: String) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}

/// Drops every line. Used when only the final result matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl EventSink for DiscardSink {
    async fn write_line(&mut self, _line: String) -> io::Result<()> {
        Ok(())
    }
}
